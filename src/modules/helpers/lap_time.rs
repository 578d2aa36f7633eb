use snafu::ensure;

use crate::errors::{CustomResult, InvalidLapTimeSnafu};

/// # parse a lap time
/// parse a lap time as shown on the timing page into seconds.
/// accepts both `M:SS.ss` and plain `SS.ss`
///
/// ## Arguments
/// * `input` - the lap time text
///
/// ## Returns
/// * `f64` - the lap time in seconds, always finite and positive
pub fn parse_lap_time(input: &str) -> CustomResult<f64> {
    let text = input.trim();
    ensure!(!text.is_empty(), InvalidLapTimeSnafu { input });

    let seconds = match text.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes: u32 = minutes
                .trim()
                .parse()
                .map_err(|_| InvalidLapTimeSnafu { input }.build())?;
            let seconds: f64 = seconds
                .trim()
                .parse()
                .map_err(|_| InvalidLapTimeSnafu { input }.build())?;

            f64::from(minutes) * 60.0 + seconds
        }
        None => text
            .parse::<f64>()
            .map_err(|_| InvalidLapTimeSnafu { input }.build())?,
    };

    // the timing page never shows a zero lap, treat it like garbage
    ensure!(seconds.is_finite() && seconds > 0.0, InvalidLapTimeSnafu { input });

    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::parse_lap_time;

    #[test]
    fn parses_minutes_and_seconds() {
        assert_eq!(parse_lap_time("1:02.50").unwrap(), 62.5);
        assert_eq!(parse_lap_time(" 0:59.90 ").unwrap(), 59.9);
    }

    #[test]
    fn parses_plain_seconds() {
        assert_eq!(parse_lap_time("45.30").unwrap(), 45.3);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_lap_time("").is_err());
        assert!(parse_lap_time("   ").is_err());
        assert!(parse_lap_time("abc").is_err());
        assert!(parse_lap_time("1:xx").is_err());
        assert!(parse_lap_time("x:12.00").is_err());
        assert!(parse_lap_time("0.00").is_err());
        assert!(parse_lap_time("-3.00").is_err());
        assert!(parse_lap_time("NaN").is_err());
    }
}
