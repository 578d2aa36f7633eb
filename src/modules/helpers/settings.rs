use std::env;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;

use crate::errors::{CustomResult, InvalidSettingSnafu};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 4000;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PORT: u16 = 3000;

/// process configuration, read from the environment and an optional `.env` file
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// timing page to start polling as soon as the server is up
    pub timing_url: Option<String>,
    pub poll_interval: Duration,
    pub auto_detect_pit: bool,
    pub fetch_timeout: Duration,
    pub port: u16,
    pub logging_level: String,
    pub log_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            timing_url: None,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            auto_detect_pit: true,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            port: DEFAULT_PORT,
            logging_level: "INFO".to_string(),
            log_file: "program.log".to_string(),
        }
    }
}

impl Settings {
    /// # load settings from the environment
    /// loads `.env` when present, every variable is optional
    ///
    /// ## Returns
    /// * `Settings` - the settings, or the first invalid variable
    pub fn from_env() -> CustomResult<Settings> {
        dotenv().ok();
        Settings::from_lookup(|name| env::var(name).ok())
    }

    /// same as `from_env` but with a custom variable source
    pub fn from_lookup<L>(lookup: L) -> CustomResult<Settings>
    where
        L: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let timing_url = lookup("TIMING_URL")
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let poll_interval = match lookup("POLL_INTERVAL_MS") {
            Some(value) => Duration::from_millis(parse_value::<u64>("POLL_INTERVAL_MS", &value)?),
            None => defaults.poll_interval,
        };
        snafu::ensure!(
            !poll_interval.is_zero(),
            InvalidSettingSnafu { name: "POLL_INTERVAL_MS", value: "0" }
        );

        let auto_detect_pit = match lookup("AUTO_DETECT_PIT") {
            Some(value) => parse_flag("AUTO_DETECT_PIT", &value)?,
            None => defaults.auto_detect_pit,
        };

        let fetch_timeout = match lookup("FETCH_TIMEOUT_SECS") {
            Some(value) => Duration::from_secs(parse_value::<u64>("FETCH_TIMEOUT_SECS", &value)?),
            None => defaults.fetch_timeout,
        };

        let port = match lookup("PORT") {
            Some(value) => parse_value::<u16>("PORT", &value)?,
            None => defaults.port,
        };

        Ok(Settings {
            timing_url,
            poll_interval,
            auto_detect_pit,
            fetch_timeout,
            port,
            logging_level: lookup("LOGGING_LEVEL").unwrap_or(defaults.logging_level),
            log_file: lookup("LOG_FILE").unwrap_or(defaults.log_file),
        })
    }
}

fn parse_value<T: FromStr>(name: &str, value: &str) -> CustomResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| InvalidSettingSnafu { name, value }.build())
}

fn parse_flag(name: &str, value: &str) -> CustomResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => InvalidSettingSnafu { name, value }.fail(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::Settings;
    use crate::errors::Error;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.poll_interval, Duration::from_millis(4000));
        assert!(settings.auto_detect_pit);
    }

    #[test]
    fn reads_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("TIMING_URL", " https://example.com/live "),
            ("POLL_INTERVAL_MS", "2500"),
            ("AUTO_DETECT_PIT", "off"),
            ("PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(settings.timing_url.as_deref(), Some("https://example.com/live"));
        assert_eq!(settings.poll_interval, Duration::from_millis(2500));
        assert!(!settings.auto_detect_pit);
        assert_eq!(settings.port, 8080);
    }

    #[test]
    fn rejects_invalid_values() {
        let err = Settings::from_lookup(lookup(&[("POLL_INTERVAL_MS", "soon")])).unwrap_err();
        assert!(matches!(err, Error::InvalidSettingError { ref name, .. } if name == "POLL_INTERVAL_MS"));

        assert!(Settings::from_lookup(lookup(&[("POLL_INTERVAL_MS", "0")])).is_err());
        assert!(Settings::from_lookup(lookup(&[("AUTO_DETECT_PIT", "maybe")])).is_err());
    }
}
