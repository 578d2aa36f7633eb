use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use live_kart_ratings::modules::helpers::logging::setup_logging;
use live_kart_ratings::modules::helpers::settings::Settings;
use live_kart_ratings::modules::helpers::snapshots::SnapshotsHelper;
use live_kart_ratings::modules::pipeline::{Pipeline, TickOutcome};
use live_kart_ratings::modules::timing_table::ApexTableExtractor;

/// Replay captured timing pages and print the resulting ratings
#[derive(Parser, Debug)]
#[clap(name = "replay_snapshots")]
#[clap(about = "Feed captured timing pages through the rating pipeline")]
struct Args {
    /// Directory holding the captured pages, replayed in file name order
    dir: PathBuf,

    /// Do not infer pit stops from slow laps
    #[clap(long)]
    no_pit: bool,

    /// Print the ratings and pit log as json
    #[clap(long)]
    json: bool,
}

/// feed captured timing pages through the pipeline as if they were polled
fn main() -> ExitCode {
    let args = Args::parse();

    let settings = Settings::from_env().expect("Failed to read settings");
    setup_logging(&settings).expect("Failed to setup logging");

    let auto_detect_pit = settings.auto_detect_pit && !args.no_pit;
    let dir = args.dir;

    let snapshots = match SnapshotsHelper::load_snapshots_from_dir(&dir) {
        Ok(snapshots) => snapshots,
        Err(error) => {
            error!(target: "replay_snapshots", "{}", error);
            return ExitCode::FAILURE;
        }
    };

    let extractor = ApexTableExtractor::new().expect("Failed to compile row patterns");
    let mut pipeline = Pipeline::new(auto_detect_pit);
    for (path, page) in snapshots {
        match pipeline.apply_snapshot(page, &extractor) {
            TickOutcome::NoChange => info!(target: "replay_snapshots", "{}: no change", path.display()),
            TickOutcome::NoRows => info!(target: "replay_snapshots", "{}: no laps", path.display()),
            TickOutcome::Updated(summary) => info!(
                target: "replay_snapshots",
                "{}: {} laps, {} skipped",
                path.display(),
                summary.appended,
                summary.skipped
            ),
        }
    }

    let ratings = pipeline.ratings();
    let pit_log = pipeline.pit_log();

    if args.json {
        let output = serde_json::json!({ "ratings": ratings, "pits": pit_log });
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(error) => {
                error!(target: "replay_snapshots", "could not serialize ratings: {}", error);
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!("{:<8} {:>8} {:>6} {:>9} {:>9} {:>6}", "kart", "score", "conf", "avg", "best", "stint");
    for entry in &ratings {
        println!(
            "{:<8} {:>8.1} {:>5.0}% {:>9.2} {:>9.2} {:>6}",
            entry.kart_id,
            entry.score,
            entry.confidence * 100.0,
            entry.avg,
            entry.best,
            entry.stint
        );
    }

    if !pit_log.is_empty() {
        println!();
        for line in pit_log {
            println!("{}", line);
        }
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;
    use clap::{CommandFactory, Parser};

    use super::Args;

    #[test]
    fn arguments_are_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn flags_may_come_before_the_directory() {
        let args = Args::try_parse_from(["replay_snapshots", "--json", "captures", "--no-pit"]).unwrap();
        assert_eq!(args.dir.to_str(), Some("captures"));
        assert!(args.json);
        assert!(args.no_pit);
    }

    #[test]
    fn help_is_not_taken_for_a_directory() {
        let err = Args::try_parse_from(["replay_snapshots", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn unknown_flags_are_rejected() {
        let err = Args::try_parse_from(["replay_snapshots", "--fast", "captures"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
        assert!(Args::try_parse_from(["replay_snapshots"]).is_err());
    }
}
