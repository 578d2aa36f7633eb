use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use log::{debug, info};

use crate::errors::Error;
use crate::modules::ingestion::{IngestSummary, IngestionEngine};
use crate::modules::models::lap::LapHistoryStore;
use crate::modules::models::rating::{RatingEngine, ScoreEntry};
use crate::modules::models::team::BaselineTracker;
use crate::modules::timing_table::RowExtractor;

/// state of the last polling tick, shown to the user
#[derive(Debug, Clone, PartialEq)]
pub enum TickStatus {
    Idle,
    Fetching,
    NoChange,
    NoRows,
    Updated(NaiveDateTime),
    FetchFailed(String),
    Stopped,
}

impl fmt::Display for TickStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TickStatus::Idle => write!(f, "Idle"),
            TickStatus::Fetching => write!(f, "Fetching..."),
            TickStatus::NoChange => write!(f, "No change"),
            TickStatus::NoRows => write!(f, "No laps on page"),
            TickStatus::Updated(at) => write!(f, "Updated {}", at.format("%H:%M:%S")),
            TickStatus::FetchFailed(_) => write!(f, "Error fetching timing page"),
            TickStatus::Stopped => write!(f, "Stopped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// byte for byte the same page as the previous tick
    NoChange,
    /// a new page without any candidate rows
    NoRows,
    Updated(IngestSummary),
}

/// the state of one polling session: lap history, team baselines and the
/// last snapshot. every projection is derived from this on request.
pub struct Pipeline {
    engine: IngestionEngine,
    laps: LapHistoryStore,
    baselines: BaselineTracker,
    last_snapshot: Option<String>,
    status: TickStatus,
}

impl Pipeline {
    pub fn new(auto_detect_pit: bool) -> Pipeline {
        Pipeline {
            engine: IngestionEngine::new(auto_detect_pit),
            laps: LapHistoryStore::new(),
            baselines: BaselineTracker::new(),
            last_snapshot: None,
            status: TickStatus::Idle,
        }
    }

    /// # apply a snapshot
    /// run a fetched page through the pipeline: dedup against the previous
    /// page, extract rows, ingest them and update the team baselines.
    ///
    /// ## Arguments
    /// * `page` - the raw text of the timing page
    /// * `extractor` - turns the page into candidate rows
    ///
    /// ## Returns
    /// * `TickOutcome` - what the tick changed
    pub fn apply_snapshot(&mut self, page: String, extractor: &dyn RowExtractor) -> TickOutcome {
        if self.last_snapshot.as_deref() == Some(page.as_str()) {
            debug!(target: "pipeline:apply_snapshot", "snapshot unchanged");
            self.status = TickStatus::NoChange;
            return TickOutcome::NoChange;
        }

        let rows = extractor.extract(&page);
        self.last_snapshot = Some(page);

        if rows.is_empty() {
            info!(target: "pipeline:apply_snapshot", "no lap rows found on the page");
            self.status = TickStatus::NoRows;
            return TickOutcome::NoRows;
        }

        let summary = self.engine.ingest(&mut self.laps, &rows);
        self.baselines.update(&self.laps);
        self.status = TickStatus::Updated(chrono::Local::now().naive_local());

        info!(
            target: "pipeline:apply_snapshot",
            "ingested {} laps, skipped {} rows, {} pit stops ({} karts)",
            summary.appended,
            summary.skipped,
            summary.pit_stops.len(),
            self.laps.kart_count()
        );

        TickOutcome::Updated(summary)
    }

    /// a failed fetch leaves the session untouched apart from the status
    pub fn record_fetch_failure(&mut self, error: &Error) {
        self.status = TickStatus::FetchFailed(error.to_string());
    }

    pub fn set_status(&mut self, status: TickStatus) {
        self.status = status;
    }

    pub fn status(&self) -> &TickStatus {
        &self.status
    }

    pub fn auto_detect_pit(&self) -> bool {
        self.engine.auto_detect_pit()
    }

    pub fn laps(&self) -> &LapHistoryStore {
        &self.laps
    }

    pub fn baselines(&self) -> &BaselineTracker {
        &self.baselines
    }

    pub fn ratings(&self) -> Vec<ScoreEntry> {
        RatingEngine::compute(&self.laps, &self.baselines)
    }

    pub fn pit_log(&self) -> Vec<String> {
        self.laps.pit_log()
    }

    pub fn lap_times(&self, kart_id: &str) -> Option<Vec<f64>> {
        self.laps.lap_times(kart_id)
    }

    pub fn all_lap_times(&self) -> BTreeMap<String, Vec<f64>> {
        self.laps.all_lap_times()
    }
}
