use chrono::NaiveDateTime;
use log::{debug, error, info};
use serde::Serialize;

use crate::modules::helpers::lap_time::parse_lap_time;
use crate::modules::models::lap::{default_team, LapHistoryStore, LapRecord};
use crate::modules::timing_table::CandidateRow;

/// a lap this much slower than the lap before it is taken as a pit stop
pub const PIT_STOP_THRESHOLD_SECS: f64 = 20.0;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PitStop {
    pub kart_id: String,
    pub lap_number: u32,
    pub stint: u32,
}

/// what happened to a single candidate row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Appended { lap_number: u32, pit: bool, stint: u32 },
    Skipped,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct IngestSummary {
    pub appended: usize,
    pub skipped: usize,
    pub pit_stops: Vec<PitStop>,
}

/// a lap that is not stored yet, its pit and stint flags are still open
struct LapDraft {
    lap_number: u32,
    time: f64,
    team: String,
    timestamp: NaiveDateTime,
}

/// seal a draft into a record, the only place pit and stint are set
fn finalize_lap(draft: LapDraft, pit: bool, stint: u32) -> LapRecord {
    LapRecord::new(draft.lap_number, draft.time, pit, stint, draft.team, draft.timestamp)
}

/// turns candidate rows into laps and infers pit stops
pub struct IngestionEngine {
    auto_detect_pit: bool,
}

impl IngestionEngine {
    pub fn new(auto_detect_pit: bool) -> IngestionEngine {
        IngestionEngine { auto_detect_pit }
    }

    pub fn auto_detect_pit(&self) -> bool {
        self.auto_detect_pit
    }

    /// # ingest a batch of rows
    /// append every row with a valid lap time as the next lap of its kart.
    /// rows are not deduplicated, two rows of one kart become two laps.
    ///
    /// ## Arguments
    /// * `store` - the lap history to append to
    /// * `rows` - the candidate rows of one snapshot
    ///
    /// ## Returns
    /// * `IngestSummary` - the amount of appended and skipped rows and the detected pit stops
    pub fn ingest(&self, store: &mut LapHistoryStore, rows: &[CandidateRow]) -> IngestSummary {
        let now = chrono::Local::now().naive_local();
        let mut summary = IngestSummary::default();

        for row in rows {
            match self.ingest_row(store, row, now) {
                RowOutcome::Appended { lap_number, pit, stint } => {
                    summary.appended += 1;
                    if pit {
                        info!(target: "ingestion:ingest", "kart {} pitted on lap {} (stint {})", row.kart_id, lap_number, stint);
                        summary.pit_stops.push(PitStop {
                            kart_id: row.kart_id.clone(),
                            lap_number,
                            stint,
                        });
                    }
                }
                RowOutcome::Skipped => summary.skipped += 1,
            }
        }

        summary
    }

    /// # ingest a single row
    ///
    /// ## Arguments
    /// * `store` - the lap history to append to
    /// * `row` - the candidate row
    /// * `timestamp` - when the row was seen
    pub fn ingest_row(&self, store: &mut LapHistoryStore, row: &CandidateRow, timestamp: NaiveDateTime) -> RowOutcome {
        let time = match parse_lap_time(&row.lap_time) {
            Ok(time) => time,
            Err(error) => {
                debug!(target: "ingestion:ingest_row", "skipping row of kart {}: {}", row.kart_id, error);
                return RowOutcome::Skipped;
            }
        };

        let previous = store.last_lap(&row.kart_id);
        let draft = LapDraft {
            lap_number: previous.map_or(1, |lap| lap.lap_number() + 1),
            time,
            team: default_team(&row.kart_id),
            timestamp,
        };

        let (pit, stint) = match previous {
            Some(previous) if self.auto_detect_pit && time - previous.time() > PIT_STOP_THRESHOLD_SECS => {
                (true, previous.stint() + 1)
            }
            Some(previous) => (false, previous.stint()),
            None => (false, 1),
        };

        let lap = finalize_lap(draft, pit, stint);
        let lap_number = lap.lap_number();
        match store.append(&row.kart_id, lap) {
            Ok(()) => RowOutcome::Appended { lap_number, pit, stint },
            Err(error) => {
                error!(target: "ingestion:ingest_row", "refusing lap: {}", error);
                RowOutcome::Skipped
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{IngestionEngine, PitStop};
    use crate::modules::models::lap::LapHistoryStore;
    use crate::modules::timing_table::CandidateRow;

    fn rows(rows: &[(&str, &str)]) -> Vec<CandidateRow> {
        rows.iter().map(|(kart, time)| CandidateRow::new(*kart, *time)).collect()
    }

    #[test]
    fn first_laps_are_numbered_from_one() {
        let mut store = LapHistoryStore::new();
        let summary = IngestionEngine::new(true).ingest(&mut store, &rows(&[("12", "45.10"), ("12", "44.80")]));

        assert_eq!(summary.appended, 2);
        let laps = store.laps("12").unwrap();
        assert_eq!(laps.len(), 2);
        for (i, lap) in laps.iter().enumerate() {
            assert_eq!(lap.lap_number(), i as u32 + 1);
            assert!(!lap.pit());
            assert_eq!(lap.stint(), 1);
            assert_eq!(lap.team(), "team_12");
        }
    }

    #[test]
    fn slow_lap_starts_a_new_stint() {
        let mut store = LapHistoryStore::new();
        let engine = IngestionEngine::new(true);
        engine.ingest(&mut store, &rows(&[("4", "30.0")]));
        let summary = engine.ingest(&mut store, &rows(&[("4", "55.0")]));

        let last = store.last_lap("4").unwrap();
        assert!(last.pit());
        assert_eq!(last.stint(), 2);
        assert_eq!(
            summary.pit_stops,
            vec![PitStop { kart_id: "4".to_string(), lap_number: 2, stint: 2 }]
        );

        // the next normal lap stays in the new stint
        engine.ingest(&mut store, &rows(&[("4", "31.0")]));
        let last = store.last_lap("4").unwrap();
        assert!(!last.pit());
        assert_eq!(last.stint(), 2);
    }

    #[test]
    fn pit_detection_can_be_disabled() {
        let mut store = LapHistoryStore::new();
        let engine = IngestionEngine::new(false);
        engine.ingest(&mut store, &rows(&[("4", "30.0"), ("4", "55.0")]));

        let last = store.last_lap("4").unwrap();
        assert!(!last.pit());
        assert_eq!(last.stint(), 1);
    }

    #[test]
    fn exactly_the_threshold_is_not_a_pit_stop() {
        let mut store = LapHistoryStore::new();
        IngestionEngine::new(true).ingest(&mut store, &rows(&[("9", "30.00"), ("9", "50.00")]));
        assert!(!store.last_lap("9").unwrap().pit());
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let mut store = LapHistoryStore::new();
        let summary = IngestionEngine::new(true).ingest(
            &mut store,
            &rows(&[("1", "abc"), ("1", ""), ("1", "50.10"), ("2", "1:xx")]),
        );

        assert_eq!(summary.appended, 1);
        assert_eq!(summary.skipped, 3);
        assert_eq!(store.laps("1").unwrap()[0].lap_number(), 1);
        assert!(store.laps("2").is_none());
    }
}
