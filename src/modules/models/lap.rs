use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::errors::{CustomResult, LapSequenceSnafu};

/// # team name of a kart
/// the timing page does not tell which team drives a kart,
/// every kart gets its own synthetic team
pub fn default_team(kart_id: &str) -> String {
    format!("team_{}", kart_id)
}

/// a single lap as it was seen on the timing page.
///
/// records are only created by the ingestion engine and are never changed once
/// they are stored, the pit and stint fields are decided when the lap is finalized.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LapRecord {
    lap_number: u32,
    time: f64,
    pit: bool,
    stint: u32,
    team: String,
    timestamp: NaiveDateTime,
}

impl LapRecord {
    pub(crate) fn new(
        lap_number: u32,
        time: f64,
        pit: bool,
        stint: u32,
        team: String,
        timestamp: NaiveDateTime,
    ) -> LapRecord {
        LapRecord {
            lap_number,
            time,
            pit,
            stint,
            team,
            timestamp,
        }
    }

    pub fn lap_number(&self) -> u32 {
        self.lap_number
    }

    /// lap time in seconds
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn pit(&self) -> bool {
        self.pit
    }

    pub fn stint(&self) -> u32 {
        self.stint
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

/// all laps of all karts seen during a session.
/// laps of a kart are ordered and numbered from 1 without gaps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LapHistoryStore {
    karts: BTreeMap<String, Vec<LapRecord>>,
}

impl LapHistoryStore {
    pub fn new() -> LapHistoryStore {
        LapHistoryStore::default()
    }

    /// # append a lap
    /// append a finalized lap to the history of a kart
    ///
    /// ## Arguments
    /// * `kart_id` - the kart the lap was driven by
    /// * `lap` - the lap, its number has to follow the last lap of the kart
    pub(crate) fn append(&mut self, kart_id: &str, lap: LapRecord) -> CustomResult<()> {
        let previous = self.karts.get(kart_id).map_or(0, |laps| laps.len() as u32);
        ensure!(
            lap.lap_number == previous + 1,
            LapSequenceSnafu {
                kart_id,
                lap_number: lap.lap_number,
                previous,
            }
        );

        self.karts.entry(kart_id.to_string()).or_default().push(lap);
        Ok(())
    }

    pub fn laps(&self, kart_id: &str) -> Option<&[LapRecord]> {
        self.karts.get(kart_id).map(|laps| laps.as_slice())
    }

    pub fn last_lap(&self, kart_id: &str) -> Option<&LapRecord> {
        self.karts.get(kart_id).and_then(|laps| laps.last())
    }

    /// every kart with its laps, ordered by kart id
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[LapRecord])> {
        self.karts
            .iter()
            .map(|(kart_id, laps)| (kart_id.as_str(), laps.as_slice()))
    }

    pub fn kart_count(&self) -> usize {
        self.karts.len()
    }

    pub fn lap_count(&self) -> usize {
        self.karts.values().map(|laps| laps.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.karts.is_empty()
    }

    /// # pit log
    /// a line for every kart whose most recent lap was a pit lap.
    /// the lines are sorted as text so the order does not depend on arrival
    pub fn pit_log(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .iter()
            .filter_map(|(kart_id, laps)| {
                let last = laps.last()?;
                if !last.pit {
                    return None;
                }
                Some(format!(
                    "{} - pit at lap {} (stint {})",
                    kart_id, last.lap_number, last.stint
                ))
            })
            .collect();

        lines.sort();
        lines
    }

    /// lap times of a single kart in the order they were driven
    pub fn lap_times(&self, kart_id: &str) -> Option<Vec<f64>> {
        self.laps(kart_id)
            .map(|laps| laps.iter().map(|lap| lap.time).collect())
    }

    /// lap times of every kart, for charting
    pub fn all_lap_times(&self) -> BTreeMap<String, Vec<f64>> {
        self.iter()
            .map(|(kart_id, laps)| {
                (kart_id.to_string(), laps.iter().map(|lap| lap.time).collect())
            })
            .collect()
    }
}
