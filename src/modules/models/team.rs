use std::collections::BTreeMap;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::modules::helpers::math::Math;
use crate::modules::models::lap::{default_team, LapHistoryStore};

/// amount of recent laps a baseline sample is taken from
pub const BASELINE_WINDOW: usize = 10;

/// learned lap time of a team
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct TeamProfile {
    /// mean of every sample folded into the profile, in seconds
    pub baseline: f64,
    /// amount of samples folded into the baseline
    pub count: u32,
}

impl TeamProfile {
    fn new(sample: f64) -> TeamProfile {
        TeamProfile {
            baseline: sample,
            count: 1,
        }
    }

    /// incremental mean, every sample weighs the same
    fn fold(&mut self, sample: f64) {
        self.count += 1;
        self.baseline = (self.baseline * f64::from(self.count - 1) + sample) / f64::from(self.count);
    }
}

/// keeps the baseline lap time of every team up to date
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaselineTracker {
    profiles: BTreeMap<String, TeamProfile>,
}

impl BaselineTracker {
    pub fn new() -> BaselineTracker {
        BaselineTracker::default()
    }

    /// # update the team baselines
    /// fold the recent average of every kart with at least two laps into
    /// the profile of its team. karts with fewer laps are skipped.
    ///
    /// ## Arguments
    /// * `laps` - the lap history of the session
    pub fn update(&mut self, laps: &LapHistoryStore) {
        for (kart_id, history) in laps.iter() {
            if history.len() < 2 {
                continue;
            }

            let recent: Vec<f64> = Math::tail(history, BASELINE_WINDOW)
                .iter()
                .map(|lap| lap.time())
                .collect();
            let average = Math::mean(&recent);

            let team = history
                .last()
                .map(|lap| lap.team().to_string())
                .unwrap_or_else(|| default_team(kart_id));

            self.fold(&team, average);
            trace!(target: "models/team:update", "kart {} folded {:.3} into {}", kart_id, average, team);
        }
    }

    fn fold(&mut self, team: &str, sample: f64) {
        match self.profiles.get_mut(team) {
            Some(profile) => profile.fold(sample),
            None => {
                self.profiles.insert(team.to_string(), TeamProfile::new(sample));
            }
        }
    }

    pub fn profile(&self, team: &str) -> Option<&TeamProfile> {
        self.profiles.get(team)
    }

    pub fn baseline(&self, team: &str) -> Option<f64> {
        self.profile(team).map(|profile| profile.baseline)
    }

    pub fn profiles(&self) -> &BTreeMap<String, TeamProfile> {
        &self.profiles
    }
}
