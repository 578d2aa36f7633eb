pub mod ingestion;
pub mod pipeline;
pub mod session;
pub mod timing_api;
pub mod timing_table;

pub mod models {
    pub mod lap;
    pub mod rating;
    pub mod team;
}

pub mod helpers {
    pub mod lap_time;
    pub mod logging;
    pub mod math;
    pub mod settings;
    pub mod snapshots;
}
