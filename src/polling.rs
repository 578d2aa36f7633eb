use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::{watch, Mutex};
use tokio::time::MissedTickBehavior;

use crate::modules::pipeline::{Pipeline, TickOutcome, TickStatus};
use crate::modules::timing_api::SnapshotFetcher;
use crate::modules::timing_table::RowExtractor;

/// poll a timing page until cancelled.
///
/// ticks run one after the other in this loop, a tick that is due while a
/// fetch is still running is skipped. after `cancel` flips to true nothing is
/// ingested anymore, a fetch that is in flight is dropped.
pub async fn poll_timing_page<F: SnapshotFetcher>(
    url: String,
    poll_interval: Duration,
    fetcher: Arc<F>,
    extractor: Arc<dyn RowExtractor>,
    pipeline: Arc<Mutex<Pipeline>>,
    mut cancel: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(target: "polling:poll_timing_page", "polling {} every {}ms", url, poll_interval.as_millis());

    loop {
        tokio::select! {
            biased;
            _ = cancel.changed() => break,
            _ = interval.tick() => {}
        }
        if *cancel.borrow() {
            break;
        }

        pipeline.lock().await.set_status(TickStatus::Fetching);

        let fetched = tokio::select! {
            biased;
            _ = cancel.changed() => break,
            fetched = fetcher.fetch(&url) => fetched,
        };
        if *cancel.borrow() {
            debug!(target: "polling:poll_timing_page", "discarding fetch after stop");
            break;
        }

        let mut state = pipeline.lock().await;
        match fetched {
            Ok(page) => match state.apply_snapshot(page, extractor.as_ref()) {
                TickOutcome::NoChange => debug!(target: "polling:poll_timing_page", "no change on {}", url),
                TickOutcome::NoRows => debug!(target: "polling:poll_timing_page", "no rows on {}", url),
                TickOutcome::Updated(summary) => {
                    debug!(target: "polling:poll_timing_page", "tick appended {} laps", summary.appended)
                }
            },
            Err(error) => {
                warn!(target: "polling:poll_timing_page", "failed fetching timing page. (error: {})", error);
                state.record_fetch_failure(&error);
            }
        }
    }

    info!(target: "polling:poll_timing_page", "stopped polling {}", url);
}
