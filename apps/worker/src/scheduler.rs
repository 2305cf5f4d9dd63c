//! Periodic snapshot capture for every known user.
//!
//! Capture is idempotent per user and trading day, so the interval only bounds
//! how soon after the market-close cutoff a day's snapshot appears.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use nestegg_core::portfolio::snapshot::CaptureOutcome;

use crate::main_lib::AppState;

/// Totals of one pass over all users.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CaptureCycleReport {
    pub captured: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Starts the background capture loop. The first tick fires immediately.
pub fn start_capture_scheduler(state: Arc<AppState>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Snapshot capture scheduler started ({:?} interval)", every);

        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            run_capture_cycle(&state).await;
        }
    })
}

/// Captures today's snapshot for every user. One user's failure does not stop the others.
pub async fn run_capture_cycle(state: &AppState) -> CaptureCycleReport {
    let mut report = CaptureCycleReport::default();

    let user_ids = match state.profile_repository.list_user_ids() {
        Ok(ids) => ids,
        Err(e) => {
            warn!("Scheduled capture skipped: cannot list users: {}", e);
            return report;
        }
    };

    for user_id in &user_ids {
        match state.snapshot_service.capture_if_absent(user_id).await {
            Ok(CaptureOutcome::Captured { as_of_day, rows }) => {
                debug!("Captured {} row(s) for '{}' on {}", rows, user_id, as_of_day);
                report.captured += 1;
            }
            Ok(_) => report.skipped += 1,
            Err(e) => {
                warn!("Snapshot capture failed for '{}': {}", user_id, e);
                report.failed += 1;
            }
        }
    }

    if report.captured > 0 || report.failed > 0 {
        info!(
            "Capture cycle finished: {} captured, {} skipped, {} failed",
            report.captured, report.skipped, report.failed
        );
    }
    report
}
