use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::{services::session_service, state::SharedState};

/// Periodically finalize sessions whose time budget ran out without further input.
///
/// Without the sweeper such sessions are only reclaimed when their player acts again.
pub async fn run(state: SharedState, period: Duration) {
    info!(period_ms = period.as_millis() as u64, "expiry sweeper started");
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let expired = session_service::expire_overdue_sessions(&state).await;
        if expired > 0 {
            info!(expired, "expired abandoned sessions");
        } else {
            debug!("expiry sweep found nothing to do");
        }
    }
}
