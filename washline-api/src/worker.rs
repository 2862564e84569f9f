use chrono::Utc;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{error, info};

use washline_order::machine::OrderStateMachine;

/// Periodic sweeper: the external caller the engine's time-based policies
/// require. Confirms deliveries the customer sat on past the window and
/// escalates bypasses pending past the grace period — both through the same
/// transition entry points the explicit operations use.
pub async fn start_sweeper(machine: Arc<OrderStateMachine>, interval_seconds: u64) {
    let mut ticker = interval(Duration::from_secs(interval_seconds));
    info!("Sweeper started, ticking every {}s", interval_seconds);

    loop {
        ticker.tick().await;
        let now = Utc::now();

        match machine.auto_confirm_due(now).await {
            Ok(0) => {}
            Ok(n) => info!("Auto-confirmed {} delivered order(s)", n),
            Err(e) => error!("Auto-confirm sweep failed: {}", e),
        }

        match machine.escalate_stale_bypasses(now).await {
            Ok(0) => {}
            Ok(n) => info!("Escalated {} order(s) to InResolution", n),
            Err(e) => error!("Bypass escalation sweep failed: {}", e),
        }
    }
}
