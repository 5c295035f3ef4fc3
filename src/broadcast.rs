use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;

/// How often the ticker feeds the countdown
pub const TICK_INTERVAL: Duration = Duration::from_millis(200);

/// Spawn a background task that drives the question countdown.
/// Ticks are broadcast as events; an expired countdown reveals the answer.
pub fn spawn_match_ticker(state: Arc<AppState>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(TICK_INTERVAL).await;
            state.tick().await;
        }
    })
}
