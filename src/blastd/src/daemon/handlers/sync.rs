use crate::daemon::state::DaemonState;
use crate::daemon::structs::Response;
use tracing::{info, warn};

pub const SYNC_REQUEST: &str = "sync";
pub const SYNC_COMPLETE: &str = "sync complete";

/// Runs one on-demand drain if the rate limiter admits it. The response is
/// written only after the drain returns.
pub async fn sync(state: &DaemonState) -> Response {
    if let Err(refused) = state.rate_limiter().acquire() {
        info!("Manual sync refused: {}", refused);
        return Response::error(refused);
    }

    match state.sync_manager().sync_now().await {
        Ok(outcome) => {
            info!(
                "Manual sync forwarded {} activities in {} batches",
                outcome.activities, outcome.batches
            );
            Response::ok_with_message(SYNC_COMPLETE)
        }
        Err(e) => {
            warn!("Manual sync failed: {}", e);
            Response::error(e)
        }
    }
}
