use crate::daemon::error::IntakeError;
use crate::daemon::handlers::activity::{activity, ACTIVITY_REQUEST};
use crate::daemon::handlers::ping::{ping, PING_REQUEST};
use crate::daemon::handlers::sync::{sync, SYNC_REQUEST};
use crate::daemon::state::DaemonState;
use crate::daemon::structs::{Request, Response};
use serde_json::Value;

/// Decodes one request line and dispatches it to its handler.
///
/// Never fails: every problem becomes an error response for this line only.
pub async fn handle_line(state: &DaemonState, line: &[u8]) -> Response {
    let request = match decode_request(line) {
        Ok(request) => request,
        Err(e) => return Response::error(e),
    };

    match request.kind.as_str() {
        ACTIVITY_REQUEST => activity(state, request.data).await,
        PING_REQUEST => ping(),
        SYNC_REQUEST => sync(state).await,
        _ => Response::error(IntakeError::UnknownRequestType),
    }
}

fn decode_request(line: &[u8]) -> Result<Request, IntakeError> {
    let value: Value = serde_json::from_slice(line).map_err(|_| IntakeError::InvalidJson)?;
    if !value.is_object() {
        return Err(IntakeError::InvalidJson);
    }
    serde_json::from_value(value).map_err(|_| IntakeError::InvalidJson)
}
