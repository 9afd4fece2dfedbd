use crate::daemon::error::IntakeError;
use crate::daemon::state::DaemonState;
use crate::daemon::structs::{ActivityData, Response};
use crate::storage::{NewActivity, DEFAULT_EDITOR};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error};

pub const ACTIVITY_REQUEST: &str = "activity";

pub async fn activity(state: &DaemonState, data: Option<Value>) -> Response {
    let activity = match parse_activity(data, state.machine()) {
        Ok(activity) => activity,
        Err(e) => return Response::error(e),
    };

    match state.buffer().append(activity).await {
        Ok(id) => {
            debug!("Buffered activity {}", id);
            Response::ok()
        }
        Err(e) => {
            error!("Failed to buffer activity: {}", e);
            Response::error(e)
        }
    }
}

/// Validates an `activity` payload. Only the two timestamps are checked;
/// an end before the start is stored as is.
pub(crate) fn parse_activity(
    data: Option<Value>,
    machine: &str,
) -> Result<NewActivity, IntakeError> {
    let data = data.ok_or(IntakeError::InvalidActivityData)?;
    let data: ActivityData =
        serde_json::from_value(data).map_err(|_| IntakeError::InvalidActivityData)?;

    let started_at = parse_timestamp(&data.started_at).ok_or(IntakeError::InvalidStartedAt)?;
    let ended_at = parse_timestamp(&data.ended_at).ok_or(IntakeError::InvalidEndedAt)?;

    let editor = if data.editor.trim().is_empty() {
        DEFAULT_EDITOR.to_string()
    } else {
        data.editor
    };

    Ok(NewActivity {
        client_id: data.client_id,
        project: data.project,
        git_remote: data.git_remote,
        started_at,
        ended_at,
        filename: data.filename,
        filetype: data.filetype,
        lines_added: data.lines_added,
        lines_removed: data.lines_removed,
        git_branch: data.git_branch,
        actions_per_minute: data.actions_per_minute,
        words_per_minute: data.words_per_minute,
        editor,
        machine: machine.to_string(),
    })
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}
