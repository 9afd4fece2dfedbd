use crate::constants::REDACTED_VALUE;
use crate::storage::Activity;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

/// One activity as the remote collection endpoint expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPayload {
    #[serde(rename = "clientUUID")]
    pub client_uuid: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub git_remote: String,
    pub started_at: String,
    pub ended_at: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub filename: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub filetype: String,
    pub lines_added: i64,
    pub lines_removed: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub git_branch: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub actions_per_minute: f64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub words_per_minute: f64,
    pub editor: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub machine: String,
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

impl ActivityPayload {
    /// Builds the outbound entry for `activity`.
    ///
    /// With `metrics_only` set, project and remote are replaced by a fixed
    /// redaction literal and the file name is dropped, whatever the client
    /// sent.
    pub fn from_activity(activity: &Activity, metrics_only: bool) -> Self {
        let (project, git_remote, filename) = if metrics_only {
            (
                REDACTED_VALUE.to_string(),
                REDACTED_VALUE.to_string(),
                String::new(),
            )
        } else {
            (
                activity.project.clone(),
                activity.git_remote.clone(),
                activity.filename.clone(),
            )
        };

        Self {
            client_uuid: activity.client_id.clone(),
            project,
            git_remote,
            started_at: activity.started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            ended_at: activity.ended_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            filename,
            filetype: activity.filetype.clone(),
            lines_added: activity.lines_added,
            lines_removed: activity.lines_removed,
            git_branch: activity.git_branch.clone(),
            actions_per_minute: activity.actions_per_minute,
            words_per_minute: activity.words_per_minute,
            editor: activity.editor.clone(),
            machine: activity.machine.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub activities: Vec<ActivityPayload>,
}

impl SyncRequest {
    pub fn from_activities(activities: &[Activity], metrics_only: bool) -> Self {
        Self {
            activities: activities
                .iter()
                .map(|activity| ActivityPayload::from_activity(activity, metrics_only))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub success: bool,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub activities: Vec<SyncedActivity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncedActivity {
    pub id: String,
}
