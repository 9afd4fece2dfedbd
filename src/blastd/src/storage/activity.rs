use chrono::{DateTime, Utc};

/// Editor used when a client leaves the field blank.
pub const DEFAULT_EDITOR: &str = "neovim";

/// An activity interval as stored in the buffer.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Activity {
    pub id: i64,
    /// Idempotency token the remote endpoint deduplicates on.
    pub client_id: String,
    pub project: String,
    pub git_remote: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub filename: String,
    pub filetype: String,
    pub lines_added: i64,
    pub lines_removed: i64,
    pub git_branch: String,
    pub actions_per_minute: f64,
    pub words_per_minute: f64,
    pub editor: String,
    pub machine: String,
    pub synced: bool,
    pub created_at: DateTime<Utc>,
}

/// An activity candidate that has not been appended yet.
///
/// `client_id` is optional; the buffer generates one on append when absent.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
    pub client_id: Option<String>,
    pub project: String,
    pub git_remote: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub filename: String,
    pub filetype: String,
    pub lines_added: i64,
    pub lines_removed: i64,
    pub git_branch: String,
    pub actions_per_minute: f64,
    pub words_per_minute: f64,
    pub editor: String,
    pub machine: String,
}

impl NewActivity {
    /// A candidate with only the required interval set and every other field
    /// at its default.
    pub fn new(started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> Self {
        Self {
            client_id: None,
            project: String::new(),
            git_remote: String::new(),
            started_at,
            ended_at,
            filename: String::new(),
            filetype: String::new(),
            lines_added: 0,
            lines_removed: 0,
            git_branch: String::new(),
            actions_per_minute: 0.0,
            words_per_minute: 0.0,
            editor: DEFAULT_EDITOR.to_string(),
            machine: String::new(),
        }
    }
}
