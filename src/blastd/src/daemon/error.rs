use thiserror::Error;

/// Client input that could not be turned into a request or an activity.
///
/// The display strings are sent back to the client verbatim.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("invalid json")]
    InvalidJson,

    #[error("invalid activity data")]
    InvalidActivityData,

    #[error("invalid started_at")]
    InvalidStartedAt,

    #[error("invalid ended_at")]
    InvalidEndedAt,

    #[error("unknown request type")]
    UnknownRequestType,
}
