use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Envelope of every intake line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Request {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            data: None,
        }
    }

    pub fn with_data(kind: &str, data: Value) -> Self {
        Self {
            kind: kind.to_string(),
            data: Some(data),
        }
    }
}

/// One response line, written for every request line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error: None,
            message: None,
        }
    }

    pub fn ok_with_message(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn error(error: impl ToString) -> Self {
        Self {
            ok: false,
            error: Some(error.to_string()),
            message: None,
        }
    }
}

/// Payload of an `activity` request, in the plugins' snake_case naming.
///
/// Every field is optional on the wire; `null` reads as the field's default.
/// The timestamps stay strings here and are validated by the handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityData {
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub project: String,
    #[serde(deserialize_with = "null_as_default")]
    pub git_remote: String,
    #[serde(deserialize_with = "null_as_default")]
    pub started_at: String,
    #[serde(deserialize_with = "null_as_default")]
    pub ended_at: String,
    #[serde(deserialize_with = "null_as_default")]
    pub filename: String,
    #[serde(deserialize_with = "null_as_default")]
    pub filetype: String,
    #[serde(deserialize_with = "null_as_default")]
    pub lines_added: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub lines_removed: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub git_branch: String,
    #[serde(deserialize_with = "null_as_default")]
    pub actions_per_minute: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub words_per_minute: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub editor: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
