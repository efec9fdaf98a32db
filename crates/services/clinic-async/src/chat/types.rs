use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The clinic user
    User,
    /// The assistant
    Assistant,
}

/// One entry in a local conversation log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author
    pub role: Role,
    /// Text
    pub content: String,
    /// Creation time (serialized as ISO-8601)
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// A user message stamped now
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// An assistant message stamped now
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Optional clinical context shared with the assistant
///
/// Blank fields are left out of the request, so the default value goes out as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientInfo {
    /// Age, as typed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    /// Gender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Medical history
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<String>,
    /// Current medications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medications: Option<String>,
}

impl PatientInfo {
    /// True when no field carries text
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [&self.age, &self.gender, &self.history, &self.medications]
            .iter()
            .all(|f| f.as_deref().is_none_or(|v| v.trim().is_empty()))
    }

    /// Drops blank fields
    #[must_use]
    pub fn normalized(&self) -> Self {
        let keep = |f: &Option<String>| {
            f.as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            age: keep(&self.age),
            gender: keep(&self.gender),
            history: keep(&self.history),
            medications: keep(&self.medications),
        }
    }
}

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest<'a> {
    /// User text
    pub message: &'a str,
    /// Existing conversation, `null` for a new one
    pub conversation_id: Option<&'a str>,
    /// Clinical context, `{}` when not shared
    pub patient_info: &'a PatientInfo,
}

/// Successful reply to a chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    /// Assistant text
    pub response: String,
    /// Conversation the message now belongs to
    pub conversation_id: String,
}

/// One server-side history entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// `user` or `assistant`, as stored by the service
    #[serde(default)]
    pub role: Option<String>,
    /// Text
    #[serde(default)]
    pub content: String,
    /// Timestamp as stored by the service
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryEnvelope {
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// Uniform failure from any chat call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ChatFailure {
    /// User-presentable message
    pub message: String,
}

impl ChatFailure {
    /// Wraps a message
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result of a chat call
pub type ChatResult<T> = Result<T, ChatFailure>;

/// Point-in-time health of the chat service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the service answered
    pub success: bool,
    /// Status fields reported by the service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ChatResult<serde_json::Value>> for ApiHealth {
    fn from(result: ChatResult<serde_json::Value>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(failure) => Self {
                success: false,
                data: None,
                error: Some(failure.message),
            },
        }
    }
}
