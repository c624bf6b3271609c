use chrono::Utc;
use serde::de::Error as DeError;
use serde::{ Deserialize, Deserializer, Serialize };
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    /// Locally surfaced failure; never sent to or received from the backend.
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: i64,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now().timestamp(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(Role::Error, content)
    }
}

/// Opaque conversation token handed out by the backend.
///
/// The backend issues UUID strings, but any JSON scalar is accepted and
/// echoed back exactly as received.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChatId(Value);

impl ChatId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(Value::String(id.into()))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// `false` for tokens that mean "no conversation": `""`, `0`, `false`, `null`.
    pub fn is_present(&self) -> bool {
        match &self.0 {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

impl From<&str> for ChatId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl TryFrom<Value> for ChatId {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(_) | Value::Object(_) => {
                Err(format!("chat_id must be a scalar, got {}", value))
            }
            scalar => Ok(Self(scalar)),
        }
    }
}

impl<'de> Deserialize<'de> for ChatId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where D: Deserializer<'de> {
        ChatId::try_from(Value::deserialize(deserializer)?).map_err(D::Error::custom)
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<ChatId>,
}

/// Reply body. Both fields are optional on the wire so a reply missing its
/// answer still hands over the conversation id.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ChatResponse {
    #[serde(default)]
    pub chat_id: Option<ChatId>,
    #[serde(default)]
    pub answer: Option<String>,
}
