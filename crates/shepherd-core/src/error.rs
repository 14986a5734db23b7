use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("occupancy snapshot must be an object keyed by spot id, found {found}")]
    NotAnObject { found: &'static str },

    #[error("zone documents must be an object or an array of objects, found {found}")]
    InvalidZoneDocuments { found: &'static str },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("occupancy feed for '{path}' failed: {message}")]
    Cancelled { path: String, message: String },
}

#[derive(Debug, Error)]
pub enum ZoneStoreError {
    #[error("failed to read zone documents from '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("zone documents in '{path}' are not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("zone store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeedbackError {
    #[error("feedback message must not be blank")]
    BlankMessage,
}

#[derive(Debug, Error)]
pub enum FeedbackStoreError {
    #[error("feedback store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LateNotificationError {
    #[error("select a lecturer before sending a late notification")]
    NoLecturer,

    #[error("select a reason before sending a late notification")]
    NoReason,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum ShepherdError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Feedback(#[from] FeedbackError),

    #[error(transparent)]
    FeedbackStore(#[from] FeedbackStoreError),

    #[error(transparent)]
    LateNotification(#[from] LateNotificationError),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error("session closed")]
    SessionClosed,
}

pub type Result<T> = std::result::Result<T, ShepherdError>;

pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
