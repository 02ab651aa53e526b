//! Error types for kiln

use crate::types::{TaskKind, TaskStatus};
use std::time::Duration;
use thiserror::Error;

/// The main error type for kiln operations
#[derive(Debug, Error)]
pub enum KilnError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{}", request_message(.url, .status, .message))]
    Request {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Task {task_id} ({kind}) ended with status {status}: {}", .detail.as_deref().unwrap_or("no detail reported"))]
    TaskFailed {
        task_id: String,
        kind: TaskKind,
        status: TaskStatus,
        detail: Option<String>,
    },

    #[error("Task {task_id} ({kind}) timed out after {}s", .elapsed.as_secs())]
    TaskTimeout {
        task_id: String,
        kind: TaskKind,
        elapsed: Duration,
    },

    #[error("Task {task_id} succeeded with no usable output: missing {field}")]
    MissingOutput { task_id: String, field: String },

    #[error("Wait for task {task_id} canceled by caller")]
    Canceled { task_id: String },

    #[error("Malformed service response: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),
}

fn request_message(url: &str, status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Request to {} failed with HTTP {}: {}", url, code, message),
        None => format!("Request to {} failed: {}", url, message),
    }
}

/// Result type alias for kiln operations
pub type Result<T> = std::result::Result<T, KilnError>;

impl From<toml::de::Error> for KilnError {
    fn from(err: toml::de::Error) -> Self {
        KilnError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for KilnError {
    fn from(err: toml::ser::Error) -> Self {
        KilnError::TomlSerError(err.to_string())
    }
}

impl From<serde_json::Error> for KilnError {
    fn from(err: serde_json::Error) -> Self {
        KilnError::Parse(err.to_string())
    }
}
