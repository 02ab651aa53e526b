//! Remote task vocabulary shared across crates

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of remote generation task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Geometry generated from a text prompt
    Shape,
    /// Materials applied to an already generated shape
    Texture,
}

impl TaskKind {
    /// Parse a kind name as accepted on the command line
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "shape" | "preview" => Some(TaskKind::Shape),
            "texture" => Some(TaskKind::Texture),
            _ => None,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Shape => write!(f, "shape"),
            TaskKind::Texture => write!(f, "texture"),
        }
    }
}

/// Normalized status of a remote task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Canceled,
}

impl TaskStatus {
    /// Normalize a service status token.
    ///
    /// Returns `None` for tokens the service has not documented; callers treat
    /// those as non-terminal.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "PENDING" | "QUEUED" => Some(TaskStatus::Pending),
            "IN_PROGRESS" | "RUNNING" => Some(TaskStatus::Running),
            "SUCCEEDED" => Some(TaskStatus::Succeeded),
            "FAILED" | "EXPIRED" => Some(TaskStatus::Failed),
            "CANCELED" | "CANCELLED" => Some(TaskStatus::Canceled),
            _ => None,
        }
    }

    /// Terminal statuses admit no further transition
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Canceled
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Succeeded => write!(f, "succeeded"),
            TaskStatus::Failed => write!(f, "failed"),
            TaskStatus::Canceled => write!(f, "canceled"),
        }
    }
}
