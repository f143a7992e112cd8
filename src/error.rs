use thiserror::Error;

use crate::model::EdgeId;

/// Failure reported by a task or relationship collaborator.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("board file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("board file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl BackendError {
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        BackendError::Status {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::status(404, what)
    }

    /// HTTP-style status, if the failure carried one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Why a relationship mutation did not take effect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelationshipError {
    #[error("relationship request ignored (repeated within debounce window)")]
    Debounced,

    #[error("These tasks are already linked")]
    Duplicate,

    #[error("{message}")]
    Rejected { status: Option<u16>, message: String },

    #[error("relationship {0:?} is not on this board")]
    EdgeNotFound(EdgeId),
}

impl RelationshipError {
    /// Build the user-facing rejection for a failed create.
    pub fn from_create_failure(err: &BackendError) -> Self {
        let status = err.status_code();
        let message = match status {
            Some(409) => "Relationship already exists or would create a cycle",
            Some(400) => "Invalid relationship (a task cannot depend on itself)",
            Some(404) => "Task not found",
            _ => "Failed to create relationship",
        };
        RelationshipError::Rejected {
            status,
            message: message.to_string(),
        }
    }

    pub fn from_delete_failure(err: &BackendError) -> Self {
        RelationshipError::Rejected {
            status: err.status_code(),
            message: "Failed to delete relationship".to_string(),
        }
    }
}
