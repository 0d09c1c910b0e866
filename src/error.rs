//! Error types for the remote audit flow.

use crate::models::{Category, Strategy};
use thiserror::Error;

/// Result type for remote audit operations.
pub type Result<T> = std::result::Result<T, AuditError>;

/// Failures surfaced by the submission, polling and speed-audit stages.
///
/// A poll that comes back without a result body is not represented here:
/// it is the normal "keep waiting" path.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The on-page service rejected the submission or answered with a
    /// response that carries no task id
    #[error("Failed to create on-page task: {message}")]
    TaskCreation {
        status_code: Option<u64>,
        message: String,
    },

    /// A status query itself failed (transport, HTTP or API status)
    #[error("Failed to poll task {task_id}: {message}")]
    TaskPoll { task_id: String, message: String },

    /// The attempt ceiling was reached before any terminal condition
    #[error("Task {task_id} did not finish after {attempts} poll attempts")]
    TaskTimeout { task_id: String, attempts: u64 },

    /// One of the per-category speed audits failed
    #[error("Speed audit failed ({strategy}, {category}): {message}")]
    SpeedAudit {
        strategy: Strategy,
        category: Category,
        message: String,
    },

    /// The HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
