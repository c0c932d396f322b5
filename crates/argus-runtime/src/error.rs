//! Runtime error types

use argus_core::{CoreError, ExecutionError};
use thiserror::Error;

/// Orchestration-level error returned to the caller of a scenario evaluation.
///
/// Per-rule and per-check failures are not errors at this level, they are
/// recorded inside the execution result.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Invalid scenario or engine configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The trigger condition did not evaluate to a boolean
    #[error("Trigger condition is not boolean: {0}")]
    NonBooleanTrigger(ExecutionError),

    /// The invocation context was cancelled
    #[error("Evaluation cancelled")]
    Cancelled,

    /// A programming fault was recovered at the orchestration boundary
    #[error("Unexpected fault: {0}")]
    UnexpectedFault(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Best-effort message of a recovered panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
