//! Error types for Argus Core

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while decoding or building core data structures
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid node: {0}")]
    InvalidNode(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Error raised while evaluating an expression tree.
///
/// Evaluation errors are data: they are stored in [`NodeEvaluation`](crate::NodeEvaluation)s
/// and rule/screening results, so they are cloneable and serializable.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionError {
    #[error("unknown function: {function}")]
    UnknownFunction { function: String },

    #[error("invalid node shape for {function}: {reason}")]
    InvalidNodeShape { function: String, reason: String },

    #[error("invalid argument for {function}: {reason}")]
    InvalidArgument { function: String, reason: String },

    #[error("null value read for field {field}")]
    NullFieldRead { field: String },

    #[error("no rows read for path {path}")]
    NoRowsRead { path: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("all screening query fields are empty")]
    AllFieldsEmpty,

    #[error("expected a boolean result, got {found}")]
    NonBooleanTriggerResult { found: String },

    #[error("access denied to field {field}")]
    AuthorizationDenied { field: String },

    #[error("external service {service} failed: {message}")]
    ExternalService { service: String, message: String },

    #[error("unexpected fault: {message}")]
    UnexpectedFault { message: String },

    #[error("evaluation cancelled")]
    CancellationRequested,
}

impl ExecutionError {
    pub fn invalid_argument(function: impl Into<String>, reason: impl Into<String>) -> Self {
        ExecutionError::InvalidArgument {
            function: function.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_shape(function: impl Into<String>, reason: impl Into<String>) -> Self {
        ExecutionError::InvalidNodeShape {
            function: function.into(),
            reason: reason.into(),
        }
    }

    pub fn external(service: impl Into<String>, message: impl Into<String>) -> Self {
        ExecutionError::ExternalService {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Errors that must escape the unit of work that raised them
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExecutionError::UnexpectedFault { .. } | ExecutionError::CancellationRequested
        )
    }

    pub fn is_authorization_denied(&self) -> bool {
        matches!(self, ExecutionError::AuthorizationDenied { .. })
    }
}
