//! Argus Core - Core types and definitions for the Argus decision engine
//!
//! This crate provides the fundamental types used across the Argus ecosystem:
//! - Value types for runtime data
//! - Expression trees and their wire format
//! - Node evaluations (the explainability artifact of an evaluation)
//! - Scenario and screening configuration
//! - Error types

pub mod ast;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use ast::{
    Application, Arity, EntityType, Function, FunctionDescriptor, Node, NodeEvaluation, Outcome,
    PreprocessingConfig, Rule, ScenarioIteration, ScreeningConfig, ShortCircuit, Thresholds,
};
pub use error::{CoreError, ExecutionError};
pub use types::Value;
