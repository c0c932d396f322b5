//! Argus Runtime - Evaluation engine for Argus scenarios
//!
//! This crate evaluates expression trees against an event, scores scenario
//! iterations and runs the screening checks they configure.

pub mod config;
pub mod context;
pub mod datasource;
pub mod engine;
pub mod environment;
pub mod error;
pub mod lists;
pub mod observability;
pub mod result;
pub mod scenario;
pub mod screening;
pub mod validation;

// Re-export main types
pub use config::{EngineConfig, EvaluationOptions, ScreeningSettings};
pub use context::EvaluationContext;
pub use datasource::{DataAccessor, InMemoryDataAccessor};
pub use engine::{evaluate, evaluate_value};
pub use environment::{Arguments, EnvironmentBuilder, EvaluationEnvironment, Evaluator};
pub use error::{Result, RuntimeError};
pub use lists::{CustomListRepository, MemoryListRepository};
pub use observability::MetricsCollector;
pub use result::{RuleExecution, RuleOutcome, ScenarioEvaluation, ScenarioExecution};
pub use scenario::ScenarioEvaluator;
pub use screening::{
    EntityRecognizer, PreprocessingPipeline, ScreeningEvaluator, ScreeningExecution,
    ScreeningMatch, ScreeningOutcome, ScreeningProvider, ScreeningQuery, ScreeningRequest,
    ScreeningStatus, WhitelistRepository,
};
pub use validation::{validate_iteration, validate_node, ValidationIssue};
