//! Scenario execution result types

mod execution;

pub use execution::{RuleExecution, RuleOutcome, ScenarioEvaluation, ScenarioExecution};
