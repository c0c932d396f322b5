//! Abstract Syntax Tree (AST) definitions for Argus
//!
//! This module contains:
//! - The closed function union and its descriptors
//! - Expression nodes and their wire format
//! - Node evaluations
//! - Scenario iterations, rules and outcomes
//! - Screening configurations

pub mod evaluation;
pub mod function;
pub mod node;
pub mod scenario;
pub mod screening;

pub use evaluation::NodeEvaluation;
pub use function::{Arity, Function, FunctionDescriptor, ShortCircuit};
pub use node::{Application, Node, NodeDto};
pub use scenario::{Outcome, Rule, ScenarioIteration, Thresholds};
pub use screening::{EntityType, PreprocessingConfig, ScreeningConfig};
