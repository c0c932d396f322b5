//! Expression evaluation engine
//!
//! The tree evaluator and the built-in function library.

pub(crate) mod operators;
pub mod tree_evaluator;

#[cfg(test)]
mod tests;

pub use tree_evaluator::{check_shape, evaluate, evaluate_value};
