//! Node evaluations
//!
//! A [`NodeEvaluation`] mirrors the shape of the evaluated [`Node`] and records,
//! for every node, the resolved value, whether it was skipped, and its errors.
//! It is both the result of an evaluation and the artifact shown to rule authors.

use super::function::Function;
use super::node::Node;
use crate::error::ExecutionError;
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeEvaluation {
    /// Function of the node, `None` for constants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<Function>,

    /// Resolved value, null when absent, skipped or failed
    pub return_value: Value,

    /// Errors of this node, including those aggregated from its children
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ExecutionError>,

    /// True when the node was intentionally not evaluated
    #[serde(default)]
    pub skipped: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeEvaluation>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub named_children: HashMap<String, NodeEvaluation>,
}

impl NodeEvaluation {
    pub fn constant(value: Value) -> Self {
        Self {
            function: None,
            return_value: value,
            errors: Vec::new(),
            skipped: false,
            children: Vec::new(),
            named_children: HashMap::new(),
        }
    }

    /// Mirror of `node` where every node is marked skipped
    pub fn skipped(node: &Node) -> Self {
        match node {
            Node::Constant(_) => Self {
                skipped: true,
                ..Self::constant(Value::Null)
            },
            Node::Apply(app) => Self {
                function: Some(app.function.clone()),
                return_value: Value::Null,
                errors: Vec::new(),
                skipped: true,
                children: app.children.iter().map(Self::skipped).collect(),
                named_children: app
                    .named_children
                    .iter()
                    .map(|(name, child)| (name.clone(), Self::skipped(child)))
                    .collect(),
            },
        }
    }

    /// Failed evaluation of `node` whose children were never evaluated
    pub fn failed(node: &Node, errors: Vec<ExecutionError>) -> Self {
        Self {
            skipped: false,
            errors,
            ..Self::skipped(node)
        }
    }

    pub fn is_success(&self) -> bool {
        !self.skipped && self.errors.is_empty()
    }

    /// Resolved value when the evaluation succeeded
    pub fn value(&self) -> Option<&Value> {
        self.is_success().then_some(&self.return_value)
    }

    /// True when every error is an access denial
    pub fn only_authorization_denied(&self) -> bool {
        !self.errors.is_empty() && self.errors.iter().all(ExecutionError::is_authorization_denied)
    }

    /// First fatal error, if any
    pub fn fatal_error(&self) -> Option<&ExecutionError> {
        self.errors.iter().find(|e| e.is_fatal())
    }
}
