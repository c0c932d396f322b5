//! Static validation of expression trees and scenario iterations
//!
//! Validation walks a tree without evaluating it, so it can run when a
//! scenario is published rather than on the first event.
//!
//! # What is checked
//!
//! - Every function node resolves in the [`EvaluationEnvironment`]
//!   (`UnknownFunction` otherwise)
//! - Every function node has the children its descriptor declares
//!   (`InvalidNodeShape` otherwise, including odd `Switch` branch lists)
//! - Iteration thresholds are ordered
//!
//! Every problem is reported with its location in the iteration; validation
//! does not stop at the first one.
//!
//! # Examples
//!
//! ```rust
//! use argus_core::{Function, Node};
//! use argus_runtime::validation::validate_node;
//! use argus_runtime::EvaluationEnvironment;
//!
//! let env = EvaluationEnvironment::with_builtins();
//!
//! let valid = Node::apply(Function::Not, vec![Node::constant(true)]);
//! assert!(validate_node(&env, &valid).is_empty());
//!
//! let unknown = Node::apply(Function::External("fuzzy_match".into()), vec![]);
//! assert_eq!(validate_node(&env, &unknown).len(), 1);
//! ```

use crate::engine::check_shape;
use crate::environment::EvaluationEnvironment;
use crate::error::{Result, RuntimeError};
use argus_core::{ExecutionError, Node, ScenarioIteration};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// A problem found in one expression of an iteration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    /// Where the expression lives, e.g. `rules.r1` or `screening.s1.query.name`
    pub location: String,
    pub error: ExecutionError,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.error)
    }
}

/// Report every unknown function and malformed node of `node`
pub fn validate_node(env: &EvaluationEnvironment, node: &Node) -> Vec<ExecutionError> {
    let mut errors = Vec::new();
    collect_errors(env, node, &mut errors);
    errors
}

fn collect_errors(env: &EvaluationEnvironment, node: &Node, errors: &mut Vec<ExecutionError>) {
    let Node::Apply(app) = node else {
        return;
    };

    if let Err(error) = env.lookup(&app.function) {
        errors.push(error);
    }
    if let Err(error) = check_shape(app) {
        errors.push(error);
    }

    for child in &app.children {
        collect_errors(env, child, errors);
    }
    for name in app.sorted_names() {
        collect_errors(env, &app.named_children[name], errors);
    }
}

/// Every expression problem of `iteration`, in evaluation order
pub fn iteration_issues(env: &EvaluationEnvironment, iteration: &ScenarioIteration) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut check = |location: String, node: &Node| {
        issues.extend(
            validate_node(env, node)
                .into_iter()
                .map(|error| ValidationIssue {
                    location: location.clone(),
                    error,
                }),
        );
    };

    if let Some(trigger) = &iteration.trigger_condition {
        check("trigger".to_string(), trigger);
    }
    for rule in &iteration.rules {
        if let Some(formula) = &rule.formula {
            check(format!("rules.{}", rule.id), formula);
        }
    }
    for config in &iteration.screening_configs {
        if let Some(trigger) = &config.trigger_rule {
            check(format!("screening.{}.trigger", config.id), trigger);
        }
        for (field, expression) in &config.query {
            check(format!("screening.{}.query.{}", config.id, field), expression);
        }
        if let Some(counterparty) = &config.counterparty_id_expression {
            check(format!("screening.{}.counterparty", config.id), counterparty);
        }
    }
    issues
}

/// Validate an iteration before it is evaluated
///
/// # Returns
/// * `Ok(())` if thresholds and every expression are valid
/// * `Err(RuntimeError::Core)` for misordered thresholds
/// * `Err(RuntimeError::Configuration)` listing every other problem
pub fn validate_iteration(env: &EvaluationEnvironment, iteration: &ScenarioIteration) -> Result<()> {
    iteration.thresholds.validate()?;

    let mut problems: Vec<String> = Vec::new();

    let mut seen = HashSet::new();
    for rule in &iteration.rules {
        if !seen.insert(rule.id.as_str()) {
            problems.push(format!("rules.{}: duplicate rule id", rule.id));
        }
    }
    let mut seen = HashSet::new();
    for config in &iteration.screening_configs {
        if !seen.insert(config.id.as_str()) {
            problems.push(format!("screening.{}: duplicate screening id", config.id));
        }
    }

    problems.extend(iteration_issues(env, iteration).iter().map(ToString::to_string));

    if problems.is_empty() {
        Ok(())
    } else {
        tracing::debug!(
            iteration_id = %iteration.id,
            problems = problems.len(),
            "scenario iteration failed validation"
        );
        Err(RuntimeError::Configuration(problems.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argus_core::{EntityType, Function, Rule, ScreeningConfig, Thresholds};

    fn env() -> EvaluationEnvironment {
        EvaluationEnvironment::with_builtins()
    }

    fn valid_formula() -> Node {
        Node::apply(
            Function::Equal,
            vec![Node::payload("currency"), Node::constant("EUR")],
        )
    }

    fn iteration() -> ScenarioIteration {
        ScenarioIteration::new("it-1", "sc-1", Thresholds::new(10, 20))
            .with_trigger(Node::constant(true))
            .with_rule(Rule::new("r1", "Currency", valid_formula(), 10))
    }

    #[test]
    fn test_valid_tree() {
        assert!(validate_node(&env(), &valid_formula()).is_empty());
        assert!(validate_node(&env(), &Node::constant(1)).is_empty());
    }

    #[test]
    fn test_reports_nested_problems() {
        let node = Node::apply(
            Function::And,
            vec![
                Node::apply(Function::External("fuzzy_match".to_string()), vec![]),
                Node::apply(Function::Not, vec![]),
            ],
        );

        let errors = validate_node(&env(), &node);
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ExecutionError::UnknownFunction { .. }));
        assert!(matches!(errors[1], ExecutionError::InvalidNodeShape { .. }));
    }

    #[test]
    fn test_odd_switch_branches() {
        let node = Node::apply(Function::Switch, vec![Node::constant(true)]);
        let errors = validate_node(&env(), &node);
        assert!(matches!(errors.as_slice(), [ExecutionError::InvalidNodeShape { .. }]));
    }

    #[test]
    fn test_valid_iteration() {
        assert!(validate_iteration(&env(), &iteration()).is_ok());
    }

    #[test]
    fn test_issue_locations() {
        let broken = Node::apply(Function::Not, vec![]);
        let iteration = iteration()
            .with_rule(Rule::new("r2", "Broken", broken.clone(), 5))
            .with_screening(
                ScreeningConfig::new("s1", EntityType::Person).with_query_field("name", broken),
            );

        let issues = iteration_issues(&env(), &iteration);
        let locations: Vec<&str> = issues.iter().map(|issue| issue.location.as_str()).collect();
        assert_eq!(locations, vec!["rules.r2", "screening.s1.query.name"]);
    }

    #[test]
    fn test_invalid_iteration() {
        let iteration = iteration().with_rule(Rule::new("r1", "Duplicate", valid_formula(), 1));
        match validate_iteration(&env(), &iteration) {
            Err(RuntimeError::Configuration(message)) => {
                assert!(message.contains("duplicate rule id"));
            }
            other => panic!("Expected Configuration error, got {:?}", other),
        }

        let mut iteration = self::iteration();
        iteration.thresholds = Thresholds::new(30, 20);
        assert!(matches!(
            validate_iteration(&env(), &iteration),
            Err(RuntimeError::Core(_))
        ));
    }
}
