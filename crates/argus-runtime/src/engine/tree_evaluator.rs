//! Tree evaluator
//!
//! Walks an expression tree bottom-up and produces a [`NodeEvaluation`] of
//! the same shape. Commutative operands are evaluated cheapest first when
//! cost reordering is enabled, and `And`/`Or`/`Switch` stop evaluating once
//! their result is determined when circuit breaking is enabled. Operands that
//! were not evaluated are marked skipped. Positional results are always
//! reported and passed to evaluators in author order.

use super::operators::{as_condition, SWITCH_DEFAULT};
use crate::context::EvaluationContext;
use crate::environment::{Arguments, EvaluationEnvironment, Evaluator};
use crate::error::panic_message;
use argus_core::{Application, ExecutionError, Node, NodeEvaluation, ShortCircuit, Value};
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;

/// Evaluate `node` in `env`.
///
/// Never fails: errors, including recovered panics of an evaluator, are
/// recorded in the returned evaluation.
pub fn evaluate<'a>(
    env: &'a EvaluationEnvironment,
    ctx: &'a EvaluationContext,
    node: &'a Node,
) -> BoxFuture<'a, NodeEvaluation> {
    async move {
        match node {
            Node::Constant(value) => NodeEvaluation::constant(value.clone()),
            Node::Apply(app) => evaluate_application(env, ctx, node, app).await,
        }
    }
    .boxed()
}

/// Check the children of `app` against its function's declared shape
pub fn check_shape(app: &Application) -> Result<(), ExecutionError> {
    let descriptor = app.function.descriptor();
    descriptor
        .check_shape(app.children.len(), |name| app.named_children.contains_key(name))
        .map_err(|reason| ExecutionError::invalid_shape(app.function.name(), reason))?;

    if descriptor.short_circuit == ShortCircuit::FirstMatchingBranch && app.children.len() % 2 != 0 {
        return Err(ExecutionError::invalid_shape(
            app.function.name(),
            "branches must be [when, then] pairs",
        ));
    }
    Ok(())
}

/// Order in which positional children are evaluated
fn evaluation_order(env: &EvaluationEnvironment, app: &Application) -> Vec<usize> {
    let mut order: Vec<usize> = (0..app.children.len()).collect();
    if app.function.descriptor().commutative && env.options().cost_reordering {
        // stable: equal costs keep author order
        order.sort_by_key(|&index| app.children[index].cost());
    }
    order
}

/// Partially evaluated children of one application
struct Children {
    positional: Vec<Option<NodeEvaluation>>,
    named: HashMap<String, Option<NodeEvaluation>>,
    /// Result fixed by circuit breaking, the evaluator is not invoked
    determined: Option<Value>,
    /// Errors raised by the node itself rather than a child
    own_errors: Vec<ExecutionError>,
    /// A child hit a fatal error, nothing else is evaluated
    aborted: bool,
}

impl Children {
    fn new(app: &Application) -> Self {
        Self {
            positional: (0..app.children.len()).map(|_| None).collect(),
            named: app.named_children.keys().map(|name| (name.clone(), None)).collect(),
            determined: None,
            own_errors: Vec::new(),
            aborted: false,
        }
    }

    fn record(&mut self, index: usize, evaluation: NodeEvaluation) {
        self.aborted |= evaluation.fatal_error().is_some();
        self.positional[index] = Some(evaluation);
    }

    fn record_named(&mut self, name: &str, evaluation: NodeEvaluation) {
        self.aborted |= evaluation.fatal_error().is_some();
        self.named.insert(name.to_string(), Some(evaluation));
    }
}

async fn evaluate_application(
    env: &EvaluationEnvironment,
    ctx: &EvaluationContext,
    node: &Node,
    app: &Application,
) -> NodeEvaluation {
    if let Err(error) = ctx.check_cancelled() {
        return NodeEvaluation::failed(node, vec![error]);
    }
    let evaluator = match env.lookup(&app.function) {
        Ok(evaluator) => evaluator,
        Err(error) => return NodeEvaluation::failed(node, vec![error]),
    };
    if let Err(error) = check_shape(app) {
        return NodeEvaluation::failed(node, vec![error]);
    }

    let descriptor = app.function.descriptor();
    let circuit_breaking = env.options().circuit_breaking;

    let mut children = Children::new(app);
    match descriptor.short_circuit {
        ShortCircuit::FirstMatchingBranch if circuit_breaking => {
            evaluate_branches(env, ctx, app, &mut children).await;
        }
        short_circuit => {
            let stop_on = match short_circuit {
                ShortCircuit::StopOn(target) if circuit_breaking => Some(target),
                _ => None,
            };
            evaluate_positional(env, ctx, app, stop_on, &mut children).await;
            if !children.aborted {
                for name in app.sorted_names() {
                    let evaluation = evaluate(env, ctx, &app.named_children[name]).await;
                    children.record_named(name, evaluation);
                    if children.aborted {
                        break;
                    }
                }
            }
        }
    }

    finish(ctx, node, app, evaluator, children).await
}

/// Evaluate positional children, stopping once one resolves to `stop_on`
async fn evaluate_positional(
    env: &EvaluationEnvironment,
    ctx: &EvaluationContext,
    app: &Application,
    stop_on: Option<bool>,
    children: &mut Children,
) {
    for index in evaluation_order(env, app) {
        let evaluation = evaluate(env, ctx, &app.children[index]).await;
        let stop = match stop_on {
            Some(target) if evaluation.is_success() => {
                as_condition(&evaluation.return_value) == Some(target)
            }
            _ => false,
        };
        children.record(index, evaluation);

        if let (true, Some(target)) = (stop, stop_on) {
            children.determined = Some(Value::Bool(target));
            break;
        }
        if children.aborted {
            break;
        }
    }
}

/// `Switch` with circuit breaking: guards in order until the first true one,
/// then only its branch, or the default when nothing matched
async fn evaluate_branches(
    env: &EvaluationEnvironment,
    ctx: &EvaluationContext,
    app: &Application,
    children: &mut Children,
) {
    for pair in 0..app.children.len() / 2 {
        let (when_index, then_index) = (2 * pair, 2 * pair + 1);
        let when = evaluate(env, ctx, &app.children[when_index]).await;
        if !when.is_success() {
            children.record(when_index, when);
            return;
        }

        let condition = as_condition(&when.return_value);
        if condition.is_none() {
            children.own_errors.push(ExecutionError::invalid_argument(
                app.function.name(),
                format!("expected boolean guard, got {}", when.return_value.type_name()),
            ));
        }
        children.record(when_index, when);
        match condition {
            Some(true) => {
                let then = evaluate(env, ctx, &app.children[then_index]).await;
                children.determined = Some(then.return_value.clone());
                children.record(then_index, then);
                return;
            }
            Some(false) => {}
            None => return,
        }
    }

    children.determined = Some(Value::Null);
    if let Some(default) = app.named_children.get(SWITCH_DEFAULT) {
        let evaluation = evaluate(env, ctx, default).await;
        children.determined = Some(evaluation.return_value.clone());
        children.record_named(SWITCH_DEFAULT, evaluation);
    }
}

async fn finish(
    ctx: &EvaluationContext,
    node: &Node,
    app: &Application,
    evaluator: &dyn Evaluator,
    children: Children,
) -> NodeEvaluation {
    let Children {
        positional,
        mut named,
        determined,
        own_errors,
        ..
    } = children;

    let positional: Vec<NodeEvaluation> = positional
        .into_iter()
        .zip(&app.children)
        .map(|(evaluation, child)| evaluation.unwrap_or_else(|| NodeEvaluation::skipped(child)))
        .collect();

    let mut named_evaluations = HashMap::with_capacity(app.named_children.len());
    for name in app.sorted_names() {
        let evaluation = named
            .remove(name)
            .flatten()
            .unwrap_or_else(|| NodeEvaluation::skipped(&app.named_children[name]));
        named_evaluations.insert(name.clone(), evaluation);
    }

    let mut errors: Vec<ExecutionError> = positional
        .iter()
        .flat_map(|child| child.errors.iter().cloned())
        .collect();
    for name in app.sorted_names() {
        errors.extend(named_evaluations[name].errors.iter().cloned());
    }
    errors.extend(own_errors);

    let mut evaluation = NodeEvaluation {
        function: Some(app.function.clone()),
        return_value: Value::Null,
        errors,
        skipped: false,
        children: positional,
        named_children: named_evaluations,
    };
    if !evaluation.errors.is_empty() {
        return evaluation;
    }

    if let Some(value) = determined {
        evaluation.return_value = value;
        return evaluation;
    }

    let arguments = Arguments::new(
        evaluation
            .children
            .iter()
            .map(|child| child.return_value.clone())
            .collect(),
        evaluation
            .named_children
            .iter()
            .map(|(name, child)| (name.clone(), child.return_value.clone()))
            .collect(),
    );

    match AssertUnwindSafe(evaluator.evaluate(ctx, arguments))
        .catch_unwind()
        .await
    {
        Ok(Ok(value)) => evaluation.return_value = value,
        Ok(Err(errors)) => evaluation.errors = errors,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(function = %app.function, %message, "evaluator panicked");
            evaluation.errors = vec![ExecutionError::UnexpectedFault { message }];
        }
    }
    evaluation
}

/// Evaluate `node` and return its value, or the aggregated errors
pub async fn evaluate_value(
    env: &EvaluationEnvironment,
    ctx: &EvaluationContext,
    node: &Node,
) -> (NodeEvaluation, Result<Value, Vec<ExecutionError>>) {
    let evaluation = evaluate(env, ctx, node).await;
    let result = if evaluation.errors.is_empty() {
        Ok(evaluation.return_value.clone())
    } else {
        Err(evaluation.errors.clone())
    };
    (evaluation, result)
}
