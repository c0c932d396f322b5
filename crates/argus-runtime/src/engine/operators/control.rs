//! Control constructs: `Switch` and `ScoreComputation`

use super::{as_condition, number_arg, type_error};
use crate::context::EvaluationContext;
use crate::environment::{Arguments, Evaluator};
use argus_core::{ExecutionError, Function, Value};

/// Named child holding the fallback branch of a `Switch`
pub(crate) const SWITCH_DEFAULT: &str = "default";

/// Positional `[when, then]` pairs and an optional named `default`.
///
/// Only invoked when every branch was resolved; with circuit breaking the
/// tree evaluator selects the branch itself.
pub(crate) struct Switch;

#[async_trait::async_trait]
impl Evaluator for Switch {
    async fn evaluate(
        &self,
        _ctx: &EvaluationContext,
        args: Arguments,
    ) -> Result<Value, Vec<ExecutionError>> {
        for pair in args.args.chunks(2) {
            let [when, then] = pair else {
                return Err(vec![ExecutionError::invalid_shape(
                    Function::Switch.name(),
                    "branches must be [when, then] pairs",
                )]);
            };
            match as_condition(when) {
                Some(true) => return Ok(then.clone()),
                Some(false) => continue,
                None => return Err(vec![type_error(&Function::Switch, "boolean", when)]),
            }
        }
        Ok(args.named(SWITCH_DEFAULT).clone())
    }
}

/// Yields `modifier` when `condition` is true, else 0
pub(crate) struct ScoreComputation;

#[async_trait::async_trait]
impl Evaluator for ScoreComputation {
    async fn evaluate(
        &self,
        _ctx: &EvaluationContext,
        args: Arguments,
    ) -> Result<Value, Vec<ExecutionError>> {
        let function = Function::ScoreComputation;
        let condition = args.named("condition");
        let matched = as_condition(condition)
            .ok_or_else(|| vec![type_error(&function, "boolean", condition)])?;
        let modifier = number_arg(&function, args.named("modifier"))
            .map_err(|e| vec![e])?
            .unwrap_or(0.0);
        Ok(Value::Number(if matched { modifier } else { 0.0 }))
    }
}
