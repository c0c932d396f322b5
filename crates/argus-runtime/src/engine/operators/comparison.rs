//! Comparison operator execution

use super::parse_timestamp;
use crate::context::EvaluationContext;
use crate::environment::{Arguments, Evaluator};
use argus_core::{ExecutionError, Function, Value};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ComparisonOp {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl ComparisonOp {
    fn function(self) -> Function {
        match self {
            ComparisonOp::Equal => Function::Equal,
            ComparisonOp::NotEqual => Function::NotEqual,
            ComparisonOp::Greater => Function::Greater,
            ComparisonOp::GreaterOrEqual => Function::GreaterOrEqual,
            ComparisonOp::Less => Function::Less,
            ComparisonOp::LessOrEqual => Function::LessOrEqual,
        }
    }
}

/// Structural equality, RFC 3339 timestamps compare as instants
pub(crate) fn values_equal(left: &Value, right: &Value) -> bool {
    if let (Value::String(l), Value::String(r)) = (left, right) {
        if let (Some(l), Some(r)) = (parse_timestamp(l), parse_timestamp(r)) {
            return l == r;
        }
    }
    left == right
}

/// Execute a comparison operation
pub(crate) fn execute_compare(
    left: &Value,
    op: ComparisonOp,
    right: &Value,
) -> Result<bool, ExecutionError> {
    match op {
        ComparisonOp::Equal => return Ok(values_equal(left, right)),
        ComparisonOp::NotEqual => return Ok(!values_equal(left, right)),
        _ => {}
    }

    // Ordering against a missing value is false
    if left.is_null() || right.is_null() {
        tracing::debug!(?left, ?op, ?right, "null comparison, returning false");
        return Ok(false);
    }

    let ordering = match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.partial_cmp(r),
        (Value::String(l), Value::String(r)) => match (parse_timestamp(l), parse_timestamp(r)) {
            (Some(l), Some(r)) => Some(l.cmp(&r)),
            _ => None,
        },
        _ => None,
    };

    let ordering = ordering.ok_or_else(|| {
        ExecutionError::invalid_argument(
            op.function().name(),
            format!("cannot compare {} and {}", left.type_name(), right.type_name()),
        )
    })?;

    Ok(match op {
        ComparisonOp::Greater => ordering == Ordering::Greater,
        ComparisonOp::GreaterOrEqual => ordering != Ordering::Less,
        ComparisonOp::Less => ordering == Ordering::Less,
        ComparisonOp::LessOrEqual => ordering != Ordering::Greater,
        ComparisonOp::Equal => ordering == Ordering::Equal,
        ComparisonOp::NotEqual => ordering != Ordering::Equal,
    })
}

#[async_trait::async_trait]
impl Evaluator for ComparisonOp {
    async fn evaluate(
        &self,
        _ctx: &EvaluationContext,
        args: Arguments,
    ) -> Result<Value, Vec<ExecutionError>> {
        execute_compare(args.arg(0), *self, args.arg(1))
            .map(Value::Bool)
            .map_err(|e| vec![e])
    }
}
