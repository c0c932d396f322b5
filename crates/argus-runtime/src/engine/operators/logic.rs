//! Boolean logic execution
//!
//! `And` and `Or` treat null as false. Circuit breaking happens in the tree
//! evaluator; these evaluators only run once every operand is resolved.

use super::{as_condition, type_error};
use crate::context::EvaluationContext;
use crate::environment::{Arguments, Evaluator};
use argus_core::{ExecutionError, Function, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogicOp {
    And,
    Or,
    Not,
}

impl LogicOp {
    fn function(self) -> Function {
        match self {
            LogicOp::And => Function::And,
            LogicOp::Or => Function::Or,
            LogicOp::Not => Function::Not,
        }
    }
}

pub(crate) fn execute_logic(op: LogicOp, args: &[Value]) -> Result<Value, ExecutionError> {
    let function = op.function();

    if op == LogicOp::Not {
        return match args.first() {
            Some(Value::Bool(b)) => Ok(Value::Bool(!b)),
            Some(Value::Null) | None => Ok(Value::Null),
            Some(other) => Err(type_error(&function, "boolean", other)),
        };
    }

    let mut conditions = Vec::with_capacity(args.len());
    for value in args {
        conditions.push(as_condition(value).ok_or_else(|| type_error(&function, "boolean", value))?);
    }

    let result = match op {
        LogicOp::And => conditions.iter().all(|c| *c),
        _ => conditions.iter().any(|c| *c),
    };
    Ok(Value::Bool(result))
}

#[async_trait::async_trait]
impl Evaluator for LogicOp {
    async fn evaluate(
        &self,
        _ctx: &EvaluationContext,
        args: Arguments,
    ) -> Result<Value, Vec<ExecutionError>> {
        execute_logic(*self, &args.args).map_err(|e| vec![e])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_or() {
        let args = vec![Value::Bool(true), Value::Bool(false)];
        assert_eq!(execute_logic(LogicOp::And, &args).unwrap(), Value::Bool(false));
        assert_eq!(execute_logic(LogicOp::Or, &args).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_null_counts_as_false() {
        let args = vec![Value::Bool(true), Value::Null];
        assert_eq!(execute_logic(LogicOp::And, &args).unwrap(), Value::Bool(false));
        assert_eq!(execute_logic(LogicOp::Or, &args).unwrap(), Value::Bool(true));
        assert_eq!(
            execute_logic(LogicOp::Or, &[Value::Null]).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_not() {
        assert_eq!(
            execute_logic(LogicOp::Not, &[Value::Bool(true)]).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(execute_logic(LogicOp::Not, &[Value::Null]).unwrap(), Value::Null);
    }

    #[test]
    fn test_non_boolean_operand() {
        let result = execute_logic(LogicOp::And, &[Value::Bool(true), Value::Number(1.0)]);
        assert!(matches!(result, Err(ExecutionError::InvalidArgument { .. })));
    }
}
