//! List function execution

use super::{type_error, values_equal};
use crate::context::EvaluationContext;
use crate::environment::{Arguments, Evaluator};
use argus_core::{ExecutionError, Function, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListOp {
    List,
    IsInList,
    IsNotInList,
    IsEmpty,
    IsNotEmpty,
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

pub(crate) fn execute_list(op: ListOp, args: Vec<Value>) -> Result<Value, ExecutionError> {
    match op {
        ListOp::List => Ok(Value::Array(args)),
        ListOp::IsEmpty => Ok(Value::Bool(args.first().map_or(true, is_empty))),
        ListOp::IsNotEmpty => Ok(Value::Bool(!args.first().map_or(true, is_empty))),
        ListOp::IsInList | ListOp::IsNotInList => {
            let function = if op == ListOp::IsInList {
                Function::IsInList
            } else {
                Function::IsNotInList
            };
            let (value, list) = match args.as_slice() {
                [value, list] => (value, list),
                _ => {
                    return Err(ExecutionError::invalid_argument(
                        function.name(),
                        "expected a value and a list",
                    ))
                }
            };
            if value.is_null() || list.is_null() {
                return Ok(Value::Null);
            }
            let items = list
                .as_array()
                .ok_or_else(|| type_error(&function, "list", list))?;
            let found = items.iter().any(|item| values_equal(item, value));
            Ok(Value::Bool(found == (op == ListOp::IsInList)))
        }
    }
}

#[async_trait::async_trait]
impl Evaluator for ListOp {
    async fn evaluate(
        &self,
        _ctx: &EvaluationContext,
        args: Arguments,
    ) -> Result<Value, Vec<ExecutionError>> {
        execute_list(*self, args.args).map_err(|e| vec![e])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocked() -> Value {
        Value::Array(vec![Value::from("acme"), Value::from("globex")])
    }

    #[test]
    fn test_list_builds_array() {
        let args = vec![Value::from("a"), Value::Number(1.0)];
        assert_eq!(
            execute_list(ListOp::List, args.clone()).unwrap(),
            Value::Array(args)
        );
    }

    #[test]
    fn test_membership() {
        assert_eq!(
            execute_list(ListOp::IsInList, vec![Value::from("acme"), blocked()]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            execute_list(ListOp::IsNotInList, vec![Value::from("initech"), blocked()]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            execute_list(ListOp::IsInList, vec![Value::Null, blocked()]).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_membership_requires_list() {
        let result = execute_list(ListOp::IsInList, vec![Value::from("a"), Value::from("a")]);
        assert!(matches!(result, Err(ExecutionError::InvalidArgument { .. })));
    }

    #[test]
    fn test_emptiness() {
        assert_eq!(
            execute_list(ListOp::IsEmpty, vec![Value::from("  ")]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            execute_list(ListOp::IsEmpty, vec![Value::Null]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            execute_list(ListOp::IsNotEmpty, vec![blocked()]).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            execute_list(ListOp::IsNotEmpty, vec![Value::Number(0.0)]).unwrap(),
            Value::Bool(true)
        );
    }
}
