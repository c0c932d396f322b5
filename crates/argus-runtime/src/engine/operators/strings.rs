//! String function execution
//!
//! Matching is case-insensitive. A null operand yields null.

use super::{string_arg, type_error};
use crate::context::EvaluationContext;
use crate::environment::{Arguments, Evaluator};
use argus_core::{ExecutionError, Function, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StringOp {
    Contains,
    NotContain,
    StartsWith,
    EndsWith,
    ContainsAnyOf,
    ContainsNoneOf,
}

impl StringOp {
    fn function(self) -> Function {
        match self {
            StringOp::Contains => Function::StringContains,
            StringOp::NotContain => Function::StringNotContain,
            StringOp::StartsWith => Function::StringStartsWith,
            StringOp::EndsWith => Function::StringEndsWith,
            StringOp::ContainsAnyOf => Function::ContainsAnyOf,
            StringOp::ContainsNoneOf => Function::ContainsNoneOf,
        }
    }
}

pub(crate) fn execute_string(op: StringOp, text: &Value, other: &Value) -> Result<Value, ExecutionError> {
    let function = op.function();
    let Some(text) = string_arg(&function, text)? else {
        return Ok(Value::Null);
    };
    let text = text.to_lowercase();

    let result = match op {
        StringOp::ContainsAnyOf | StringOp::ContainsNoneOf => {
            let candidates = match other {
                Value::Null => return Ok(Value::Null),
                Value::Array(items) => items,
                other => return Err(type_error(&function, "list of strings", other)),
            };
            let mut any = false;
            for candidate in candidates {
                if let Some(candidate) = string_arg(&function, candidate)? {
                    if text.contains(&candidate.to_lowercase()) {
                        any = true;
                        break;
                    }
                }
            }
            if op == StringOp::ContainsAnyOf {
                any
            } else {
                !any
            }
        }
        _ => {
            let Some(pattern) = string_arg(&function, other)? else {
                return Ok(Value::Null);
            };
            let pattern = pattern.to_lowercase();
            match op {
                StringOp::Contains => text.contains(&pattern),
                StringOp::NotContain => !text.contains(&pattern),
                StringOp::StartsWith => text.starts_with(&pattern),
                _ => text.ends_with(&pattern),
            }
        }
    };
    Ok(Value::Bool(result))
}

#[async_trait::async_trait]
impl Evaluator for StringOp {
    async fn evaluate(
        &self,
        _ctx: &EvaluationContext,
        args: Arguments,
    ) -> Result<Value, Vec<ExecutionError>> {
        execute_string(*self, args.arg(0), args.arg(1)).map_err(|e| vec![e])
    }
}

/// `StringConcat`: joins non-null operands with the optional named `separator`
pub(crate) struct StringConcat;

#[async_trait::async_trait]
impl Evaluator for StringConcat {
    async fn evaluate(
        &self,
        _ctx: &EvaluationContext,
        args: Arguments,
    ) -> Result<Value, Vec<ExecutionError>> {
        let separator = string_arg(&Function::StringConcat, args.named("separator"))
            .map_err(|e| vec![e])?
            .unwrap_or("");
        let parts: Vec<String> = args
            .args
            .iter()
            .filter(|v| !v.is_null())
            .map(ToString::to_string)
            .collect();
        Ok(Value::String(parts.join(separator)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::from(text)
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        assert_eq!(
            execute_string(StringOp::Contains, &s("ACME Holdings"), &s("acme")).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            execute_string(StringOp::NotContain, &s("ACME Holdings"), &s("globex")).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_prefix_suffix() {
        assert_eq!(
            execute_string(StringOp::StartsWith, &s("FR7630001"), &s("fr76")).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            execute_string(StringOp::EndsWith, &s("FR7630001"), &s("002")).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_contains_any_of() {
        let words = Value::Array(vec![s("casino"), s("crypto")]);
        assert_eq!(
            execute_string(StringOp::ContainsAnyOf, &s("Online Casino Ltd"), &words).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            execute_string(StringOp::ContainsNoneOf, &s("Bakery"), &words).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_null_text() {
        assert_eq!(
            execute_string(StringOp::Contains, &Value::Null, &s("a")).unwrap(),
            Value::Null
        );
    }

    #[tokio::test]
    async fn test_concat() {
        let ctx = EvaluationContext::empty("org");
        let args = Arguments::new(
            vec![s("Jane"), Value::Null, s("Doe"), Value::Number(2.0)],
            [("separator".to_string(), s(" "))].into_iter().collect(),
        );
        assert_eq!(
            StringConcat.evaluate(&ctx, args).await.unwrap(),
            s("Jane Doe 2")
        );
    }
}
