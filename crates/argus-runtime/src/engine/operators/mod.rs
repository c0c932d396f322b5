//! Built-in function library
//!
//! One module per function family. Each family is an operation enum that
//! implements [`Evaluator`]; [`builtin`] maps every built-in [`Function`] to
//! its evaluator.

mod arithmetic;
mod comparison;
mod control;
mod data;
mod lists;
mod logic;
mod strings;
mod time;

pub(crate) use comparison::values_equal;
pub(crate) use control::SWITCH_DEFAULT;
pub(crate) use time::parse_timestamp;

use crate::environment::Evaluator;
use crate::lists::CustomListRepository;
use argus_core::{ExecutionError, Function, Value};
use std::sync::Arc;

use arithmetic::ArithmeticOp;
use comparison::ComparisonOp;
use control::{ScoreComputation, Switch};
use data::{CustomListAccess, DatabaseAccess, Payload};
use lists::ListOp;
use logic::LogicOp;
use strings::{StringConcat, StringOp};
use time::TimeOp;

/// Evaluator of a built-in function, `None` for [`Function::External`]
pub(crate) fn builtin(
    function: &Function,
    lists: &Arc<dyn CustomListRepository>,
) -> Option<Arc<dyn Evaluator>> {
    let evaluator: Arc<dyn Evaluator> = match function {
        Function::And => Arc::new(LogicOp::And),
        Function::Or => Arc::new(LogicOp::Or),
        Function::Not => Arc::new(LogicOp::Not),
        Function::Add => Arc::new(ArithmeticOp::Add),
        Function::Subtract => Arc::new(ArithmeticOp::Subtract),
        Function::Multiply => Arc::new(ArithmeticOp::Multiply),
        Function::Divide => Arc::new(ArithmeticOp::Divide),
        Function::Equal => Arc::new(ComparisonOp::Equal),
        Function::NotEqual => Arc::new(ComparisonOp::NotEqual),
        Function::Greater => Arc::new(ComparisonOp::Greater),
        Function::GreaterOrEqual => Arc::new(ComparisonOp::GreaterOrEqual),
        Function::Less => Arc::new(ComparisonOp::Less),
        Function::LessOrEqual => Arc::new(ComparisonOp::LessOrEqual),
        Function::StringContains => Arc::new(StringOp::Contains),
        Function::StringNotContain => Arc::new(StringOp::NotContain),
        Function::StringStartsWith => Arc::new(StringOp::StartsWith),
        Function::StringEndsWith => Arc::new(StringOp::EndsWith),
        Function::ContainsAnyOf => Arc::new(StringOp::ContainsAnyOf),
        Function::ContainsNoneOf => Arc::new(StringOp::ContainsNoneOf),
        Function::StringConcat => Arc::new(StringConcat),
        Function::List => Arc::new(ListOp::List),
        Function::IsInList => Arc::new(ListOp::IsInList),
        Function::IsNotInList => Arc::new(ListOp::IsNotInList),
        Function::IsEmpty => Arc::new(ListOp::IsEmpty),
        Function::IsNotEmpty => Arc::new(ListOp::IsNotEmpty),
        Function::TimeNow => Arc::new(TimeOp::Now),
        Function::TimeAdd => Arc::new(TimeOp::Add),
        Function::ParseTime => Arc::new(TimeOp::Parse),
        Function::Switch => Arc::new(Switch),
        Function::ScoreComputation => Arc::new(ScoreComputation),
        Function::Payload => Arc::new(Payload),
        Function::DatabaseAccess => Arc::new(DatabaseAccess),
        Function::CustomListAccess => Arc::new(CustomListAccess::new(Arc::clone(lists))),
        Function::External(_) => return None,
    };
    Some(evaluator)
}

/// Null is "false" for boolean aggregation, other non-booleans are not conditions
pub(crate) fn as_condition(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Null => Some(false),
        _ => None,
    }
}

fn type_error(function: &Function, expected: &str, found: &Value) -> ExecutionError {
    ExecutionError::invalid_argument(
        function.name(),
        format!("expected {}, got {}", expected, found.type_name()),
    )
}

/// Number argument, `None` for null
fn number_arg(function: &Function, value: &Value) -> Result<Option<f64>, ExecutionError> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(Some(*n)),
        other => Err(type_error(function, "number", other)),
    }
}

/// String argument, `None` for null
fn string_arg<'a>(function: &Function, value: &'a Value) -> Result<Option<&'a str>, ExecutionError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        other => Err(type_error(function, "string", other)),
    }
}

/// String argument that must be present
fn required_string<'a>(function: &Function, value: &'a Value) -> Result<&'a str, ExecutionError> {
    string_arg(function, value)?.ok_or_else(|| type_error(function, "string", value))
}
