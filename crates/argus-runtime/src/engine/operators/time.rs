//! Time function execution
//!
//! Timestamps travel as RFC 3339 strings and are normalized to UTC.

use super::{number_arg, string_arg, type_error};
use crate::context::EvaluationContext;
use crate::environment::{Arguments, Evaluator};
use argus_core::{ExecutionError, Function, Value};
use chrono::{DateTime, Duration, SecondsFormat, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimeOp {
    Now,
    Add,
    Parse,
}

pub(crate) fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

pub(crate) fn format_timestamp(time: DateTime<Utc>) -> Value {
    Value::String(time.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

fn timestamp_arg(function: &Function, value: &Value) -> Result<Option<DateTime<Utc>>, ExecutionError> {
    match string_arg(function, value)? {
        None => Ok(None),
        Some(text) => parse_timestamp(text).map(Some).ok_or_else(|| {
            ExecutionError::invalid_argument(
                function.name(),
                format!("'{}' is not an RFC 3339 timestamp", text),
            )
        }),
    }
}

fn time_add(args: &Arguments) -> Result<Value, ExecutionError> {
    let function = Function::TimeAdd;
    let Some(timestamp) = timestamp_arg(&function, args.named("timestampField"))? else {
        return Ok(Value::Null);
    };
    let Some(seconds) = number_arg(&function, args.named("duration"))? else {
        return Ok(Value::Null);
    };
    let out_of_range = || {
        ExecutionError::invalid_argument(
            function.name(),
            format!("duration of {} seconds is out of range", seconds),
        )
    };
    let duration = if seconds.is_finite() {
        Duration::try_milliseconds((seconds * 1000.0).round() as i64).ok_or_else(out_of_range)?
    } else {
        return Err(out_of_range());
    };

    let sign = args.named("sign");
    let shifted = match sign.as_str() {
        Some("+") => timestamp.checked_add_signed(duration),
        Some("-") => timestamp.checked_sub_signed(duration),
        _ => return Err(type_error(&function, "sign '+' or '-'", sign)),
    };
    shifted.map(format_timestamp).ok_or_else(out_of_range)
}

#[async_trait::async_trait]
impl Evaluator for TimeOp {
    async fn evaluate(
        &self,
        ctx: &EvaluationContext,
        args: Arguments,
    ) -> Result<Value, Vec<ExecutionError>> {
        let result = match self {
            TimeOp::Now => Ok(format_timestamp(ctx.now())),
            TimeOp::Add => time_add(&args),
            TimeOp::Parse => {
                timestamp_arg(&Function::ParseTime, args.arg(0)).map(|t| t.map_or(Value::Null, format_timestamp))
            }
        };
        result.map_err(|e| vec![e])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ctx() -> EvaluationContext {
        EvaluationContext::empty("org").with_now(parse_timestamp("2024-05-01T10:00:00Z").unwrap())
    }

    fn time_add_args(timestamp: &str, seconds: f64, sign: &str) -> Arguments {
        Arguments::new(
            Vec::new(),
            HashMap::from([
                ("timestampField".to_string(), Value::from(timestamp)),
                ("duration".to_string(), Value::Number(seconds)),
                ("sign".to_string(), Value::from(sign)),
            ]),
        )
    }

    #[tokio::test]
    async fn test_now_uses_context_clock() {
        let now = TimeOp::Now.evaluate(&ctx(), Arguments::default()).await.unwrap();
        assert_eq!(now, Value::from("2024-05-01T10:00:00Z"));
    }

    #[tokio::test]
    async fn test_add_and_subtract() {
        let later = TimeOp::Add
            .evaluate(&ctx(), time_add_args("2024-05-01T10:00:00Z", 3600.0, "+"))
            .await
            .unwrap();
        assert_eq!(later, Value::from("2024-05-01T11:00:00Z"));

        let earlier = TimeOp::Add
            .evaluate(&ctx(), time_add_args("2024-05-01T10:00:00Z", 86400.0, "-"))
            .await
            .unwrap();
        assert_eq!(earlier, Value::from("2024-04-30T10:00:00Z"));
    }

    #[tokio::test]
    async fn test_add_rejects_unknown_sign() {
        let errors = TimeOp::Add
            .evaluate(&ctx(), time_add_args("2024-05-01T10:00:00Z", 1.0, "*"))
            .await
            .unwrap_err();
        assert!(matches!(errors[0], ExecutionError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_add_out_of_range_is_invalid_argument() {
        for (seconds, sign) in [(1e13, "+"), (1e13, "-"), (1e300, "+")] {
            let errors = TimeOp::Add
                .evaluate(&ctx(), time_add_args("2024-01-01T00:00:00Z", seconds, sign))
                .await
                .unwrap_err();
            assert_eq!(errors.len(), 1);
            assert!(matches!(errors[0], ExecutionError::InvalidArgument { .. }));
            assert!(!errors[0].is_fatal());
        }
    }

    #[tokio::test]
    async fn test_parse_normalizes_to_utc() {
        let parsed = TimeOp::Parse
            .evaluate(
                &ctx(),
                Arguments::positional(vec![Value::from("2024-05-01T12:30:00+02:00")]),
            )
            .await
            .unwrap();
        assert_eq!(parsed, Value::from("2024-05-01T10:30:00Z"));

        let errors = TimeOp::Parse
            .evaluate(&ctx(), Arguments::positional(vec![Value::from("yesterday")]))
            .await
            .unwrap_err();
        assert!(matches!(errors[0], ExecutionError::InvalidArgument { .. }));
    }
}
