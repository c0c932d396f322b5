//! Data access functions
//!
//! `Payload`, `DatabaseAccess` and `CustomListAccess` are the only evaluators
//! that suspend on a collaborator. Collaborator reads race the context
//! cancellation.

use super::{required_string, type_error};
use crate::context::EvaluationContext;
use crate::environment::{Arguments, Evaluator};
use crate::lists::CustomListRepository;
use argus_core::{ExecutionError, Function, Value};
use std::future::Future;
use std::sync::Arc;

async fn until_cancelled<T, F>(ctx: &EvaluationContext, read: F) -> Result<T, ExecutionError>
where
    F: Future<Output = Result<T, ExecutionError>>,
{
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(ExecutionError::CancellationRequested),
        result = read => result,
    }
}

/// `Payload(field)`: a field of the evaluated event, null when absent
pub(crate) struct Payload;

#[async_trait::async_trait]
impl Evaluator for Payload {
    async fn evaluate(
        &self,
        ctx: &EvaluationContext,
        args: Arguments,
    ) -> Result<Value, Vec<ExecutionError>> {
        let field = required_string(&Function::Payload, args.arg(0)).map_err(|e| vec![e])?;
        let value = until_cancelled(ctx, ctx.data().payload_field(field))
            .await
            .map_err(|e| vec![e])?;
        Ok(value.unwrap_or(Value::Null))
    }
}

/// `DatabaseAccess`: a field of a record linked to the trigger object
pub(crate) struct DatabaseAccess;

impl DatabaseAccess {
    async fn read(ctx: &EvaluationContext, args: &Arguments) -> Result<Value, ExecutionError> {
        let function = Function::DatabaseAccess;
        let table = required_string(&function, args.named("tableName"))?;
        let field = required_string(&function, args.named("fieldName"))?;

        let path_value = args.named("path");
        let path = path_value
            .as_array()
            .ok_or_else(|| type_error(&function, "list of relation names", path_value))?
            .iter()
            .map(|segment| required_string(&function, segment).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;

        let value = until_cancelled(ctx, ctx.data().db_field(table, &path, field)).await?;
        match value {
            Some(value) if !value.is_null() => Ok(value),
            _ => {
                let qualified = path
                    .iter()
                    .map(String::as_str)
                    .chain(std::iter::once(field))
                    .collect::<Vec<_>>()
                    .join(".");
                Err(ExecutionError::NullFieldRead { field: qualified })
            }
        }
    }
}

#[async_trait::async_trait]
impl Evaluator for DatabaseAccess {
    async fn evaluate(
        &self,
        ctx: &EvaluationContext,
        args: Arguments,
    ) -> Result<Value, Vec<ExecutionError>> {
        Self::read(ctx, &args).await.map_err(|e| vec![e])
    }
}

/// `CustomListAccess`: the values of an organization's custom list
pub(crate) struct CustomListAccess {
    lists: Arc<dyn CustomListRepository>,
}

impl CustomListAccess {
    pub(crate) fn new(lists: Arc<dyn CustomListRepository>) -> Self {
        Self { lists }
    }
}

#[async_trait::async_trait]
impl Evaluator for CustomListAccess {
    async fn evaluate(
        &self,
        ctx: &EvaluationContext,
        args: Arguments,
    ) -> Result<Value, Vec<ExecutionError>> {
        let list_id = required_string(&Function::CustomListAccess, args.named("customListId"))
            .map_err(|e| vec![e])?;
        let values = until_cancelled(ctx, self.lists.list_values(ctx.organization_id(), list_id))
            .await
            .map_err(|e| vec![e])?;
        Ok(Value::Array(values.into_iter().map(Value::String).collect()))
    }
}
