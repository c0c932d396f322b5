//! Test modules for the tree evaluator

mod evaluation;
mod reordering;

use crate::context::EvaluationContext;
use crate::datasource::InMemoryDataAccessor;
use argus_core::{Function, Node, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Event whose linked account has the given name and payload `flag`
fn account_data(name: &str, flag: bool) -> Arc<InMemoryDataAccessor> {
    Arc::new(
        InMemoryDataAccessor::new()
            .with_payload_field("flag", flag)
            .with_payload_field("amount", 120)
            .with_record(
                &["account"],
                HashMap::from([("name".to_string(), Value::from(name))]),
            ),
    )
}

fn ctx_with(data: &Arc<InMemoryDataAccessor>) -> EvaluationContext {
    EvaluationContext::new("org", data.clone())
}

/// `account.name = <name>`, an expensive comparison
fn account_name_is(name: &str) -> Node {
    Node::apply(
        Function::Equal,
        vec![
            Node::database_access("transactions", &["account"], "name"),
            Node::constant(name),
        ],
    )
}

fn flag_is_true() -> Node {
    Node::apply(
        Function::Equal,
        vec![Node::payload("flag"), Node::constant(true)],
    )
}
