//! Shared fixtures for the runtime integration tests

#![allow(dead_code)]

use argus_core::{ExecutionError, Function, Node, Value};
use argus_runtime::screening::ScreeningProvider;
use argus_runtime::{
    EvaluationContext, InMemoryDataAccessor, ScreeningMatch, ScreeningRequest,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Event of a transaction whose linked account has the given name
pub fn account_event(name: &str) -> Arc<InMemoryDataAccessor> {
    Arc::new(
        InMemoryDataAccessor::new()
            .with_payload_field("amount", 120)
            .with_payload_field("currency", "EUR")
            .with_payload_field("counterparty_name", "Joe Finnigan")
            .with_payload_field("counterparty_id", "cp-1")
            .with_record(
                &["account"],
                HashMap::from([("name".to_string(), Value::from(name))]),
            ),
    )
}

pub fn ctx_for(data: Arc<InMemoryDataAccessor>) -> EvaluationContext {
    EvaluationContext::new("org-1", data)
}

/// `account.name = <name>`
pub fn account_name_is(name: &str) -> Node {
    Node::apply(
        Function::Equal,
        vec![
            Node::database_access("transactions", &["account"], "name"),
            Node::constant(name),
        ],
    )
}

pub fn payload_equals(field: &str, value: impl Into<Value>) -> Node {
    Node::apply(Function::Equal, vec![Node::payload(field), Node::constant(value)])
}

/// Provider answering every search with fixed matches, recording requests
#[derive(Default)]
pub struct RecordingProvider {
    matches: Vec<ScreeningMatch>,
    delay: Option<Duration>,
    failure: Option<ExecutionError>,
    requests: Mutex<Vec<ScreeningRequest>>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_matches(matches: Vec<ScreeningMatch>) -> Self {
        Self {
            matches,
            ..Self::default()
        }
    }

    pub fn failing(error: ExecutionError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ScreeningRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ScreeningProvider for RecordingProvider {
    fn is_configured(&self) -> bool {
        true
    }

    async fn search(&self, request: ScreeningRequest) -> Result<Vec<ScreeningMatch>, ExecutionError> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(self.matches.clone()),
        }
    }
}

/// Provider that panics when the searched subject is `panic`
pub struct PanickingProvider;

#[async_trait::async_trait]
impl ScreeningProvider for PanickingProvider {
    fn is_configured(&self) -> bool {
        true
    }

    async fn search(&self, request: ScreeningRequest) -> Result<Vec<ScreeningMatch>, ExecutionError> {
        if request.queries.iter().any(|query| query.subject() == "panic") {
            panic!("provider crashed");
        }
        Ok(vec![ScreeningMatch::new("match-1")])
    }
}

/// Provider of a deployment without a screening service
pub struct UnconfiguredProvider;

#[async_trait::async_trait]
impl ScreeningProvider for UnconfiguredProvider {
    fn is_configured(&self) -> bool {
        false
    }

    async fn search(&self, _request: ScreeningRequest) -> Result<Vec<ScreeningMatch>, ExecutionError> {
        Err(ExecutionError::external("screening", "must not be called"))
    }
}
