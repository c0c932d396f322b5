//! Scenario evaluation example
//!
//! Scores one transaction against a scenario with a single rule and a
//! screening check backed by a canned provider.
//!
//! To run this example:
//! ```bash
//! cargo run --package argus-runtime --example scenario_evaluation
//! ```

use argus_core::{
    EntityType, ExecutionError, Function, Node, Outcome, Rule, ScenarioIteration, ScreeningConfig,
    Thresholds, Value,
};
use argus_runtime::{
    EvaluationContext, EvaluationEnvironment, InMemoryDataAccessor, ScenarioEvaluator,
    ScreeningEvaluator, ScreeningMatch, ScreeningProvider, ScreeningRequest,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Provider returning one match for every search
struct CannedProvider;

#[async_trait::async_trait]
impl ScreeningProvider for CannedProvider {
    fn is_configured(&self) -> bool {
        true
    }

    async fn search(&self, request: ScreeningRequest) -> Result<Vec<ScreeningMatch>, ExecutionError> {
        let subject = request
            .queries
            .first()
            .map(|query| query.subject().to_string())
            .unwrap_or_default();
        Ok(vec![ScreeningMatch::new("ofac-123").with_name(subject)])
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = EvaluationEnvironment::with_builtins();
    let evaluator = ScenarioEvaluator::new(env.clone())
        .with_screening(ScreeningEvaluator::new(env, Arc::new(CannedProvider)));

    let iteration = ScenarioIteration::new("it-1", "large-transfers", Thresholds::new(10, 50))
        .with_trigger(Node::apply(
            Function::Greater,
            vec![Node::payload("amount"), Node::constant(1000)],
        ))
        .with_rule(Rule::new(
            "r-test-account",
            "Reject test account",
            Node::apply(
                Function::Equal,
                vec![
                    Node::database_access("transactions", &["account"], "name"),
                    Node::constant("Reject test account"),
                ],
            ),
            100,
        ))
        .with_screening(
            ScreeningConfig::new("s-counterparty", EntityType::Person)
                .with_query_field("name", Node::payload("counterparty_name"))
                .with_forced_outcome(Outcome::BlockAndReview),
        );

    let data = InMemoryDataAccessor::new()
        .with_payload_field("amount", 2500)
        .with_payload_field("counterparty_name", "Joe Finnigan")
        .with_record(
            &["account"],
            HashMap::from([("name".to_string(), Value::from("Approve test account"))]),
        );
    let ctx = EvaluationContext::new("org-1", Arc::new(data));

    let result = evaluator.evaluate(&ctx, &iteration).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
