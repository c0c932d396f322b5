//! Basic tree evaluation tests

use super::*;
use crate::engine::evaluate;
use crate::environment::{Arguments, EvaluationEnvironment, Evaluator};
use argus_core::{ExecutionError, NodeEvaluation};

struct Panicking;

#[async_trait::async_trait]
impl Evaluator for Panicking {
    async fn evaluate(
        &self,
        _ctx: &EvaluationContext,
        _args: Arguments,
    ) -> Result<Value, Vec<ExecutionError>> {
        panic!("evaluator bug")
    }
}

#[tokio::test]
async fn test_constant() {
    let env = EvaluationEnvironment::with_builtins();
    let ctx = EvaluationContext::empty("org");
    let evaluation = evaluate(&env, &ctx, &Node::constant(42)).await;
    assert_eq!(evaluation, NodeEvaluation::constant(Value::Number(42.0)));
}

#[tokio::test]
async fn test_nested_arithmetic_keeps_author_order() {
    let env = EvaluationEnvironment::with_builtins();
    let ctx = EvaluationContext::empty("org");
    // (10 - 4) / (1 + 2)
    let node = Node::apply(
        Function::Divide,
        vec![
            Node::apply(Function::Subtract, vec![Node::constant(10), Node::constant(4)]),
            Node::apply(Function::Add, vec![Node::constant(1), Node::constant(2)]),
        ],
    );
    let evaluation = evaluate(&env, &ctx, &node).await;
    assert!(evaluation.is_success());
    assert_eq!(evaluation.return_value, Value::Number(2.0));
    assert_eq!(evaluation.children[0].return_value, Value::Number(6.0));
    assert_eq!(evaluation.children[1].return_value, Value::Number(3.0));
}

#[tokio::test]
async fn test_database_comparison() {
    let env = EvaluationEnvironment::with_builtins();
    let data = account_data("Reject test account", false);
    let ctx = ctx_with(&data);

    let evaluation = evaluate(&env, &ctx, &account_name_is("Reject test account")).await;
    assert_eq!(evaluation.return_value, Value::Bool(true));

    let evaluation = evaluate(&env, &ctx, &account_name_is("Approve test account")).await;
    assert_eq!(evaluation.return_value, Value::Bool(false));
}

#[tokio::test]
async fn test_unknown_function() {
    let env = EvaluationEnvironment::with_builtins();
    let ctx = EvaluationContext::empty("org");
    let node = Node::apply(
        Function::External("velocity".to_string()),
        vec![Node::payload("amount")],
    );

    let evaluation = evaluate(&env, &ctx, &node).await;
    assert_eq!(
        evaluation.errors,
        vec![ExecutionError::UnknownFunction {
            function: "velocity".to_string()
        }]
    );
    assert!(!evaluation.skipped);
    assert!(evaluation.children[0].skipped);
}

#[tokio::test]
async fn test_invalid_shape() {
    let env = EvaluationEnvironment::with_builtins();
    let ctx = EvaluationContext::empty("org");
    let node = Node::apply(Function::Not, vec![Node::constant(true), Node::constant(false)]);

    let evaluation = evaluate(&env, &ctx, &node).await;
    assert!(matches!(
        evaluation.errors[..],
        [ExecutionError::InvalidNodeShape { .. }]
    ));

    let missing_named = Node::apply_named(Function::TimeAdd, [("sign", Node::constant("+"))]);
    let evaluation = evaluate(&env, &ctx, &missing_named).await;
    assert!(matches!(
        evaluation.errors[..],
        [ExecutionError::InvalidNodeShape { .. }]
    ));
}

#[tokio::test]
async fn test_child_errors_are_aggregated() {
    let env = EvaluationEnvironment::with_builtins();
    let ctx = EvaluationContext::empty("org");
    let node = Node::apply(
        Function::Add,
        vec![
            Node::apply(Function::Divide, vec![Node::constant(1), Node::constant(0)]),
            Node::apply(Function::Divide, vec![Node::constant(2), Node::constant(0)]),
        ],
    );

    let evaluation = evaluate(&env, &ctx, &node).await;
    assert_eq!(
        evaluation.errors,
        vec![ExecutionError::DivisionByZero, ExecutionError::DivisionByZero]
    );
    assert_eq!(evaluation.return_value, Value::Null);
    assert_eq!(evaluation.children[0].errors, vec![ExecutionError::DivisionByZero]);
}

#[tokio::test]
async fn test_panicking_evaluator_is_contained() {
    let function = Function::External("buggy".to_string());
    let env = EvaluationEnvironment::builder()
        .with_builtins()
        .register(function.clone(), Arc::new(Panicking))
        .build();
    let ctx = EvaluationContext::empty("org");
    let node = Node::apply(
        Function::Or,
        vec![Node::apply(function, Vec::new()), Node::constant(false)],
    );

    let evaluation = evaluate(&env, &ctx, &node).await;
    assert_eq!(
        evaluation.errors,
        vec![ExecutionError::UnexpectedFault {
            message: "evaluator bug".to_string()
        }]
    );
    assert!(evaluation.fatal_error().is_some());
}

#[tokio::test]
async fn test_cancelled_context() {
    let env = EvaluationEnvironment::with_builtins();
    let ctx = EvaluationContext::empty("org");
    ctx.cancel();

    let node = Node::apply(Function::Add, vec![Node::constant(1), Node::constant(2)]);
    let evaluation = evaluate(&env, &ctx, &node).await;
    assert_eq!(evaluation.errors, vec![ExecutionError::CancellationRequested]);
}

#[tokio::test]
async fn test_wire_format_evaluates_identically() {
    let env = EvaluationEnvironment::with_builtins();
    let data = account_data("Reject test account", true);
    let ctx = ctx_with(&data);

    let json = r#"{
        "type": "And",
        "children": [
            {
                "type": "=",
                "children": [
                    {
                        "type": "DatabaseAccess",
                        "staticData": {"tableName": "transactions", "fieldName": "name", "path": ["account"]}
                    },
                    {"type": "Constant", "staticData": {"value": "Reject test account"}}
                ]
            },
            {"type": "Payload", "children": [{"staticData": {"value": "flag"}}]}
        ]
    }"#;
    let decoded = Node::from_json(json).unwrap();
    let built = Node::apply(
        Function::And,
        vec![account_name_is("Reject test account"), Node::payload("flag")],
    );
    assert_eq!(decoded, built);

    let reencoded = Node::from_json(&decoded.to_json().unwrap()).unwrap();
    let first = evaluate(&env, &ctx, &decoded).await;
    let second = evaluate(&env, &ctx, &reencoded).await;
    assert_eq!(first, second);
    assert_eq!(first.return_value, Value::Bool(true));
}

#[tokio::test]
async fn test_evaluation_is_deterministic() {
    let env = EvaluationEnvironment::with_builtins();
    let data = account_data("Approve test account", false);
    let ctx = ctx_with(&data);
    let node = Node::apply(
        Function::Or,
        vec![
            account_name_is("Reject test account"),
            flag_is_true(),
            Node::apply(Function::Greater, vec![Node::payload("amount"), Node::constant(100)]),
        ],
    );

    let first = evaluate(&env, &ctx, &node).await;
    let second = evaluate(&env, &ctx, &node).await;
    assert_eq!(first, second);
    assert_eq!(first.return_value, Value::Bool(true));
}
