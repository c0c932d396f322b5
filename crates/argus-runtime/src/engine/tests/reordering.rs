//! Cost-based reordering tests

use super::*;
use crate::engine::evaluate;
use crate::environment::EvaluationEnvironment;

fn expensive_first() -> Node {
    Node::apply(
        Function::And,
        vec![
            account_name_is("Reject test account"),
            flag_is_true(),
            Node::constant(true),
        ],
    )
}

#[test]
fn test_node_cost() {
    assert_eq!(Node::constant(1).cost(), 0);
    assert_eq!(flag_is_true().cost(), 6);
    assert_eq!(account_name_is("x").cost(), 51);
}

#[tokio::test]
async fn test_reordering_is_transparent() {
    let env = EvaluationEnvironment::with_builtins();

    for (name, flag) in [
        ("Reject test account", true),
        ("Reject test account", false),
        ("Approve test account", true),
        ("Approve test account", false),
    ] {
        let reordered = {
            let data = account_data(name, flag);
            evaluate(&env, &ctx_with(&data), &expensive_first()).await
        };
        let author_order = {
            let data = account_data(name, flag);
            evaluate(&env.without_cost_reordering(), &ctx_with(&data), &expensive_first()).await
        };
        assert_eq!(reordered.return_value, author_order.return_value);
        assert_eq!(
            reordered.return_value,
            Value::Bool(name == "Reject test account" && flag)
        );
    }
}

#[tokio::test]
async fn test_cheap_operand_spares_database_read() {
    let env = EvaluationEnvironment::with_builtins();

    let data = account_data("Reject test account", false);
    let evaluation = evaluate(&env, &ctx_with(&data), &expensive_first()).await;
    assert_eq!(evaluation.return_value, Value::Bool(false));
    assert!(evaluation.children[0].skipped);
    assert_eq!(data.db_reads(), 0);

    let data = account_data("Reject test account", false);
    let env = env.without_cost_reordering();
    let evaluation = evaluate(&env, &ctx_with(&data), &expensive_first()).await;
    assert_eq!(evaluation.return_value, Value::Bool(false));
    assert!(!evaluation.children[0].skipped);
    assert_eq!(data.db_reads(), 1);
}

#[tokio::test]
async fn test_results_reported_in_author_order() {
    let env = EvaluationEnvironment::with_builtins();
    let data = account_data("Reject test account", true);
    let evaluation = evaluate(&env, &ctx_with(&data), &expensive_first()).await;

    assert_eq!(evaluation.return_value, Value::Bool(true));
    assert_eq!(evaluation.children[0].function, Some(Function::Equal));
    assert_eq!(evaluation.children[0].children[0].function, Some(Function::DatabaseAccess));
    assert_eq!(evaluation.children[2].function, None);
}

#[tokio::test]
async fn test_non_commutative_functions_keep_order() {
    let env = EvaluationEnvironment::with_builtins();
    let data = account_data("Reject test account", false);
    // amount - 20, the payload read costs more than the constant
    let node = Node::apply(
        Function::Subtract,
        vec![Node::payload("amount"), Node::constant(20)],
    );
    let evaluation = evaluate(&env, &ctx_with(&data), &node).await;
    assert_eq!(evaluation.return_value, Value::Number(100.0));
}

#[tokio::test]
async fn test_dry_run_environment_skips_nothing() {
    let env = EvaluationEnvironment::with_builtins().for_dry_run();
    let data = account_data("Approve test account", false);
    let evaluation = evaluate(&env, &ctx_with(&data), &expensive_first()).await;

    assert_eq!(evaluation.return_value, Value::Bool(false));
    assert!(evaluation.children.iter().all(|c| !c.skipped));
    assert_eq!(data.db_reads(), 1);
}
