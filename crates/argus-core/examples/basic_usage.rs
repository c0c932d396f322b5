//! Basic usage example for argus-core
//!
//! Run with: cargo run --example basic_usage

use argus_core::{Function, Node, Outcome, Rule, ScenarioIteration, Thresholds, Value};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Argus Core Basic Usage Example ===\n");

    // Example 1: Values
    println!("1. Values:");
    for value in [Value::from(42), Value::from("Acme"), Value::Bool(true), Value::Null] {
        println!("   {} ({})", value, value.type_name());
    }
    println!();

    // Example 2: account.name = "Reject test account"
    println!("2. Building a formula:");
    let formula = Node::apply(
        Function::Equal,
        vec![
            Node::database_access("transactions", &["account"], "name"),
            Node::constant("Reject test account"),
        ],
    );
    println!("   cost: {}\n", formula.cost());

    // Example 3: Wire format
    println!("3. Wire format:");
    let json = formula.to_json()?;
    println!("   {}", json);
    assert_eq!(Node::from_json(&json)?, formula);
    println!();

    // Example 4: A scenario iteration and its thresholds
    println!("4. Scenario iteration:");
    let iteration = ScenarioIteration::new("it-1", "sc-1", Thresholds::new(10, 10))
        .with_rule(Rule::new("r1", "Reject test account", formula, 100));
    iteration.thresholds.validate()?;
    for score in [0, 100] {
        let outcome: Outcome = iteration.thresholds.classify(score);
        println!("   score {} -> {:?}", score, outcome);
    }

    println!("\n=== Example Complete ===");
    Ok(())
}
