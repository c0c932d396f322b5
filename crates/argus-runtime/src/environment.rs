//! Evaluation environment
//!
//! The immutable table mapping every [`Function`] to its [`Evaluator`], plus
//! the optimization flags of the tree evaluator. An environment is assembled
//! once by an [`EnvironmentBuilder`] and passed by reference into every
//! evaluation call; specialized clones share the same read-only table.

use crate::config::EvaluationOptions;
use crate::context::EvaluationContext;
use crate::engine::operators;
use crate::lists::{CustomListRepository, MemoryListRepository};
use argus_core::{ExecutionError, Function, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

static NULL: Value = Value::Null;

/// Resolved argument values handed to an [`Evaluator`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    /// Positional values, in author order
    pub args: Vec<Value>,
    pub named: HashMap<String, Value>,
}

impl Arguments {
    pub fn new(args: Vec<Value>, named: HashMap<String, Value>) -> Self {
        Self { args, named }
    }

    pub fn positional(args: Vec<Value>) -> Self {
        Self {
            args,
            named: HashMap::new(),
        }
    }

    /// Positional value at `index`, null when out of range
    pub fn arg(&self, index: usize) -> &Value {
        self.args.get(index).unwrap_or(&NULL)
    }

    /// Named value, null when absent
    pub fn named(&self, name: &str) -> &Value {
        self.named.get(name).unwrap_or(&NULL)
    }
}

/// Implementation of one function
#[async_trait::async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(
        &self,
        ctx: &EvaluationContext,
        args: Arguments,
    ) -> Result<Value, Vec<ExecutionError>>;
}

/// Read-only function registry and evaluator flags
#[derive(Clone)]
pub struct EvaluationEnvironment {
    evaluators: Arc<HashMap<Function, Arc<dyn Evaluator>>>,
    options: EvaluationOptions,
}

impl EvaluationEnvironment {
    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::new()
    }

    /// Environment with every built-in function and an empty custom list store
    pub fn with_builtins() -> Self {
        Self::builder().with_builtins().build()
    }

    /// Evaluator registered for `function`
    pub fn lookup(&self, function: &Function) -> Result<&dyn Evaluator, ExecutionError> {
        self.evaluators
            .get(function)
            .map(|evaluator| evaluator.as_ref())
            .ok_or_else(|| ExecutionError::UnknownFunction {
                function: function.name().to_string(),
            })
    }

    pub fn is_registered(&self, function: &Function) -> bool {
        self.evaluators.contains_key(function)
    }

    pub fn options(&self) -> EvaluationOptions {
        self.options
    }

    pub fn with_options(&self, options: EvaluationOptions) -> Self {
        Self {
            evaluators: Arc::clone(&self.evaluators),
            options,
        }
    }

    pub fn without_cost_reordering(&self) -> Self {
        self.with_options(EvaluationOptions {
            cost_reordering: false,
            ..self.options
        })
    }

    pub fn without_circuit_breaking(&self) -> Self {
        self.with_options(EvaluationOptions {
            circuit_breaking: false,
            ..self.options
        })
    }

    /// Every node evaluated in author order, nothing skipped
    pub fn for_dry_run(&self) -> Self {
        self.with_options(EvaluationOptions::unoptimized())
    }
}

impl fmt::Debug for EvaluationEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut functions: Vec<&str> = self.evaluators.keys().map(Function::name).collect();
        functions.sort_unstable();
        f.debug_struct("EvaluationEnvironment")
            .field("functions", &functions)
            .field("options", &self.options)
            .finish()
    }
}

/// Startup-time assembly of an [`EvaluationEnvironment`]
///
/// Registering the same function twice is a programming error and panics.
pub struct EnvironmentBuilder {
    builtins: bool,
    custom_lists: Option<Arc<dyn CustomListRepository>>,
    registered: HashMap<Function, Arc<dyn Evaluator>>,
    options: EvaluationOptions,
}

impl EnvironmentBuilder {
    pub fn new() -> Self {
        Self {
            builtins: false,
            custom_lists: None,
            registered: HashMap::new(),
            options: EvaluationOptions::default(),
        }
    }

    /// Register every built-in function
    pub fn with_builtins(mut self) -> Self {
        self.builtins = true;
        self
    }

    /// Repository read by `CustomListAccess`
    pub fn with_custom_lists(mut self, repository: Arc<dyn CustomListRepository>) -> Self {
        self.custom_lists = Some(repository);
        self
    }

    /// Register an evaluator.
    ///
    /// # Panics
    ///
    /// When `function` is already registered.
    pub fn register(mut self, function: Function, evaluator: Arc<dyn Evaluator>) -> Self {
        Self::insert(&mut self.registered, function, evaluator);
        self
    }

    pub fn with_options(mut self, options: EvaluationOptions) -> Self {
        self.options = options;
        self
    }

    /// # Panics
    ///
    /// When an explicitly registered function is also a built-in.
    pub fn build(self) -> EvaluationEnvironment {
        let mut evaluators = HashMap::new();

        if self.builtins || self.custom_lists.is_some() {
            let lists = self
                .custom_lists
                .unwrap_or_else(|| Arc::new(MemoryListRepository::new()));
            let functions: Vec<Function> = if self.builtins {
                Function::BUILTINS.to_vec()
            } else {
                vec![Function::CustomListAccess]
            };
            for function in functions {
                if let Some(evaluator) = operators::builtin(&function, &lists) {
                    Self::insert(&mut evaluators, function, evaluator);
                }
            }
        }

        for (function, evaluator) in self.registered {
            Self::insert(&mut evaluators, function, evaluator);
        }

        tracing::debug!(functions = evaluators.len(), "evaluation environment built");

        EvaluationEnvironment {
            evaluators: Arc::new(evaluators),
            options: self.options,
        }
    }

    fn insert(
        evaluators: &mut HashMap<Function, Arc<dyn Evaluator>>,
        function: Function,
        evaluator: Arc<dyn Evaluator>,
    ) {
        if evaluators.contains_key(&function) {
            panic!("function {} is registered twice", function);
        }
        evaluators.insert(function, evaluator);
    }
}

impl Default for EnvironmentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(Value);

    #[async_trait::async_trait]
    impl Evaluator for Constant {
        async fn evaluate(
            &self,
            _ctx: &EvaluationContext,
            _args: Arguments,
        ) -> Result<Value, Vec<ExecutionError>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_builtins_registered() {
        let env = EvaluationEnvironment::with_builtins();
        for function in Function::BUILTINS {
            assert!(env.is_registered(function), "{} missing", function);
        }
    }

    #[test]
    fn test_unknown_function() {
        let env = EvaluationEnvironment::with_builtins();
        let error = env
            .lookup(&Function::External("riskScore".to_string()))
            .err()
            .unwrap();
        assert_eq!(
            error,
            ExecutionError::UnknownFunction {
                function: "riskScore".to_string()
            }
        );
    }

    #[test]
    fn test_register_external() {
        let env = EvaluationEnvironment::builder()
            .with_builtins()
            .register(
                Function::External("riskScore".to_string()),
                Arc::new(Constant(Value::Number(0.7))),
            )
            .build();
        assert!(env.is_registered(&Function::External("riskScore".to_string())));
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn test_duplicate_registration_panics() {
        let function = Function::External("riskScore".to_string());
        let _ = EvaluationEnvironment::builder()
            .register(function.clone(), Arc::new(Constant(Value::Null)))
            .register(function, Arc::new(Constant(Value::Null)));
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn test_overriding_builtin_panics() {
        let _ = EvaluationEnvironment::builder()
            .with_builtins()
            .register(Function::Add, Arc::new(Constant(Value::Null)))
            .build();
    }

    #[test]
    fn test_specialized_clones_share_table() {
        let env = EvaluationEnvironment::with_builtins();
        let dry_run = env.for_dry_run();
        assert_eq!(dry_run.options(), EvaluationOptions::unoptimized());
        assert!(Arc::ptr_eq(&env.evaluators, &dry_run.evaluators));

        let no_reorder = env.without_cost_reordering();
        assert!(!no_reorder.options().cost_reordering);
        assert!(no_reorder.options().circuit_breaking);

        let no_breaking = env.without_circuit_breaking();
        assert!(no_breaking.options().cost_reordering);
        assert!(!no_breaking.options().circuit_breaking);
    }

    #[test]
    fn test_custom_lists_only() {
        let env = EvaluationEnvironment::builder()
            .with_custom_lists(Arc::new(MemoryListRepository::new()))
            .build();
        assert!(env.is_registered(&Function::CustomListAccess));
        assert!(!env.is_registered(&Function::Add));
    }

    #[test]
    fn test_arguments_default_to_null() {
        let args = Arguments::positional(vec![Value::Bool(true)]);
        assert_eq!(args.arg(0), &Value::Bool(true));
        assert_eq!(args.arg(3), &Value::Null);
        assert_eq!(args.named("default"), &Value::Null);
    }
}
