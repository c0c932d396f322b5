//! Scenario scoring orchestrator
//!
//! Evaluates a scenario iteration against one event: the trigger condition,
//! then every rule in author order, then the score classification and the
//! screening checks. Rule, trigger and check failures are recorded in the
//! result; only configuration errors, cancellation and recovered panics are
//! returned as errors.

use crate::config::EngineConfig;
use crate::context::EvaluationContext;
use crate::engine::evaluate;
use crate::environment::EvaluationEnvironment;
use crate::error::{panic_message, Result, RuntimeError};
use crate::observability::{names, MetricsCollector};
use crate::result::{RuleExecution, RuleOutcome, ScenarioEvaluation, ScenarioExecution};
use crate::screening::{ScreeningEvaluator, ScreeningExecution, ScreeningStatus};
use argus_core::{ExecutionError, NodeEvaluation, Rule, ScenarioIteration, Value};
use chrono::Utc;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Scenario scoring orchestrator
#[derive(Clone)]
pub struct ScenarioEvaluator {
    env: EvaluationEnvironment,
    screening: Option<ScreeningEvaluator>,
    metrics: Arc<MetricsCollector>,
}

impl ScenarioEvaluator {
    pub fn new(env: EvaluationEnvironment) -> Self {
        Self {
            env,
            screening: None,
            metrics: Arc::new(MetricsCollector::new()),
        }
    }

    /// Orchestrator whose environment uses the configured evaluator options
    pub fn from_config(env: EvaluationEnvironment, config: &EngineConfig) -> Self {
        Self::new(env.with_options(config.evaluation))
    }

    pub fn with_screening(mut self, screening: ScreeningEvaluator) -> Self {
        self.screening = Some(screening);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn environment(&self) -> &EvaluationEnvironment {
        &self.env
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Evaluate `iteration` against the event bound to `ctx`
    pub async fn evaluate(
        &self,
        ctx: &EvaluationContext,
        iteration: &ScenarioIteration,
    ) -> Result<ScenarioEvaluation> {
        let started = Instant::now();
        let result = self
            .guarded(self.run(&self.env, self.screening.as_ref(), ctx, iteration))
            .await;
        self.metrics
            .histogram(names::SCENARIO_EVALUATION_SECONDS)
            .observe_duration(started.elapsed());
        result
    }

    /// Evaluate `iteration` with every optimization disabled and without
    /// screening, so the evaluation of every node is visible
    pub async fn dry_run(
        &self,
        ctx: &EvaluationContext,
        iteration: &ScenarioIteration,
    ) -> Result<ScenarioEvaluation> {
        let env = self.env.for_dry_run();
        self.guarded(self.run(&env, None, ctx, iteration)).await
    }

    /// Recover a panic escaping the evaluation as an `UnexpectedFault`
    async fn guarded<F>(&self, evaluation: F) -> Result<ScenarioEvaluation>
    where
        F: std::future::Future<Output = Result<ScenarioEvaluation>>,
    {
        match AssertUnwindSafe(evaluation).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(%message, "scenario evaluation panicked");
                Err(RuntimeError::UnexpectedFault(message))
            }
        }
    }

    async fn run(
        &self,
        env: &EvaluationEnvironment,
        screening: Option<&ScreeningEvaluator>,
        ctx: &EvaluationContext,
        iteration: &ScenarioIteration,
    ) -> Result<ScenarioEvaluation> {
        let started = Instant::now();
        iteration.thresholds.validate()?;
        self.metrics.counter(names::SCENARIO_EVALUATIONS).inc();

        tracing::debug!(
            scenario_id = %iteration.scenario_id,
            iteration_id = %iteration.id,
            rules = iteration.rules.len(),
            "evaluating scenario"
        );

        match self.trigger(env, ctx, iteration).await? {
            Trigger::Matched => {}
            Trigger::NotMatched => {
                self.metrics.counter(names::SCENARIO_TRIGGER_MISMATCH).inc();
                tracing::debug!(scenario_id = %iteration.scenario_id, "trigger condition did not match");
                return Ok(ScenarioEvaluation::TriggerNotMatched {
                    scenario_id: iteration.scenario_id.clone(),
                    iteration_id: iteration.id.clone(),
                });
            }
            Trigger::Failed(evaluation) => {
                self.metrics.counter(names::SCENARIO_TRIGGER_FAILURES).inc();
                tracing::warn!(
                    scenario_id = %iteration.scenario_id,
                    errors = evaluation.errors.len(),
                    "trigger condition failed"
                );
                return Ok(ScenarioEvaluation::TriggerFailed {
                    scenario_id: iteration.scenario_id.clone(),
                    iteration_id: iteration.id.clone(),
                    errors: evaluation.errors.clone(),
                    evaluation,
                });
            }
        }

        let mut rule_executions = Vec::with_capacity(iteration.rules.len());
        let mut score: i64 = 0;
        for rule in &iteration.rules {
            let execution = self.evaluate_rule(env, ctx, rule).await?;
            score = score.saturating_add(execution.score_modifier);
            rule_executions.push(execution);
        }
        let mut outcome = iteration.thresholds.classify(score);

        let (screening_executions, screening_failures) = match screening {
            Some(screening) if !iteration.screening_configs.is_empty() => {
                let result = screening.evaluate(ctx, &iteration.screening_configs).await;
                if ctx.is_cancelled() {
                    return Err(RuntimeError::Cancelled);
                }
                self.record_screening(&result.executions);
                (result.executions, result.failures)
            }
            None if !iteration.screening_configs.is_empty() => {
                tracing::warn!(
                    scenario_id = %iteration.scenario_id,
                    checks = iteration.screening_configs.len(),
                    "no screening evaluator, skipping screening checks"
                );
                (Vec::new(), Vec::new())
            }
            _ => (Vec::new(), Vec::new()),
        };

        for forced in screening_executions
            .iter()
            .filter(|execution| execution.is_hit())
            .filter_map(|execution| execution.forced_outcome)
        {
            outcome = outcome.max(forced);
        }

        tracing::info!(
            scenario_id = %iteration.scenario_id,
            iteration_id = %iteration.id,
            score,
            outcome = ?outcome,
            "scenario evaluated"
        );

        Ok(ScenarioEvaluation::Executed(ScenarioExecution {
            id: Uuid::new_v4(),
            scenario_id: iteration.scenario_id.clone(),
            iteration_id: iteration.id.clone(),
            organization_id: ctx.organization_id().to_string(),
            score,
            outcome,
            rule_executions,
            screening_executions,
            screening_failures,
            evaluated_at: Utc::now(),
            duration_ms: started.elapsed().as_millis() as u64,
        }))
    }

    async fn trigger(
        &self,
        env: &EvaluationEnvironment,
        ctx: &EvaluationContext,
        iteration: &ScenarioIteration,
    ) -> Result<Trigger> {
        let Some(trigger) = &iteration.trigger_condition else {
            return Ok(Trigger::Matched);
        };

        let evaluation = evaluate(env, ctx, trigger).await;
        if !evaluation.errors.is_empty() {
            return match escalate(&evaluation) {
                Some(error) => Err(error),
                None if evaluation.only_authorization_denied() => Ok(Trigger::NotMatched),
                None => Ok(Trigger::Failed(evaluation)),
            };
        }

        match evaluation.return_value {
            Value::Bool(true) => Ok(Trigger::Matched),
            Value::Bool(false) | Value::Null => Ok(Trigger::NotMatched),
            other => Err(RuntimeError::NonBooleanTrigger(
                ExecutionError::NonBooleanTriggerResult {
                    found: other.type_name().to_string(),
                },
            )),
        }
    }

    async fn evaluate_rule(
        &self,
        env: &EvaluationEnvironment,
        ctx: &EvaluationContext,
        rule: &Rule,
    ) -> Result<RuleExecution> {
        let Some(formula) = &rule.formula else {
            return Ok(rule_execution(rule, RuleOutcome::NoHit, Vec::new(), None));
        };

        let evaluation = evaluate(env, ctx, formula).await;
        if ctx.is_cancelled() {
            return Err(RuntimeError::Cancelled);
        }

        if !evaluation.errors.is_empty() {
            if evaluation.only_authorization_denied() {
                return Ok(rule_execution(rule, RuleOutcome::NoHit, Vec::new(), Some(evaluation)));
            }
            self.metrics.counter(names::RULE_ERRORS).inc();
            tracing::warn!(
                rule_id = %rule.id,
                errors = evaluation.errors.len(),
                "rule evaluation failed"
            );
            let errors = evaluation.errors.clone();
            return Ok(rule_execution(rule, RuleOutcome::Error, errors, Some(evaluation)));
        }

        let execution = match &evaluation.return_value {
            Value::Bool(true) => rule_execution(rule, RuleOutcome::Hit, Vec::new(), None),
            Value::Bool(false) | Value::Null => rule_execution(rule, RuleOutcome::NoHit, Vec::new(), None),
            other => {
                self.metrics.counter(names::RULE_ERRORS).inc();
                let error = ExecutionError::NonBooleanTriggerResult {
                    found: other.type_name().to_string(),
                };
                rule_execution(rule, RuleOutcome::Error, vec![error], None)
            }
        };
        tracing::debug!(rule_id = %rule.id, outcome = ?execution.outcome, "rule evaluated");

        Ok(RuleExecution {
            evaluation: Some(evaluation),
            ..execution
        })
    }

    fn record_screening(&self, executions: &[ScreeningExecution]) {
        self.metrics
            .counter(names::SCREENING_CHECKS)
            .add(executions.len() as u64);
        let failed = executions
            .iter()
            .filter(|execution| execution.status == ScreeningStatus::Error)
            .count();
        self.metrics
            .counter(names::SCREENING_FAILURES)
            .add(failed as u64);
    }
}

fn rule_execution(
    rule: &Rule,
    outcome: RuleOutcome,
    errors: Vec<ExecutionError>,
    evaluation: Option<NodeEvaluation>,
) -> RuleExecution {
    RuleExecution {
        rule_id: rule.id.clone(),
        name: rule.name.clone(),
        outcome,
        score_modifier: if outcome == RuleOutcome::Hit {
            rule.score_modifier
        } else {
            0
        },
        errors,
        evaluation,
    }
}

enum Trigger {
    Matched,
    NotMatched,
    Failed(NodeEvaluation),
}

/// Orchestration error for the fatal errors of a trigger evaluation
fn escalate(evaluation: &NodeEvaluation) -> Option<RuntimeError> {
    match evaluation.fatal_error()? {
        ExecutionError::CancellationRequested => Some(RuntimeError::Cancelled),
        ExecutionError::UnexpectedFault { message } => {
            Some(RuntimeError::UnexpectedFault(message.clone()))
        }
        _ => None,
    }
}

impl std::fmt::Debug for ScenarioEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioEvaluator")
            .field("env", &self.env)
            .field("screening", &self.screening.is_some())
            .finish()
    }
}
