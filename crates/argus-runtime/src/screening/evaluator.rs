//! Screening evaluation orchestrator
//!
//! Runs every screening check of an iteration concurrently. Each check is an
//! isolated task; its outcome is written into a slot indexed by the check's
//! configuration position so results come back in configuration order.

use super::collaborators::{
    DisabledRecognizer, EntityRecognizer, NoWhitelist, ScreeningProvider, WhitelistRepository,
};
use super::pipeline::{PreprocessingPipeline, StageInput};
use super::types::{
    ScreeningExecution, ScreeningMatch, ScreeningQuery, ScreeningRequest, ScreeningStatus,
};
use crate::config::ScreeningSettings;
use crate::context::EvaluationContext;
use crate::engine::evaluate_value;
use crate::environment::EvaluationEnvironment;
use crate::error::panic_message;
use argus_core::{ExecutionError, Node, ScreeningConfig, Value};
use futures::FutureExt;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use uuid::Uuid;

/// Results of all screening checks of one evaluation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreeningOutcome {
    /// One execution per configuration, in configuration order
    pub executions: Vec<ScreeningExecution>,
    /// Fatal errors escalated by checks
    pub failures: Vec<ExecutionError>,
}

/// Slots shared by the check tasks
struct SharedResults {
    executions: Vec<Option<ScreeningExecution>>,
    failures: Vec<ExecutionError>,
}

/// Concurrent screening orchestrator
#[derive(Clone)]
pub struct ScreeningEvaluator {
    env: EvaluationEnvironment,
    provider: Arc<dyn ScreeningProvider>,
    recognizer: Arc<dyn EntityRecognizer>,
    whitelist: Arc<dyn WhitelistRepository>,
    pipeline: Arc<PreprocessingPipeline>,
    settings: ScreeningSettings,
}

/// Expression outcome inside a check: a value, or the execution to record
enum Resolved {
    Value(Value),
    Stop(ScreeningExecution),
}

impl ScreeningEvaluator {
    pub fn new(env: EvaluationEnvironment, provider: Arc<dyn ScreeningProvider>) -> Self {
        Self {
            env,
            provider,
            recognizer: Arc::new(DisabledRecognizer),
            whitelist: Arc::new(NoWhitelist),
            pipeline: Arc::new(PreprocessingPipeline::standard()),
            settings: ScreeningSettings::default(),
        }
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        self.recognizer = recognizer;
        self
    }

    pub fn with_whitelist(mut self, whitelist: Arc<dyn WhitelistRepository>) -> Self {
        self.whitelist = whitelist;
        self
    }

    pub fn with_pipeline(mut self, pipeline: PreprocessingPipeline) -> Self {
        self.pipeline = Arc::new(pipeline);
        self
    }

    pub fn with_settings(mut self, settings: ScreeningSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Evaluator using `env` for query expressions, other settings unchanged
    pub fn with_environment(mut self, env: EvaluationEnvironment) -> Self {
        self.env = env;
        self
    }

    /// Run every check and wait for all of them
    pub async fn evaluate(&self, ctx: &EvaluationContext, configs: &[ScreeningConfig]) -> ScreeningOutcome {
        let shared = Arc::new(Mutex::new(SharedResults {
            executions: (0..configs.len()).map(|_| None).collect(),
            failures: Vec::new(),
        }));

        let mut tasks = JoinSet::new();
        for (index, config) in configs.iter().cloned().enumerate() {
            let evaluator = self.clone();
            let ctx = ctx.clone();
            let shared = Arc::clone(&shared);

            tasks.spawn(async move {
                let result = AssertUnwindSafe(evaluator.run_check(&ctx, &config))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        let message = panic_message(panic.as_ref());
                        tracing::error!(check_id = %config.id, %message, "screening check panicked");
                        Err(ExecutionError::UnexpectedFault { message })
                    });

                let mut results = shared.lock().await;
                match result {
                    Ok(execution) => results.executions[index] = Some(execution),
                    Err(error) => {
                        results.executions[index] =
                            Some(ScreeningExecution::failed(&config.id, &config.name, error.clone()));
                        results.failures.push(error);
                    }
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(error) = joined {
                tracing::error!(%error, "screening task did not complete");
            }
        }

        let mut results = shared.lock().await;
        let failures = std::mem::take(&mut results.failures);
        let executions = std::mem::take(&mut results.executions)
            .into_iter()
            .zip(configs)
            .map(|(execution, config)| {
                execution.unwrap_or_else(|| {
                    ScreeningExecution::failed(
                        &config.id,
                        &config.name,
                        ExecutionError::UnexpectedFault {
                            message: "screening check did not complete".to_string(),
                        },
                    )
                })
            })
            .collect();

        ScreeningOutcome {
            executions,
            failures,
        }
    }

    /// One check, aborted when the context is cancelled.
    ///
    /// Returns `Err` only for fatal errors; expected failures are recorded in
    /// the execution.
    async fn run_check(
        &self,
        ctx: &EvaluationContext,
        config: &ScreeningConfig,
    ) -> Result<ScreeningExecution, ExecutionError> {
        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(ExecutionError::CancellationRequested),
            result = self.check(ctx, config) => result,
        }
    }

    async fn check(
        &self,
        ctx: &EvaluationContext,
        config: &ScreeningConfig,
    ) -> Result<ScreeningExecution, ExecutionError> {
        let started = Instant::now();
        let finish = |mut execution: ScreeningExecution| {
            execution.duration_ms = started.elapsed().as_millis() as u64;
            Ok(execution)
        };

        if let Some(trigger) = &config.trigger_rule {
            match self.resolve(ctx, config, trigger).await? {
                Resolved::Stop(execution) => return finish(execution),
                Resolved::Value(Value::Bool(true)) => {}
                Resolved::Value(Value::Null) | Resolved::Value(Value::Bool(false)) => {
                    tracing::debug!(check_id = %config.id, "screening trigger did not match");
                    return finish(ScreeningExecution::no_hit(&config.id, &config.name));
                }
                Resolved::Value(other) => {
                    let error = ExecutionError::NonBooleanTriggerResult {
                        found: other.type_name().to_string(),
                    };
                    return finish(ScreeningExecution::failed(&config.id, &config.name, error));
                }
            }
        }

        let mut filters = BTreeMap::new();
        for (field, expression) in &config.query {
            let value = match self.resolve(ctx, config, expression).await? {
                Resolved::Stop(execution) => return finish(execution),
                Resolved::Value(value) => value,
            };
            let text = match value {
                Value::Null => String::new(),
                Value::String(text) => text,
                other => other.to_string(),
            };
            if text.trim().is_empty() {
                tracing::info!(check_id = %config.id, field = %field, "screening query field is empty");
                return finish(ScreeningExecution::failed(
                    &config.id,
                    &config.name,
                    ExecutionError::AllFieldsEmpty,
                ));
            }
            filters.insert(field.clone(), text);
        }
        if filters.is_empty() {
            return finish(ScreeningExecution::failed(&config.id, &config.name, ExecutionError::AllFieldsEmpty));
        }

        let input = StageInput {
            env: &self.env,
            ctx,
            recognizer: self.recognizer.as_ref(),
            config: &config.preprocessing,
        };
        let queries = match self
            .pipeline
            .run(vec![ScreeningQuery::new(config.entity_type, filters)], &input)
            .await
        {
            Ok(queries) => queries,
            Err(error) if error.is_fatal() => return Err(error),
            Err(error) => {
                tracing::warn!(check_id = %config.id, %error, "screening preprocessing failed");
                return finish(ScreeningExecution::failed(&config.id, &config.name, error));
            }
        };
        if queries.is_empty() {
            tracing::debug!(check_id = %config.id, "no screening query left after preprocessing");
            return finish(ScreeningExecution::no_hit(&config.id, &config.name));
        }

        let counterparty_id = match &config.counterparty_id_expression {
            None => None,
            Some(expression) => match self.resolve(ctx, config, expression).await? {
                Resolved::Stop(execution) => return finish(execution),
                Resolved::Value(Value::Null) => None,
                Resolved::Value(value) => Some(value.to_string()).filter(|id| !id.trim().is_empty()),
            },
        };

        let mut execution = ScreeningExecution::no_hit(&config.id, &config.name);
        execution.queries = queries.clone();
        execution.counterparty_id = counterparty_id.clone();
        execution.forced_outcome = config.forced_outcome;

        match self.search(ctx, config, queries, counterparty_id.as_deref()).await {
            Ok((run_id, matches)) => {
                execution.run_id = Some(run_id);
                execution.status = if matches.is_empty() {
                    ScreeningStatus::NoHit
                } else {
                    ScreeningStatus::Hit
                };
                execution.matches = matches;
            }
            Err(error) if error.is_fatal() => return Err(error),
            Err(error) => {
                tracing::warn!(check_id = %config.id, %error, "screening search failed");
                execution.status = ScreeningStatus::Error;
                execution.error = Some(error);
            }
        }

        tracing::debug!(
            check_id = %config.id,
            status = ?execution.status,
            matches = execution.matches.len(),
            "screening check finished"
        );
        finish(execution)
    }

    /// Evaluate an expression of the check; non-fatal errors stop the check
    async fn resolve(
        &self,
        ctx: &EvaluationContext,
        config: &ScreeningConfig,
        expression: &Node,
    ) -> Result<Resolved, ExecutionError> {
        let (evaluation, result) = evaluate_value(&self.env, ctx, expression).await;
        let errors = match result {
            Ok(value) => return Ok(Resolved::Value(value)),
            Err(errors) => errors,
        };
        if let Some(fatal) = evaluation.fatal_error() {
            return Err(fatal.clone());
        }
        if evaluation.only_authorization_denied() {
            return Ok(Resolved::Stop(ScreeningExecution::no_hit(&config.id, &config.name)));
        }

        Ok(match errors.into_iter().next() {
            Some(error) => Resolved::Stop(ScreeningExecution::failed(&config.id, &config.name, error)),
            None => Resolved::Value(evaluation.return_value),
        })
    }

    async fn search(
        &self,
        ctx: &EvaluationContext,
        config: &ScreeningConfig,
        queries: Vec<ScreeningQuery>,
        counterparty_id: Option<&str>,
    ) -> Result<(Uuid, Vec<ScreeningMatch>), ExecutionError> {
        if !self.provider.is_configured() {
            return Err(ExecutionError::external("screening", "provider is not configured"));
        }

        let organization_id = ctx.organization_id();
        let mut limit = self.settings.result_limit;
        if let Some(counterparty_id) = counterparty_id {
            limit += self
                .whitelist
                .count_for_counterparty(organization_id, counterparty_id)
                .await?;
        }

        let run_id = Uuid::new_v4();
        let request = ScreeningRequest {
            organization_id: organization_id.to_string(),
            queries,
            datasets: config.datasets.clone(),
            limit,
        };
        tracing::debug!(check_id = %config.id, %run_id, limit, "dispatching screening search");

        let mut matches = self.provider.search(request).await?;
        if let Some(counterparty_id) = counterparty_id {
            matches = self
                .whitelist
                .filter_whitelisted(organization_id, matches, counterparty_id)
                .await?;
        }
        Ok((run_id, matches))
    }
}

