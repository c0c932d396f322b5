//! Screening query preprocessing
//!
//! An ordered list of stages, each mapping a set of queries to a new set.
//! Stages only read their inputs, so a pipeline is shared by every check.

use super::collaborators::{EntityRecognizer, RecognizedEntity};
use super::types::ScreeningQuery;
use crate::context::EvaluationContext;
use crate::engine::evaluate;
use crate::environment::EvaluationEnvironment;
use argus_core::{EntityType, ExecutionError, Node, PreprocessingConfig, Value};
use std::collections::HashSet;

/// Everything a stage may read
pub struct StageInput<'a> {
    pub env: &'a EvaluationEnvironment,
    pub ctx: &'a EvaluationContext,
    pub recognizer: &'a dyn EntityRecognizer,
    pub config: &'a PreprocessingConfig,
}

#[async_trait::async_trait]
pub trait PreprocessingStage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn apply(
        &self,
        queries: Vec<ScreeningQuery>,
        input: &StageInput<'_>,
    ) -> Result<Vec<ScreeningQuery>, ExecutionError>;
}

/// Drops queries whose subject is shorter than the configured minimum
///
/// Queries without a subject are kept as they are.
pub struct LengthCutoff;

#[async_trait::async_trait]
impl PreprocessingStage for LengthCutoff {
    fn name(&self) -> &'static str {
        "length_cutoff"
    }

    async fn apply(
        &self,
        queries: Vec<ScreeningQuery>,
        input: &StageInput<'_>,
    ) -> Result<Vec<ScreeningQuery>, ExecutionError> {
        let min_length = input.config.min_length;
        Ok(queries
            .into_iter()
            .filter(|query| {
                if !query.has_subject() {
                    return true;
                }
                let length = query.subject().trim().chars().count();
                let keep = length >= min_length;
                if !keep {
                    tracing::debug!(length, min_length, "screening query below minimum length, dropped");
                }
                keep
            })
            .collect())
    }
}

/// Splits subjects into one query per recognized person or organization
pub struct EntityRecognition;

impl EntityRecognition {
    fn entity_type(entity: &RecognizedEntity) -> Option<EntityType> {
        match entity.label.to_ascii_lowercase().as_str() {
            "person" | "per" => Some(EntityType::Person),
            "company" | "organization" | "organisation" | "org" => Some(EntityType::Organization),
            _ => None,
        }
    }
}

#[async_trait::async_trait]
impl PreprocessingStage for EntityRecognition {
    fn name(&self) -> &'static str {
        "entity_recognition"
    }

    async fn apply(
        &self,
        queries: Vec<ScreeningQuery>,
        input: &StageInput<'_>,
    ) -> Result<Vec<ScreeningQuery>, ExecutionError> {
        if !input.config.use_ner || !input.recognizer.is_configured() {
            return Ok(queries);
        }

        let mut recognized = Vec::with_capacity(queries.len());
        for query in queries {
            if !query.has_subject() {
                recognized.push(query);
                continue;
            }
            let entities = match input.recognizer.recognize(query.subject()).await {
                Ok(entities) => entities,
                Err(error) => {
                    tracing::warn!(%error, "entity recognition failed, keeping query");
                    recognized.push(query);
                    continue;
                }
            };

            let split: Vec<ScreeningQuery> = entities
                .iter()
                .filter_map(|entity| {
                    Self::entity_type(entity).map(|kind| query.with_subject(kind, entity.text.as_str()))
                })
                .collect();
            if split.is_empty() {
                recognized.push(query);
            } else {
                recognized.extend(split);
            }
        }
        Ok(recognized)
    }
}

/// Removes digits from subjects
pub struct DigitStripping;

#[async_trait::async_trait]
impl PreprocessingStage for DigitStripping {
    fn name(&self) -> &'static str {
        "digit_stripping"
    }

    async fn apply(
        &self,
        mut queries: Vec<ScreeningQuery>,
        input: &StageInput<'_>,
    ) -> Result<Vec<ScreeningQuery>, ExecutionError> {
        if !input.config.remove_numbers {
            return Ok(queries);
        }
        for query in queries.iter_mut().filter(|query| query.has_subject()) {
            let stripped: String = query.subject().chars().filter(|c| !c.is_ascii_digit()).collect();
            query.set_subject(stripped.split_whitespace().collect::<Vec<_>>().join(" "));
        }
        Ok(queries)
    }
}

/// Removes words found in the configured custom list from subjects
pub struct IgnoreListFilter;

impl IgnoreListFilter {
    async fn ignored_words(input: &StageInput<'_>, list_id: &str) -> Result<HashSet<String>, ExecutionError> {
        let evaluation = evaluate(input.env, input.ctx, &Node::custom_list(list_id)).await;
        if let Some(error) = evaluation.errors.into_iter().next() {
            return Err(error);
        }
        let words = match evaluation.return_value {
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .flat_map(str::split_whitespace)
                .map(str::to_lowercase)
                .collect(),
            _ => HashSet::new(),
        };
        Ok(words)
    }
}

#[async_trait::async_trait]
impl PreprocessingStage for IgnoreListFilter {
    fn name(&self) -> &'static str {
        "ignore_list"
    }

    async fn apply(
        &self,
        mut queries: Vec<ScreeningQuery>,
        input: &StageInput<'_>,
    ) -> Result<Vec<ScreeningQuery>, ExecutionError> {
        let Some(list_id) = input.config.ignore_list_id.as_deref() else {
            return Ok(queries);
        };
        let ignored = Self::ignored_words(input, list_id).await?;
        if ignored.is_empty() {
            return Ok(queries);
        }

        for query in queries.iter_mut().filter(|query| query.has_subject()) {
            let kept: Vec<&str> = query
                .subject()
                .split_whitespace()
                .filter(|word| !ignored.contains(&word.to_lowercase()))
                .collect();
            let kept = kept.join(" ");
            query.set_subject(kept);
        }
        Ok(queries)
    }
}

/// Ordered preprocessing stages
pub struct PreprocessingPipeline {
    stages: Vec<Box<dyn PreprocessingStage>>,
}

impl PreprocessingPipeline {
    pub fn new(stages: Vec<Box<dyn PreprocessingStage>>) -> Self {
        Self { stages }
    }

    /// Length cutoff, entity recognition, digit stripping, ignore list, length cutoff
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(LengthCutoff),
            Box::new(EntityRecognition),
            Box::new(DigitStripping),
            Box::new(IgnoreListFilter),
            Box::new(LengthCutoff),
        ])
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run every stage in order; stops early once no query is left
    pub async fn run(
        &self,
        mut queries: Vec<ScreeningQuery>,
        input: &StageInput<'_>,
    ) -> Result<Vec<ScreeningQuery>, ExecutionError> {
        for stage in &self.stages {
            if queries.is_empty() {
                tracing::debug!(stage = stage.name(), "no screening query left, skipping remaining stages");
                break;
            }
            queries = stage.apply(queries, input).await?;
        }
        Ok(queries)
    }
}

impl Default for PreprocessingPipeline {
    fn default() -> Self {
        Self::standard()
    }
}
