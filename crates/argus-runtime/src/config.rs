//! Configuration types for the evaluation engine

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tree evaluator optimizations
    pub evaluation: EvaluationOptions,

    /// Screening orchestration settings
    pub screening: ScreeningSettings,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML configuration document
    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(content).context("failed to parse engine configuration")
    }

    /// Load a YAML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine configuration {}", path.display()))?;
        Self::from_yaml_str(&content)
    }

    pub fn with_evaluation(mut self, evaluation: EvaluationOptions) -> Self {
        self.evaluation = evaluation;
        self
    }

    pub fn with_screening(mut self, screening: ScreeningSettings) -> Self {
        self.screening = screening;
        self
    }
}

/// Optimizations applied by the tree evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationOptions {
    /// Evaluate commutative operands cheapest first
    pub cost_reordering: bool,

    /// Stop evaluating operands once the result is determined
    pub circuit_breaking: bool,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            cost_reordering: true,
            circuit_breaking: true,
        }
    }
}

impl EvaluationOptions {
    /// Every node evaluated in author order
    pub fn unoptimized() -> Self {
        Self {
            cost_reordering: false,
            circuit_breaking: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningSettings {
    /// Base number of matches requested from the search provider
    pub result_limit: usize,
}

impl Default for ScreeningSettings {
    fn default() -> Self {
        Self { result_limit: 10 }
    }
}
