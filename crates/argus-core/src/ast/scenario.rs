//! Scenario definitions: rules, thresholds and outcomes

use super::node::Node;
use super::screening::ScreeningConfig;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

/// Rule definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Unique rule ID
    pub id: String,

    /// Human-readable name
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Formula, a rule without one never hits
    #[serde(default)]
    pub formula: Option<Node>,

    /// Score added when the formula evaluates to true
    pub score_modifier: i64,
}

impl Rule {
    pub fn new(id: impl Into<String>, name: impl Into<String>, formula: Node, score_modifier: i64) -> Self {
        Rule {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            formula: Some(formula),
            score_modifier,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Score thresholds of an iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub review: i64,
    #[serde(default)]
    pub block_and_review: Option<i64>,
    pub reject: i64,
}

impl Thresholds {
    pub fn new(review: i64, reject: i64) -> Self {
        Self {
            review,
            block_and_review: None,
            reject,
        }
    }

    pub fn with_block_and_review(mut self, threshold: i64) -> Self {
        self.block_and_review = Some(threshold);
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.review > self.reject {
            return Err(CoreError::InvalidConfiguration(format!(
                "review threshold {} is above reject threshold {}",
                self.review, self.reject
            )));
        }
        if let Some(block) = self.block_and_review {
            if block < self.review || block > self.reject {
                return Err(CoreError::InvalidConfiguration(format!(
                    "block and review threshold {} is outside [{}, {}]",
                    block, self.review, self.reject
                )));
            }
        }
        Ok(())
    }

    /// Classify an aggregate score
    pub fn classify(&self, score: i64) -> Outcome {
        if score >= self.reject {
            Outcome::Reject
        } else if self.block_and_review.is_some_and(|t| score >= t) {
            Outcome::BlockAndReview
        } else if score >= self.review {
            Outcome::Review
        } else {
            Outcome::Approve
        }
    }
}

/// Decision outcome, ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Approve,
    Review,
    BlockAndReview,
    Reject,
}

/// A published, versioned set of rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioIteration {
    pub id: String,
    pub scenario_id: String,
    #[serde(default)]
    pub version: Option<u32>,
    /// Trigger condition, an absent trigger always matches
    #[serde(default)]
    pub trigger_condition: Option<Node>,
    #[serde(default)]
    pub rules: Vec<Rule>,
    pub thresholds: Thresholds,
    #[serde(default)]
    pub screening_configs: Vec<ScreeningConfig>,
}

impl ScenarioIteration {
    pub fn new(id: impl Into<String>, scenario_id: impl Into<String>, thresholds: Thresholds) -> Self {
        Self {
            id: id.into(),
            scenario_id: scenario_id.into(),
            version: None,
            trigger_condition: None,
            rules: Vec::new(),
            thresholds,
            screening_configs: Vec::new(),
        }
    }

    pub fn with_trigger(mut self, trigger: Node) -> Self {
        self.trigger_condition = Some(trigger);
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_screening(mut self, config: ScreeningConfig) -> Self {
        self.screening_configs.push(config);
        self
    }
}
