//! Scenario execution results
//!
//! Created once per evaluated event and owned by the caller. Per-rule and
//! per-check failures are data inside the result.

use crate::screening::ScreeningExecution;
use argus_core::{ExecutionError, NodeEvaluation, Outcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOutcome {
    Hit,
    NoHit,
    Error,
}

/// Result of one rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleExecution {
    pub rule_id: String,
    pub name: String,
    pub outcome: RuleOutcome,
    /// Score contributed to the scenario, 0 unless the rule hit
    pub score_modifier: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ExecutionError>,
    /// Evaluation of the formula, absent for rules without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<NodeEvaluation>,
}

impl RuleExecution {
    pub fn is_hit(&self) -> bool {
        self.outcome == RuleOutcome::Hit
    }
}

/// Result of a scenario iteration whose trigger matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioExecution {
    pub id: Uuid,
    pub scenario_id: String,
    pub iteration_id: String,
    pub organization_id: String,
    pub score: i64,
    pub outcome: Outcome,
    pub rule_executions: Vec<RuleExecution>,
    #[serde(default)]
    pub screening_executions: Vec<ScreeningExecution>,
    /// Fatal errors escalated by screening checks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub screening_failures: Vec<ExecutionError>,
    pub evaluated_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ScenarioExecution {
    /// Rules that hit, in author order
    pub fn hit_rules(&self) -> impl Iterator<Item = &RuleExecution> {
        self.rule_executions.iter().filter(|rule| rule.is_hit())
    }

    /// Rules whose formula failed
    pub fn failed_rules(&self) -> impl Iterator<Item = &RuleExecution> {
        self.rule_executions
            .iter()
            .filter(|rule| rule.outcome == RuleOutcome::Error)
    }
}

/// Outcome of evaluating a scenario iteration against one event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScenarioEvaluation {
    /// The trigger condition was false or could not be read
    #[serde(rename_all = "camelCase")]
    TriggerNotMatched {
        scenario_id: String,
        iteration_id: String,
    },
    /// The trigger condition failed on the event's data; no rule was evaluated
    #[serde(rename_all = "camelCase")]
    TriggerFailed {
        scenario_id: String,
        iteration_id: String,
        errors: Vec<ExecutionError>,
        evaluation: NodeEvaluation,
    },
    Executed(ScenarioExecution),
}

impl ScenarioEvaluation {
    pub fn execution(&self) -> Option<&ScenarioExecution> {
        match self {
            ScenarioEvaluation::Executed(execution) => Some(execution),
            _ => None,
        }
    }

    pub fn into_execution(self) -> Option<ScenarioExecution> {
        match self {
            ScenarioEvaluation::Executed(execution) => Some(execution),
            _ => None,
        }
    }

    pub fn is_trigger_matched(&self) -> bool {
        matches!(self, ScenarioEvaluation::Executed(_))
    }

    /// Errors of a failed trigger condition, empty otherwise
    pub fn trigger_errors(&self) -> &[ExecutionError] {
        match self {
            ScenarioEvaluation::TriggerFailed { errors, .. } => errors,
            _ => &[],
        }
    }
}
