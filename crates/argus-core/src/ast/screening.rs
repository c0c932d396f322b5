//! Screening (sanctions/watchlist check) configuration

use super::node::Node;
use super::scenario::Outcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of entity a screening query searches for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntityType {
    #[default]
    Thing,
    Person,
    Organization,
    Vehicle,
}

/// Query preprocessing applied before the external search
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreprocessingConfig {
    /// Queries whose subject is shorter than this are dropped
    pub min_length: usize,
    /// Split subjects into recognized entities
    pub use_ner: bool,
    /// Strip digits from subjects
    pub remove_numbers: bool,
    /// Custom list of words removed from subjects
    pub ignore_list_id: Option<String>,
}

/// A screening check attached to a scenario iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// The check only runs when this is absent or true
    #[serde(default)]
    pub trigger_rule: Option<Node>,
    #[serde(default)]
    pub entity_type: EntityType,
    /// Query field name to an expression resolving to a string
    pub query: BTreeMap<String, Node>,
    #[serde(default)]
    pub counterparty_id_expression: Option<Node>,
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,
    #[serde(default)]
    pub datasets: Vec<String>,
    /// Minimum scenario outcome when the check has a hit
    #[serde(default)]
    pub forced_outcome: Option<Outcome>,
}

impl ScreeningConfig {
    pub fn new(id: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            trigger_rule: None,
            entity_type,
            query: BTreeMap::new(),
            counterparty_id_expression: None,
            preprocessing: PreprocessingConfig::default(),
            datasets: Vec::new(),
            forced_outcome: None,
        }
    }

    pub fn with_query_field(mut self, field: impl Into<String>, expression: Node) -> Self {
        self.query.insert(field.into(), expression);
        self
    }

    pub fn with_trigger(mut self, trigger: Node) -> Self {
        self.trigger_rule = Some(trigger);
        self
    }

    pub fn with_counterparty(mut self, expression: Node) -> Self {
        self.counterparty_id_expression = Some(expression);
        self
    }

    pub fn with_preprocessing(mut self, preprocessing: PreprocessingConfig) -> Self {
        self.preprocessing = preprocessing;
        self
    }

    pub fn with_forced_outcome(mut self, outcome: Outcome) -> Self {
        self.forced_outcome = Some(outcome);
        self
    }
}
