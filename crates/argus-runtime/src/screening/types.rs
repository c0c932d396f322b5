//! Screening queries, matches and per-check results

use argus_core::{EntityType, ExecutionError, Outcome};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Query field holding the searched name
pub const SUBJECT_FIELD: &str = "name";

/// One structured search query: an entity type and field filters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningQuery {
    pub entity_type: EntityType,
    pub filters: BTreeMap<String, String>,
}

impl ScreeningQuery {
    pub fn new(entity_type: EntityType, filters: BTreeMap<String, String>) -> Self {
        Self {
            entity_type,
            filters,
        }
    }

    /// Query searching only for `subject`
    pub fn subject_only(entity_type: EntityType, subject: impl Into<String>) -> Self {
        Self::new(
            entity_type,
            BTreeMap::from([(SUBJECT_FIELD.to_string(), subject.into())]),
        )
    }

    /// Free text the preprocessing stages operate on
    pub fn subject(&self) -> &str {
        self.filters.get(SUBJECT_FIELD).map_or("", String::as_str)
    }

    /// Queries keyed on other fields only carry no subject and bypass text preprocessing
    pub fn has_subject(&self) -> bool {
        self.filters.contains_key(SUBJECT_FIELD)
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.filters.insert(SUBJECT_FIELD.to_string(), subject.into());
    }

    /// Same filters with another subject and entity type
    pub fn with_subject(&self, entity_type: EntityType, subject: impl Into<String>) -> Self {
        let mut query = Self::new(entity_type, self.filters.clone());
        query.set_subject(subject);
        query
    }
}

/// Request sent to the screening provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningRequest {
    pub organization_id: String,
    pub queries: Vec<ScreeningQuery>,
    #[serde(default)]
    pub datasets: Vec<String>,
    /// Maximum number of matches to return
    pub limit: usize,
}

/// A candidate match returned by the screening provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningMatch {
    /// Identifier of the matched entity at the provider
    pub entity_id: String,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub datasets: Vec<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

impl ScreeningMatch {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            names: Vec::new(),
            datasets: Vec::new(),
            score: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningStatus {
    NoHit,
    Hit,
    Error,
}

/// Outcome of one screening check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningExecution {
    pub config_id: String,
    pub name: String,
    pub status: ScreeningStatus,
    /// Identifier of the search run, absent when no search was dispatched
    pub run_id: Option<Uuid>,
    /// Queries after preprocessing
    #[serde(default)]
    pub queries: Vec<ScreeningQuery>,
    #[serde(default)]
    pub matches: Vec<ScreeningMatch>,
    pub counterparty_id: Option<String>,
    #[serde(default)]
    pub error: Option<ExecutionError>,
    /// Minimum scenario outcome when this check is a hit
    pub forced_outcome: Option<Outcome>,
    pub duration_ms: u64,
}

impl ScreeningExecution {
    pub fn no_hit(config_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            config_id: config_id.into(),
            name: name.into(),
            status: ScreeningStatus::NoHit,
            run_id: None,
            queries: Vec::new(),
            matches: Vec::new(),
            counterparty_id: None,
            error: None,
            forced_outcome: None,
            duration_ms: 0,
        }
    }

    pub fn failed(
        config_id: impl Into<String>,
        name: impl Into<String>,
        error: ExecutionError,
    ) -> Self {
        Self {
            status: ScreeningStatus::Error,
            error: Some(error),
            ..Self::no_hit(config_id, name)
        }
    }

    pub fn is_hit(&self) -> bool {
        self.status == ScreeningStatus::Hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_defaults_to_empty() {
        let query = ScreeningQuery::new(EntityType::Thing, BTreeMap::new());
        assert_eq!(query.subject(), "");
    }

    #[test]
    fn test_with_subject_keeps_other_filters() {
        let query = ScreeningQuery::new(
            EntityType::Thing,
            BTreeMap::from([
                ("name".to_string(), "Jane Doe at Acme".to_string()),
                ("country".to_string(), "FR".to_string()),
            ]),
        );
        let split = query.with_subject(EntityType::Person, "Jane Doe");
        assert_eq!(split.entity_type, EntityType::Person);
        assert_eq!(split.subject(), "Jane Doe");
        assert_eq!(split.filters["country"], "FR");
    }

    #[test]
    fn test_failed_execution() {
        let execution = ScreeningExecution::failed("sc-1", "PEP", ExecutionError::AllFieldsEmpty);
        assert_eq!(execution.status, ScreeningStatus::Error);
        assert!(!execution.is_hit());
        assert_eq!(execution.error, Some(ExecutionError::AllFieldsEmpty));
    }
}
