//! External collaborators of the screening orchestrator

use super::types::{ScreeningMatch, ScreeningRequest};
use argus_core::ExecutionError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// Sanctions/watchlist search service
#[async_trait::async_trait]
pub trait ScreeningProvider: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn search(&self, request: ScreeningRequest) -> Result<Vec<ScreeningMatch>, ExecutionError>;
}

/// Entity found in free text by an [`EntityRecognizer`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecognizedEntity {
    /// Recognizer label such as `PERSON` or `COMPANY`
    pub label: String,
    pub text: String,
}

impl RecognizedEntity {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

/// Named entity recognition service
#[async_trait::async_trait]
pub trait EntityRecognizer: Send + Sync {
    /// Recognition is skipped entirely when unconfigured
    fn is_configured(&self) -> bool;

    async fn recognize(&self, text: &str) -> Result<Vec<RecognizedEntity>, ExecutionError>;
}

/// Screening matches already reviewed and accepted for a counterparty
#[async_trait::async_trait]
pub trait WhitelistRepository: Send + Sync {
    async fn count_for_counterparty(
        &self,
        organization_id: &str,
        counterparty_id: &str,
    ) -> Result<usize, ExecutionError>;

    async fn filter_whitelisted(
        &self,
        organization_id: &str,
        matches: Vec<ScreeningMatch>,
        counterparty_id: &str,
    ) -> Result<Vec<ScreeningMatch>, ExecutionError>;
}

/// Recognizer of a deployment without entity recognition
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledRecognizer;

#[async_trait::async_trait]
impl EntityRecognizer for DisabledRecognizer {
    fn is_configured(&self) -> bool {
        false
    }

    async fn recognize(&self, _text: &str) -> Result<Vec<RecognizedEntity>, ExecutionError> {
        Ok(Vec::new())
    }
}

/// Whitelist that never holds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWhitelist;

#[async_trait::async_trait]
impl WhitelistRepository for NoWhitelist {
    async fn count_for_counterparty(
        &self,
        _organization_id: &str,
        _counterparty_id: &str,
    ) -> Result<usize, ExecutionError> {
        Ok(0)
    }

    async fn filter_whitelisted(
        &self,
        _organization_id: &str,
        matches: Vec<ScreeningMatch>,
        _counterparty_id: &str,
    ) -> Result<Vec<ScreeningMatch>, ExecutionError> {
        Ok(matches)
    }
}

/// In-memory whitelist of matched entity ids per counterparty
#[derive(Debug, Default)]
pub struct MemoryWhitelist {
    entries: RwLock<HashMap<(String, String), HashSet<String>>>,
}

impl MemoryWhitelist {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, organization_id: &str, counterparty_id: &str, entity_id: &str) {
        self.entries
            .write()
            .await
            .entry((organization_id.to_string(), counterparty_id.to_string()))
            .or_default()
            .insert(entity_id.to_string());
    }
}

#[async_trait::async_trait]
impl WhitelistRepository for MemoryWhitelist {
    async fn count_for_counterparty(
        &self,
        organization_id: &str,
        counterparty_id: &str,
    ) -> Result<usize, ExecutionError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&(organization_id.to_string(), counterparty_id.to_string()))
            .map_or(0, HashSet::len))
    }

    async fn filter_whitelisted(
        &self,
        organization_id: &str,
        matches: Vec<ScreeningMatch>,
        counterparty_id: &str,
    ) -> Result<Vec<ScreeningMatch>, ExecutionError> {
        let entries = self.entries.read().await;
        let Some(whitelisted) =
            entries.get(&(organization_id.to_string(), counterparty_id.to_string()))
        else {
            return Ok(matches);
        };
        Ok(matches
            .into_iter()
            .filter(|m| !whitelisted.contains(&m.entity_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_whitelist() {
        let whitelist = MemoryWhitelist::new();
        whitelist.add("org", "cp-1", "ofac-123").await;

        assert_eq!(whitelist.count_for_counterparty("org", "cp-1").await.unwrap(), 1);
        assert_eq!(whitelist.count_for_counterparty("org", "cp-2").await.unwrap(), 0);

        let matches = vec![ScreeningMatch::new("ofac-123"), ScreeningMatch::new("un-9")];
        let kept = whitelist
            .filter_whitelisted("org", matches.clone(), "cp-1")
            .await
            .unwrap();
        assert_eq!(kept, vec![ScreeningMatch::new("un-9")]);

        let kept = whitelist.filter_whitelisted("org", matches.clone(), "cp-2").await.unwrap();
        assert_eq!(kept, matches);
    }

    #[tokio::test]
    async fn test_null_objects() {
        assert!(!DisabledRecognizer.is_configured());
        assert!(DisabledRecognizer.recognize("Jane Doe").await.unwrap().is_empty());
        assert_eq!(NoWhitelist.count_for_counterparty("org", "cp").await.unwrap(), 0);
    }
}
