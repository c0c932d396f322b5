//! In-memory custom list repository
//!
//! Simple memory-based list storage for testing and development.

use super::CustomListRepository;
use argus_core::ExecutionError;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory custom list repository
///
/// Lists are keyed by `(organization_id, list_id)` and keep insertion order.
#[derive(Debug, Default)]
pub struct MemoryListRepository {
    lists: RwLock<HashMap<(String, String), Vec<String>>>,
}

impl MemoryListRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository holding a single list
    pub fn with_list<I, S>(organization_id: &str, list_id: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut lists = HashMap::new();
        lists.insert(
            (organization_id.to_string(), list_id.to_string()),
            values.into_iter().map(Into::into).collect(),
        );
        Self {
            lists: RwLock::new(lists),
        }
    }

    /// Add a value to a list, creating the list if needed. Duplicates are ignored.
    pub async fn add(&self, organization_id: &str, list_id: &str, value: impl Into<String>) {
        let value = value.into();
        let mut lists = self.lists.write().await;
        let list = lists
            .entry((organization_id.to_string(), list_id.to_string()))
            .or_default();
        if !list.contains(&value) {
            list.push(value);
        }
    }

    /// Remove a value from a list
    pub async fn remove(&self, organization_id: &str, list_id: &str, value: &str) {
        let mut lists = self.lists.write().await;
        if let Some(list) = lists.get_mut(&(organization_id.to_string(), list_id.to_string())) {
            list.retain(|v| v != value);
        }
    }
}

#[async_trait::async_trait]
impl CustomListRepository for MemoryListRepository {
    async fn list_values(
        &self,
        organization_id: &str,
        list_id: &str,
    ) -> Result<Vec<String>, ExecutionError> {
        let lists = self.lists.read().await;
        match lists.get(&(organization_id.to_string(), list_id.to_string())) {
            Some(values) => Ok(values.clone()),
            None => {
                tracing::warn!(
                    organization_id,
                    list_id,
                    "custom list not found, treating as empty"
                );
                Ok(Vec::new())
            }
        }
    }
}
