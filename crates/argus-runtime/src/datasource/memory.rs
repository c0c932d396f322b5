//! In-memory data accessor
//!
//! Holds an event payload and the records linked to it, for tests, dry runs
//! and callers that preload their data.

use super::DataAccessor;
use argus_core::{ExecutionError, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct InMemoryDataAccessor {
    payload: HashMap<String, Value>,
    /// Records keyed by relation path from the trigger object
    records: HashMap<Vec<String>, HashMap<String, Value>>,
    /// `path.field` keys whose reads are denied
    denied: HashSet<String>,
    db_reads: AtomicUsize,
}

impl InMemoryDataAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(payload: HashMap<String, Value>) -> Self {
        Self {
            payload,
            ..Self::default()
        }
    }

    pub fn with_payload_field(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(field.to_string(), value.into());
        self
    }

    /// Register the record reached through `path`
    pub fn with_record(mut self, path: &[&str], record: HashMap<String, Value>) -> Self {
        self.records
            .insert(path.iter().map(|p| p.to_string()).collect(), record);
        self
    }

    /// Deny reads of `field` on the record reached through `path`
    pub fn deny(mut self, path: &[&str], field: &str) -> Self {
        self.denied.insert(Self::qualified(path, field));
        self
    }

    /// Number of database field reads served so far
    pub fn db_reads(&self) -> usize {
        self.db_reads.load(Ordering::SeqCst)
    }

    fn qualified<S: AsRef<str>>(path: &[S], field: &str) -> String {
        path.iter()
            .map(AsRef::as_ref)
            .chain(std::iter::once(field))
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[async_trait::async_trait]
impl DataAccessor for InMemoryDataAccessor {
    async fn payload_field(&self, field: &str) -> Result<Option<Value>, ExecutionError> {
        Ok(self.payload.get(field).cloned())
    }

    async fn db_field(
        &self,
        trigger_table: &str,
        path: &[String],
        field: &str,
    ) -> Result<Option<Value>, ExecutionError> {
        self.db_reads.fetch_add(1, Ordering::SeqCst);

        let qualified = Self::qualified(path, field);
        if self.denied.contains(&qualified) {
            return Err(ExecutionError::AuthorizationDenied { field: qualified });
        }

        let record = self.records.get(path).ok_or_else(|| ExecutionError::NoRowsRead {
            path: format!("{}.{}", trigger_table, path.join(".")),
        })?;
        Ok(record.get(field).cloned())
    }
}
