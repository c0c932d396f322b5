//! Data Access Layer
//!
//! Resolves the values read by `Payload` and `DatabaseAccess` leaves. An
//! accessor is bound to the event being evaluated: payload reads come from
//! the event itself, database reads start from the event's trigger object and
//! follow the data model's declared relations.

mod memory;

pub use memory::InMemoryDataAccessor;

use argus_core::{ExecutionError, Value};

/// Source of payload and database field values for one evaluated event
#[async_trait::async_trait]
pub trait DataAccessor: Send + Sync {
    /// Read a field of the event payload, `None` when absent
    async fn payload_field(&self, field: &str) -> Result<Option<Value>, ExecutionError>;

    /// Read `field` on the record reached from `trigger_table` through `path`.
    ///
    /// Fails with [`ExecutionError::NoRowsRead`] when the path leads nowhere and
    /// with [`ExecutionError::AuthorizationDenied`] when the field may not be read.
    async fn db_field(
        &self,
        trigger_table: &str,
        path: &[String],
        field: &str,
    ) -> Result<Option<Value>, ExecutionError>;
}
