//! Custom list management module
//!
//! Custom lists are organization-scoped lists of strings (blocked merchants,
//! words ignored by screening, ...) read by the `CustomListAccess` function.

mod memory;

pub use memory::MemoryListRepository;

use argus_core::ExecutionError;

/// Storage of custom list values
#[async_trait::async_trait]
pub trait CustomListRepository: Send + Sync {
    /// All values of `list_id` in `organization_id`. An unknown list is empty.
    async fn list_values(
        &self,
        organization_id: &str,
        list_id: &str,
    ) -> Result<Vec<String>, ExecutionError>;
}
