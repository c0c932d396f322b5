//! Evaluation context
//!
//! The per-call invocation context threaded through every evaluator: the
//! organization scope, the data accessor bound to the evaluated event, the
//! evaluation clock and a cancellation token.

use crate::datasource::{DataAccessor, InMemoryDataAccessor};
use argus_core::ExecutionError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct EvaluationContext {
    organization_id: String,
    data: Arc<dyn DataAccessor>,
    now: DateTime<Utc>,
    cancellation: CancellationToken,
}

impl EvaluationContext {
    pub fn new(organization_id: impl Into<String>, data: Arc<dyn DataAccessor>) -> Self {
        Self {
            organization_id: organization_id.into(),
            data,
            now: Utc::now(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Context without any event data
    pub fn empty(organization_id: impl Into<String>) -> Self {
        Self::new(organization_id, Arc::new(InMemoryDataAccessor::new()))
    }

    /// Pin the evaluation clock
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Derive the cancellation from `parent`: cancelling the parent cancels this context
    pub fn with_parent_cancellation(mut self, parent: &CancellationToken) -> Self {
        self.cancellation = parent.child_token();
        self
    }

    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    pub fn data(&self) -> &dyn DataAccessor {
        self.data.as_ref()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Resolves once the context is cancelled
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await
    }

    pub fn check_cancelled(&self) -> Result<(), ExecutionError> {
        if self.is_cancelled() {
            Err(ExecutionError::CancellationRequested)
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for EvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("organization_id", &self.organization_id)
            .field("now", &self.now)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_shared_by_clones() {
        let ctx = EvaluationContext::empty("org");
        let clone = ctx.clone();
        assert!(clone.check_cancelled().is_ok());

        ctx.cancel();
        assert!(clone.is_cancelled());
        assert_eq!(
            clone.check_cancelled(),
            Err(ExecutionError::CancellationRequested)
        );
    }

    #[test]
    fn test_parent_cancellation() {
        let parent = CancellationToken::new();
        let ctx = EvaluationContext::empty("org").with_parent_cancellation(&parent);
        parent.cancel();
        assert!(ctx.is_cancelled());
    }

    #[test]
    fn test_pinned_clock() {
        let now = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let ctx = EvaluationContext::empty("org").with_now(now);
        assert_eq!(ctx.now(), now);
        assert_eq!(ctx.organization_id(), "org");
    }
}
