//! Observability module
//!
//! In-process counters and duration histograms recorded by the orchestrators.
//! Logging goes through `tracing`; no subscriber is installed here.

pub mod metrics;

pub use metrics::{names, Counter, Histogram, MetricsCollector};
