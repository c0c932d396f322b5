//! Metrics collection

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

/// Metric names recorded by the engine
pub mod names {
    pub const SCENARIO_EVALUATIONS: &str = "scenario_evaluations_total";
    pub const SCENARIO_TRIGGER_MISMATCH: &str = "scenario_trigger_mismatch_total";
    pub const SCENARIO_TRIGGER_FAILURES: &str = "scenario_trigger_failures_total";
    pub const RULE_ERRORS: &str = "rule_errors_total";
    pub const SCREENING_CHECKS: &str = "screening_checks_total";
    pub const SCREENING_FAILURES: &str = "screening_failures_total";
    pub const SCENARIO_EVALUATION_SECONDS: &str = "scenario_evaluation_seconds";
}

/// Monotonic counter
#[derive(Debug)]
pub struct Counter {
    name: String,
    value: AtomicU64,
}

impl Counter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inc(&self) {
        self.add(1);
    }

    pub fn add(&self, value: u64) {
        self.value.fetch_add(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

/// Default bucket upper bounds, in seconds
pub const DEFAULT_BUCKETS: [f64; 11] = [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

#[derive(Debug)]
struct HistogramState {
    /// One count per bound plus the overflow bucket
    buckets: Vec<u64>,
    count: u64,
    sum: f64,
    max: f64,
}

/// Fixed-bucket histogram of observed values, durations in seconds
///
/// Memory does not grow with the number of observations; percentiles are
/// resolved to the upper bound of the bucket holding them.
#[derive(Debug)]
pub struct Histogram {
    name: String,
    bounds: Vec<f64>,
    state: Mutex<HistogramState>,
}

impl Histogram {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_buckets(name, DEFAULT_BUCKETS)
    }

    /// Histogram with the given bucket upper bounds
    pub fn with_buckets(name: impl Into<String>, bounds: impl IntoIterator<Item = f64>) -> Self {
        let mut bounds: Vec<f64> = bounds.into_iter().filter(|bound| bound.is_finite()).collect();
        bounds.sort_by(f64::total_cmp);
        bounds.dedup();
        let buckets = vec![0; bounds.len() + 1];
        Self {
            name: name.into(),
            bounds,
            state: Mutex::new(HistogramState {
                buckets,
                count: 0,
                sum: 0.0,
                max: 0.0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn observe(&self, value: f64) {
        let bucket = self.bounds.partition_point(|bound| *bound < value);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.buckets[bucket] += 1;
        state.max = if state.count == 0 { value } else { state.max.max(value) };
        state.count += 1;
        state.sum += value;
    }

    pub fn observe_duration(&self, duration: Duration) {
        self.observe(duration.as_secs_f64());
    }

    pub fn count(&self) -> u64 {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).count
    }

    pub fn sum(&self) -> f64 {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).sum
    }

    /// Percentile (0-100) of the observed values, 0 when empty
    ///
    /// Values above the last bound report the largest observed value.
    pub fn percentile(&self, p: f64) -> f64 {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.count == 0 {
            return 0.0;
        }
        let rank = ((p.clamp(0.0, 100.0) / 100.0) * state.count as f64).ceil().max(1.0) as u64;
        let mut seen = 0;
        for (index, count) in state.buckets.iter().enumerate() {
            seen += count;
            if seen >= rank {
                return self.bounds.get(index).map_or(state.max, |bound| bound.min(state.max));
            }
        }
        state.max
    }

    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.buckets.iter_mut().for_each(|count| *count = 0);
        state.count = 0;
        state.sum = 0.0;
        state.max = 0.0;
    }
}

/// Named counters and histograms, created on first use
#[derive(Debug, Default)]
pub struct MetricsCollector {
    counters: RwLock<HashMap<String, Arc<Counter>>>,
    histograms: RwLock<HashMap<String, Arc<Histogram>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> Arc<Counter> {
        if let Some(counter) = self
            .counters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Arc::clone(counter);
        }
        Arc::clone(
            self.counters
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Counter::new(name))),
        )
    }

    pub fn histogram(&self, name: &str) -> Arc<Histogram> {
        if let Some(histogram) = self
            .histograms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Arc::clone(histogram);
        }
        Arc::clone(
            self.histograms
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Histogram::new(name))),
        )
    }

    /// Current value of a counter, 0 if it was never recorded
    pub fn counter_value(&self, name: &str) -> u64 {
        self.counters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map_or(0, |counter| counter.get())
    }

    pub fn counter_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .counters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn reset_all(&self) {
        for counter in self.counters.read().unwrap_or_else(PoisonError::into_inner).values() {
            counter.reset();
        }
        for histogram in self.histograms.read().unwrap_or_else(PoisonError::into_inner).values() {
            histogram.reset();
        }
    }
}
