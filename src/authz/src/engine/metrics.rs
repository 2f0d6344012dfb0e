//! Decision metrics in Prometheus exposition format
//!
//! Counters and histogram buckets are plain atomics so that concurrent
//! evaluations never contend on a lock just to be counted.

use super::decision::{DenialCause, Outcome};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Upper bounds (seconds) of the evaluation latency histogram
pub const LATENCY_BUCKETS: [f64; 10] = [
    0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 1.0,
];

/// Point-in-time copy of the engine counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineMetrics {
    /// Total evaluations rendered
    pub total_decisions: u64,

    /// Evaluations that succeeded
    pub succeeded: u64,

    /// Evaluations that failed, for any cause
    pub failed: u64,

    /// Failures because no principal was presented
    pub missing_principal: u64,

    /// Failures because the user store faulted
    pub lookup_faults: u64,

    /// Failures because the stored role was empty
    pub missing_role: u64,

    /// Failures because the held role ranked too low
    pub insufficient_rank: u64,

    /// Cumulative counts per entry of [`LATENCY_BUCKETS`]
    pub latency_buckets: Vec<u64>,

    /// Sum of evaluation latencies in seconds
    pub latency_sum_seconds: f64,
}

impl EngineMetrics {
    /// Share of decisions that succeeded
    pub fn success_rate(&self) -> f64 {
        if self.total_decisions == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.total_decisions as f64
        }
    }

    /// Mean evaluation latency in milliseconds
    pub fn avg_latency_ms(&self) -> f64 {
        if self.total_decisions == 0 {
            0.0
        } else {
            self.latency_sum_seconds * 1000.0 / self.total_decisions as f64
        }
    }
}

/// Lock-free metrics collector
#[derive(Debug)]
pub struct MetricsCollector {
    total_decisions: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    missing_principal: AtomicU64,
    lookup_faults: AtomicU64,
    missing_role: AtomicU64,
    insufficient_rank: AtomicU64,
    latency_buckets: [AtomicU64; LATENCY_BUCKETS.len()],
    latency_sum_micros: AtomicU64,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            total_decisions: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            missing_principal: AtomicU64::new(0),
            lookup_faults: AtomicU64::new(0),
            missing_role: AtomicU64::new(0),
            insufficient_rank: AtomicU64::new(0),
            latency_buckets: Default::default(),
            latency_sum_micros: AtomicU64::new(0),
        }
    }

    pub(crate) fn record(&self, outcome: &Outcome, latency: Duration) {
        self.total_decisions.fetch_add(1, Ordering::Relaxed);

        match outcome {
            Outcome::Granted { .. } => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
            }
            Outcome::Denied(cause) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                let counter = match cause {
                    DenialCause::MissingPrincipal => &self.missing_principal,
                    DenialCause::Lookup(_) => &self.lookup_faults,
                    DenialCause::MissingRole => &self.missing_role,
                    DenialCause::InsufficientRank { .. } => &self.insufficient_rank,
                };
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }

        self.record_latency(latency);
    }

    fn record_latency(&self, latency: Duration) {
        let seconds = latency.as_secs_f64();
        for (bound, bucket) in LATENCY_BUCKETS.iter().zip(&self.latency_buckets) {
            if seconds <= *bound {
                bucket.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.latency_sum_micros
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> EngineMetrics {
        EngineMetrics {
            total_decisions: self.total_decisions.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            missing_principal: self.missing_principal.load(Ordering::Relaxed),
            lookup_faults: self.lookup_faults.load(Ordering::Relaxed),
            missing_role: self.missing_role.load(Ordering::Relaxed),
            insufficient_rank: self.insufficient_rank.load(Ordering::Relaxed),
            latency_buckets: self
                .latency_buckets
                .iter()
                .map(|bucket| bucket.load(Ordering::Relaxed))
                .collect(),
            latency_sum_seconds: self.latency_sum_micros.load(Ordering::Relaxed) as f64
                / 1_000_000.0,
        }
    }

    /// Export metrics in Prometheus format
    pub fn export_prometheus(&self) -> String {
        let metrics = self.snapshot();

        let mut out = format!(
            r#"# HELP rbac_decisions_total Total number of authorization decisions
# TYPE rbac_decisions_total counter
rbac_decisions_total {}

# HELP rbac_decisions_succeeded_total Decisions that allowed the operation
# TYPE rbac_decisions_succeeded_total counter
rbac_decisions_succeeded_total {}

# HELP rbac_decisions_failed_total Decisions that denied the operation, by cause
# TYPE rbac_decisions_failed_total counter
rbac_decisions_failed_total{{cause="missing_principal"}} {}
rbac_decisions_failed_total{{cause="lookup_fault"}} {}
rbac_decisions_failed_total{{cause="missing_role"}} {}
rbac_decisions_failed_total{{cause="insufficient_rank"}} {}

# HELP rbac_evaluation_seconds Decision evaluation latency
# TYPE rbac_evaluation_seconds histogram
"#,
            metrics.total_decisions,
            metrics.succeeded,
            metrics.missing_principal,
            metrics.lookup_faults,
            metrics.missing_role,
            metrics.insufficient_rank,
        );

        for (bound, count) in LATENCY_BUCKETS.iter().zip(&metrics.latency_buckets) {
            out.push_str(&format!(
                "rbac_evaluation_seconds_bucket{{le=\"{}\"}} {}\n",
                bound, count
            ));
        }
        out.push_str(&format!(
            "rbac_evaluation_seconds_bucket{{le=\"+Inf\"}} {}\n",
            metrics.total_decisions
        ));
        out.push_str(&format!(
            "rbac_evaluation_seconds_sum {}\n",
            metrics.latency_sum_seconds
        ));
        out.push_str(&format!(
            "rbac_evaluation_seconds_count {}\n",
            metrics.total_decisions
        ));

        out
    }

    /// Reset all metrics
    pub fn reset(&self) {
        for counter in [
            &self.total_decisions,
            &self.succeeded,
            &self.failed,
            &self.missing_principal,
            &self.lookup_faults,
            &self.missing_role,
            &self.insufficient_rank,
            &self.latency_sum_micros,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        for bucket in &self.latency_buckets {
            bucket.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
