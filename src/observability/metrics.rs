//! # Metrics
//!
//! Prometheus metrics for monitoring the sync service.
//!
//! ## Metrics Exposed
//!
//! - `vault_secret_sync_runs_total` - Total number of sync runs
//! - `vault_secret_sync_run_errors_total` - Total number of runs aborted by a run-level error
//! - `vault_secret_sync_run_duration_seconds` - Duration of sync runs
//! - `vault_secret_sync_mappings_total{outcome}` - Mapping outcomes (synced, skipped, failed)
//! - `vault_secret_sync_authentications_total` - Vault AppRole logins performed
//! - `vault_secret_sync_store_operations_total{operation}` - Vault operations
//! - `vault_secret_sync_store_operation_duration_seconds{operation}` - Duration of Vault operations
//! - `vault_secret_sync_store_operation_errors_total{operation}` - Failed Vault operations
//! - `vault_secret_sync_target_writes_total{operation}` - Target Secret creates and patches
//! - `vault_secret_sync_backend_reachable{backend}` - Last health probe result (1 reachable, 0 not)

use prometheus::{
    core::Collector, Histogram, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Registry,
};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static SYNC_RUNS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("vault_secret_sync_runs_total", "Total number of sync runs")
        .expect("Failed to create SYNC_RUNS_TOTAL metric - this should never happen")
});

static SYNC_RUN_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "vault_secret_sync_run_errors_total",
        "Total number of sync runs aborted by a run-level error",
    )
    .expect("Failed to create SYNC_RUN_ERRORS_TOTAL metric - this should never happen")
});

static SYNC_RUN_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "vault_secret_sync_run_duration_seconds",
            "Duration of sync runs in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create SYNC_RUN_DURATION metric - this should never happen")
});

static MAPPINGS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "vault_secret_sync_mappings_total",
            "Total number of processed mappings by outcome",
        ),
        &["outcome"],
    )
    .expect("Failed to create MAPPINGS_TOTAL metric - this should never happen")
});

static AUTHENTICATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "vault_secret_sync_authentications_total",
        "Total number of Vault AppRole logins performed",
    )
    .expect("Failed to create AUTHENTICATIONS_TOTAL metric - this should never happen")
});

static STORE_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "vault_secret_sync_store_operations_total",
            "Total number of Vault operations by operation type",
        ),
        &["operation"],
    )
    .expect("Failed to create STORE_OPERATIONS_TOTAL metric - this should never happen")
});

static STORE_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "vault_secret_sync_store_operation_duration_seconds",
            "Duration of Vault operations in seconds by operation type",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
        &["operation"],
    )
    .expect("Failed to create STORE_OPERATION_DURATION metric - this should never happen")
});

static STORE_OPERATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "vault_secret_sync_store_operation_errors_total",
            "Total number of failed Vault operations by operation type",
        ),
        &["operation"],
    )
    .expect("Failed to create STORE_OPERATION_ERRORS_TOTAL metric - this should never happen")
});

static TARGET_WRITES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "vault_secret_sync_target_writes_total",
            "Total number of target Secret writes by operation (create, patch)",
        ),
        &["operation"],
    )
    .expect("Failed to create TARGET_WRITES_TOTAL metric - this should never happen")
});

static BACKEND_REACHABLE: LazyLock<IntGaugeVec> = LazyLock::new(|| {
    IntGaugeVec::new(
        prometheus::Opts::new(
            "vault_secret_sync_backend_reachable",
            "Result of the last reachability probe per backend (1 reachable, 0 unreachable)",
        ),
        &["backend"],
    )
    .expect("Failed to create BACKEND_REACHABLE metric - this should never happen")
});

fn register<C>(collector: &C) -> Result<(), prometheus::Error>
where
    C: Collector + Clone + 'static,
{
    match REGISTRY.register(Box::new(collector.clone())) {
        // Registering twice (e.g. several tests in one binary) is harmless
        Ok(()) | Err(prometheus::Error::AlreadyReg) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Register every metric with the service registry
///
/// # Errors
/// Returns an error if a metric descriptor conflicts with an existing one
pub fn register_metrics() -> Result<(), prometheus::Error> {
    register(&*SYNC_RUNS_TOTAL)?;
    register(&*SYNC_RUN_ERRORS_TOTAL)?;
    register(&*SYNC_RUN_DURATION)?;
    register(&*MAPPINGS_TOTAL)?;
    register(&*AUTHENTICATIONS_TOTAL)?;
    register(&*STORE_OPERATIONS_TOTAL)?;
    register(&*STORE_OPERATION_DURATION)?;
    register(&*STORE_OPERATION_ERRORS_TOTAL)?;
    register(&*TARGET_WRITES_TOTAL)?;
    register(&*BACKEND_REACHABLE)?;

    Ok(())
}

pub fn increment_sync_runs() {
    SYNC_RUNS_TOTAL.inc();
}

pub fn increment_sync_run_errors() {
    SYNC_RUN_ERRORS_TOTAL.inc();
}

pub fn observe_sync_run_duration(duration: f64) {
    SYNC_RUN_DURATION.observe(duration);
}

/// Count one mapping outcome (`synced`, `skipped` or `failed`)
pub fn record_mapping_outcome(outcome: &str) {
    MAPPINGS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn increment_authentications() {
    AUTHENTICATIONS_TOTAL.inc();
}

pub fn record_store_operation(operation: &str, duration: f64) {
    STORE_OPERATIONS_TOTAL.with_label_values(&[operation]).inc();
    STORE_OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn increment_store_operation_errors(operation: &str) {
    STORE_OPERATION_ERRORS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

pub fn record_target_write(operation: &str) {
    TARGET_WRITES_TOTAL.with_label_values(&[operation]).inc();
}

pub fn set_backend_reachable(backend: &str, reachable: bool) {
    BACKEND_REACHABLE
        .with_label_values(&[backend])
        .set(i64::from(reachable));
}

/// Gather every registered metric family
pub(crate) fn gather() -> Vec<prometheus::proto::MetricFamily> {
    REGISTRY.gather()
}
