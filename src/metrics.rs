// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the ACM certificate controller.
//!
//! All metrics carry the namespace prefix `acm_tedens_dev_` (prometheus-safe
//! version of "acm.tedens.dev").
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Ingress reconciliations and their outcomes
//! - **Certificate Metrics** - Requests, reuse, deletions and validation time
//! - **Error Metrics** - Failures by category
//!
//! # Example
//!
//! ```rust,no_run
//! use acm_manager::metrics::record_reconciliation_success;
//!
//! record_reconciliation_success(std::time::Duration::from_secs(1));
//! ```

use prometheus::{
    Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "acm_tedens_dev";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

fn counter(name: &str, help: &str) -> Counter {
    let counter = Counter::with_opts(Opts::new(format!("{METRICS_NAMESPACE}_{name}"), help))
        .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
}

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of Ingress reconciliations by status
///
/// Labels:
/// - `status`: Outcome (`success`, `error`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of Ingress reconciliations by status",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of Ingress reconciliations in seconds, including validation waits
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of Ingress reconciliations in seconds",
    )
    .buckets(vec![0.01, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 180.0, 600.0]);
    let histogram = Histogram::with_opts(opts).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Certificate Metrics
// ============================================================================

/// Total number of certificates requested from ACM
pub static CERTIFICATES_REQUESTED_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    counter(
        "certificates_requested_total",
        "Total number of certificates requested",
    )
});

/// Total number of existing certificates reused instead of requesting
pub static CERTIFICATES_REUSED_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    counter(
        "certificates_reused_total",
        "Total number of existing certificates reused",
    )
});

/// Total number of certificates deleted on Ingress deletion
pub static CERTIFICATES_DELETED_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    counter(
        "certificates_deleted_total",
        "Total number of certificates deleted",
    )
});

/// Total number of DNS validation records upserted
pub static VALIDATION_RECORDS_UPSERTED_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    counter(
        "validation_records_upserted_total",
        "Total number of DNS validation records upserted",
    )
});

/// Time from certificate request to issuance in seconds
pub static CERTIFICATE_VALIDATION_SECONDS: LazyLock<Histogram> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_certificate_validation_seconds"),
        "Time between certificate request and issuance in seconds",
    )
    .buckets(vec![15.0, 30.0, 60.0, 120.0, 180.0, 300.0, 450.0, 600.0]);
    let histogram = Histogram::with_opts(opts).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of errors by category
///
/// Labels:
/// - `error_type`: Category of error (`api_error`, `zone_not_found`,
///   `validation_record_error`, `certificate_failed`, `validation_timeout`,
///   `config_error`, `kubernetes_error`)
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by category",
    );
    let counter = CounterVec::new(opts, &["error_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful reconciliation
pub fn record_reconciliation_success(duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&["success"]).inc();
    RECONCILIATION_DURATION_SECONDS.observe(duration.as_secs_f64());
}

/// Record a failed reconciliation
pub fn record_reconciliation_error(duration: Duration) {
    RECONCILIATION_TOTAL.with_label_values(&["error"]).inc();
    RECONCILIATION_DURATION_SECONDS.observe(duration.as_secs_f64());
}

pub fn record_certificate_requested() {
    CERTIFICATES_REQUESTED_TOTAL.inc();
}

pub fn record_certificate_reused() {
    CERTIFICATES_REUSED_TOTAL.inc();
}

pub fn record_certificate_deleted() {
    CERTIFICATES_DELETED_TOTAL.inc();
}

pub fn record_validation_record_upserted() {
    VALIDATION_RECORDS_UPSERTED_TOTAL.inc();
}

/// Record how long a requested certificate took to be issued
pub fn record_certificate_issued(elapsed: Duration) {
    CERTIFICATE_VALIDATION_SECONDS.observe(elapsed.as_secs_f64());
}

/// Record an error
///
/// # Arguments
/// * `error_type` - Category of error (e.g., `api_error`, `validation_timeout`)
pub fn record_error(error_type: &str) {
    ERRORS_TOTAL.with_label_values(&[error_type]).inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
