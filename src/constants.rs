// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the ACM manager.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Certificate Validation Constants
// ============================================================================

/// Interval between two `DescribeCertificate` polls while waiting for issuance
pub const VALIDATION_POLL_INTERVAL_SECS: u64 = 15;

/// Overall deadline for a newly requested certificate to reach `ISSUED` (10 minutes)
pub const VALIDATION_TIMEOUT_SECS: u64 = 600;

/// Emit a progress log line every N polls
pub const VALIDATION_PROGRESS_EVERY: u32 = 4;

/// TTL of the Route 53 validation records (5 minutes)
pub const VALIDATION_RECORD_TTL_SECS: i64 = 300;

/// Default certificate lifetime when `cert-ttl` is absent or malformed (365 days)
pub const DEFAULT_CERT_TTL_SECS: u64 = 365 * 24 * 3600;

/// Prefix Route 53 puts in front of hosted zone identifiers
pub const HOSTED_ZONE_ID_PREFIX: &str = "/hostedzone/";

// ============================================================================
// Controller Requeue Constants
// ============================================================================

/// Resync interval after a successful reconcile (12 hours)
pub const RESYNC_INTERVAL_SECS: u64 = 12 * 3600;

/// Requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

// ============================================================================
// Kubernetes Version Constants
// ============================================================================

/// Oldest Kubernetes minor release the controller is supported on
pub const DEFAULT_MIN_KUBERNETES_VERSION: &str = "1.32";

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

/// Thread name prefix for the Tokio runtime
pub const TOKIO_THREAD_NAME: &str = "acm-manager";

// ============================================================================
// Probe / Metrics Server Constants
// ============================================================================

/// Default bind address for the health, readiness and metrics endpoints
pub const DEFAULT_HEALTH_PROBE_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Path for the liveness probe
pub const HEALTHZ_PATH: &str = "/healthz";

/// Path for the readiness probe
pub const READYZ_PATH: &str = "/readyz";
