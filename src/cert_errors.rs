// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Certificate lifecycle and DNS validation error types.
//!
//! This module provides specialized error types for:
//! - Certificate authority and DNS provider API failures
//! - Hosted zone resolution for validation records
//! - DNS validation record creation
//! - Certificate issuance (timeouts, validation failures)
//! - Invalid Ingress configuration
//!
//! None of these are retried in-process. They propagate to the controller, whose
//! error policy requeues the Ingress.

use std::time::Duration;
use thiserror::Error;

use crate::providers::ValidationRecord;

/// Errors returned by a certificate authority or DNS provider API call.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// The API call itself failed (throttling, network, permissions, ...)
    ///
    /// Treated as transient: the Ingress is requeued with the controller's backoff.
    #[error("{service} {operation} failed: {reason}")]
    Api {
        /// Service that was called (e.g. `ACM`, `Route53`)
        service: &'static str,
        /// API operation (e.g. `RequestCertificate`)
        operation: &'static str,
        /// Error message reported by the SDK
        reason: String,
    },

    /// The API call succeeded but the response lacked a required field
    #[error("{service} {operation} returned an incomplete response: {reason}")]
    MalformedResponse {
        /// Service that was called
        service: &'static str,
        /// API operation
        operation: &'static str,
        /// What was missing
        reason: String,
    },
}

/// Errors resolving the hosted zone that should receive a validation record.
#[derive(Error, Debug, Clone)]
pub enum ZoneError {
    /// No hosted zone name is a suffix of the domain
    #[error("No matching hosted zone found for domain '{domain}'")]
    NoMatchingZone {
        /// Domain that could not be placed in a zone
        domain: String,
    },

    /// Listing hosted zones failed
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Errors creating DNS validation records for a certificate.
#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    /// Reading the certificate's validation requirements failed
    #[error("Failed to describe certificate: {0}")]
    Describe(#[source] ProviderError),

    /// No hosted zone could be inferred for a validation record
    #[error("Failed to infer hosted zone for validation record {record}: {source}")]
    Zone {
        /// Record that needed a zone
        record: ValidationRecord,
        /// Why the zone could not be resolved
        #[source]
        source: ZoneError,
    },

    /// The record upsert was rejected
    #[error("Failed to upsert validation record {record} in zone {zone_id}: {source}")]
    Upsert {
        /// Record being written
        record: ValidationRecord,
        /// Target hosted zone
        zone_id: String,
        /// Provider failure
        #[source]
        source: ProviderError,
    },
}

/// Errors from the certificate lifecycle (reuse, request, validation, issuance).
///
/// Every variant raised after a certificate was requested carries its ARN so
/// callers can correlate the failure with the pending certificate, which is
/// never rolled back.
#[derive(Error, Debug, Clone)]
pub enum CertificateError {
    /// Listing, requesting or describing a certificate failed
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Validation records for a freshly requested certificate could not be created
    #[error("Failed to create DNS validation records for certificate {arn}: {source}")]
    ValidationRecords {
        /// ARN of the requested certificate
        arn: String,
        /// Underlying failure
        #[source]
        source: ValidationError,
    },

    /// Describing the certificate while waiting for issuance failed
    #[error("Failed to check status of certificate {arn}: {source}")]
    StatusCheck {
        /// ARN of the requested certificate
        arn: String,
        /// Underlying failure
        #[source]
        source: ProviderError,
    },

    /// The certificate authority marked the certificate as failed
    #[error("Certificate {arn} validation failed: {reason}")]
    ValidationFailed {
        /// ARN of the failed certificate
        arn: String,
        /// Failure reason reported by the authority
        reason: String,
    },

    /// The certificate did not reach `ISSUED` before the deadline
    ///
    /// The certificate may still be issued later; the next resync picks it up
    /// through the reuse path.
    #[error("Certificate {arn} validation timed out after {}s", .waited.as_secs())]
    ValidationTimeout {
        /// ARN of the pending certificate
        arn: String,
        /// How long the controller waited
        waited: Duration,
    },
}

impl CertificateError {
    /// ARN of the certificate this error relates to, if one had been requested.
    #[must_use]
    pub fn arn(&self) -> Option<&str> {
        match self {
            Self::Provider(_) => None,
            Self::ValidationRecords { arn, .. }
            | Self::StatusCheck { arn, .. }
            | Self::ValidationFailed { arn, .. }
            | Self::ValidationTimeout { arn, .. } => Some(arn),
        }
    }

    /// Short machine readable category, used as a metrics label.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Provider(_) | Self::StatusCheck { .. } => "api_error",
            Self::ValidationRecords {
                source:
                    ValidationError::Zone {
                        source: ZoneError::NoMatchingZone { .. },
                        ..
                    },
                ..
            } => "zone_not_found",
            Self::ValidationRecords { .. } => "validation_record_error",
            Self::ValidationFailed { .. } => "certificate_failed",
            Self::ValidationTimeout { .. } => "validation_timeout",
        }
    }
}

/// Errors in the Ingress configuration that make reconciliation impossible.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// Neither the domain annotation nor a rule host provides a domain
    #[error(
        "Ingress {namespace}/{name} has no domain: set acm.tedens.dev/domain or a host on the first rule"
    )]
    EmptyDomain {
        /// Ingress namespace
        namespace: String,
        /// Ingress name
        name: String,
    },
}

#[cfg(test)]
#[path = "cert_errors_tests.rs"]
mod cert_errors_tests;
