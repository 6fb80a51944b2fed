// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! External certificate authority and DNS provider interfaces.
//!
//! The reconcilers never talk to an SDK directly. They go through the
//! [`CertificateAuthority`] and [`DnsProvider`] traits, which speak in the
//! provider-neutral types defined here. Production implementations live in
//! [`acm`] (AWS Certificate Manager) and [`route53`] (Amazon Route 53).
//!
//! # Example
//!
//! ```rust,no_run
//! use acm_manager::providers::{acm::AcmCertificateAuthority, CertificateAuthority, REUSABLE_STATUSES};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let sdk_config = aws_config::load_from_env().await;
//! let acm = AcmCertificateAuthority::new(&sdk_config);
//! for cert in acm.list_certificates(&REUSABLE_STATUSES).await? {
//!     println!("{} {}", cert.domain_name, cert.arn);
//! }
//! # Ok(())
//! # }
//! ```

pub mod acm;
pub mod route53;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;

use crate::cert_errors::ProviderError;

/// Lifecycle status of a certificate as reported by the certificate authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertificateStatus {
    PendingValidation,
    Issued,
    Inactive,
    Expired,
    ValidationTimedOut,
    Revoked,
    Failed,
    /// A status this controller does not know about
    Unknown,
}

impl CertificateStatus {
    /// Wire name of the status as used by ACM.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingValidation => "PENDING_VALIDATION",
            Self::Issued => "ISSUED",
            Self::Inactive => "INACTIVE",
            Self::Expired => "EXPIRED",
            Self::ValidationTimedOut => "VALIDATION_TIMED_OUT",
            Self::Revoked => "REVOKED",
            Self::Failed => "FAILED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statuses eligible for reuse and for cleanup. `FAILED` certificates are
/// deliberately absent so a failed request is replaced on the next reconcile.
pub const REUSABLE_STATUSES: [CertificateStatus; 2] =
    [CertificateStatus::Issued, CertificateStatus::PendingValidation];

/// One entry of a certificate listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSummary {
    pub arn: String,
    pub domain_name: String,
}

/// Parameters of a new DNS-validated certificate request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateRequest {
    /// Primary domain, already wildcard-prefixed when requested
    pub domain_name: String,
    pub subject_alternative_names: Vec<String>,
    pub tags: BTreeMap<String, String>,
}

/// A DNS record the certificate authority requires before it issues.
///
/// Equality and hashing cover name, type and value, which makes the record its
/// own deduplication key: two domains of one certificate frequently share the
/// same validation record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidationRecord {
    pub name: String,
    pub record_type: String,
    pub value: String,
}

impl fmt::Display for ValidationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.record_type, self.value)
    }
}

/// Validation requirement for one domain of a certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainValidation {
    pub domain_name: String,
    /// Absent until the authority has generated the record
    pub record: Option<ValidationRecord>,
}

/// Current state of a single certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateDetail {
    pub arn: String,
    pub status: CertificateStatus,
    pub failure_reason: Option<String>,
    pub domain_validations: Vec<DomainValidation>,
}

/// A DNS hosted zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZone {
    /// Identifier as returned by the provider, possibly path-prefixed
    pub id: String,
    /// Zone apex, possibly with a trailing dot
    pub name: String,
}

/// Certificate authority operations consumed by the controller.
#[async_trait]
pub trait CertificateAuthority: Send + Sync {
    /// List certificates in any of the given statuses, across all pages.
    async fn list_certificates(
        &self,
        statuses: &[CertificateStatus],
    ) -> Result<Vec<CertificateSummary>, ProviderError>;

    /// Request a DNS-validated certificate and return its ARN.
    async fn request_certificate(&self, request: &CertificateRequest)
        -> Result<String, ProviderError>;

    /// Fetch status and validation requirements of a certificate.
    async fn describe_certificate(&self, arn: &str) -> Result<CertificateDetail, ProviderError>;

    /// Delete a certificate.
    async fn delete_certificate(&self, arn: &str) -> Result<(), ProviderError>;
}

/// DNS provider operations consumed by the controller.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every hosted zone, across all pages.
    async fn list_hosted_zones(&self) -> Result<Vec<HostedZone>, ProviderError>;

    /// Create or replace a single-value record set.
    async fn upsert_record(
        &self,
        zone_id: &str,
        record: &ValidationRecord,
        ttl_secs: i64,
    ) -> Result<(), ProviderError>;
}
