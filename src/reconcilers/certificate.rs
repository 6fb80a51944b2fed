// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Certificate lifecycle: reuse or request, validate, wait for issuance.
//!
//! `ensure_certificate` returns the ARN of a certificate for the Ingress
//! domain. An existing `ISSUED` or `PENDING_VALIDATION` certificate is reused
//! when allowed; otherwise a DNS-validated certificate is requested, its
//! validation records are written to Route 53, and ACM is polled until the
//! certificate is issued, fails, or the validation deadline passes.
//!
//! Reuse matches the resolved domain itself. Only the request carries the
//! `*.` prefix when a wildcard is wanted.
//!
//! The whole sequence runs under the domain's [`DomainLocks`] entry so
//! concurrent reconciles of one domain never request duplicates from this
//! replica.
//!
//! [`DomainLocks`]: super::locks::DomainLocks

use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::validation::create_validation_records;
use crate::annotations::ResolvedConfig;
use crate::cert_errors::CertificateError;
use crate::constants::{
    VALIDATION_POLL_INTERVAL_SECS, VALIDATION_PROGRESS_EVERY, VALIDATION_TIMEOUT_SECS,
};
use crate::context::Context;
use crate::labels::{MANAGED_BY_ACM_MANAGER, TAG_MANAGED_BY};
use crate::metrics;
use crate::providers::{
    CertificateAuthority, CertificateRequest, CertificateStatus, REUSABLE_STATUSES,
};

/// How the controller waits for a requested certificate to be issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Delay between status checks
    pub poll_interval: Duration,
    /// Overall deadline measured from the first status check
    pub timeout: Duration,
    /// Emit a progress log line every this many status checks
    pub progress_every: u32,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(VALIDATION_POLL_INTERVAL_SECS),
            timeout: Duration::from_secs(VALIDATION_TIMEOUT_SECS),
            progress_every: VALIDATION_PROGRESS_EVERY,
        }
    }
}

/// Name the certificate is issued for: `*.`-prefixed when a wildcard is wanted.
#[must_use]
pub fn certificate_domain(domain: &str, wildcard: bool) -> String {
    if wildcard {
        format!("*.{domain}")
    } else {
        domain.to_string()
    }
}

/// Build the ACM request for `domain`, tagged as managed by this controller.
#[must_use]
pub fn build_request(domain: &str, config: &ResolvedConfig) -> CertificateRequest {
    CertificateRequest {
        domain_name: certificate_domain(domain, config.wildcard),
        subject_alternative_names: config.sans.clone(),
        tags: BTreeMap::from([(
            TAG_MANAGED_BY.to_string(),
            MANAGED_BY_ACM_MANAGER.to_string(),
        )]),
    }
}

/// Find the first reusable certificate whose domain equals `domain`,
/// ignoring case.
///
/// # Errors
///
/// Returns [`CertificateError::Provider`] if listing certificates fails.
pub async fn find_reusable_certificate(
    ca: &dyn CertificateAuthority,
    domain: &str,
) -> Result<Option<String>, CertificateError> {
    let certificates = ca.list_certificates(&REUSABLE_STATUSES).await?;
    Ok(certificates
        .into_iter()
        .find(|cert| cert.domain_name.eq_ignore_ascii_case(domain))
        .map(|cert| cert.arn))
}

/// Return the ARN of a certificate covering `domain`, requesting and
/// validating one if none can be reused.
///
/// # Errors
///
/// Any failure after the request carries the ARN of the pending certificate,
/// which is left in place (see [`CertificateError::arn`]).
pub async fn ensure_certificate(
    ctx: &Context,
    domain: &str,
    config: &ResolvedConfig,
) -> Result<String, CertificateError> {
    let _guard = ctx.locks.lock(domain).await;

    if config.reuse_existing {
        if let Some(arn) = find_reusable_certificate(ctx.certificates.as_ref(), domain).await? {
            info!(domain = %domain, arn = %arn, "Reusing existing ACM certificate");
            metrics::record_certificate_reused();
            return Ok(arn);
        }
        debug!(domain = %domain, "No reusable certificate found");
    }

    let request = build_request(domain, config);
    let arn = ctx.certificates.request_certificate(&request).await?;
    metrics::record_certificate_requested();
    info!(
        domain = %request.domain_name,
        sans = ?request.subject_alternative_names,
        arn = %arn,
        "Requested ACM certificate"
    );

    create_validation_records(
        ctx.certificates.as_ref(),
        ctx.dns.as_ref(),
        &arn,
        config.zone_id.as_deref(),
    )
    .await
    .map_err(|source| CertificateError::ValidationRecords {
        arn: arn.clone(),
        source,
    })?;

    wait_for_issuance(ctx.certificates.as_ref(), &arn, &ctx.validation).await?;
    Ok(arn)
}

/// Poll `arn` until it is issued, fails, or the policy deadline passes.
///
/// # Errors
///
/// - [`CertificateError::ValidationFailed`] when ACM marks it `FAILED`
/// - [`CertificateError::ValidationTimeout`] when the deadline passes
/// - [`CertificateError::StatusCheck`] when a describe call fails
pub async fn wait_for_issuance(
    ca: &dyn CertificateAuthority,
    arn: &str,
    policy: &ValidationPolicy,
) -> Result<(), CertificateError> {
    let started = Instant::now();
    let deadline = started + policy.timeout;
    let mut attempts: u32 = 0;

    loop {
        if Instant::now() > deadline {
            warn!(arn = %arn, attempts, "Timed out waiting for ACM certificate validation");
            return Err(CertificateError::ValidationTimeout {
                arn: arn.to_string(),
                waited: started.elapsed(),
            });
        }

        let detail = ca
            .describe_certificate(arn)
            .await
            .map_err(|source| CertificateError::StatusCheck {
                arn: arn.to_string(),
                source,
            })?;

        attempts += 1;
        if policy.progress_every > 0 && attempts % policy.progress_every == 0 {
            info!(
                arn = %arn,
                attempt = attempts,
                status = %detail.status,
                "Waiting for ACM certificate validation"
            );
        }

        match detail.status {
            CertificateStatus::Issued => {
                let elapsed = started.elapsed();
                metrics::record_certificate_issued(elapsed);
                info!(arn = %arn, elapsed_secs = elapsed.as_secs(), "ACM certificate issued");
                return Ok(());
            }
            CertificateStatus::Failed => {
                return Err(CertificateError::ValidationFailed {
                    arn: arn.to_string(),
                    reason: detail
                        .failure_reason
                        .unwrap_or_else(|| "unknown".to_string()),
                });
            }
            _ => tokio::time::sleep(policy.poll_interval).await,
        }
    }
}

#[cfg(test)]
#[path = "certificate_tests.rs"]
mod certificate_tests;
