// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Certificate deletion when a managed Ingress goes away.

use tracing::{debug, info};

use crate::cert_errors::ProviderError;
use crate::metrics;
use crate::providers::{CertificateAuthority, REUSABLE_STATUSES};

/// Delete the first `ISSUED` or `PENDING_VALIDATION` certificate whose domain
/// equals `domain`, ignoring case.
///
/// Returns the ARN that was deleted, or `None` when nothing matched. Only one
/// certificate is removed even if several exist for the domain.
///
/// # Errors
///
/// Returns the provider error if listing or deleting fails. Callers keep the
/// Ingress finalizer in that case so deletion is retried.
pub async fn delete_certificate_for_domain(
    ca: &dyn CertificateAuthority,
    domain: &str,
) -> Result<Option<String>, ProviderError> {
    let certificates = ca.list_certificates(&REUSABLE_STATUSES).await?;

    let Some(certificate) = certificates
        .into_iter()
        .find(|cert| cert.domain_name.eq_ignore_ascii_case(domain))
    else {
        debug!(domain = %domain, "No certificate to delete");
        return Ok(None);
    };

    ca.delete_certificate(&certificate.arn).await?;
    metrics::record_certificate_deleted();
    info!(domain = %domain, arn = %certificate.arn, "Deleted ACM certificate");

    Ok(Some(certificate.arn))
}

#[cfg(test)]
#[path = "cleanup_tests.rs"]
mod cleanup_tests;
