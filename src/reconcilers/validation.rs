// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS validation record creation.
//!
//! Turns the pending domain validations of a certificate into Route 53
//! UPSERTs. Several domains of one certificate often share the same record
//! (e.g. `example.com` and `*.example.com`), so records are deduplicated by
//! name, type and value within a single pass.

use std::collections::HashSet;
use tracing::{debug, info};

use super::hosted_zone::{bare_zone_id, find_hosted_zone};
use crate::cert_errors::ValidationError;
use crate::constants::VALIDATION_RECORD_TTL_SECS;
use crate::metrics;
use crate::providers::{CertificateAuthority, DnsProvider, ValidationRecord};

/// Upsert every validation record `arn` currently requires.
///
/// When `zone_override` is set all records go to that zone; otherwise each
/// record's zone is resolved from the domain it validates. Requirements whose
/// record has not been generated yet are skipped.
///
/// Returns the number of records written.
///
/// # Errors
///
/// The first failure aborts the call: describing the certificate, resolving a
/// zone, or upserting a record.
pub async fn create_validation_records(
    ca: &dyn CertificateAuthority,
    dns: &dyn DnsProvider,
    arn: &str,
    zone_override: Option<&str>,
) -> Result<usize, ValidationError> {
    let detail = ca
        .describe_certificate(arn)
        .await
        .map_err(ValidationError::Describe)?;

    let mut seen: HashSet<ValidationRecord> = HashSet::new();

    for validation in &detail.domain_validations {
        let Some(record) = &validation.record else {
            debug!(arn = %arn, domain = %validation.domain_name, "Validation record not generated yet");
            continue;
        };

        if !seen.insert(record.clone()) {
            debug!(arn = %arn, record = %record, "Skipping duplicate validation record");
            continue;
        }

        let zone_id = match zone_override {
            Some(zone_id) => bare_zone_id(zone_id).to_string(),
            None => find_hosted_zone(dns, &validation.domain_name)
                .await
                .map_err(|source| ValidationError::Zone {
                    record: record.clone(),
                    source,
                })?,
        };

        dns.upsert_record(&zone_id, record, VALIDATION_RECORD_TTL_SECS)
            .await
            .map_err(|source| ValidationError::Upsert {
                record: record.clone(),
                zone_id: zone_id.clone(),
                source,
            })?;

        metrics::record_validation_record_upserted();
        info!(
            arn = %arn,
            zone_id = %zone_id,
            name = %record.name,
            record_type = %record.record_type,
            "Upserted DNS validation record"
        );
    }

    Ok(seen.len())
}

#[cfg(test)]
#[path = "validation_tests.rs"]
mod validation_tests;
