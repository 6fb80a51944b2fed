// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Amazon Route 53 implementation of [`DnsProvider`].

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_route53::error::DisplayErrorContext;
use aws_sdk_route53::types::{
    Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};
use aws_sdk_route53::Client as Route53Client;
use tracing::debug;

use super::{DnsProvider, HostedZone, ValidationRecord};
use crate::cert_errors::ProviderError;

const SERVICE: &str = "Route53";

/// DNS provider backed by Amazon Route 53.
#[derive(Clone)]
pub struct Route53DnsProvider {
    client: Route53Client,
}

impl std::fmt::Debug for Route53DnsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route53DnsProvider").finish_non_exhaustive()
    }
}

impl Route53DnsProvider {
    /// Create a client from a loaded AWS SDK configuration.
    #[must_use]
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Route53Client::new(sdk_config),
        }
    }
}

fn api_error(operation: &'static str, err: &impl std::error::Error) -> ProviderError {
    ProviderError::Api {
        service: SERVICE,
        operation,
        reason: DisplayErrorContext(err).to_string(),
    }
}

/// Build the single-record UPSERT batch for a validation record.
fn upsert_batch(record: &ValidationRecord, ttl_secs: i64) -> Result<ChangeBatch, ProviderError> {
    let build_error =
        |e: aws_sdk_route53::error::BuildError| api_error("ChangeResourceRecordSets", &e);

    let record_set = ResourceRecordSet::builder()
        .name(&record.name)
        .r#type(RrType::from(record.record_type.as_str()))
        .ttl(ttl_secs)
        .resource_records(
            ResourceRecord::builder()
                .value(&record.value)
                .build()
                .map_err(build_error)?,
        )
        .build()
        .map_err(build_error)?;

    let change = Change::builder()
        .action(ChangeAction::Upsert)
        .resource_record_set(record_set)
        .build()
        .map_err(build_error)?;

    ChangeBatch::builder()
        .changes(change)
        .build()
        .map_err(build_error)
}

#[async_trait]
impl DnsProvider for Route53DnsProvider {
    async fn list_hosted_zones(&self) -> Result<Vec<HostedZone>, ProviderError> {
        let mut zones = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let output = self
                .client
                .list_hosted_zones()
                .set_marker(marker.take())
                .send()
                .await
                .map_err(|e| api_error("ListHostedZones", &e))?;

            zones.extend(output.hosted_zones().iter().map(|zone| HostedZone {
                id: zone.id().to_string(),
                name: zone.name().to_string(),
            }));

            match output.next_marker() {
                Some(next) if output.is_truncated() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        debug!(count = zones.len(), "Listed Route 53 hosted zones");
        Ok(zones)
    }

    async fn upsert_record(
        &self,
        zone_id: &str,
        record: &ValidationRecord,
        ttl_secs: i64,
    ) -> Result<(), ProviderError> {
        self.client
            .change_resource_record_sets()
            .hosted_zone_id(zone_id)
            .change_batch(upsert_batch(record, ttl_secs)?)
            .send()
            .await
            .map_err(|e| api_error("ChangeResourceRecordSets", &e))?;
        Ok(())
    }
}
