// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory fakes of the external collaborators used by reconciler tests.
//!
//! Every fake records the calls it receives so tests can assert on what the
//! controller did (or did not) do against ACM, Route 53 and the Kubernetes API.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use k8s_openapi::api::networking::v1::{Ingress, IngressRule, IngressSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::cert_errors::ProviderError;
use crate::context::Context;
use crate::providers::{
    CertificateAuthority, CertificateDetail, CertificateRequest, CertificateStatus,
    CertificateSummary, DnsProvider, DomainValidation, HostedZone, ValidationRecord,
};
use crate::reconcilers::certificate::ValidationPolicy;
use crate::reconcilers::finalizers::IngressWriter;
use crate::reconcilers::locks::DomainLocks;

pub const TEST_NAMESPACE: &str = "default";
pub const TEST_INGRESS: &str = "web";

fn injected(service: &'static str, operation: &'static str) -> ProviderError {
    ProviderError::Api {
        service,
        operation,
        reason: "injected failure".to_string(),
    }
}

// =====================================================
// Certificate authority
// =====================================================

/// Fake ACM: a static certificate inventory plus a scripted status sequence
/// returned by successive describe calls.
#[derive(Default)]
pub struct FakeCertificateAuthority {
    inventory: Vec<(CertificateSummary, CertificateStatus)>,
    statuses: Mutex<VecDeque<CertificateStatus>>,
    final_status: Option<CertificateStatus>,
    failure_reason: Option<String>,
    validations: Vec<DomainValidation>,
    fail_list: bool,
    fail_request: bool,
    fail_describe: bool,
    fail_delete: bool,
    pub requests: Mutex<Vec<CertificateRequest>>,
    pub deleted: Mutex<Vec<String>>,
    pub list_calls: AtomicUsize,
    pub describe_calls: AtomicUsize,
}

impl FakeCertificateAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an existing certificate to the inventory.
    pub fn with_certificate(mut self, arn: &str, domain: &str, status: CertificateStatus) -> Self {
        self.inventory.push((
            CertificateSummary {
                arn: arn.to_string(),
                domain_name: domain.to_string(),
            },
            status,
        ));
        self
    }

    /// Statuses returned by successive describe calls. Once exhausted the
    /// last one repeats (or `PENDING_VALIDATION` if none was given).
    pub fn with_statuses(mut self, statuses: &[CertificateStatus]) -> Self {
        self.final_status = statuses.last().copied();
        self.statuses = Mutex::new(statuses.iter().copied().collect());
        self
    }

    pub fn with_failure_reason(mut self, reason: &str) -> Self {
        self.failure_reason = Some(reason.to_string());
        self
    }

    /// Add a domain validation requirement with a CNAME record.
    pub fn with_validation(mut self, domain: &str, record: ValidationRecord) -> Self {
        self.validations.push(DomainValidation {
            domain_name: domain.to_string(),
            record: Some(record),
        });
        self
    }

    /// Add a domain validation requirement whose record is not generated yet.
    pub fn with_pending_validation(mut self, domain: &str) -> Self {
        self.validations.push(DomainValidation {
            domain_name: domain.to_string(),
            record: None,
        });
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn failing_request(mut self) -> Self {
        self.fail_request = true;
        self
    }

    pub fn failing_describe(mut self) -> Self {
        self.fail_describe = true;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn deleted_arns(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl CertificateAuthority for FakeCertificateAuthority {
    async fn list_certificates(
        &self,
        statuses: &[CertificateStatus],
    ) -> Result<Vec<CertificateSummary>, ProviderError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list {
            return Err(injected("ACM", "ListCertificates"));
        }
        Ok(self
            .inventory
            .iter()
            .filter(|(_, status)| statuses.contains(status))
            .map(|(summary, _)| summary.clone())
            .collect())
    }

    async fn request_certificate(
        &self,
        request: &CertificateRequest,
    ) -> Result<String, ProviderError> {
        if self.fail_request {
            return Err(injected("ACM", "RequestCertificate"));
        }
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        Ok(format!(
            "arn:aws:acm:us-east-1:123456789012:certificate/new-{}",
            requests.len()
        ))
    }

    async fn describe_certificate(&self, arn: &str) -> Result<CertificateDetail, ProviderError> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_describe {
            return Err(injected("ACM", "DescribeCertificate"));
        }
        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .or(self.final_status)
            .unwrap_or(CertificateStatus::PendingValidation);
        Ok(CertificateDetail {
            arn: arn.to_string(),
            status,
            failure_reason: self.failure_reason.clone(),
            domain_validations: self.validations.clone(),
        })
    }

    async fn delete_certificate(&self, arn: &str) -> Result<(), ProviderError> {
        if self.fail_delete {
            return Err(injected("ACM", "DeleteCertificate"));
        }
        self.deleted.lock().unwrap().push(arn.to_string());
        Ok(())
    }
}

// =====================================================
// DNS provider
// =====================================================

/// A recorded record upsert: (zone id, record, ttl).
pub type Upsert = (String, ValidationRecord, i64);

/// Fake Route 53 with a fixed zone list.
#[derive(Default)]
pub struct FakeDnsProvider {
    zones: Vec<HostedZone>,
    fail_list: bool,
    fail_upsert: bool,
    pub upserts: Mutex<Vec<Upsert>>,
    pub list_calls: AtomicUsize,
}

impl FakeDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zone(mut self, id: &str, name: &str) -> Self {
        self.zones.push(HostedZone {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn failing_upsert(mut self) -> Self {
        self.fail_upsert = true;
        self
    }

    pub fn recorded_upserts(&self) -> Vec<Upsert> {
        self.upserts.lock().unwrap().clone()
    }
}

#[async_trait]
impl DnsProvider for FakeDnsProvider {
    async fn list_hosted_zones(&self) -> Result<Vec<HostedZone>, ProviderError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list {
            return Err(injected("Route53", "ListHostedZones"));
        }
        Ok(self.zones.clone())
    }

    async fn upsert_record(
        &self,
        zone_id: &str,
        record: &ValidationRecord,
        ttl_secs: i64,
    ) -> Result<(), ProviderError> {
        if self.fail_upsert {
            return Err(injected("Route53", "ChangeResourceRecordSets"));
        }
        self.upserts
            .lock()
            .unwrap()
            .push((zone_id.to_string(), record.clone(), ttl_secs));
        Ok(())
    }
}

// =====================================================
// Ingress writer
// =====================================================

/// A write the controller made against an Ingress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressWrite {
    AddFinalizer(String),
    RemoveFinalizer(String),
    SetAnnotation { key: String, value: String },
}

/// Fake Kubernetes writer recording finalizer and annotation patches.
#[derive(Default)]
pub struct FakeIngressWriter {
    fail_annotation: bool,
    pub writes: Mutex<Vec<IngressWrite>>,
}

impl FakeIngressWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_annotation(mut self) -> Self {
        self.fail_annotation = true;
        self
    }

    pub fn recorded_writes(&self) -> Vec<IngressWrite> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl IngressWriter for FakeIngressWriter {
    async fn add_finalizer(&self, _ingress: &Ingress, finalizer: &str) -> Result<()> {
        self.writes
            .lock()
            .unwrap()
            .push(IngressWrite::AddFinalizer(finalizer.to_string()));
        Ok(())
    }

    async fn remove_finalizer(&self, _ingress: &Ingress, finalizer: &str) -> Result<()> {
        self.writes
            .lock()
            .unwrap()
            .push(IngressWrite::RemoveFinalizer(finalizer.to_string()));
        Ok(())
    }

    async fn set_annotation(&self, _ingress: &Ingress, key: &str, value: &str) -> Result<()> {
        if self.fail_annotation {
            return Err(anyhow!("injected annotation patch failure"));
        }
        self.writes.lock().unwrap().push(IngressWrite::SetAnnotation {
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }
}

// =====================================================
// Builders
// =====================================================

/// Bundle of fakes wired into a [`Context`], kept around for assertions.
pub struct Harness {
    pub ca: Arc<FakeCertificateAuthority>,
    pub dns: Arc<FakeDnsProvider>,
    pub writer: Arc<FakeIngressWriter>,
    pub ctx: Context,
}

impl Harness {
    pub fn new(ca: FakeCertificateAuthority, dns: FakeDnsProvider) -> Self {
        Self::with_writer(ca, dns, FakeIngressWriter::new())
    }

    pub fn with_writer(
        ca: FakeCertificateAuthority,
        dns: FakeDnsProvider,
        writer: FakeIngressWriter,
    ) -> Self {
        let ca = Arc::new(ca);
        let dns = Arc::new(dns);
        let writer = Arc::new(writer);
        let ctx = Context {
            certificates: ca.clone(),
            dns: dns.clone(),
            ingresses: writer.clone(),
            locks: DomainLocks::default(),
            validation: ValidationPolicy::default(),
        };
        Self {
            ca,
            dns,
            writer,
            ctx,
        }
    }
}

/// Build an Ingress with the given annotations and rule hosts.
pub fn ingress(annotations: &[(&str, &str)], hosts: &[&str]) -> Ingress {
    let annotations: BTreeMap<String, String> = annotations
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    let rules: Vec<IngressRule> = hosts
        .iter()
        .map(|host| IngressRule {
            host: Some((*host).to_string()),
            ..Default::default()
        })
        .collect();

    Ingress {
        metadata: ObjectMeta {
            name: Some(TEST_INGRESS.to_string()),
            namespace: Some(TEST_NAMESPACE.to_string()),
            annotations: if annotations.is_empty() {
                None
            } else {
                Some(annotations)
            },
            ..Default::default()
        },
        spec: Some(IngressSpec {
            rules: if rules.is_empty() { None } else { Some(rules) },
            ..Default::default()
        }),
        status: None,
    }
}

/// Add a finalizer to a test Ingress.
pub fn with_finalizer(mut ingress: Ingress, finalizer: &str) -> Ingress {
    ingress
        .metadata
        .finalizers
        .get_or_insert_with(Vec::new)
        .push(finalizer.to_string());
    ingress
}

/// Mark a test Ingress as being deleted.
pub fn being_deleted(mut ingress: Ingress) -> Ingress {
    ingress.metadata.deletion_timestamp = Some(Time(k8s_openapi::jiff::Timestamp::now()));
    ingress
}

/// A CNAME validation record for `domain`.
pub fn cname(domain: &str) -> ValidationRecord {
    ValidationRecord {
        name: format!("_a1b2c3.{domain}."),
        record_type: "CNAME".to_string(),
        value: format!("_d4e5f6.{domain}.acm-validations.aws."),
    }
}
