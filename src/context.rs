// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for the Ingress controller.
//!
//! The controller hands every reconcile an `Arc<Context>` holding:
//! - The certificate authority (ACM) and DNS provider (Route 53)
//! - The writer used to patch Ingress finalizers and annotations
//! - Per-domain locks serializing certificate issuance
//! - The validation wait policy

use aws_config::SdkConfig;
use kube::Client;
use std::sync::Arc;

use crate::providers::acm::AcmCertificateAuthority;
use crate::providers::route53::Route53DnsProvider;
use crate::providers::{CertificateAuthority, DnsProvider};
use crate::reconcilers::certificate::ValidationPolicy;
use crate::reconcilers::finalizers::{IngressWriter, KubeIngressWriter};
use crate::reconcilers::locks::DomainLocks;

/// Shared context passed to the Ingress reconciler.
#[derive(Clone)]
pub struct Context {
    /// Certificate authority used to list, request, describe and delete certificates
    pub certificates: Arc<dyn CertificateAuthority>,

    /// DNS provider receiving validation records
    pub dns: Arc<dyn DnsProvider>,

    /// Kubernetes writes against the reconciled Ingress
    pub ingresses: Arc<dyn IngressWriter>,

    /// In-process mutual exclusion per certificate domain
    pub locks: DomainLocks,

    /// How long and how often to poll for issuance
    pub validation: ValidationPolicy,
}

impl Context {
    /// Build the production context from a Kubernetes client and AWS SDK configuration.
    #[must_use]
    pub fn new(client: Client, sdk_config: &SdkConfig) -> Self {
        Self {
            certificates: Arc::new(AcmCertificateAuthority::new(sdk_config)),
            dns: Arc::new(Route53DnsProvider::new(sdk_config)),
            ingresses: Arc::new(KubeIngressWriter::new(client)),
            locks: DomainLocks::default(),
            validation: ValidationPolicy::default(),
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("locks", &self.locks)
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}
