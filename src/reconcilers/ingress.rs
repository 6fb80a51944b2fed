// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Ingress reconciliation: finalizer lifecycle and certificate attachment.
//!
//! Each pass resolves the Ingress annotations and picks a phase from three
//! facts: whether the Ingress is managed, whether it is being deleted, and
//! whether our finalizer is present.
//!
//! | managed | deleting | finalizer | phase |
//! |---|---|---|---|
//! | no | any | any | [`ReconcilePhase::Unmanaged`] |
//! | yes | no | no | [`ReconcilePhase::EnsureFinalizer`], then active |
//! | yes | no | yes | [`ReconcilePhase::Active`] |
//! | yes | yes | yes | [`ReconcilePhase::Cleanup`] |
//! | yes | yes | no | [`ReconcilePhase::AlreadyFinalized`] |
//!
//! The active phase ensures a certificate and writes its ARN to the
//! `alb.ingress.kubernetes.io/certificate-arn` annotation. Cleanup optionally
//! deletes the certificate and only then releases the finalizer, so a failed
//! deletion blocks the Ingress from going away until it succeeds.

use anyhow::{Context as _, Result};
use k8s_openapi::api::networking::v1::Ingress;
use kube::runtime::controller::Action;
use kube::ResourceExt;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::certificate::ensure_certificate;
use super::cleanup::delete_certificate_for_domain;
use super::finalizers::has_finalizer;
use crate::annotations::{annotation_warnings, resolve_annotations, ResolvedConfig};
use crate::cert_errors::{CertificateError, ConfigError, ProviderError};
use crate::constants::RESYNC_INTERVAL_SECS;
use crate::context::Context;
use crate::labels::{CERTIFICATE_ARN_ANNOTATION, FINALIZER_INGRESS};

/// Where an Ingress is in its certificate lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePhase {
    /// Not managed by this controller; nothing to do
    Unmanaged,
    /// Managed, live, finalizer missing
    EnsureFinalizer,
    /// Managed, live, finalizer present
    Active,
    /// Being deleted with our finalizer still present
    Cleanup,
    /// Being deleted and already released by us
    AlreadyFinalized,
}

/// Result of a reconcile pass, mapped onto a controller action by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Unmanaged,
    /// A certificate is attached to the Ingress
    Certified { arn: String },
    /// Cleanup ran and the finalizer was removed
    Finalized,
    AlreadyFinalized,
}

impl ReconcileOutcome {
    /// Controller action after a successful pass. Certified Ingresses are
    /// resynced periodically to pick up out-of-band certificate changes.
    #[must_use]
    pub fn action(&self) -> Action {
        match self {
            Self::Certified { .. } => Action::requeue(Duration::from_secs(RESYNC_INTERVAL_SECS)),
            Self::Unmanaged | Self::Finalized | Self::AlreadyFinalized => Action::await_change(),
        }
    }
}

/// Pick the reconcile phase.
#[must_use]
pub fn determine_phase(
    managed: bool,
    being_deleted: bool,
    finalizer_present: bool,
) -> ReconcilePhase {
    match (managed, being_deleted, finalizer_present) {
        (false, _, _) => ReconcilePhase::Unmanaged,
        (true, false, false) => ReconcilePhase::EnsureFinalizer,
        (true, false, true) => ReconcilePhase::Active,
        (true, true, true) => ReconcilePhase::Cleanup,
        (true, true, false) => ReconcilePhase::AlreadyFinalized,
    }
}

/// Domain the certificate is for: the domain annotation if set, else the
/// host of the first rule, else empty.
#[must_use]
pub fn resolve_domain(ingress: &Ingress, config: &ResolvedConfig) -> String {
    if let Some(domain) = &config.domain_override {
        return domain.clone();
    }
    ingress
        .spec
        .as_ref()
        .and_then(|spec| spec.rules.as_ref())
        .and_then(|rules| rules.first())
        .and_then(|rule| rule.host.clone())
        .unwrap_or_default()
}

/// Reconcile one Ingress.
///
/// # Errors
///
/// Returns an error if any Kubernetes write, ACM or Route 53 call fails, if
/// the certificate fails or times out validation, or if a managed Ingress has
/// no domain. The Ingress annotation is only written on success.
pub async fn reconcile_ingress(ctx: &Context, ingress: &Ingress) -> Result<ReconcileOutcome> {
    let namespace = ingress.namespace().unwrap_or_default();
    let name = ingress.name_any();
    let annotations = ingress.metadata.annotations.as_ref();

    let config = resolve_annotations(annotations);
    let phase = determine_phase(
        config.managed,
        ingress.metadata.deletion_timestamp.is_some(),
        has_finalizer(ingress, FINALIZER_INGRESS),
    );

    if phase == ReconcilePhase::Unmanaged {
        debug!("Ingress {}/{} is not managed, skipping", namespace, name);
        return Ok(ReconcileOutcome::Unmanaged);
    }

    for warning in annotation_warnings(annotations) {
        warn!("Ingress {}/{}: {}", namespace, name, warning);
    }

    let domain = resolve_domain(ingress, &config);

    match phase {
        ReconcilePhase::Unmanaged => Ok(ReconcileOutcome::Unmanaged),
        ReconcilePhase::AlreadyFinalized => {
            debug!("Ingress {}/{} already finalized", namespace, name);
            Ok(ReconcileOutcome::AlreadyFinalized)
        }
        ReconcilePhase::Cleanup => finalize(ctx, ingress, &config, &domain).await,
        ReconcilePhase::EnsureFinalizer => {
            ctx.ingresses
                .add_finalizer(ingress, FINALIZER_INGRESS)
                .await
                .with_context(|| format!("Failed to add finalizer to Ingress {namespace}/{name}"))?;
            certify(ctx, ingress, &config, &domain).await
        }
        ReconcilePhase::Active => certify(ctx, ingress, &config, &domain).await,
    }
}

async fn certify(
    ctx: &Context,
    ingress: &Ingress,
    config: &ResolvedConfig,
    domain: &str,
) -> Result<ReconcileOutcome> {
    let namespace = ingress.namespace().unwrap_or_default();
    let name = ingress.name_any();

    if domain.is_empty() {
        return Err(ConfigError::EmptyDomain { namespace, name }.into());
    }

    info!(domain = %domain, "Reconciling managed Ingress {}/{}", namespace, name);

    let arn = ensure_certificate(ctx, domain, config)
        .await
        .with_context(|| format!("Failed to ensure certificate for domain {domain}"))?;

    ctx.ingresses
        .set_annotation(ingress, CERTIFICATE_ARN_ANNOTATION, &arn)
        .await
        .with_context(|| {
            format!("Failed to patch Ingress {namespace}/{name} with certificate ARN {arn}")
        })?;

    info!(arn = %arn, "Patched Ingress {}/{} with ACM certificate ARN", namespace, name);
    Ok(ReconcileOutcome::Certified { arn })
}

async fn finalize(
    ctx: &Context,
    ingress: &Ingress,
    config: &ResolvedConfig,
    domain: &str,
) -> Result<ReconcileOutcome> {
    let namespace = ingress.namespace().unwrap_or_default();
    let name = ingress.name_any();

    if config.delete_cert_on_delete {
        if domain.is_empty() {
            warn!(
                "Ingress {}/{} has no domain, skipping certificate deletion",
                namespace, name
            );
        } else {
            info!(
                domain = %domain,
                "Ingress {}/{} is being deleted, deleting associated ACM certificate",
                namespace,
                name
            );
            delete_certificate_for_domain(ctx.certificates.as_ref(), domain)
                .await
                .with_context(|| format!("Failed to delete ACM certificate for {domain}"))?;
        }
    }

    ctx.ingresses
        .remove_finalizer(ingress, FINALIZER_INGRESS)
        .await
        .with_context(|| format!("Failed to remove finalizer from Ingress {namespace}/{name}"))?;

    Ok(ReconcileOutcome::Finalized)
}

/// Metrics category of a reconcile error.
#[must_use]
pub fn error_type(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<CertificateError>() {
            return e.error_type();
        }
        if cause.downcast_ref::<ConfigError>().is_some() {
            return "config_error";
        }
        if cause.downcast_ref::<ProviderError>().is_some() {
            return "api_error";
        }
        if cause.downcast_ref::<kube::Error>().is_some() {
            return "kubernetes_error";
        }
    }
    "unknown"
}

#[cfg(test)]
#[path = "ingress_tests.rs"]
mod ingress_tests;
