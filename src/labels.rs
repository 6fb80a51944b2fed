// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Annotation keys and marker tokens read from or written to `Ingress` resources.
//!
//! Every key the controller reads lives under [`ANNOTATION_PREFIX`]. The only key it
//! writes is [`CERTIFICATE_ARN_ANNOTATION`], which the AWS Load Balancer Controller
//! consumes to attach the certificate to the listener.

// ============================================================================
// Input Annotations (acm.tedens.dev/*)
// ============================================================================

/// Common prefix of all annotations understood by the controller
pub const ANNOTATION_PREFIX: &str = "acm.tedens.dev/";

/// Master switch: the Ingress is ignored unless this is `"true"`
pub const ANNOTATION_MANAGED: &str = "acm.tedens.dev/managed";

/// Overrides the domain inferred from the first Ingress rule
pub const ANNOTATION_DOMAIN: &str = "acm.tedens.dev/domain";

/// Overrides Route 53 hosted zone inference for validation records
pub const ANNOTATION_ZONE_ID: &str = "acm.tedens.dev/zone-id";

/// Requests `*.<domain>` instead of `<domain>`
pub const ANNOTATION_WILDCARD: &str = "acm.tedens.dev/wildcard";

/// Reuse an issued or pending certificate for the domain (default on)
pub const ANNOTATION_REUSE_EXISTING: &str = "acm.tedens.dev/reuse-existing";

/// Delete the certificate when the Ingress is deleted
pub const ANNOTATION_DELETE_CERT_ON_INGRESS_DELETE: &str =
    "acm.tedens.dev/delete-cert-on-ingress-delete";

/// Comma separated subject alternative names
pub const ANNOTATION_SAN: &str = "acm.tedens.dev/san";

/// Desired certificate lifetime (informational)
pub const ANNOTATION_CERT_TTL: &str = "acm.tedens.dev/cert-ttl";

/// Parsed and carried, no behavior attached yet
pub const ANNOTATION_FALLBACK_WILDCARD: &str = "acm.tedens.dev/fallback-wildcard";

// ============================================================================
// Output Annotations
// ============================================================================

/// Certificate ARN consumed by the AWS Load Balancer Controller
pub const CERTIFICATE_ARN_ANNOTATION: &str = "alb.ingress.kubernetes.io/certificate-arn";

// ============================================================================
// Finalizers
// ============================================================================

/// Finalizer that defers Ingress deletion until certificate cleanup has run
pub const FINALIZER_INGRESS: &str = "acm.tedens.dev/finalizer";

// ============================================================================
// Certificate Tags
// ============================================================================

/// Tag key stamped on every certificate requested by the controller
pub const TAG_MANAGED_BY: &str = "ManagedBy";

/// Tag value stamped on every certificate requested by the controller
pub const MANAGED_BY_ACM_MANAGER: &str = "acm-manager";
