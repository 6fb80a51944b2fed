// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation logic for managed Ingresses.
//!
//! - [`ingress`] - Top-level state machine (finalizer, certify, cleanup)
//! - [`certificate`] - Reuse-or-request and wait for issuance
//! - [`validation`] - DNS validation record creation
//! - [`hosted_zone`] - Longest-suffix hosted zone resolution
//! - [`cleanup`] - Certificate deletion on Ingress deletion
//! - [`finalizers`] - Finalizer and annotation patches
//! - [`locks`] - Per-domain issuance locks

pub mod certificate;
pub mod cleanup;
pub mod finalizers;
pub mod hosted_zone;
pub mod ingress;
pub mod locks;
pub mod validation;

pub use certificate::{ensure_certificate, ValidationPolicy};
pub use cleanup::delete_certificate_for_domain;
pub use hosted_zone::find_hosted_zone;
pub use ingress::{reconcile_ingress, ReconcileOutcome};
pub use validation::create_validation_records;
