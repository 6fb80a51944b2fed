// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # acm-manager - ACM certificates for Kubernetes Ingresses
//!
//! acm-manager watches `networking.k8s.io/v1` Ingresses and keeps an AWS
//! Certificate Manager certificate in step with each annotated Ingress:
//! it reuses or requests a DNS-validated certificate, writes the validation
//! records to Route 53, waits for issuance and attaches the ARN through the
//! `alb.ingress.kubernetes.io/certificate-arn` annotation. On deletion it can
//! delete the certificate before releasing the Ingress.
//!
//! ## Modules
//!
//! - [`annotations`] - `acm.tedens.dev/*` annotations to typed configuration
//! - [`reconcilers`] - Ingress state machine and certificate lifecycle
//! - [`providers`] - ACM and Route 53 behind provider traits
//! - [`context`] - Shared reconcile context
//! - [`cert_errors`] - Error taxonomy
//! - [`metrics`] / [`server`] - Prometheus metrics and probes
//!
//! ## Example
//!
//! ```rust
//! use acm_manager::annotations::resolve_annotations;
//! use std::collections::BTreeMap;
//!
//! let annotations = BTreeMap::from([
//!     ("acm.tedens.dev/managed".to_string(), "true".to_string()),
//!     ("acm.tedens.dev/wildcard".to_string(), "true".to_string()),
//!     ("acm.tedens.dev/san".to_string(), "a.example.com, b.example.com".to_string()),
//! ]);
//!
//! let config = resolve_annotations(Some(&annotations));
//! assert!(config.managed && config.wildcard && config.reuse_existing);
//! assert_eq!(config.sans, vec!["a.example.com", "b.example.com"]);
//! ```

pub mod annotations;
pub mod cert_errors;
pub mod cluster_version;
pub mod config;
pub mod constants;
pub mod context;
pub mod duration;
pub mod labels;
pub mod metrics;
pub mod providers;
pub mod reconcilers;
pub mod server;

#[cfg(test)]
mod testing;
