// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Resolution of `acm.tedens.dev/*` annotations into a typed configuration.
//!
//! Resolution never fails: a malformed value silently falls back to its default so
//! that an operator typo never blocks reconciliation. [`annotation_warnings`] reports
//! those fallbacks separately so the reconciler can surface them in the logs.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::constants::DEFAULT_CERT_TTL_SECS;
use crate::duration::parse_duration;
use crate::labels::{
    ANNOTATION_CERT_TTL, ANNOTATION_DELETE_CERT_ON_INGRESS_DELETE, ANNOTATION_DOMAIN,
    ANNOTATION_FALLBACK_WILDCARD, ANNOTATION_MANAGED, ANNOTATION_PREFIX,
    ANNOTATION_REUSE_EXISTING, ANNOTATION_SAN, ANNOTATION_WILDCARD, ANNOTATION_ZONE_ID,
};

/// Boolean annotations, used when looking for malformed values.
const BOOLEAN_ANNOTATIONS: [&str; 5] = [
    ANNOTATION_MANAGED,
    ANNOTATION_WILDCARD,
    ANNOTATION_REUSE_EXISTING,
    ANNOTATION_DELETE_CERT_ON_INGRESS_DELETE,
    ANNOTATION_FALLBACK_WILDCARD,
];

/// Certificate configuration derived from an Ingress' annotations.
///
/// Recomputed on every reconcile and never persisted. When `managed` is false the
/// Ingress is inert to the controller regardless of every other field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Master switch
    pub managed: bool,
    /// Domain to certify instead of the first rule's host
    pub domain_override: Option<String>,
    /// Hosted zone for validation records instead of suffix inference
    pub zone_id: Option<String>,
    /// Request `*.<domain>`
    pub wildcard: bool,
    /// Extra subject alternative names
    pub sans: Vec<String>,
    /// Desired lifetime; informational only
    pub cert_ttl: Duration,
    /// Reuse an issued or pending certificate for the domain
    pub reuse_existing: bool,
    /// Delete the certificate when the Ingress goes away
    pub delete_cert_on_delete: bool,
    /// Carried for forward compatibility, no behavior attached
    pub fallback_wildcard: bool,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            managed: false,
            domain_override: None,
            zone_id: None,
            wildcard: false,
            sans: Vec::new(),
            cert_ttl: Duration::from_secs(DEFAULT_CERT_TTL_SECS),
            reuse_existing: true,
            delete_cert_on_delete: false,
            fallback_wildcard: false,
        }
    }
}

/// Resolve an Ingress' annotation map into a [`ResolvedConfig`].
///
/// `None` (an Ingress without annotations) resolves to the defaults, which are
/// unmanaged.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use acm_manager::annotations::resolve_annotations;
///
/// let mut annotations = BTreeMap::new();
/// annotations.insert("acm.tedens.dev/managed".to_string(), "true".to_string());
/// annotations.insert("acm.tedens.dev/san".to_string(), "a.example.com, b.example.com".to_string());
///
/// let config = resolve_annotations(Some(&annotations));
/// assert!(config.managed);
/// assert!(config.reuse_existing);
/// assert_eq!(config.sans, vec!["a.example.com", "b.example.com"]);
/// ```
#[must_use]
pub fn resolve_annotations(annotations: Option<&BTreeMap<String, String>>) -> ResolvedConfig {
    let Some(annotations) = annotations else {
        return ResolvedConfig::default();
    };

    let get = |key: &str| annotations.get(key).map(String::as_str);

    ResolvedConfig {
        managed: is_true(get(ANNOTATION_MANAGED)),
        domain_override: non_empty(get(ANNOTATION_DOMAIN)),
        zone_id: non_empty(get(ANNOTATION_ZONE_ID)),
        wildcard: is_true(get(ANNOTATION_WILDCARD)),
        sans: get(ANNOTATION_SAN).map(parse_sans).unwrap_or_default(),
        cert_ttl: get(ANNOTATION_CERT_TTL)
            .and_then(|raw| parse_duration(raw).ok())
            .unwrap_or(Duration::from_secs(DEFAULT_CERT_TTL_SECS)),
        reuse_existing: !get(ANNOTATION_REUSE_EXISTING)
            .is_some_and(|v| v.eq_ignore_ascii_case("false")),
        delete_cert_on_delete: is_true(get(ANNOTATION_DELETE_CERT_ON_INGRESS_DELETE)),
        fallback_wildcard: is_true(get(ANNOTATION_FALLBACK_WILDCARD)),
    }
}

/// Report annotation values that [`resolve_annotations`] had to fall back on.
///
/// Returns one human readable message per problem, in annotation key order.
/// Annotations outside the `acm.tedens.dev/` prefix are never inspected.
#[must_use]
pub fn annotation_warnings(annotations: Option<&BTreeMap<String, String>>) -> Vec<String> {
    let Some(annotations) = annotations else {
        return Vec::new();
    };

    let mut warnings = Vec::new();

    for (key, value) in annotations {
        if !key.starts_with(ANNOTATION_PREFIX) {
            continue;
        }

        if BOOLEAN_ANNOTATIONS.contains(&key.as_str())
            && !value.eq_ignore_ascii_case("true")
            && !value.eq_ignore_ascii_case("false")
        {
            warnings.push(format!(
                "annotation {key}={value:?} is not a boolean; using the default"
            ));
        }

        if key == ANNOTATION_CERT_TTL {
            if let Err(e) = parse_duration(value) {
                warnings.push(format!(
                    "annotation {key}={value:?} is not a valid duration ({e:#}); using {}h",
                    DEFAULT_CERT_TTL_SECS / 3600
                ));
            }
        }

        if key == ANNOTATION_SAN
            && !value.trim().is_empty()
            && value.split(',').any(|s| s.trim().is_empty())
        {
            warnings.push(format!(
                "annotation {key}={value:?} contains empty entries; they are ignored"
            ));
        }
    }

    warnings
}

/// Split a comma separated SAN list, trimming entries and dropping empty ones.
fn parse_sans(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|san| !san.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn is_true(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

#[cfg(test)]
#[path = "annotations_tests.rs"]
mod annotations_tests;
