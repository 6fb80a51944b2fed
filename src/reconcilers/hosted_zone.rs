// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Hosted zone resolution for DNS validation records.
//!
//! The zone for a domain is the hosted zone whose apex is the longest suffix
//! of the domain. Zones are listed on every call and never cached.

use tracing::debug;

use crate::cert_errors::ZoneError;
use crate::constants::HOSTED_ZONE_ID_PREFIX;
use crate::providers::{DnsProvider, HostedZone};

/// Pick the hosted zone with the longest name that is a suffix of `domain`.
///
/// Trailing dots are stripped from zone names before matching. Only a strictly
/// longer match replaces the current best, so among equal-length matches the
/// first zone listed wins.
#[must_use]
pub fn select_hosted_zone<'a>(domain: &str, zones: &'a [HostedZone]) -> Option<&'a HostedZone> {
    let mut best: Option<(&HostedZone, usize)> = None;

    for zone in zones {
        let name = zone.name.trim_end_matches('.');
        if !domain.ends_with(name) {
            continue;
        }
        if best.is_none_or(|(_, len)| name.len() > len) {
            best = Some((zone, name.len()));
        }
    }

    best.map(|(zone, _)| zone)
}

/// Strip the provider's path prefix (`/hostedzone/`) from a zone id.
#[must_use]
pub fn bare_zone_id(id: &str) -> &str {
    id.strip_prefix(HOSTED_ZONE_ID_PREFIX).unwrap_or(id)
}

/// Resolve the hosted zone id that should hold records for `domain`.
///
/// # Errors
///
/// Returns [`ZoneError::NoMatchingZone`] when no zone name is a suffix of the
/// domain, or [`ZoneError::Provider`] when listing zones fails.
pub async fn find_hosted_zone(dns: &dyn DnsProvider, domain: &str) -> Result<String, ZoneError> {
    let zones = dns.list_hosted_zones().await?;

    let zone = select_hosted_zone(domain, &zones).ok_or_else(|| ZoneError::NoMatchingZone {
        domain: domain.to_string(),
    })?;

    let zone_id = bare_zone_id(&zone.id).to_string();
    debug!(domain = %domain, zone = %zone.name, zone_id = %zone_id, "Resolved hosted zone");
    Ok(zone_id)
}

#[cfg(test)]
#[path = "hosted_zone_tests.rs"]
mod hosted_zone_tests;
