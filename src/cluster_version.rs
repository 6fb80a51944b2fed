// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Minimum Kubernetes version gate checked at startup.

use anyhow::{anyhow, bail, Context as _, Result};
use kube::Client;
use std::fmt;
use tracing::info;

/// A `major.minor` Kubernetes version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct KubernetesVersion {
    pub major: u32,
    pub minor: u32,
}

impl KubernetesVersion {
    /// Parse `major.minor` out of strings such as `1.32`, `v1.32.3`,
    /// `v1.31.2-eks-7f9249a` or `v1.30.4+k3s1`. Patch and suffixes are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the major or minor component is missing or not numeric.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let version = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let mut parts = version.split('.');

        let major = parts
            .next()
            .and_then(leading_number)
            .ok_or_else(|| anyhow!("unexpected Kubernetes version format: {raw}"))?;
        let minor = parts
            .next()
            .and_then(leading_number)
            .ok_or_else(|| anyhow!("unexpected Kubernetes version format: {raw}"))?;

        Ok(Self { major, minor })
    }
}

impl fmt::Display for KubernetesVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Digits at the start of a version component (`32+` and `32-eks` give 32).
fn leading_number(part: &str) -> Option<u32> {
    let end = part
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(part.len());
    part[..end].parse().ok()
}

/// Fail unless `server` is at least `minimum`. Comparison is numeric.
///
/// # Errors
///
/// Returns an error if either version cannot be parsed or the server is too old.
pub fn check_version(server: &str, minimum: &str) -> Result<KubernetesVersion> {
    let server_version = KubernetesVersion::parse(server)?;
    let minimum_version = KubernetesVersion::parse(minimum)
        .with_context(|| format!("invalid minimum Kubernetes version {minimum}"))?;

    if server_version < minimum_version {
        bail!("unsupported Kubernetes version {server}: requires Kubernetes >= v{minimum_version}");
    }
    Ok(server_version)
}

/// Read the API server version and enforce `minimum`.
///
/// # Errors
///
/// Returns an error if the version cannot be fetched, parsed, or is too old.
pub async fn verify_cluster_version(client: &Client, minimum: &str) -> Result<()> {
    let info = client
        .apiserver_version()
        .await
        .context("unable to fetch Kubernetes server version")?;

    let version = check_version(&info.git_version, minimum)?;
    info!(
        "Kubernetes server version {} ({}) satisfies minimum v{}",
        version, info.git_version, minimum
    );
    Ok(())
}
