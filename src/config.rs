// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Command-line and environment configuration for the controller.

use clap::Parser;
use std::net::SocketAddr;

use crate::constants::{DEFAULT_HEALTH_PROBE_BIND_ADDRESS, DEFAULT_MIN_KUBERNETES_VERSION};

/// ACM certificate controller for Kubernetes Ingresses
#[derive(Parser, Debug, Clone)]
#[command(name = "acm-manager", version, about, long_about = None)]
pub struct Config {
    /// Address serving /healthz, /readyz and /metrics
    #[arg(
        long,
        env = "HEALTH_PROBE_BIND_ADDRESS",
        default_value = DEFAULT_HEALTH_PROBE_BIND_ADDRESS
    )]
    pub health_probe_bind_address: SocketAddr,

    /// AWS region for ACM and Route 53 (defaults to the SDK provider chain)
    #[arg(long, env = "AWS_REGION")]
    pub aws_region: Option<String>,

    /// Only watch Ingresses in this namespace (defaults to all namespaces)
    #[arg(long, env = "WATCH_NAMESPACE")]
    pub watch_namespace: Option<String>,

    /// Refuse to start on clusters older than this `major.minor` version
    #[arg(
        long,
        env = "MIN_KUBERNETES_VERSION",
        default_value = DEFAULT_MIN_KUBERNETES_VERSION
    )]
    pub min_kubernetes_version: String,

    /// Skip the Kubernetes version check
    #[arg(long, env = "SKIP_VERSION_CHECK")]
    pub skip_version_check: bool,
}
