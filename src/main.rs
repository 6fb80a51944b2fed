// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use acm_manager::{
    cluster_version::verify_cluster_version,
    config::Config,
    constants::{ERROR_REQUEUE_DURATION_SECS, TOKIO_THREAD_NAME, TOKIO_WORKER_THREADS},
    context::Context,
    metrics,
    reconcilers::{ingress::error_type, reconcile_ingress},
    server::{start_server, ServerState},
};
use anyhow::Result;
use clap::Parser;
use futures::StreamExt;
use k8s_openapi::api::networking::v1::Ingress;
use kube::{
    runtime::{controller::Action, watcher, Controller},
    Api, Client, ResourceExt,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
struct ReconcileError(#[from] anyhow::Error);

fn main() -> Result<()> {
    let config = Config::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name(TOKIO_THREAD_NAME)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(config))
}

async fn async_main(config: Config) -> Result<()> {
    // Respects RUST_LOG (default info) and RUST_LOG_FORMAT (json or text)
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting ACM certificate controller");
    debug!(?config, "Loaded configuration");

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;

    if config.skip_version_check {
        info!("Skipping Kubernetes version check");
    } else {
        verify_cluster_version(&client, &config.min_kubernetes_version).await?;
    }

    debug!("Loading AWS SDK configuration");
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
    if let Some(region) = &config.aws_region {
        loader = loader.region(aws_config::Region::new(region.clone()));
    }
    let sdk_config = loader.load().await;
    info!(
        region = ?sdk_config.region().map(ToString::to_string),
        "AWS SDK configuration loaded"
    );

    let context = Arc::new(Context::new(client.clone(), &sdk_config));
    let server_state = Arc::new(ServerState::default());

    tokio::select! {
        result = start_server(config.health_probe_bind_address, server_state.clone()) => {
            error!("CRITICAL: HTTP server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("HTTP server exited unexpectedly without error")
        }
        result = run_ingress_controller(client, config.watch_namespace.as_deref(), context, server_state) => {
            info!("Ingress controller stopped");
            result
        }
    }
}

/// Run the Ingress controller until a shutdown signal is received
async fn run_ingress_controller(
    client: Client,
    watch_namespace: Option<&str>,
    context: Arc<Context>,
    server_state: Arc<ServerState>,
) -> Result<()> {
    let api: Api<Ingress> = match watch_namespace {
        Some(namespace) => {
            info!("Starting Ingress controller in namespace {}", namespace);
            Api::namespaced(client, namespace)
        }
        None => {
            info!("Starting Ingress controller for all namespaces");
            Api::all(client)
        }
    };

    let controller = Controller::new(api, watcher::Config::default()).shutdown_on_signal();
    server_state.mark_ready();

    controller
        .run(reconcile_ingress_wrapper, error_policy, context)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

/// Reconcile wrapper for `Ingress`
async fn reconcile_ingress_wrapper(
    ingress: Arc<Ingress>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let start = Instant::now();
    debug!(
        ingress = %ingress.name_any(),
        namespace = ?ingress.namespace(),
        "Reconcile wrapper called for Ingress"
    );

    match reconcile_ingress(&ctx, &ingress).await {
        Ok(outcome) => {
            metrics::record_reconciliation_success(start.elapsed());
            debug!(?outcome, "Reconciled Ingress {}", ingress.name_any());
            Ok(outcome.action())
        }
        Err(e) => {
            metrics::record_reconciliation_error(start.elapsed());
            metrics::record_error(error_type(&e));
            error!(
                "Failed to reconcile Ingress {}/{}: {:#}",
                ingress.namespace().unwrap_or_default(),
                ingress.name_any(),
                e
            );
            Err(e.into())
        }
    }
}

/// Error policy for controller
fn error_policy(_resource: Arc<Ingress>, _err: &ReconcileError, _ctx: Arc<Context>) -> Action {
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}
