// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Finalizer and annotation writes against Kubernetes resources.
//!
//! The generic helpers work on any namespaced resource and use JSON merge
//! patches of `metadata.finalizers` / `metadata.annotations`. A resource that
//! has already disappeared (404) is treated as done.
//!
//! The Ingress reconciler does not call them directly. It goes through the
//! [`IngressWriter`] trait so the state machine can be exercised without an
//! API server.
//!
//! # Example
//!
//! ```rust,no_run
//! use acm_manager::labels::FINALIZER_INGRESS;
//! use acm_manager::reconcilers::finalizers::ensure_finalizer;
//! use k8s_openapi::api::networking::v1::Ingress;
//! use kube::Client;
//!
//! async fn reconcile(client: Client, ingress: Ingress) -> anyhow::Result<()> {
//!     ensure_finalizer(&client, &ingress, FINALIZER_INGRESS).await?;
//!     Ok(())
//! }
//! ```

use anyhow::Result;
use async_trait::async_trait;
use k8s_openapi::api::networking::v1::Ingress;
use kube::api::{Patch, PatchParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use serde_json::json;
use tracing::{debug, info};

/// Whether `finalizer` is present on the resource.
#[must_use]
pub fn has_finalizer<T: Resource>(resource: &T, finalizer: &str) -> bool {
    resource
        .meta()
        .finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|existing| existing == finalizer))
}

/// Finalizer list with `finalizer` appended, or `None` if already present.
#[must_use]
pub fn finalizers_with<T: Resource>(resource: &T, finalizer: &str) -> Option<Vec<String>> {
    if has_finalizer(resource, finalizer) {
        return None;
    }
    let mut finalizers = resource.meta().finalizers.clone().unwrap_or_default();
    finalizers.push(finalizer.to_string());
    Some(finalizers)
}

/// Finalizer list without `finalizer`, or `None` if it was not present.
#[must_use]
pub fn finalizers_without<T: Resource>(resource: &T, finalizer: &str) -> Option<Vec<String>> {
    if !has_finalizer(resource, finalizer) {
        return None;
    }
    let mut finalizers = resource.meta().finalizers.clone().unwrap_or_default();
    finalizers.retain(|f| f != finalizer);
    Some(finalizers)
}

/// Merge-patch a namespaced resource, ignoring a resource that no longer exists.
async fn merge_patch<T>(client: &Client, resource: &T, patch: &serde_json::Value) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();
    let api: Api<T> = Api::namespaced(client.clone(), &namespace);

    match api
        .patch(&name, &PatchParams::default(), &Patch::Merge(patch))
        .await
    {
        Ok(_) => Ok(()),
        Err(kube::Error::Api(ae)) if ae.code == 404 => {
            debug!("{} {}/{} is gone, skipping patch", T::kind(&()), namespace, name);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Add a finalizer to a resource if not already present.
///
/// # Errors
///
/// Returns an error if the API patch operation fails.
pub async fn ensure_finalizer<T>(client: &Client, resource: &T, finalizer: &str) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    let Some(finalizers) = finalizers_with(resource, finalizer) else {
        return Ok(());
    };

    info!(
        "Adding finalizer {} to {}/{} {}",
        finalizer,
        resource.namespace().unwrap_or_default(),
        resource.name_any(),
        T::kind(&())
    );

    let patch = json!({ "metadata": { "finalizers": finalizers } });
    merge_patch(client, resource, &patch).await
}

/// Remove a finalizer from a resource if present.
///
/// # Errors
///
/// Returns an error if the API patch operation fails.
pub async fn remove_finalizer<T>(client: &Client, resource: &T, finalizer: &str) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    let Some(finalizers) = finalizers_without(resource, finalizer) else {
        return Ok(());
    };

    info!(
        "Removing finalizer {} from {}/{} {}",
        finalizer,
        resource.namespace().unwrap_or_default(),
        resource.name_any(),
        T::kind(&())
    );

    let patch = json!({ "metadata": { "finalizers": finalizers } });
    merge_patch(client, resource, &patch).await
}

/// Set a single annotation on a resource, leaving all others untouched.
///
/// # Errors
///
/// Returns an error if the API patch operation fails.
pub async fn set_annotation<T>(
    client: &Client,
    resource: &T,
    key: &str,
    value: &str,
) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    let mut annotations = serde_json::Map::new();
    annotations.insert(key.to_string(), json!(value));
    let patch = json!({ "metadata": { "annotations": annotations } });
    merge_patch(client, resource, &patch).await
}

/// Writes the reconciler performs against an Ingress.
#[async_trait]
pub trait IngressWriter: Send + Sync {
    async fn add_finalizer(&self, ingress: &Ingress, finalizer: &str) -> Result<()>;

    async fn remove_finalizer(&self, ingress: &Ingress, finalizer: &str) -> Result<()>;

    async fn set_annotation(&self, ingress: &Ingress, key: &str, value: &str) -> Result<()>;
}

/// [`IngressWriter`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeIngressWriter {
    client: Client,
}

impl KubeIngressWriter {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IngressWriter for KubeIngressWriter {
    async fn add_finalizer(&self, ingress: &Ingress, finalizer: &str) -> Result<()> {
        ensure_finalizer(&self.client, ingress, finalizer).await
    }

    async fn remove_finalizer(&self, ingress: &Ingress, finalizer: &str) -> Result<()> {
        remove_finalizer(&self.client, ingress, finalizer).await
    }

    async fn set_annotation(&self, ingress: &Ingress, key: &str, value: &str) -> Result<()> {
        set_annotation(&self.client, ingress, key, value).await
    }
}

#[cfg(test)]
#[path = "finalizers_tests.rs"]
mod finalizers_tests;
