// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-domain mutual exclusion for certificate issuance.
//!
//! ACM offers no locking primitive, so two reconciles resolving to the same
//! domain could both see "no existing certificate" and request duplicates.
//! Holding the domain's lock across the reuse check, the request, validation
//! record creation and polling makes the second reconcile wait and then find
//! the first one's certificate through the reuse path.
//!
//! The lock is in-process only. An entry lives only while some reconcile
//! holds or waits for it, so the map stays bounded by the in-flight domains.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = HashMap<String, Arc<Mutex<()>>>;

/// Map of normalized domain name to its lock.
#[derive(Debug, Clone, Default)]
pub struct DomainLocks {
    inner: Arc<StdMutex<LockMap>>,
}

impl DomainLocks {
    /// Acquire the lock for `domain`, waiting for any holder to release it.
    ///
    /// Domain names are compared case-insensitively.
    pub async fn lock(&self, domain: &str) -> DomainGuard {
        let key = normalize(domain);
        let entry = self
            .map()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        // The entry clone lives in this future until the lock is granted, so
        // a waiter keeps the entry from being pruned.
        let guard = entry.lock_owned().await;
        DomainGuard {
            locks: self.clone(),
            key,
            guard: Some(guard),
        }
    }

    /// Number of domains currently locked or waited on.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    // Critical sections never panic, but a poisoned map is still usable.
    fn map(&self) -> MutexGuard<'_, LockMap> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, key: &str) {
        let mut locks = self.map();
        // Clones are only taken under the map lock, so a count of one means
        // nobody holds or waits for this domain.
        if locks
            .get(key)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(key);
        }
    }
}

/// Held lock on one domain. Dropping it releases the lock and forgets the
/// domain once nobody else is waiting for it.
pub struct DomainGuard {
    locks: DomainLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl std::fmt::Debug for DomainGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainGuard").field("key", &self.key).finish()
    }
}

impl Drop for DomainGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks.release(&self.key);
    }
}

fn normalize(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
#[path = "locks_tests.rs"]
mod locks_tests;
