//! TTL cache in front of a group resolver.
//!
//! Group lookups can be expensive (process spawn, directory round-trip) and
//! brokers authenticate in bursts. This wrapper caches successful lookups per
//! short name with a bounded TTL.
//!
//! The fail-open contract is preserved: a miss or an expired entry always
//! falls through to a live lookup, and lookup failures are propagated
//! uncached - an error is never turned into an authoritative empty result.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::Result;

use super::GroupResolver;

/// Caching wrapper around any [`GroupResolver`].
pub struct CachedGroupResolver<R> {
    inner: R,
    ttl: Duration,
    max_entries: usize,
    entries: DashMap<String, CachedGroups>,
}

struct CachedGroups {
    groups: Vec<String>,
    cached_at: Instant,
}

impl CachedGroups {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

impl<R: GroupResolver> CachedGroupResolver<R> {
    /// Wrap `inner` with a TTL cache.
    pub fn new(inner: R, ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner,
            ttl,
            max_entries,
            entries: DashMap::new(),
        }
    }

    /// Number of live cache entries (expired ones may still be counted).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn store(&self, short_name: &str, groups: &[String]) {
        if self.entries.len() >= self.max_entries {
            self.entries.retain(|_, entry| !entry.is_expired(self.ttl));
        }
        // Still full after sweeping: skip the insert rather than grow
        // unboundedly. The next lookup simply goes live again.
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(short_name) {
            return;
        }
        self.entries.insert(
            short_name.to_string(),
            CachedGroups {
                groups: groups.to_vec(),
                cached_at: Instant::now(),
            },
        );
    }
}

#[async_trait]
impl<R: GroupResolver> GroupResolver for CachedGroupResolver<R> {
    async fn resolve_groups(&self, short_name: &str) -> Result<Vec<String>> {
        if let Some(entry) = self.entries.get(short_name) {
            if entry.is_expired(self.ttl) {
                drop(entry);
                self.entries.remove(short_name);
            } else {
                tracing::debug!(user = short_name, "Group cache hit");
                return Ok(entry.groups.clone());
            }
        }

        let groups = self.inner.resolve_groups(short_name).await?;
        self.store(short_name, &groups);
        Ok(groups)
    }
}
