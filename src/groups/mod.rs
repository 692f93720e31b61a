//! Group membership resolution.
//!
//! A [`GroupResolver`] maps a short user name to the ordered list of group
//! names it belongs to. The implementation is selected by name from a fixed,
//! compile-time registry - see [`resolver_from_config`].
//!
//! # Fail-open policy
//!
//! Resolvers report lookup failures as errors, but those errors never travel
//! past [`crate::builder::PrincipalBuilder`]: the builder degrades to a
//! username-only principal. The worst outcome of a broken directory is that
//! group-based policies stop matching - never an authentication outage.
//!
//! # Modules
//!
//! - [`shell`] - local OS lookup via `id -Gn` (the default)
//! - [`static_map`] - fixed user-to-groups map from provider options
//! - [`cache`] - TTL cache wrapper around any resolver

pub mod cache;
pub mod shell;
pub mod static_map;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::GroupMappingConfig;
use crate::{Error, Result};

pub use cache::CachedGroupResolver;
pub use shell::ShellGroupsProvider;
pub use static_map::StaticGroupsProvider;

/// Name of the default local-OS provider.
pub const SHELL_PROVIDER: &str = "shell";

/// Name of the fixed-map provider.
pub const STATIC_PROVIDER: &str = "static";

/// All registered provider names.
pub const KNOWN_PROVIDERS: &[&str] = &[SHELL_PROVIDER, STATIC_PROVIDER];

/// Option-bag keys carrying this prefix are forwarded to the provider with
/// the prefix stripped; all other keys are invisible to it.
pub const PROVIDER_OPTION_PREFIX: &str = "provider.";

// ─────────────────────────────────────────────────────────────────────────────
// Resolver trait
// ─────────────────────────────────────────────────────────────────────────────

/// Pluggable group membership source.
///
/// `resolve_groups` may block on external I/O (process spawn, directory
/// round-trip); callers must not hold shared locks across the call. Every
/// invocation is independent - implementations must be safe under
/// unsynchronized concurrent use.
#[async_trait]
pub trait GroupResolver: Send + Sync {
    /// Groups the user belongs to, in source order.
    ///
    /// # Errors
    ///
    /// Returns `Error::GroupLookup` when the underlying lookup fails. The
    /// caller is expected to treat that as "no groups", not as fatal.
    async fn resolve_groups(&self, short_name: &str) -> Result<Vec<String>>;
}

#[async_trait]
impl GroupResolver for Arc<dyn GroupResolver> {
    async fn resolve_groups(&self, short_name: &str) -> Result<Vec<String>> {
        self.as_ref().resolve_groups(short_name).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Returns `true` when `name` is a registered provider.
#[must_use]
pub fn is_known_provider(name: &str) -> bool {
    KNOWN_PROVIDERS.contains(&name)
}

/// Construct the resolver selected by `config`.
///
/// # Errors
///
/// Returns `Error::Config` for an unregistered provider name. This is the
/// only fatal path in the crate and fires at startup, never per request.
pub fn resolver_from_config(config: &GroupMappingConfig) -> Result<Arc<dyn GroupResolver>> {
    let options = provider_options(&config.options);
    match config.provider.as_str() {
        SHELL_PROVIDER => Ok(Arc::new(ShellGroupsProvider::new())),
        STATIC_PROVIDER => Ok(Arc::new(StaticGroupsProvider::from_options(&options))),
        other => Err(Error::Config(format!(
            "Unknown group mapping provider '{other}' (known: {})",
            KNOWN_PROVIDERS.join(", ")
        ))),
    }
}

/// Strip [`PROVIDER_OPTION_PREFIX`] off matching option keys, dropping the
/// rest of the bag.
fn provider_options(raw: &HashMap<String, String>) -> HashMap<String, String> {
    raw.iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(PROVIDER_OPTION_PREFIX)
                .map(|stripped| (stripped.to_string(), value.clone()))
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
