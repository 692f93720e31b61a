//! Composite principal building.
//!
//! [`PrincipalBuilder`] is the pipeline entry point: one [`AuthEvent`] in,
//! one [`CompositePrincipal`] out. It normalizes the authenticated name
//! (shortening for SASL, subject attribute extraction for TLS), resolves
//! group memberships, and composes the self-inclusive member list the
//! authorization layer matches against.
//!
//! `build` is infallible by contract: every failure inside the pipeline
//! degrades the result instead of propagating. Construction is the only
//! place errors surface, and only for fatal misconfiguration.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::PrincipalConfig;
use crate::groups::{self, CachedGroupResolver, GroupResolver};
use crate::principal::{AuthEvent, CompositePrincipal, Principal};
use crate::realm::{Krb5ConfRealmSource, RealmSource};
use crate::shortener::NameShortener;
use crate::subject;
use crate::Result;

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builds composite principals from authentication events.
///
/// Construct once at startup with [`PrincipalBuilder::from_config`]; the
/// result is immutable and safe to share across however many connection
/// handlers the broker runs in parallel.
pub struct PrincipalBuilder {
    shortener: NameShortener,
    cert_attribute: String,
    resolver: Arc<dyn GroupResolver>,
    lookup_timeout: Duration,
}

impl PrincipalBuilder {
    /// Build from configuration, discovering the realm via `krb5.conf`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an unregistered group mapping provider or
    /// a malformed shortening rule. Realm discovery failure is non-fatal.
    pub fn from_config(config: &PrincipalConfig) -> Result<Self> {
        Self::with_realm_source(config, &Krb5ConfRealmSource::new())
    }

    /// Build from configuration with an injected realm source.
    ///
    /// # Errors
    ///
    /// Same as [`PrincipalBuilder::from_config`].
    pub fn with_realm_source(
        config: &PrincipalConfig,
        realm_source: &dyn RealmSource,
    ) -> Result<Self> {
        let shortener = NameShortener::from_unparsed(&config.shortening_rules, realm_source)?;
        let mut resolver = groups::resolver_from_config(&config.group_mapping)?;
        if config.cache.enabled {
            resolver = Arc::new(CachedGroupResolver::new(
                resolver,
                Duration::from_secs(config.cache.ttl_secs),
                config.cache.max_entries,
            ));
        }
        Ok(Self::new(
            shortener,
            config.cert_attribute.clone(),
            resolver,
            config.lookup_timeout(),
        ))
    }

    /// Assemble a builder from already-constructed parts.
    #[must_use]
    pub fn new(
        shortener: NameShortener,
        cert_attribute: impl Into<String>,
        resolver: Arc<dyn GroupResolver>,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            shortener,
            cert_attribute: cert_attribute.into(),
            resolver,
            lookup_timeout,
        }
    }

    /// Build the composite principal for one authentication event.
    ///
    /// Never fails: lookup errors, timeouts, and malformed certificate
    /// subjects all degrade to a username-only principal with a warning.
    pub async fn build(&self, event: &AuthEvent) -> CompositePrincipal {
        match event {
            AuthEvent::Sasl { authorization_id } => {
                let short_name = self.shortener.shorten(authorization_id);
                self.compose(short_name).await
            }
            AuthEvent::Tls { subject_dn } => {
                let short_name = subject::extract_attribute(subject_dn, &self.cert_attribute);
                self.compose(short_name).await
            }
            AuthEvent::Other { principal } => CompositePrincipal::solo(principal.clone()),
        }
    }

    /// Compose the self-inclusive member list for a resolved short name.
    async fn compose(&self, short_name: String) -> CompositePrincipal {
        let primary = Principal::user(short_name);
        let mut members = vec![primary.clone()];
        members.extend(
            self.lookup_groups(&primary.name)
                .await
                .into_iter()
                .map(Principal::group),
        );
        CompositePrincipal::new(primary, members)
    }

    /// Resolve groups, translating every failure mode into an empty list.
    async fn lookup_groups(&self, short_name: &str) -> Vec<String> {
        debug!(user = short_name, "Resolving groups");
        let lookup = self.resolver.resolve_groups(short_name);
        match tokio::time::timeout(self.lookup_timeout, lookup).await {
            Ok(Ok(groups)) => {
                debug!(
                    user = short_name,
                    groups = groups.join(", "),
                    "Resolved groups"
                );
                groups
            }
            Ok(Err(e)) => {
                warn!(
                    user = short_name,
                    error = %e,
                    "Groups could not be resolved, proceeding with authorization based on username only"
                );
                Vec::new()
            }
            Err(_) => {
                warn!(
                    user = short_name,
                    timeout_secs = self.lookup_timeout.as_secs(),
                    "Group lookup timed out, proceeding with authorization based on username only"
                );
                Vec::new()
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
