//! Configuration management.
//!
//! The whole configuration surface is read once at startup and immutable
//! afterwards; [`PrincipalConfig::validate`] front-loads every fatal check so
//! misconfiguration aborts broker startup instead of surfacing on a request.
//!
//! # Example YAML
//!
//! ```yaml
//! cert_attribute: CN
//! shortening_rules:
//!   - "DEFAULT CORP.EXAMPLE.COM"
//!   - "RULE:((\\w+)/admin@CORP\\.EXAMPLE\\.COM)$1"
//! group_mapping:
//!   provider: shell
//!   options:
//!     provider.command: id
//! cache:
//!   enabled: true
//!   ttl_secs: 300
//!   max_entries: 1024
//! lookup_timeout_secs: 5
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::shortener::ShorteningRule;
use crate::{Error, Result, groups};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level config
// ─────────────────────────────────────────────────────────────────────────────

/// Principal builder configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrincipalConfig {
    /// Subject attribute extracted as the user name for TLS connections.
    pub cert_attribute: String,

    /// Ordered principal-to-local shortening rules (first match wins).
    ///
    /// See [`crate::shortener`] for the rule grammar.
    pub shortening_rules: Vec<String>,

    /// Group mapping provider selection and options.
    pub group_mapping: GroupMappingConfig,

    /// Optional TTL cache in front of the group resolver.
    pub cache: GroupCacheConfig,

    /// Upper bound on a single group lookup, in seconds.
    ///
    /// A lookup exceeding this behaves exactly like a lookup failure:
    /// empty group set, warning logged, pipeline continues.
    pub lookup_timeout_secs: u64,
}

impl Default for PrincipalConfig {
    fn default() -> Self {
        Self {
            cert_attribute: "CN".to_string(),
            shortening_rules: Vec::new(),
            group_mapping: GroupMappingConfig::default(),
            cache: GroupCacheConfig::default(),
            lookup_timeout_secs: 5,
        }
    }
}

/// Group mapping provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupMappingConfig {
    /// Registered provider name. Defaults to local OS group lookup.
    pub provider: String,

    /// Flat option bag.
    ///
    /// Entries whose keys start with `provider.` are handed to the selected
    /// provider with the prefix stripped; everything else is ignored by
    /// providers.
    pub options: HashMap<String, String>,
}

impl Default for GroupMappingConfig {
    fn default() -> Self {
        Self {
            provider: groups::SHELL_PROVIDER.to_string(),
            options: HashMap::new(),
        }
    }
}

/// TTL cache configuration for group lookups.
///
/// Off by default: every `build()` then performs a fresh resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupCacheConfig {
    /// Enable the cache layer.
    pub enabled: bool,
    /// Time-to-live for a cached group set, in seconds.
    pub ttl_secs: u64,
    /// Maximum number of cached users before inserts are skipped.
    pub max_entries: usize,
}

impl Default for GroupCacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_secs: 300,
            max_entries: 1024,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading & validation
// ─────────────────────────────────────────────────────────────────────────────

impl PrincipalConfig {
    /// Load configuration from file and environment.
    ///
    /// Environment variables use the `BROKER_PRINCIPAL_` prefix with `__` as
    /// section separator, e.g. `BROKER_PRINCIPAL_GROUP_MAPPING__PROVIDER`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist, cannot be parsed,
    /// or fails [`PrincipalConfig::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment.merge(Env::prefixed("BROKER_PRINCIPAL_").split("__"));

        let config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Run every startup-fatal check.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an unregistered provider name, a
    /// malformed shortening rule, an empty certificate attribute, or a zero
    /// lookup timeout.
    pub fn validate(&self) -> Result<()> {
        if !groups::is_known_provider(&self.group_mapping.provider) {
            return Err(Error::Config(format!(
                "Unknown group mapping provider '{}' (known: {})",
                self.group_mapping.provider,
                groups::KNOWN_PROVIDERS.join(", ")
            )));
        }
        for rule in &self.shortening_rules {
            ShorteningRule::parse(rule)?;
        }
        if self.cert_attribute.trim().is_empty() {
            return Err(Error::Config(
                "cert_attribute must not be empty".to_string(),
            ));
        }
        if self.lookup_timeout_secs == 0 {
            return Err(Error::Config(
                "lookup_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The lookup timeout as a `Duration`.
    #[must_use]
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
