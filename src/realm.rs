//! Default realm discovery.
//!
//! The `DEFAULT` shortening rule needs to know the local Kerberos realm.
//! Discovery is strictly best-effort: a [`RealmSource`] returns `Option`, and
//! an absent realm degrades shortening to pass-through instead of failing
//! startup.

use std::env;
use std::path::{Path, PathBuf};

/// Where [`Krb5ConfRealmSource`] looks when `KRB5_CONFIG` is unset.
const DEFAULT_KRB5_CONF: &str = "/etc/krb5.conf";

/// Best-effort provider of the local default realm.
///
/// Implementations must never fail: anything that goes wrong during discovery
/// is reported as `None`.
pub trait RealmSource: Send + Sync {
    /// The default realm, if one could be discovered.
    fn default_realm(&self) -> Option<String>;
}

// ─────────────────────────────────────────────────────────────────────────────
// krb5.conf discovery
// ─────────────────────────────────────────────────────────────────────────────

/// Reads `default_realm` from the `[libdefaults]` section of `krb5.conf`.
///
/// Honours the `KRB5_CONFIG` environment variable, falling back to
/// `/etc/krb5.conf`. A missing or unparsable file yields `None`.
#[derive(Debug, Clone)]
pub struct Krb5ConfRealmSource {
    path: PathBuf,
}

impl Krb5ConfRealmSource {
    /// Discover the config path from the environment.
    #[must_use]
    pub fn new() -> Self {
        let path = env::var("KRB5_CONFIG")
            .map_or_else(|_| PathBuf::from(DEFAULT_KRB5_CONF), PathBuf::from);
        Self { path }
    }

    /// Use an explicit config path (tests, non-standard layouts).
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for Krb5ConfRealmSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RealmSource for Krb5ConfRealmSource {
    fn default_realm(&self) -> Option<String> {
        let realm = parse_default_realm(&self.path);
        match &realm {
            Some(r) => tracing::debug!(realm = r.as_str(), "Discovered default realm"),
            None => tracing::debug!(
                path = %self.path.display(),
                "No default realm found, principal shortening degrades to pass-through"
            ),
        }
        realm
    }
}

fn parse_default_realm(path: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(path).ok()?;
    let mut in_libdefaults = false;
    for raw_line in contents.lines() {
        // Strip krb5.conf comments
        let line = raw_line
            .split_once('#')
            .map_or(raw_line, |(head, _)| head)
            .trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('[') {
            in_libdefaults = line == "[libdefaults]";
            continue;
        }
        if !in_libdefaults {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            if key.trim() == "default_realm" && !value.trim().is_empty() {
                return Some(value.trim().to_string());
            }
        }
    }
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixed realm
// ─────────────────────────────────────────────────────────────────────────────

/// A fixed realm, for tests and deployments that pin the realm explicitly.
#[derive(Debug, Clone)]
pub struct StaticRealmSource(
    /// The realm to report.
    pub String,
);

impl RealmSource for StaticRealmSource {
    fn default_realm(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// A source that never discovers a realm.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRealmSource;

impl RealmSource for NoRealmSource {
    fn default_realm(&self) -> Option<String> {
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
