//! Principal name shortening.
//!
//! Turns a fully-qualified principal name (`alice@CORP.EXAMPLE.COM`,
//! `svc/host.example.com@CORP.EXAMPLE.COM`) into the short canonical name
//! used for group lookups. An ordered rule list is evaluated per principal;
//! the first matching rule wins and an unmatched principal passes through
//! unchanged.
//!
//! # Rule grammar
//!
//! - `DEFAULT [REALM]` - matches `local@REALM`, where `REALM` is the rule's
//!   explicit realm or the discovered default realm. Yields the lowercased
//!   local part. Without any realm the rule never matches.
//! - `RULE:(regex)replacement[/L]` - the regex is anchored over the full
//!   principal; `$1`-style capture references in the replacement are
//!   expanded; a trailing `/L` lowercases the result.
//!
//! Rule strings are parsed once at startup; a malformed rule is a fatal
//! configuration error. Realm discovery failure is not: the shortener is
//! still built and degrades to pass-through for `DEFAULT` rules.

use regex::Regex;

use crate::realm::RealmSource;
use crate::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Rules
// ─────────────────────────────────────────────────────────────────────────────

/// One parsed shortening rule.
#[derive(Debug, Clone)]
pub enum ShorteningRule {
    /// `DEFAULT [REALM]`: strip the (default or explicit) realm, lowercase.
    Default {
        /// Explicit realm; `None` means use the discovered default realm.
        realm: Option<String>,
    },
    /// `RULE:(regex)replacement[/L]`: regex substitution over the principal.
    Pattern {
        /// Anchored match over the full principal name.
        regex: Regex,
        /// Replacement template with `$n` capture references.
        replacement: String,
        /// Lowercase the result (`/L` suffix).
        lowercase: bool,
    },
}

impl ShorteningRule {
    /// Parse a single rule string.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw == "DEFAULT" {
            return Ok(Self::Default { realm: None });
        }
        if let Some(realm) = raw.strip_prefix("DEFAULT ") {
            return Ok(Self::Default {
                realm: Some(realm.trim().to_string()),
            });
        }
        if let Some(body) = raw.strip_prefix("RULE:") {
            return Self::parse_pattern(raw, body);
        }
        Err(Error::Config(format!("Unrecognized shortening rule '{raw}'")))
    }

    fn parse_pattern(raw: &str, body: &str) -> Result<Self> {
        if !body.starts_with('(') {
            return Err(Error::Config(format!(
                "Shortening rule '{raw}' must have a parenthesized pattern after RULE:"
            )));
        }
        let close = matching_paren(body).ok_or_else(|| {
            Error::Config(format!("Unbalanced parentheses in shortening rule '{raw}'"))
        })?;
        let pattern = &body[1..close];
        let mut replacement = &body[close + 1..];
        let lowercase = if let Some(stripped) = replacement.strip_suffix("/L") {
            replacement = stripped;
            true
        } else {
            false
        };
        let regex = Regex::new(&format!("^(?:{pattern})$"))
            .map_err(|e| Error::Config(format!("Bad pattern in shortening rule '{raw}': {e}")))?;
        Ok(Self::Pattern {
            regex,
            replacement: replacement.to_string(),
            lowercase,
        })
    }

    /// Apply this rule, returning `None` when the principal does not match.
    fn apply(&self, principal: &str, default_realm: Option<&str>) -> Option<String> {
        match self {
            Self::Default { realm } => {
                let target = realm.as_deref().or(default_realm)?;
                let (local, principal_realm) = principal.rsplit_once('@')?;
                if local.is_empty() || principal_realm != target {
                    return None;
                }
                Some(local.to_lowercase())
            }
            Self::Pattern {
                regex,
                replacement,
                lowercase,
            } => {
                if !regex.is_match(principal) {
                    return None;
                }
                let shortened = regex.replace(principal, replacement.as_str()).into_owned();
                Some(if *lowercase {
                    shortened.to_lowercase()
                } else {
                    shortened
                })
            }
        }
    }
}

/// Index of the `)` matching the leading `(` of `body`, honouring escapes.
fn matching_paren(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Shortener
// ─────────────────────────────────────────────────────────────────────────────

/// Applies the configured rule list to fully-qualified principal names.
///
/// Built once at startup; realm discovery runs exactly once during
/// construction. Safe for unsynchronized concurrent use.
#[derive(Debug, Clone)]
pub struct NameShortener {
    rules: Vec<ShorteningRule>,
    default_realm: Option<String>,
}

impl NameShortener {
    /// Build from already-parsed rules and an optional default realm.
    #[must_use]
    pub fn new(rules: Vec<ShorteningRule>, default_realm: Option<String>) -> Self {
        Self {
            rules,
            default_realm,
        }
    }

    /// Parse rule strings and discover the default realm.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for a malformed rule string. Realm discovery
    /// failure is non-fatal.
    pub fn from_unparsed(raw_rules: &[String], realm_source: &dyn RealmSource) -> Result<Self> {
        let rules = raw_rules
            .iter()
            .map(|r| ShorteningRule::parse(r))
            .collect::<Result<Vec<_>>>()?;
        let default_realm = if rules.is_empty() {
            None
        } else {
            realm_source.default_realm()
        };
        Ok(Self::new(rules, default_realm))
    }

    /// Shorten a fully-qualified principal name.
    ///
    /// First matching rule wins; with no rules, or no matching rule, the
    /// name passes through unchanged.
    #[must_use]
    pub fn shorten(&self, principal_name: &str) -> String {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(principal_name, self.default_realm.as_deref()))
            .unwrap_or_else(|| principal_name.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
