//! Principal data model.
//!
//! Defines the value types flowing through the pipeline: the plain
//! [`Principal`] (a `(kind, name)` pair), the [`CompositePrincipal`] carrying
//! secondary group memberships, and the [`AuthEvent`] delivered by the host
//! broker's authentication layer once per connection.
//!
//! # Matching semantics
//!
//! Authorization layers match composites through [`CompositePrincipal::matches`]
//! and [`CompositePrincipal::contains`] - a deliberate relaxation of strict
//! equality so that a policy written against a plain `Group` principal
//! transparently matches any user carrying that group. Structural `PartialEq`
//! on both types stays strict and side-effect free.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Principal kind for authenticated users.
pub const USER_KIND: &str = "User";

/// Principal kind for resolved group memberships.
pub const GROUP_KIND: &str = "Group";

// ─────────────────────────────────────────────────────────────────────────────
// Principal
// ─────────────────────────────────────────────────────────────────────────────

/// A `(kind, name)` pair identifying an authenticated entity or group.
///
/// Pure value type: two principals are equal iff both fields are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    /// Principal kind, e.g. `"User"` or `"Group"`.
    pub kind: String,
    /// Principal name (short name for users, group name for groups).
    pub name: String,
}

impl Principal {
    /// Create a principal with an arbitrary kind.
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a `User` principal.
    pub fn user(name: impl Into<String>) -> Self {
        Self::new(USER_KIND, name)
    }

    /// Create a `Group` principal.
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(GROUP_KIND, name)
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authentication event
// ─────────────────────────────────────────────────────────────────────────────

/// Authentication outcome delivered by the host broker, one per connection.
///
/// Consumed exactly once by [`crate::builder::PrincipalBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// SASL/ticket authentication produced an already-resolved authorization id.
    Sasl {
        /// Fully-qualified authorization id, e.g. `alice@CORP.EXAMPLE.COM`.
        authorization_id: String,
    },
    /// TLS authentication produced a peer certificate subject string.
    Tls {
        /// Subject distinguished name, e.g. `CN=alice,OU=eng,DC=example,DC=com`.
        subject_dn: String,
    },
    /// Any other mechanism; the identity is taken as-is, no group resolution.
    Other {
        /// Pre-resolved principal reported by the mechanism.
        principal: Principal,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Composite principal
// ─────────────────────────────────────────────────────────────────────────────

/// A principal carrying its secondary group memberships.
///
/// For principals built from [`AuthEvent::Sasl`] / [`AuthEvent::Tls`] the
/// member list always contains `primary` itself (self-inclusive), so a match
/// against the bare user principal keeps working. The member list is an
/// ordered set: construction preserves first-seen order and drops duplicates.
/// It is immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositePrincipal {
    primary: Principal,
    members: Vec<Principal>,
}

impl CompositePrincipal {
    /// Build a composite from a primary principal and its member list.
    ///
    /// Duplicates in `members` are dropped, keeping the first occurrence.
    #[must_use]
    pub fn new(primary: Principal, members: Vec<Principal>) -> Self {
        let mut deduped: Vec<Principal> = Vec::with_capacity(members.len());
        for member in members {
            if !deduped.contains(&member) {
                deduped.push(member);
            }
        }
        Self {
            primary,
            members: deduped,
        }
    }

    /// Build a composite whose only member is the principal itself.
    ///
    /// Used for [`AuthEvent::Other`], where no group resolution is attempted.
    #[must_use]
    pub fn solo(principal: Principal) -> Self {
        Self {
            members: vec![principal.clone()],
            primary: principal,
        }
    }

    /// The primary (user) principal.
    #[must_use]
    pub fn primary(&self) -> &Principal {
        &self.primary
    }

    /// The ordered member set: the user itself plus its groups.
    #[must_use]
    pub fn members(&self) -> &[Principal] {
        &self.members
    }

    /// Returns `true` if `principal` is among this composite's members.
    ///
    /// This is the containment check an authorization layer uses to match a
    /// composite against a policy written for a plain principal.
    #[must_use]
    pub fn contains(&self, principal: &Principal) -> bool {
        self.members.contains(principal)
    }

    /// Returns `true` if the two composites share at least one member.
    ///
    /// Typically the shared member is a group. Pure check, never mutates
    /// either side.
    #[must_use]
    pub fn matches(&self, other: &CompositePrincipal) -> bool {
        self.members.iter().any(|m| other.members.contains(m))
    }
}

impl fmt::Display for CompositePrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn composite(user: &str, groups: &[&str]) -> CompositePrincipal {
        let primary = Principal::user(user);
        let mut members = vec![primary.clone()];
        members.extend(groups.iter().map(|g| Principal::group(*g)));
        CompositePrincipal::new(primary, members)
    }

    #[test]
    fn principal_equality_is_by_kind_and_name() {
        assert_eq!(Principal::user("alice"), Principal::user("alice"));
        assert_ne!(Principal::user("alice"), Principal::group("alice"));
        assert_ne!(Principal::user("alice"), Principal::user("bob"));
    }

    #[test]
    fn display_shows_kind_and_name() {
        assert_eq!(Principal::group("wheel").to_string(), "Group:wheel");
    }

    #[test]
    fn members_contain_primary() {
        // GIVEN: composite built for a user with groups
        let c = composite("alice", &["eng", "wheel"]);
        // THEN: the self entry is present alongside the groups
        assert!(c.contains(&Principal::user("alice")));
        assert_eq!(c.members().len(), 3);
    }

    #[test]
    fn construction_drops_duplicate_members() {
        let primary = Principal::user("alice");
        let members = vec![
            primary.clone(),
            Principal::group("eng"),
            Principal::group("eng"),
            primary.clone(),
        ];
        let c = CompositePrincipal::new(primary, members);
        assert_eq!(c.members().len(), 2);
    }

    #[test]
    fn construction_preserves_member_order() {
        let c = composite("alice", &["zeta", "alpha"]);
        let names: Vec<&str> = c.members().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, &["alice", "zeta", "alpha"]);
    }

    #[test]
    fn matches_on_shared_group() {
        // GIVEN: two users sharing one group
        let a = composite("alice", &["eng", "wheel"]);
        let b = composite("bob", &["eng"]);
        // THEN: the match predicate fires both ways
        assert!(a.matches(&b));
        assert!(b.matches(&a));
    }

    #[test]
    fn no_match_on_disjoint_members() {
        let a = composite("alice", &["eng"]);
        let b = composite("bob", &["sales"]);
        assert!(!a.matches(&b));
    }

    #[test]
    fn matches_never_mutates_members() {
        let a = composite("alice", &["eng"]);
        let b = composite("bob", &["sales"]);
        let before = a.members().to_vec();
        let _ = a.matches(&b);
        assert_eq!(a.members(), before.as_slice());
    }

    #[test]
    fn contains_matches_plain_group_principal() {
        let c = composite("alice", &["eng"]);
        assert!(c.contains(&Principal::group("eng")));
        assert!(!c.contains(&Principal::group("sales")));
    }

    #[test]
    fn solo_composite_contains_only_itself() {
        let c = CompositePrincipal::solo(Principal::new("ServiceAccount", "scanner"));
        assert_eq!(c.members().len(), 1);
        assert_eq!(c.primary(), &Principal::new("ServiceAccount", "scanner"));
    }
}
