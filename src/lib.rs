//! Group-aware principal building for message brokers.
//!
//! Augments an authenticated connection's identity with secondary group
//! memberships so a downstream authorization layer can write group-based
//! policies instead of matching single usernames.
//!
//! # Pipeline
//!
//! ```text
//! AuthEvent (SASL authorization id | TLS subject DN | other)
//!   → NameShortener / subject attribute extraction   (canonical short name)
//!   → GroupResolver                                  (ordered group list)
//!   → CompositePrincipal                             (self + Group members)
//! ```
//!
//! # Guarantees
//!
//! - **Always a principal**: [`builder::PrincipalBuilder::build`] never
//!   fails. Lookup errors, timeouts, malformed subjects, and absent realms
//!   all degrade to a username-only principal with a logged warning.
//! - **Fatal only at startup**: the single fatal path is misconfiguration
//!   (unknown provider, malformed shortening rule), raised while the builder
//!   is constructed so the broker refuses the configuration up front.
//! - **Immutable after startup**: rules, provider selection, and options are
//!   read once; `build` is safe under unsynchronized concurrent invocation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod config;
pub mod error;
pub mod groups;
pub mod principal;
pub mod realm;
pub mod shortener;
pub mod subject;

pub use builder::PrincipalBuilder;
pub use config::PrincipalConfig;
pub use error::{Error, Result};
pub use principal::{AuthEvent, CompositePrincipal, GROUP_KIND, Principal, USER_KIND};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
///
/// `RUST_LOG` overrides `level`; `format` selects `"json"` or human-readable
/// output. Fails if a global subscriber is already installed, so the host
/// broker can call this exactly once during startup.
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => subscriber.with(fmt::layer().json()).try_init(),
        _ => subscriber.with(fmt::layer()).try_init(),
    }
    .map_err(|e| Error::Config(format!("Failed to initialise tracing: {e}")))
}
