//! Error types for broker-principal

use std::io;

use thiserror::Error;

/// Result type alias for broker-principal
pub type Result<T> = std::result::Result<T, Error>;

/// Principal builder errors
///
/// Only [`Error::Config`] ever escapes to the host broker: it is raised while
/// the builder is constructed at startup and must abort server configuration.
/// [`Error::GroupLookup`] and [`Error::Io`] stay internal to the resolution
/// pipeline - [`crate::builder::PrincipalBuilder::build`] swallows them and
/// degrades to a username-only principal.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (fatal, detected at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Group lookup failure (request-scoped, never fatal)
    #[error("Group lookup failed for user '{user}': {reason}")]
    GroupLookup {
        /// Short name the lookup was attempted for
        user: String,
        /// Underlying failure description
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Create a group lookup error
    pub fn group_lookup(user: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::GroupLookup {
            user: user.into(),
            reason: reason.into(),
        }
    }
}
