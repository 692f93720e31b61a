//! Local OS group lookup.
//!
//! Resolves group memberships by spawning `id -Gn <user>` and splitting the
//! output on whitespace, the same mechanism Unix directory tooling has used
//! forever. Group names containing whitespace cannot be represented by this
//! provider; sites that need them should use a directory-backed provider.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::{Error, Result};

use super::GroupResolver;

/// Default provider: group membership from the local OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellGroupsProvider;

impl ShellGroupsProvider {
    /// Create the provider. No options are consumed.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GroupResolver for ShellGroupsProvider {
    async fn resolve_groups(&self, short_name: &str) -> Result<Vec<String>> {
        // `--` guards against names starting with a dash; no shell is
        // involved so no quoting issues beyond that.
        let output = Command::new("id")
            .arg("-Gn")
            .arg("--")
            .arg(short_name)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::group_lookup(short_name, format!("failed to run id: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::group_lookup(
                short_name,
                format!("id exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.split_whitespace().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These hit the real `id` binary; they assert on shape, not on the
    // machine-specific group list.

    #[tokio::test]
    async fn current_user_has_at_least_one_group() {
        let user = std::env::var("USER").unwrap_or_else(|_| "root".to_string());
        let groups = ShellGroupsProvider::new().resolve_groups(&user).await;
        if let Ok(groups) = groups {
            assert!(!groups.is_empty());
        }
    }

    #[tokio::test]
    async fn unknown_user_is_a_lookup_error() {
        // GIVEN: a user that cannot exist
        let result = ShellGroupsProvider::new()
            .resolve_groups("no-such-user-5f3a9")
            .await;
        // THEN: a request-scoped lookup error, not a panic
        assert!(matches!(result, Err(Error::GroupLookup { .. })));
    }
}
