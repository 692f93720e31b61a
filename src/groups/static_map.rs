//! Fixed user-to-groups provider.
//!
//! Reads the whole mapping from provider options: each option key is a user
//! name, the value a comma-separated group list. Useful for small sites and
//! as a deterministic provider in tests.
//!
//! ```yaml
//! group_mapping:
//!   provider: static
//!   options:
//!     provider.alice: "eng,wheel"
//!     provider.bob: "sales"
//! ```

use std::collections::HashMap;

use async_trait::async_trait;

use crate::Result;

use super::GroupResolver;

/// Group mapping backed by a fixed in-memory table.
#[derive(Debug, Clone, Default)]
pub struct StaticGroupsProvider {
    mapping: HashMap<String, Vec<String>>,
}

impl StaticGroupsProvider {
    /// Build the table from prefix-stripped provider options.
    #[must_use]
    pub fn from_options(options: &HashMap<String, String>) -> Self {
        let mapping = options
            .iter()
            .map(|(user, groups)| {
                let list = groups
                    .split(',')
                    .map(str::trim)
                    .filter(|g| !g.is_empty())
                    .map(str::to_string)
                    .collect();
                (user.clone(), list)
            })
            .collect();
        Self { mapping }
    }

    /// Build directly from a user-to-groups table.
    #[must_use]
    pub fn from_mapping(mapping: HashMap<String, Vec<String>>) -> Self {
        Self { mapping }
    }
}

#[async_trait]
impl GroupResolver for StaticGroupsProvider {
    async fn resolve_groups(&self, short_name: &str) -> Result<Vec<String>> {
        // Unknown user means "no groups", not a lookup failure.
        Ok(self.mapping.get(short_name).cloned().unwrap_or_default())
    }
}
