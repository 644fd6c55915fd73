//! Resolver configuration.

use serde::{Deserialize, Serialize};

use crate::classify::{Classifier, ELEMENT_MARKER, ELEMENT_VERSION};

/// Role name that marks a relationship type as hosting its source.
pub const HOST_ROLE: &str = "host";

/// Configuration for a [`Resolver`](crate::Resolver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Metadata key holding the `{version, kind}` marker
    pub marker: String,
    /// Marker version this engine understands
    pub version: String,
    /// `metadata.role` value identifying hosting relationship types
    pub host_role: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            marker: ELEMENT_MARKER.to_string(),
            version: ELEMENT_VERSION.to_string(),
            host_role: HOST_ROLE.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Defaults, overridden by `CLOUTPATH_MARKER`, `CLOUTPATH_VERSION` and
    /// `CLOUTPATH_HOST_ROLE` when set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(marker) = lookup("CLOUTPATH_MARKER") {
            config.marker = marker;
        }
        if let Some(version) = lookup("CLOUTPATH_VERSION") {
            config.version = version;
        }
        if let Some(role) = lookup("CLOUTPATH_HOST_ROLE") {
            config.host_role = role;
        }
        config
    }

    pub fn classifier(&self) -> Classifier<'_> {
        Classifier::new(&self.marker, &self.version)
    }
}
