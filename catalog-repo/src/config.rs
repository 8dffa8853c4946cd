//! Repository configuration.

use catalog_types::{EntityVersion, VersionStep};
use serde::{Deserialize, Serialize};

/// Tunables shared by every repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Version assigned on create.
    pub initial_version: EntityVersion,
    /// Increment applied when an update changes at least one field.
    pub version_step: VersionStep,
    /// When set, an update that changed nothing does not run the update hook.
    pub skip_unchanged_update_hooks: bool,
    /// Page size used when a list call does not set a limit.
    pub default_page_size: usize,
    /// Base URL for derived `href` fields. No href is set when absent.
    pub href_base: Option<String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            initial_version: EntityVersion::INITIAL,
            version_step: VersionStep::Minor,
            skip_unchanged_update_hooks: false,
            default_page_size: 10,
            href_base: None,
        }
    }
}
