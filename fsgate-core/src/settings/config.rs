use serde::{Deserialize, Serialize};

use crate::boundary::Boundaries;
use crate::error::Result;

/// Persisted configuration, stored as TOML under `~/.fsgate/settings.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Settings {
    /// Directories that file operations are denied from touching. Entries
    /// may start with `~/`, which expands to the home directory when the
    /// boundary set is built.
    #[serde(default)]
    pub denied_directories: Vec<String>,
}

impl Settings {
    /// Builds the enforcement set from the configured denied directories.
    pub fn boundaries(&self) -> Result<Boundaries> {
        Boundaries::new(self.denied_directories.iter().map(String::as_str))
    }
}
