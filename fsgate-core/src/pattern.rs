use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::{FsError, Result};

/// A compiled exclusion pattern.
///
/// `**` crosses directory separators while `*` and `?` stay within one
/// segment; matching is case sensitive and dot files get no special
/// treatment. An entry matches when the pattern matches its path relative
/// to the traversal root, or failing that its bare name.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    set: GlobSet,
}

impl Pattern {
    /// Compiles a glob used verbatim.
    pub fn glob(raw: &str) -> Result<Self> {
        Self::compile(raw, &[raw.to_string()])
    }

    /// Exclusion for a folder name or relative folder path: matches the
    /// folder itself at any depth and everything beneath it, without
    /// touching entries that merely share the name as a prefix.
    pub fn folder(name: &str) -> Result<Self> {
        Self::compile(name, &[format!("**/{name}"), format!("**/{name}/**")])
    }

    fn compile(raw: &str, globs: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for glob in globs {
            let glob = GlobBuilder::new(glob)
                .literal_separator(true)
                .build()
                .map_err(|source| FsError::Pattern {
                    pattern: raw.to_string(),
                    source,
                })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|source| FsError::Pattern {
            pattern: raw.to_string(),
            source,
        })?;
        Ok(Self {
            raw: raw.to_string(),
            set,
        })
    }

    /// The pattern text as supplied by its source.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// True when the relative path or the bare entry name matches.
    pub fn matches(&self, relative_path: &str, name: &str) -> bool {
        self.set.is_match(relative_path) || self.set.is_match(name)
    }
}
