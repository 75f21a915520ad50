use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::boundary::Boundaries;
use crate::error::Result;
use crate::pattern::Pattern;

/// Name of the per-directory ignore file.
pub const IGNORE_FILE: &str = ".gitignore";

/// Parses ignore file contents into exclusion patterns.
///
/// Blank lines and `#` comments are dropped. Negated (`!`) entries are
/// unsupported and dropped. A trailing `/` marks a directory entry, which
/// excludes that directory and everything beneath it at any depth; every
/// other entry is matched at any depth. Lines that fail to compile are
/// skipped, so parsing itself never fails.
pub fn parse_patterns(content: &str) -> Vec<Pattern> {
    let mut patterns = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(negated) = line.strip_prefix('!') {
            debug!(pattern = negated, "Dropping unsupported negated ignore pattern");
            continue;
        }
        let compiled = match line.strip_suffix('/') {
            Some(dir) => Pattern::folder(dir),
            None => Pattern::glob(&format!("**/{line}")),
        };
        match compiled {
            Ok(pattern) => patterns.push(pattern),
            Err(e) => debug!(line, error = %e, "Skipping unparseable ignore pattern"),
        }
    }
    patterns
}

/// Normalizes one caller-supplied folder filter into an exclusion pattern.
///
/// Backslashes become `/`; a leading `./` and a trailing `/` are stripped.
/// Entries without wildcards name an exact folder, matched at any depth
/// together with its contents; entries with wildcards are compiled as globs
/// verbatim. Entries that normalize to nothing yield `None`.
pub fn normalize_ignore_folder(entry: &str) -> Result<Option<Pattern>> {
    let normalized = entry.replace('\\', "/");
    let normalized = normalized.strip_prefix("./").unwrap_or(&normalized);
    let normalized = normalized.strip_suffix('/').unwrap_or(normalized);
    if normalized.is_empty() {
        return Ok(None);
    }
    let pattern = if normalized.contains(['*', '?']) {
        Pattern::glob(normalized)?
    } else {
        Pattern::folder(normalized)?
    };
    Ok(Some(pattern))
}

pub fn normalize_ignore_folders(entries: &[String]) -> Result<Vec<Pattern>> {
    let mut patterns = Vec::new();
    for entry in entries {
        if let Some(pattern) = normalize_ignore_folder(entry)? {
            patterns.push(pattern);
        }
    }
    Ok(patterns)
}

/// Per-traversal memoization of each directory's own ignore patterns.
///
/// Create one per top-level call and discard it afterwards, so ignore file
/// edits between calls are observed.
#[derive(Default)]
pub struct IgnoreCache {
    own: HashMap<PathBuf, Vec<Pattern>>,
}

impl IgnoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// This directory's own (non-inherited) patterns, parsed on first use.
    ///
    /// A missing, unreadable, or out-of-bounds ignore file contributes no
    /// patterns.
    pub async fn own_patterns(&mut self, boundaries: &Boundaries, dir: &Path) -> &[Pattern] {
        if !self.own.contains_key(dir) {
            let patterns = load_patterns(boundaries, dir).await;
            self.own.insert(dir.to_path_buf(), patterns);
        }
        self.own.get(dir).map(Vec::as_slice).unwrap_or_default()
    }
}

async fn load_patterns(boundaries: &Boundaries, dir: &Path) -> Vec<Pattern> {
    let ignore_path = dir.join(IGNORE_FILE);
    let valid = match boundaries.validate(&ignore_path.to_string_lossy()).await {
        Ok(valid) => valid,
        Err(_) => return Vec::new(),
    };
    match fs::read_to_string(&valid).await {
        Ok(content) => parse_patterns(&content),
        Err(_) => Vec::new(),
    }
}
