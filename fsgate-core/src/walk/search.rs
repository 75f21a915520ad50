use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::boundary::Boundaries;
use crate::error::{FsError, Result};
use crate::ignore::{normalize_ignore_folders, IgnoreCache};
use crate::pattern::Pattern;
use crate::walk::join_rel;

/// Case-insensitive name-substring search beneath `root`.
///
/// Entries that fail validation are skipped one at a time; excluded entries
/// are suppressed even when their name matches. A wildcard-free exclude
/// covers a folder's contents, not the folder entry itself. Results are
/// full paths in discovery order.
pub async fn search_names(
    boundaries: &Boundaries,
    root: &str,
    query: &str,
    exclude_patterns: &[String],
    ignore_folders: &[String],
) -> Result<Vec<PathBuf>> {
    let excludes = build_excludes(exclude_patterns)?;
    let folders = normalize_ignore_folders(ignore_folders)?;
    let root_path = boundaries.validate(root).await?;

    let mut walk = SearchWalk {
        boundaries,
        cache: IgnoreCache::new(),
        excludes,
        folders,
        needle: query.to_lowercase(),
        results: Vec::new(),
    };
    walk.visit(&root_path, "", &[]).await?;
    Ok(walk.results)
}

/// Wildcard-free exclude entries suppress everything beneath a folder of
/// that name at any depth; the folder entry itself is still eligible to
/// match. Anything containing a wildcard is compiled verbatim.
fn build_excludes(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|pattern| {
            if pattern.contains(['*', '?']) {
                Pattern::glob(pattern)
            } else {
                Pattern::glob(&format!("**/{pattern}/**"))
            }
        })
        .collect()
}

struct SearchWalk<'a> {
    boundaries: &'a Boundaries,
    cache: IgnoreCache,
    excludes: Vec<Pattern>,
    folders: Vec<Pattern>,
    needle: String,
    results: Vec<PathBuf>,
}

impl SearchWalk<'_> {
    async fn visit(&mut self, dir: &Path, rel: &str, inherited: &[Pattern]) -> Result<()> {
        let mut effective = inherited.to_vec();
        effective.extend_from_slice(self.cache.own_patterns(self.boundaries, dir).await);

        let mut read = fs::read_dir(dir).await.map_err(|e| FsError::io(dir, e))?;
        while let Some(entry) = read.next_entry().await.map_err(|e| FsError::io(dir, e))? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();

            if let Err(e) = self.boundaries.validate(&path.to_string_lossy()).await {
                debug!(path = %path.display(), error = %e, "Skipping entry during search");
                continue;
            }

            let entry_rel = join_rel(rel, &name);
            if self.folders.iter().any(|p| p.matches(&entry_rel, &name))
                || self.excludes.iter().any(|p| p.matches(&entry_rel, &name))
                || effective.iter().any(|p| p.matches(&entry_rel, &name))
            {
                continue;
            }

            if name.to_lowercase().contains(&self.needle) {
                self.results.push(path.clone());
            }

            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            if file_type.is_dir() {
                if let Err(e) = Box::pin(self.visit(&path, &entry_rel, &effective)).await {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable directory during search");
                }
            }
        }
        Ok(())
    }
}
