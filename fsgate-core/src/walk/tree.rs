use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::warn;

use crate::boundary::Boundaries;
use crate::error::{FsError, Result};
use crate::ignore::{normalize_ignore_folders, IgnoreCache};
use crate::pattern::Pattern;
use crate::walk::join_rel;

/// Entry names that never appear in listings, regardless of kind.
pub const NOISE_NAMES: [&str; 3] = [".git", ".DS_Store", ".idea"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
}

/// One node of a nested listing. Directories always carry `children`
/// (possibly empty), files never do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeEntry>>,
}

impl TreeEntry {
    fn file(name: String) -> Self {
        Self {
            name,
            kind: EntryKind::File,
            children: None,
        }
    }

    fn directory(name: String, children: Vec<TreeEntry>) -> Self {
        Self {
            name,
            kind: EntryKind::Directory,
            children: Some(children),
        }
    }
}

/// Flattened listing: relative paths sorted ascending, directories carrying
/// a trailing slash. The two sequences are disjoint by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatTree {
    pub directories: Vec<String>,
    pub files: Vec<String>,
}

impl FlatTree {
    fn from_entries(entries: &[TreeEntry]) -> Self {
        let mut flat = FlatTree::default();
        flatten(entries, "", &mut flat);
        flat.directories.sort();
        flat.files.sort();
        flat
    }
}

fn flatten(entries: &[TreeEntry], prefix: &str, flat: &mut FlatTree) {
    for entry in entries {
        let rel = join_rel(prefix, &entry.name);
        match entry.kind {
            EntryKind::Directory => {
                flat.directories.push(format!("{rel}/"));
                if let Some(children) = &entry.children {
                    flatten(children, &rel, flat);
                }
            }
            EntryKind::File => flat.files.push(rel),
        }
    }
}

/// Builds the nested listing beneath `root` in enumeration order.
///
/// Ignore files and the fixed noise names apply; a failure at the root
/// fails the call while failures further down skip that subtree.
pub async fn build_nested(boundaries: &Boundaries, root: &str) -> Result<Vec<TreeEntry>> {
    let root_path = boundaries.validate(root).await?;
    let mut walk = TreeWalk {
        boundaries,
        cache: IgnoreCache::new(),
        folders: Vec::new(),
    };
    walk.walk(&root_path, "", &[]).await
}

/// Builds the flattened listing beneath `root`, additionally filtered by
/// caller-supplied folder names or globs.
pub async fn build_flat(
    boundaries: &Boundaries,
    root: &str,
    ignore_folders: &[String],
) -> Result<FlatTree> {
    let folders = normalize_ignore_folders(ignore_folders)?;
    let root_path = boundaries.validate(root).await?;
    let mut walk = TreeWalk {
        boundaries,
        cache: IgnoreCache::new(),
        folders,
    };
    let entries = walk.walk(&root_path, "", &[]).await?;
    Ok(FlatTree::from_entries(&entries))
}

struct TreeWalk<'a> {
    boundaries: &'a Boundaries,
    cache: IgnoreCache,
    folders: Vec<Pattern>,
}

impl TreeWalk<'_> {
    async fn walk(&mut self, dir: &Path, rel: &str, inherited: &[Pattern]) -> Result<Vec<TreeEntry>> {
        let mut effective = inherited.to_vec();
        effective.extend_from_slice(self.cache.own_patterns(self.boundaries, dir).await);

        let mut read = fs::read_dir(dir).await.map_err(|e| FsError::io(dir, e))?;
        let mut entries = Vec::new();
        while let Some(entry) = read.next_entry().await.map_err(|e| FsError::io(dir, e))? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if NOISE_NAMES.contains(&name.as_str()) {
                continue;
            }

            let entry_rel = join_rel(rel, &name);
            if effective.iter().any(|p| p.matches(&entry_rel, &name))
                || self.folders.iter().any(|p| p.matches(&entry_rel, &name))
            {
                continue;
            }

            let Ok(file_type) = entry.file_type().await else {
                // Entry vanished or its kind cannot be determined; leave it out.
                continue;
            };

            if !file_type.is_dir() {
                entries.push(TreeEntry::file(name));
                continue;
            }

            let path = entry.path();
            match self.descend(&path, &entry_rel, &effective).await {
                Ok(children) => entries.push(TreeEntry::directory(name, children)),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping subtree during tree traversal");
                }
            }
        }
        Ok(entries)
    }

    async fn descend(
        &mut self,
        path: &Path,
        rel: &str,
        inherited: &[Pattern],
    ) -> Result<Vec<TreeEntry>> {
        let valid = self.boundaries.validate(&path.to_string_lossy()).await?;
        Box::pin(self.walk(&valid, rel, inherited)).await
    }
}
