use std::env;
use std::path::{Component, Path, PathBuf};

use tokio::fs;

use crate::error::{FsError, Result};

/// Immutable set of directories that operations must stay out of.
///
/// Denylist semantics: a path equal to or beneath any entry is refused and
/// everything else is permitted. An empty set permits everything; hosts that
/// want a safe default have to configure entries themselves. Build one value
/// up front and share it; reconfiguring means building a new value.
#[derive(Debug, Clone, Default)]
pub struct Boundaries {
    denied: Vec<PathBuf>,
}

impl Boundaries {
    /// Stores each entry home-expanded, absolute, and lexically normalized.
    pub fn new<I, S>(dirs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut denied = Vec::new();
        for dir in dirs {
            let expanded = expand_home(dir.as_ref());
            let absolute = absolutize(&expanded)?;
            denied.push(normalize(&absolute));
        }
        Ok(Self { denied })
    }

    fn is_denied(&self, path: &Path) -> bool {
        self.denied.iter().any(|dir| path.starts_with(dir))
    }

    /// Checks a requested path against the denied set.
    ///
    /// Existing targets come back canonicalized, after their real
    /// (symlink-resolved) path passes the same check. Targets that are not
    /// on disk yet come back lexically normalized, provided their parent
    /// directory exists and its real path is itself permitted. Never returns
    /// a partially resolved path.
    pub async fn validate(&self, requested: &str) -> Result<PathBuf> {
        let expanded = expand_home(requested);
        let absolute = absolutize(&expanded)?;
        let normalized = normalize(&absolute);

        if self.is_denied(&normalized) {
            return Err(FsError::PathDenied { path: normalized });
        }

        match fs::canonicalize(&normalized).await {
            Ok(real) => {
                if self.is_denied(&real) {
                    return Err(FsError::SymlinkDenied { path: normalized });
                }
                Ok(real)
            }
            Err(_) => {
                // Target is not on disk yet; its parent decides.
                let Some(parent) = normalized.parent().map(Path::to_path_buf) else {
                    return Err(FsError::ParentMissing { path: normalized });
                };
                let real_parent = match fs::canonicalize(&parent).await {
                    Ok(real_parent) => real_parent,
                    Err(_) => return Err(FsError::ParentMissing { path: parent }),
                };
                if self.is_denied(&real_parent) {
                    return Err(FsError::ParentDenied { path: normalized });
                }
                Ok(normalized)
            }
        }
    }
}

/// Expands a leading `~` or `~/` to the user's home directory. Paths are
/// returned untouched when the home directory cannot be determined.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Lexical cleanup: drops `.` segments and resolves `..` against preceding
/// components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut components = path.components().peekable();
    let mut normalized = match components.peek().copied() {
        Some(component @ Component::Prefix(..)) => {
            components.next();
            PathBuf::from(component.as_os_str())
        }
        _ => PathBuf::new(),
    };

    for component in components {
        match component {
            Component::Prefix(..) => {}
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(name) => normalized.push(name),
        }
    }

    normalized
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().map_err(|e| FsError::io(path, e))?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempfile::tempdir;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/b/c")), PathBuf::from("/a/b/c"));
        assert_eq!(normalize(Path::new("/a/./b")), PathBuf::from("/a/b"));
        assert_eq!(normalize(Path::new("/a/b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/a/b/../../c")), PathBuf::from("/c"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("/a//b/")), PathBuf::from("/a/b"));
        assert_eq!(normalize(Path::new("a/./b")), PathBuf::from("a/b"));
    }

    #[test]
    fn test_expand_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_home("~"), home);
        assert_eq!(expand_home("~/notes"), home.join("notes"));
        assert_eq!(expand_home("/etc/hosts"), PathBuf::from("/etc/hosts"));
        assert_eq!(expand_home("~user/notes"), PathBuf::from("~user/notes"));
    }

    // The denied set is lexical, so tests pin the temp root to its real
    // path before building entries under it.
    fn canonical_root(temp: &tempfile::TempDir) -> PathBuf {
        temp.path().canonicalize().unwrap()
    }

    #[tokio::test]
    async fn test_validate_allows_outside_denied() {
        let temp = tempdir().unwrap();
        let root = canonical_root(&temp);
        let denied = root.join("denied");
        let open = root.join("open");
        std_fs::create_dir(&denied).unwrap();
        std_fs::create_dir(&open).unwrap();
        std_fs::write(open.join("file.txt"), "content").unwrap();

        let boundaries = Boundaries::new([denied.to_str().unwrap()]).unwrap();
        let valid = boundaries
            .validate(open.join("file.txt").to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(valid, open.join("file.txt"));
    }

    #[tokio::test]
    async fn test_validate_denies_inside() {
        let temp = tempdir().unwrap();
        let root = canonical_root(&temp);
        let denied = root.join("denied");
        std_fs::create_dir(&denied).unwrap();
        std_fs::write(denied.join("secret.txt"), "secret").unwrap();

        let boundaries = Boundaries::new([denied.to_str().unwrap()]).unwrap();
        let err = boundaries
            .validate(denied.join("secret.txt").to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::PathDenied { .. }));
    }

    #[tokio::test]
    async fn test_validate_denies_directory_itself() {
        let temp = tempdir().unwrap();
        let root = canonical_root(&temp);
        let denied = root.join("denied");
        std_fs::create_dir(&denied).unwrap();

        let boundaries = Boundaries::new([denied.to_str().unwrap()]).unwrap();
        let err = boundaries
            .validate(denied.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(err.is_denied());
    }

    #[tokio::test]
    async fn test_validate_sibling_name_prefix_allowed() {
        let temp = tempdir().unwrap();
        let root = canonical_root(&temp);
        let denied = root.join("ab");
        let sibling = root.join("abc");
        std_fs::create_dir(&denied).unwrap();
        std_fs::create_dir(&sibling).unwrap();

        // "abc" shares a string prefix with "ab" but is not inside it
        let boundaries = Boundaries::new([denied.to_str().unwrap()]).unwrap();
        boundaries
            .validate(sibling.to_str().unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_validate_dotdot_cannot_reenter() {
        let temp = tempdir().unwrap();
        let root = canonical_root(&temp);
        let denied = root.join("denied");
        std_fs::create_dir(&denied).unwrap();
        std_fs::write(denied.join("secret.txt"), "secret").unwrap();

        let boundaries = Boundaries::new([denied.to_str().unwrap()]).unwrap();
        let sneaky = root.join("open/../denied/secret.txt");
        let err = boundaries
            .validate(sneaky.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::PathDenied { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_validate_symlink_escape_denied() {
        let temp = tempdir().unwrap();
        let root = canonical_root(&temp);
        let denied = root.join("denied");
        let open = root.join("open");
        std_fs::create_dir(&denied).unwrap();
        std_fs::create_dir(&open).unwrap();
        std_fs::write(denied.join("secret.txt"), "secret").unwrap();
        std::os::unix::fs::symlink(denied.join("secret.txt"), open.join("link.txt")).unwrap();

        let boundaries = Boundaries::new([denied.to_str().unwrap()]).unwrap();
        let err = boundaries
            .validate(open.join("link.txt").to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::SymlinkDenied { .. }));
    }

    #[tokio::test]
    async fn test_validate_new_file_with_existing_parent() {
        let temp = tempdir().unwrap();
        let root = canonical_root(&temp);
        let open = root.join("open");
        std_fs::create_dir(&open).unwrap();

        let boundaries = Boundaries::new(Vec::<String>::new()).unwrap();
        let valid = boundaries
            .validate(open.join("new.txt").to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(valid, open.join("new.txt"));
        assert!(!valid.exists());
    }

    #[tokio::test]
    async fn test_validate_new_file_missing_parent() {
        let temp = tempdir().unwrap();

        let boundaries = Boundaries::new(Vec::<String>::new()).unwrap();
        let err = boundaries
            .validate(temp.path().join("missing/new.txt").to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::ParentMissing { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_validate_new_file_parent_symlinked_into_denied() {
        let temp = tempdir().unwrap();
        let root = canonical_root(&temp);
        let denied = root.join("denied");
        let open = root.join("open");
        std_fs::create_dir(&denied).unwrap();
        std_fs::create_dir(&open).unwrap();
        std::os::unix::fs::symlink(&denied, open.join("link")).unwrap();

        let boundaries = Boundaries::new([denied.to_str().unwrap()]).unwrap();
        let err = boundaries
            .validate(open.join("link/new.txt").to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::ParentDenied { .. }));
    }

    #[tokio::test]
    async fn test_validate_expands_home_in_denied_set() {
        if dirs::home_dir().is_none() {
            return;
        }

        let boundaries = Boundaries::new(["~/fsgate-denied-fixture"]).unwrap();
        let err = boundaries
            .validate("~/fsgate-denied-fixture/inner.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::PathDenied { .. }));
    }

    #[tokio::test]
    async fn test_validate_home_alias_resolves_identically() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        if !home.is_dir() {
            return;
        }

        let boundaries = Boundaries::new(Vec::<String>::new()).unwrap();
        let via_alias = boundaries
            .validate("~/fsgate-alias-check.txt")
            .await
            .unwrap();
        let spelled_out = boundaries
            .validate(home.join("fsgate-alias-check.txt").to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(via_alias, spelled_out);
    }

    #[tokio::test]
    async fn test_empty_set_denies_nothing() {
        let temp = tempdir().unwrap();
        std_fs::write(temp.path().join("file.txt"), "content").unwrap();

        let boundaries = Boundaries::new(Vec::<String>::new()).unwrap();
        boundaries
            .validate(temp.path().join("file.txt").to_str().unwrap())
            .await
            .unwrap();
    }
}
