use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, FsError>;

/// Errors raised by path validation and the file operations built on it.
///
/// Kinds stay structured inside the crate; only `Display` produces the text
/// a caller ultimately sees.
#[derive(Error, Debug)]
pub enum FsError {
    #[error("Access denied - path is inside a disallowed directory: {}", .path.display())]
    PathDenied { path: PathBuf },

    #[error("Access denied - symlink target is inside a disallowed directory: {}", .path.display())]
    SymlinkDenied { path: PathBuf },

    #[error("Access denied - parent directory is inside a disallowed directory: {}", .path.display())]
    ParentDenied { path: PathBuf },

    #[error("Parent directory does not exist: {}", .path.display())]
    ParentMissing { path: PathBuf },

    #[error("File not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Path is not a file: {}", .path.display())]
    NotAFile { path: PathBuf },

    #[error("Path is not a directory: {}", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("Invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// True for any of the three boundary denial causes.
    pub fn is_denied(&self) -> bool {
        matches!(
            self,
            Self::PathDenied { .. } | Self::SymlinkDenied { .. } | Self::ParentDenied { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
