use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use tokio::fs;

use crate::boundary::Boundaries;
use crate::error::{FsError, Result};
use crate::walk::search::search_names;
use crate::walk::tree::{build_flat, build_nested};

/// Rendered by [`FileAccess::search`] when nothing matched.
pub const NO_MATCHES: &str = "No matches found";

/// Boundary-checked file operations, the surface handed to a tool-dispatch
/// layer. Every operation validates its path arguments before touching the
/// filesystem; text-returning operations render the way an agent consumes
/// them.
#[derive(Clone)]
pub struct FileAccess {
    boundaries: Boundaries,
}

impl FileAccess {
    pub fn new(boundaries: Boundaries) -> Self {
        Self { boundaries }
    }

    /// Resolves and checks a path without performing any operation on it.
    pub async fn validate(&self, path: &str) -> Result<PathBuf> {
        self.boundaries.validate(path).await
    }

    /// Reads a regular file as UTF-8. With `line_numbers`, each line is
    /// prefixed with its 1-based number for line-oriented follow-up edits.
    pub async fn read_file(&self, path: &str, line_numbers: bool) -> Result<String> {
        let valid = self.boundaries.validate(path).await?;

        let metadata = match fs::metadata(&valid).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FsError::NotFound { path: valid })
            }
            Err(e) => return Err(FsError::io(&valid, e)),
        };
        if !metadata.is_file() {
            return Err(FsError::NotAFile { path: valid });
        }

        let content = fs::read_to_string(&valid)
            .await
            .map_err(|e| FsError::io(&valid, e))?;
        if !line_numbers {
            return Ok(content);
        }
        Ok(content
            .lines()
            .enumerate()
            .map(|(i, line)| format!("{}\t{}", i + 1, line))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Reads a batch of files. Each item renders as `<path>:` followed by
    /// its content, or `<path>: Error - <message>` when that item fails;
    /// items are joined by `---` separators. One bad path never aborts the
    /// rest.
    pub async fn read_many(&self, paths: &[String]) -> String {
        let mut sections = Vec::with_capacity(paths.len());
        for path in paths {
            match self.read_file(path, false).await {
                Ok(content) => sections.push(format!("{path}:\n{content}\n")),
                Err(e) => sections.push(format!("{path}: Error - {e}")),
            }
        }
        sections.join("\n---\n")
    }

    /// Writes UTF-8 content. The parent directory of a new file must already
    /// exist and be permitted; validation rejects the write otherwise.
    pub async fn write_file(&self, path: &str, content: &str) -> Result<String> {
        let valid = self.boundaries.validate(path).await?;
        fs::write(&valid, content)
            .await
            .map_err(|e| FsError::io(&valid, e))?;
        Ok(format!("Successfully wrote to {path}"))
    }

    /// Creates a directory, succeeding quietly when it already exists.
    pub async fn create_directory(&self, path: &str) -> Result<String> {
        let valid = self.boundaries.validate(path).await?;
        fs::create_dir_all(&valid)
            .await
            .map_err(|e| FsError::io(&valid, e))?;
        Ok(format!("Successfully created directory {path}"))
    }

    /// Renames a file or directory. Both endpoints are validated.
    pub async fn move_path(&self, source: &str, destination: &str) -> Result<String> {
        let valid_source = self.boundaries.validate(source).await?;
        let valid_destination = self.boundaries.validate(destination).await?;
        fs::rename(&valid_source, &valid_destination)
            .await
            .map_err(|e| FsError::io(&valid_source, e))?;
        Ok(format!("Successfully moved {source} to {destination}"))
    }

    /// One-level listing in enumeration order, each name prefixed with its
    /// kind tag.
    pub async fn list_directory(&self, path: &str) -> Result<String> {
        let valid = self.boundaries.validate(path).await?;

        let metadata = match fs::metadata(&valid).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FsError::NotFound { path: valid })
            }
            Err(e) => return Err(FsError::io(&valid, e)),
        };
        if !metadata.is_dir() {
            return Err(FsError::NotADirectory { path: valid });
        }

        let mut read = fs::read_dir(&valid)
            .await
            .map_err(|e| FsError::io(&valid, e))?;
        let mut lines = Vec::new();
        while let Some(entry) = read
            .next_entry()
            .await
            .map_err(|e| FsError::io(&valid, e))?
        {
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            let tag = if file_type.is_dir() { "[DIR]" } else { "[FILE]" };
            lines.push(format!("{tag} {}", entry.file_name().to_string_lossy()));
        }
        Ok(lines.join("\n"))
    }

    /// Size, timestamps, kind flags, and permission bits as `key: value`
    /// lines.
    pub async fn file_info(&self, path: &str) -> Result<String> {
        let valid = self.boundaries.validate(path).await?;

        let metadata = match fs::metadata(&valid).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FsError::NotFound { path: valid })
            }
            Err(e) => return Err(FsError::io(&valid, e)),
        };

        let lines = [
            format!("size: {}", metadata.len()),
            format!("created: {}", format_timestamp(metadata.created())),
            format!("modified: {}", format_timestamp(metadata.modified())),
            format!("accessed: {}", format_timestamp(metadata.accessed())),
            format!("is_directory: {}", metadata.is_dir()),
            format!("is_file: {}", metadata.is_file()),
            format!("permissions: {}", format_permissions(&metadata)),
        ];
        Ok(lines.join("\n"))
    }

    /// Flattened recursive listing as indented JSON with `directories` and
    /// `files` keys.
    pub async fn flat_tree(&self, root: &str, ignore_folders: &[String]) -> Result<String> {
        let tree = build_flat(&self.boundaries, root, ignore_folders).await?;
        Ok(serde_json::to_string_pretty(&tree)?)
    }

    /// Nested recursive listing as indented JSON, one entry per immediate
    /// child of `root`.
    pub async fn nested_tree(&self, root: &str) -> Result<String> {
        let entries = build_nested(&self.boundaries, root).await?;
        Ok(serde_json::to_string_pretty(&entries)?)
    }

    /// Name search rendered as newline-joined full paths, or the
    /// [`NO_MATCHES`] sentinel when nothing matched.
    pub async fn search(
        &self,
        root: &str,
        query: &str,
        exclude_patterns: &[String],
        ignore_folders: &[String],
    ) -> Result<String> {
        let matches = search_names(
            &self.boundaries,
            root,
            query,
            exclude_patterns,
            ignore_folders,
        )
        .await?;
        if matches.is_empty() {
            return Ok(NO_MATCHES.to_string());
        }
        let lines: Vec<String> = matches
            .iter()
            .map(|path| path.display().to_string())
            .collect();
        Ok(lines.join("\n"))
    }
}

fn format_timestamp(time: std::io::Result<SystemTime>) -> String {
    match time {
        Ok(time) => DateTime::<Local>::from(time).to_rfc3339(),
        Err(_) => "unavailable".to_string(),
    }
}

#[cfg(unix)]
fn format_permissions(metadata: &std::fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:03o}", metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn format_permissions(metadata: &std::fs::Metadata) -> String {
    if metadata.permissions().readonly() {
        "read-only".to_string()
    } else {
        "writable".to_string()
    }
}
