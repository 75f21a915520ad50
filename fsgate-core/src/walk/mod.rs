//! Boundary-checked recursive directory traversal.
//!
//! ## Architecture
//!
//! ### tree.rs
//! Depth-first walker producing listings in two shapes:
//! - Nested entries (`TreeEntry`), preserving filesystem enumeration order
//! - A flattened, sorted split of directory and file paths (`FlatTree`)
//!
//! ### search.rs
//! Depth-first case-insensitive name search over the same filtering
//! pipeline, returning full paths in discovery order.
//!
//! Both walkers check every directory they descend into against the
//! configured boundaries, accumulate ignore patterns strictly downward via
//! a per-call [`crate::ignore::IgnoreCache`], and treat failures below the
//! traversal root as skips rather than call-level errors.

pub mod search;
pub mod tree;

/// Relative paths use `/` separators at any depth, with the traversal root
/// itself rendered as the empty string.
pub(crate) fn join_rel(rel: &str, name: &str) -> String {
    if rel.is_empty() {
        name.to_string()
    } else {
        format!("{rel}/{name}")
    }
}
