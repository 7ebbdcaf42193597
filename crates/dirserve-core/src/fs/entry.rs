//! Entry representation.

use std::path::Path;

use serde::Serialize;

/// Whether an entry is a directory or anything else.
///
/// Symbolic links are never followed, so a link to a directory is a `File`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One child of a directory, as reported to a client.
///
/// Entries are immutable values created per request. For directories `size`
/// is the recursive aggregate from [`crate::fs::size::SizeCache`]; for
/// everything else it is the length reported by `symlink_metadata`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    name: String,
    kind: EntryKind,
    size: u64,
    rel_path: String,
}

impl Entry {
    /// Creates an entry for `rel_path`, taking the name from its last component.
    pub fn new(rel_path: String, kind: EntryKind, size: u64) -> Self {
        let name = Path::new(&rel_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            kind,
            size,
            rel_path,
        }
    }

    /// Returns the final path segment.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Returns `true` if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Returns the byte size; recursive for directories.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the path relative to the root, without a leading separator.
    pub fn rel_path(&self) -> &str {
        &self.rel_path
    }
}
