//! Directory browsing and recursive name search.

use std::collections::VecDeque;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

use unicode_normalization::UnicodeNormalization;

use crate::error::{CoreError, CoreResult};
use crate::fs::entry::{Entry, EntryKind};
use crate::fs::resolve::Root;
use crate::fs::size::{log_skipped, SizeCache};

/// Name matching follows the platform's usual file system case rules.
const CASE_INSENSITIVE_NAMES: bool = cfg!(any(windows, target_os = "macos"));

/// The immediate contents of one directory plus aggregates over them.
#[derive(Debug, Clone)]
pub struct Listing {
    /// The relative path as requested.
    pub path: String,
    /// Children in file system enumeration order.
    pub entries: Vec<Entry>,
    pub file_count: usize,
    pub folder_count: usize,
    /// Sum of every entry's `size`.
    pub total_size: u64,
}

impl Listing {
    fn new(path: String, entries: Vec<Entry>) -> Self {
        let folder_count = entries.iter().filter(|e| e.is_dir()).count();
        let file_count = entries.len() - folder_count;
        let total_size = entries.iter().map(Entry::size).sum();
        Self {
            path,
            entries,
            file_count,
            folder_count,
            total_size,
        }
    }
}

/// Every descendant whose name contains a query.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The relative starting path as requested.
    pub path: String,
    pub query: String,
    /// Matches in breadth-first order.
    pub matches: Vec<Entry>,
}

/// Lists the directory at `rel` under `root`.
///
/// Entries are returned **unsorted**, in the order the OS enumerates them.
/// Directory entries carry their recursive size, computed with one
/// [`SizeCache`] for the whole call.
///
/// # Errors
///
/// - [`CoreError::AccessDenied`]: `rel` escapes the root.
/// - [`CoreError::DirectoryNotFound`]: the path is missing or not a directory.
/// - [`CoreError::Io`]: the directory itself cannot be read.
///
/// # Examples
///
/// ```no_run
/// use dirserve_core::{browse, Root};
///
/// let root = Root::new("/srv").unwrap();
/// let listing = browse(&root, "docs").unwrap();
/// for entry in &listing.entries {
///     println!("{} {}", entry.name(), entry.size());
/// }
/// ```
pub fn browse(root: &Root, rel: &str) -> CoreResult<Listing> {
    let dir = root.resolve(rel)?;
    if !dir.is_dir() {
        return Err(CoreError::DirectoryNotFound(rel.to_string()));
    }

    let mut cache = SizeCache::new();
    let mut entries = Vec::new();

    for dir_entry in std::fs::read_dir(&dir)? {
        let dir_entry = match dir_entry {
            Ok(e) => e,
            Err(e) => {
                log_skipped(&dir, &e);
                continue;
            }
        };
        let metadata = match dir_entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                log_skipped(&dir_entry.path(), &e);
                continue;
            }
        };
        if let Some(entry) = make_entry(root, &mut cache, &dir_entry.path(), &metadata) {
            entries.push(entry);
        }
    }

    Ok(Listing::new(rel.to_string(), entries))
}

/// Finds every descendant of `rel` whose name contains `query`.
///
/// The walk is breadth-first with an explicit queue and does not follow
/// symbolic links. Matching is a literal substring test on NFC-normalised
/// names; it ignores case on Windows and macOS. Subdirectories that cannot be
/// read are skipped and the partial result is returned.
///
/// # Errors
///
/// - [`CoreError::EmptyQuery`]: `query` is empty or whitespace.
/// - [`CoreError::AccessDenied`]: `rel` escapes the root.
/// - [`CoreError::DirectoryNotFound`]: the start is missing or not a directory.
/// - [`CoreError::Io`]: the start directory itself cannot be read.
pub fn search(root: &Root, rel: &str, query: &str) -> CoreResult<SearchResult> {
    if query.trim().is_empty() {
        return Err(CoreError::EmptyQuery);
    }

    let start = root.resolve(rel)?;
    if !start.is_dir() {
        return Err(CoreError::DirectoryNotFound(rel.to_string()));
    }

    let needle = fold_name(query);
    let matches = collect_matches(root, &start, VecDeque::from([start.clone()]), &needle)?;

    tracing::debug!(query, matches = matches.len(), "search finished");

    Ok(SearchResult {
        path: rel.to_string(),
        query: query.to_string(),
        matches,
    })
}

/// Breadth-first walk over `queue`, collecting entries whose folded name
/// contains `needle`. Only a failure to read `start` itself is an error.
fn collect_matches(
    root: &Root,
    start: &Path,
    mut queue: VecDeque<PathBuf>,
    needle: &str,
) -> CoreResult<Vec<Entry>> {
    let mut cache = SizeCache::new();
    let mut matches = Vec::new();

    while let Some(dir) = queue.pop_front() {
        let read_dir = match std::fs::read_dir(&dir) {
            Ok(rd) => rd,
            Err(e) if dir == start => return Err(e.into()),
            Err(e) => {
                log_skipped(&dir, &e);
                continue;
            }
        };

        for dir_entry in read_dir {
            let dir_entry = match dir_entry {
                Ok(e) => e,
                Err(e) => {
                    log_skipped(&dir, &e);
                    continue;
                }
            };
            let metadata = match dir_entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    log_skipped(&dir_entry.path(), &e);
                    continue;
                }
            };
            let path = dir_entry.path();

            if fold_name(&dir_entry.file_name().to_string_lossy()).contains(needle) {
                if let Some(entry) = make_entry(root, &mut cache, &path, &metadata) {
                    matches.push(entry);
                }
            }
            if metadata.is_dir() {
                queue.push_back(path);
            }
        }
    }

    Ok(matches)
}

/// Builds the entry for `path`, or `None` if its relative path is not valid
/// UTF-8 and so could not be sent back as a request parameter.
fn make_entry(
    root: &Root,
    cache: &mut SizeCache,
    path: &Path,
    metadata: &Metadata,
) -> Option<Entry> {
    let Some(rel_path) = root.relative(path) else {
        tracing::warn!("skipping {}: name is not valid UTF-8", path.display());
        return None;
    };
    let entry = if metadata.is_dir() {
        Entry::new(rel_path, EntryKind::Directory, cache.directory_size(path))
    } else {
        Entry::new(rel_path, EntryKind::File, metadata.len())
    };
    Some(entry)
}

fn fold_name(name: &str) -> String {
    let normalized: String = name.nfc().collect();
    if CASE_INSENSITIVE_NAMES {
        normalized.to_lowercase()
    } else {
        normalized
    }
}
