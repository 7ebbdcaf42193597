//! Recursive directory size aggregation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Sums the sizes of everything below `dir`, without a shared cache.
///
/// See [`SizeCache::directory_size`] for the traversal rules.
pub fn directory_size(dir: &Path) -> u64 {
    SizeCache::new().directory_size(dir)
}

/// Memoizes directory aggregates for the duration of a single request.
///
/// Every directory visited while computing one aggregate is remembered, so
/// asking for a nested directory afterwards costs nothing. A cache must not
/// outlive the request that created it: the filesystem may change between
/// requests.
#[derive(Debug, Default)]
pub struct SizeCache {
    sizes: HashMap<PathBuf, u64>,
}

enum Visit {
    Enter(PathBuf),
    Exit(PathBuf),
}

impl SizeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the byte sum of all non-directory entries reachable under `dir`.
    ///
    /// The walk uses an explicit stack, so deep trees cannot exhaust the call
    /// stack. Symbolic links are never followed; a link counts with its own
    /// `symlink_metadata` length. Subtrees that cannot be read are skipped and
    /// the partial sum is returned.
    pub fn directory_size(&mut self, dir: &Path) -> u64 {
        if let Some(&size) = self.sizes.get(dir) {
            return size;
        }

        let mut partial: HashMap<PathBuf, u64> = HashMap::new();
        let mut stack = vec![Visit::Enter(dir.to_path_buf())];

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(path) => {
                    if let Some(&size) = self.sizes.get(&path) {
                        add_to_parent(&mut partial, &path, size);
                        continue;
                    }
                    stack.push(Visit::Exit(path.clone()));

                    let read_dir = match std::fs::read_dir(&path) {
                        Ok(rd) => rd,
                        Err(e) => {
                            log_skipped(&path, &e);
                            continue;
                        }
                    };

                    for dir_entry in read_dir {
                        let dir_entry = match dir_entry {
                            Ok(e) => e,
                            Err(e) => {
                                log_skipped(&path, &e);
                                continue;
                            }
                        };
                        // DirEntry::metadata and file_type do not traverse links.
                        let metadata = match dir_entry.metadata() {
                            Ok(m) => m,
                            Err(e) => {
                                log_skipped(&dir_entry.path(), &e);
                                continue;
                            }
                        };
                        if metadata.is_dir() {
                            stack.push(Visit::Enter(dir_entry.path()));
                        } else {
                            *partial.entry(path.clone()).or_insert(0) += metadata.len();
                        }
                    }
                }
                Visit::Exit(path) => {
                    let total = partial.remove(&path).unwrap_or(0);
                    if path != dir {
                        add_to_parent(&mut partial, &path, total);
                    }
                    self.sizes.insert(path, total);
                }
            }
        }

        self.sizes.get(dir).copied().unwrap_or(0)
    }
}

fn add_to_parent(partial: &mut HashMap<PathBuf, u64>, path: &Path, size: u64) {
    if let Some(parent) = path.parent() {
        *partial.entry(parent.to_path_buf()).or_insert(0) += size;
    }
}

/// Logs a subtree that is left out of a traversal.
///
/// Permission errors are expected on real systems and only logged at debug.
pub(crate) fn log_skipped(path: &Path, err: &std::io::Error) {
    if err.kind() == std::io::ErrorKind::PermissionDenied {
        tracing::debug!("skipping unreadable {}: {err}", path.display());
    } else {
        tracing::warn!("skipping {}: {err}", path.display());
    }
}
