//! The served root and resolution of untrusted paths against it.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::error::{CoreError, CoreResult};

/// The canonical directory under which every operation is confined.
///
/// `Root` is cheap to clone and immutable once built, so it can be shared
/// across request handlers and moved into blocking tasks freely.
///
/// # Examples
///
/// ```no_run
/// use dirserve_core::Root;
///
/// let root = Root::new("/srv").unwrap();
/// assert!(root.resolve("../etc").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    path: Arc<PathBuf>,
}

impl Root {
    /// Canonicalizes `path` and wraps it as a root.
    ///
    /// # Errors
    ///
    /// - [`CoreError::Io`] if the path cannot be canonicalized (e.g. it does not exist).
    /// - [`CoreError::InvalidRoot`] if it is not a directory.
    pub fn new(path: impl AsRef<Path>) -> CoreResult<Self> {
        let canonical = std::fs::canonicalize(path.as_ref())?;
        if !canonical.is_dir() {
            return Err(CoreError::InvalidRoot(canonical));
        }
        Ok(Self {
            path: Arc::new(canonical),
        })
    }

    /// Returns the canonical absolute root path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Maps untrusted relative input to an absolute path under the root.
    ///
    /// The input is expected to be already percent-decoded by the transport.
    /// `.` and `..` segments are collapsed before the containment check, which
    /// compares path components rather than raw strings, so `/home/app` never
    /// contains `/home/appendix`. The deepest existing ancestor of the result is
    /// then canonicalized through the filesystem and checked again, which
    /// rejects symlinks leading out of the root.
    ///
    /// Existence is not checked; callers decide what a missing path means.
    ///
    /// # Errors
    ///
    /// - [`CoreError::AccessDenied`] if the result would leave the root.
    /// - [`CoreError::InvalidPath`] if the input contains a NUL byte.
    pub fn resolve(&self, input: &str) -> CoreResult<PathBuf> {
        if input.contains('\0') {
            return Err(CoreError::InvalidPath(input.replace('\0', "\\0")));
        }

        let normalized = normalize_lexically(&self.path.join(input));
        if !normalized.starts_with(self.path()) {
            tracing::debug!(input, "rejected path outside root");
            return Err(CoreError::AccessDenied);
        }

        let resolved = canonicalize_existing(&normalized);
        if !resolved.starts_with(self.path()) {
            tracing::debug!(input, "rejected path escaping root through a link");
            return Err(CoreError::AccessDenied);
        }

        Ok(resolved)
    }

    /// Expresses `path` relative to the root, using the native separator.
    ///
    /// Returns `None` if `path` is not under the root or if the relative part
    /// is not valid UTF-8.
    pub fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(self.path()).ok()?;
        rel.to_str().map(str::to_owned)
    }
}

/// Collapses `.`, `..` and redundant separators without touching the filesystem.
///
/// `..` at the filesystem root stays at the root, matching OS semantics.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

/// Canonicalizes the deepest ancestor of `path` that exists and re-attaches
/// the missing tail. `path` must already be lexically normalized.
fn canonicalize_existing(path: &Path) -> PathBuf {
    for ancestor in path.ancestors() {
        if let Ok(canonical) = std::fs::canonicalize(ancestor) {
            return match path.strip_prefix(ancestor) {
                Ok(rest) if !rest.as_os_str().is_empty() => canonical.join(rest),
                _ => canonical,
            };
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Root) {
        let tmp = TempDir::new().unwrap();
        let home = tmp.path().join("app");
        fs::create_dir_all(home.join("docs").join("sub")).unwrap();
        fs::write(home.join("docs").join("a.txt"), "hi").unwrap();
        let root = Root::new(&home).unwrap();
        (tmp, root)
    }

    #[test]
    fn new_canonicalizes_root() {
        let (tmp, root) = setup();
        let dotted = tmp.path().join("app").join("docs").join("..");
        let again = Root::new(dotted).unwrap();
        assert_eq!(again.path(), root.path());
        assert!(root.path().is_absolute());
    }

    #[test]
    fn new_rejects_missing_root() {
        let tmp = TempDir::new().unwrap();
        let result = Root::new(tmp.path().join("nope"));
        assert!(matches!(result, Err(CoreError::Io(_))));
    }

    #[test]
    fn new_rejects_file_root() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(Root::new(&file), Err(CoreError::InvalidRoot(_))));
    }

    #[test]
    fn empty_input_resolves_to_root() {
        let (_tmp, root) = setup();
        assert_eq!(root.resolve("").unwrap(), root.path());
    }

    #[test]
    fn relative_input_resolves_under_root() {
        let (_tmp, root) = setup();
        let resolved = root.resolve("docs/a.txt").unwrap();
        assert_eq!(resolved, root.path().join("docs").join("a.txt"));
    }

    #[test]
    fn dot_segments_are_collapsed() {
        let (_tmp, root) = setup();
        let resolved = root.resolve("./docs/sub/../a.txt").unwrap();
        assert_eq!(resolved, root.path().join("docs").join("a.txt"));
    }

    #[test]
    fn redundant_separators_are_collapsed() {
        let (_tmp, root) = setup();
        let resolved = root.resolve("docs//sub/").unwrap();
        assert_eq!(resolved, root.path().join("docs").join("sub"));
    }

    #[test]
    fn parent_escape_is_denied() {
        let (_tmp, root) = setup();
        assert!(matches!(root.resolve("../etc"), Err(CoreError::AccessDenied)));
        assert!(matches!(
            root.resolve("docs/../../../etc/passwd"),
            Err(CoreError::AccessDenied)
        ));
    }

    #[test]
    fn excursion_that_returns_inside_is_allowed() {
        let (_tmp, root) = setup();
        let resolved = root.resolve("docs/../../app/docs").unwrap();
        assert_eq!(resolved, root.path().join("docs"));
    }

    #[test]
    fn sibling_with_shared_prefix_is_denied() {
        let (tmp, root) = setup();
        fs::create_dir(tmp.path().join("appendix")).unwrap();
        assert!(matches!(
            root.resolve("../appendix"),
            Err(CoreError::AccessDenied)
        ));
    }

    #[test]
    fn absolute_input_outside_root_is_denied() {
        let (tmp, root) = setup();
        let outside = tmp.path().to_string_lossy().to_string();
        assert!(matches!(root.resolve(&outside), Err(CoreError::AccessDenied)));
    }

    #[test]
    fn absolute_input_inside_root_is_allowed() {
        let (_tmp, root) = setup();
        let inside = root.path().join("docs").to_string_lossy().to_string();
        assert_eq!(root.resolve(&inside).unwrap(), root.path().join("docs"));
    }

    #[test]
    fn missing_path_still_resolves() {
        let (_tmp, root) = setup();
        let resolved = root.resolve("docs/missing/deeper").unwrap();
        assert_eq!(
            resolved,
            root.path().join("docs").join("missing").join("deeper")
        );
    }

    #[test]
    fn nul_byte_is_invalid() {
        let (_tmp, root) = setup();
        assert!(matches!(
            root.resolve("docs\0/a.txt"),
            Err(CoreError::InvalidPath(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn backslash_is_an_ordinary_character_on_unix() {
        let (_tmp, root) = setup();
        let resolved = root.resolve("..\\..\\etc").unwrap();
        assert_eq!(resolved, root.path().join("..\\..\\etc"));
    }

    #[cfg(windows)]
    #[test]
    fn backslash_traversal_is_denied_on_windows() {
        let (_tmp, root) = setup();
        assert!(matches!(
            root.resolve("..\\..\\Windows"),
            Err(CoreError::AccessDenied)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_out_of_root_is_denied() {
        let (tmp, root) = setup();
        let outside = tmp.path().join("secret");
        fs::create_dir(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, root.path().join("escape")).unwrap();

        assert!(matches!(root.resolve("escape"), Err(CoreError::AccessDenied)));
        assert!(matches!(
            root.resolve("escape/new.txt"),
            Err(CoreError::AccessDenied)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_inside_root_resolves_to_target() {
        let (_tmp, root) = setup();
        std::os::unix::fs::symlink(root.path().join("docs"), root.path().join("alias")).unwrap();
        assert_eq!(root.resolve("alias").unwrap(), root.path().join("docs"));
    }

    #[test]
    fn relative_strips_root() {
        let (_tmp, root) = setup();
        let abs = root.path().join("docs").join("a.txt");
        let expected = Path::new("docs").join("a.txt").to_string_lossy().to_string();
        assert_eq!(root.relative(&abs).unwrap(), expected);
        assert_eq!(root.relative(root.path()).unwrap(), "");
    }

    #[test]
    fn relative_rejects_foreign_paths() {
        let (tmp, root) = setup();
        assert!(root.relative(tmp.path()).is_none());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn relative_rejects_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (_tmp, root) = setup();
        let abs = root.path().join(OsStr::from_bytes(b"bad\xff.txt"));
        assert!(root.relative(&abs).is_none());
    }
}
