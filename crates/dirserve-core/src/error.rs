//! Error types for `dirserve-core`.
//!
//! All fallible operations in the core library return [`CoreResult<T>`],
//! which is an alias for `Result<T, CoreError>`.
//!
//! Messages only ever carry paths relative to the served root, so they are
//! safe to show to a client. [`CoreError::InvalidRoot`] is the exception and
//! only occurs at startup.

use std::path::PathBuf;

/// Unified error type for all core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The requested path resolves outside the served root.
    #[error("access denied")]
    AccessDenied,

    /// The requested path cannot be represented on this platform.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The relative path does not name an existing directory.
    #[error("directory not found: {0}")]
    DirectoryNotFound(String),

    /// The relative path does not name an existing regular file.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// A search was requested with an empty or whitespace-only query.
    #[error("search query is empty")]
    EmptyQuery,

    /// An upload carried no bytes.
    #[error("uploaded file is empty")]
    EmptyUpload,

    /// A client-supplied file name reduces to nothing usable.
    #[error("invalid file name: {0}")]
    InvalidName(String),

    /// The configured home directory is not a directory.
    #[error("home directory is not a directory: {0}")]
    InvalidRoot(PathBuf),

    /// An I/O error that doesn't fit a more specific variant.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout `dirserve-core`.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_denied_has_no_path() {
        assert_eq!(CoreError::AccessDenied.to_string(), "access denied");
    }

    #[test]
    fn directory_not_found_displays_relative_path() {
        let err = CoreError::DirectoryNotFound("docs/missing".to_string());
        assert_eq!(err.to_string(), "directory not found: docs/missing");
    }

    #[test]
    fn file_not_found_displays_relative_path() {
        let err = CoreError::FileNotFound("docs/a.txt".to_string());
        assert_eq!(err.to_string(), "file not found: docs/a.txt");
    }

    #[test]
    fn invalid_name_displays_message() {
        let err = CoreError::InvalidName("..".to_string());
        assert_eq!(err.to_string(), "invalid file name: ..");
    }

    #[test]
    fn io_error_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let core_err: CoreError = io_err.into();
        assert!(matches!(core_err, CoreError::Io(_)));
        assert!(core_err.to_string().contains("disk on fire"));
    }

    #[test]
    fn error_is_debug() {
        let debug = format!("{:?}", CoreError::EmptyQuery);
        assert!(debug.contains("EmptyQuery"));
    }
}
