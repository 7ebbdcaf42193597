//! dirserve core library: path-safe directory service.
//!
//! `dirserve-core` resolves untrusted relative paths against a fixed root and
//! implements the operations a browser-facing file explorer needs: browsing
//! with recursive sizes, recursive name search, streamed uploads and
//! downloads. It knows nothing about HTTP; `dirserve-web` translates requests
//! into these calls.
//!
//! # Modules
//!
//! - [`fs`]: [`Root`] and path resolution, [`Entry`], size aggregation,
//!   browse/search, upload/download.
//! - [`error`]: unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod error;
pub mod fs;

pub use error::{CoreError, CoreResult};
pub use fs::{
    browse, commit_upload, directory_size, open_download, search, stage_upload, Download, Entry,
    EntryKind, Listing, Root, SearchResult, SizeCache, StagedUpload, Upload,
};
