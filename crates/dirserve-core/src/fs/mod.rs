//! File system side of the directory service.
//!
//! Every operation takes a [`resolve::Root`] and untrusted relative input.
//! Nothing here keeps state between calls.

pub mod entry;
pub mod ops;
pub mod resolve;
pub mod size;
pub mod transfer;

pub use entry::{Entry, EntryKind};
pub use ops::{browse, search, Listing, SearchResult};
pub use resolve::Root;
pub use size::{directory_size, SizeCache};
pub use transfer::{commit_upload, open_download, stage_upload, Download, StagedUpload, Upload};
