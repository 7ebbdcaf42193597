//! Streaming uploads into the root and opening files for download.
//!
//! Uploads happen in two steps because a multipart form may deliver the file
//! bytes before it names the destination directory:
//!
//! 1. [`stage_upload`] streams the bytes into an anonymous temporary file in
//!    the system temp directory, outside the served tree.
//! 2. [`commit_upload`] validates the destination, opens it with
//!    create-or-truncate semantics and copies the staged bytes in.
//!
//! The staged file has no name, so nothing is visible under the root while an
//! upload is in flight and the OS reclaims it when the [`StagedUpload`] is
//! dropped or the process dies.

use std::fs::File;
use std::io::{Seek, SeekFrom};

use tokio::io::{AsyncRead, AsyncWriteExt};

use crate::error::{CoreError, CoreResult};
use crate::fs::resolve::Root;

/// Upload bytes held in a temporary file until a destination is known.
#[derive(Debug)]
pub struct StagedUpload {
    file: File,
    len: u64,
}

impl StagedUpload {
    /// Number of bytes received.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// A file that has been written into the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// The sanitised name the file was stored under.
    pub file_name: String,
    /// Path of the stored file relative to the root.
    pub rel_path: String,
    pub size: u64,
}

/// An open file ready to be streamed to a client.
///
/// The handle is closed when this value (or the stream wrapping `file`) is
/// dropped.
#[derive(Debug)]
pub struct Download {
    pub file: tokio::fs::File,
    /// Final path segment, for `Content-Disposition`.
    pub file_name: String,
    pub len: u64,
}

/// Streams `reader` into a new anonymous temporary file.
///
/// Copying goes through tokio's bounded copy buffer; the upload is never held
/// in memory as a whole. No size limit is applied here.
///
/// # Errors
///
/// - [`CoreError::Io`] if the temporary file cannot be created or written, or
///   if `reader` fails. A reader error is passed through unchanged as the
///   source of the `Io` variant.
pub async fn stage_upload<R>(mut reader: R) -> CoreResult<StagedUpload>
where
    R: AsyncRead + Unpin,
{
    let staged = tempfile::tempfile()?;

    let mut file = tokio::fs::File::from_std(staged.try_clone()?);
    let len = tokio::io::copy(&mut reader, &mut file).await?;
    file.flush().await?;

    Ok(StagedUpload { file: staged, len })
}

/// Writes a staged upload to `dir_rel/<file_name>` under `root`.
///
/// `file_name` is the name reported by the client. Any directory components
/// in it, with either separator, are stripped before use.
///
/// The destination is opened with create-or-truncate semantics, so an
/// existing file with the same name is **overwritten** without prompting and
/// keeps its inode, permissions and ownership. A symbolic link at the
/// destination is replaced rather than written through.
///
/// # Errors
///
/// - [`CoreError::EmptyUpload`]: nothing was received.
/// - [`CoreError::InvalidName`]: the name is empty, `.` or `..` once
///   stripped, or a directory of that name already exists.
/// - [`CoreError::AccessDenied`]: `dir_rel` escapes the root.
/// - [`CoreError::DirectoryNotFound`]: `dir_rel` is not an existing directory.
/// - [`CoreError::Io`]: the destination could not be opened or written.
pub fn commit_upload(
    root: &Root,
    mut staged: StagedUpload,
    dir_rel: &str,
    file_name: &str,
) -> CoreResult<Upload> {
    if staged.is_empty() {
        return Err(CoreError::EmptyUpload);
    }

    let name = sanitize_file_name(file_name)?;
    let dir = root.resolve(dir_rel)?;
    if !dir.is_dir() {
        return Err(CoreError::DirectoryNotFound(dir_rel.to_string()));
    }

    let dest = dir.join(&name);
    match std::fs::symlink_metadata(&dest) {
        Ok(meta) if meta.file_type().is_symlink() => std::fs::remove_file(&dest)?,
        Ok(meta) if meta.is_dir() => return Err(CoreError::InvalidName(name)),
        _ => {}
    }

    staged.file.seek(SeekFrom::Start(0))?;
    let mut out = File::create(&dest)?;
    let size = std::io::copy(&mut staged.file, &mut out)?;
    out.sync_all()?;

    let rel_path = root.relative(&dest).ok_or(CoreError::AccessDenied)?;
    tracing::info!(path = %rel_path, size, "upload stored");

    Ok(Upload {
        file_name: name,
        rel_path,
        size,
    })
}

/// Opens the regular file at `rel` under `root` for reading.
///
/// # Errors
///
/// - [`CoreError::AccessDenied`]: `rel` escapes the root.
/// - [`CoreError::FileNotFound`]: the path is missing or not a regular file.
/// - [`CoreError::Io`]: the file exists but cannot be opened.
pub async fn open_download(root: &Root, rel: &str) -> CoreResult<Download> {
    let path = root.resolve(rel)?;

    let metadata = match tokio::fs::metadata(&path).await {
        Ok(m) if m.is_file() => m,
        _ => return Err(CoreError::FileNotFound(rel.to_string())),
    };

    let file = tokio::fs::File::open(&path).await?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Download {
        file,
        file_name,
        len: metadata.len(),
    })
}

/// Reduces a client-supplied file name to its final segment.
///
/// Both `/` and `\` count as separators regardless of platform, since the
/// name comes from an arbitrary client.
fn sanitize_file_name(raw: &str) -> CoreResult<String> {
    let name = raw.rsplit(&['/', '\\'][..]).next().unwrap_or_default();
    if name.is_empty() || name == "." || name == ".." || name.contains('\0') {
        return Err(CoreError::InvalidName(raw.replace('\0', "\\0")));
    }
    Ok(name.to_string())
}
