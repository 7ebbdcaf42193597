use axum::body::Body;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use dirserve_core::{commit_upload, open_download, stage_upload, StagedUpload};
use futures::TryStreamExt;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio_util::io::{ReaderStream, StreamReader};

use crate::dto::{DownloadQuery, UploadResponse};
use crate::error::AppError;
use crate::state::AppState;

/// RFC 5987 `attr-char`: everything else is percent-encoded in `filename*`.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// `GET /download?filePath=P`: streams a file as an attachment.
///
/// The file handle lives inside the response body stream and is released
/// when the body completes or the client goes away.
pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, AppError> {
    let file_path = query
        .file_path
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("filePath parameter is required.".to_string()))?;

    let download = open_download(&state.root, &file_path).await?;
    tracing::info!(path = %file_path, size = download.len, "download");

    let headers = [
        (
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        ),
        (
            header::CONTENT_DISPOSITION,
            content_disposition(&download.file_name)?,
        ),
        (header::CONTENT_LENGTH, HeaderValue::from(download.len)),
    ];
    let body = Body::from_stream(ReaderStream::new(download.file));

    Ok((headers, body).into_response())
}

/// `POST /upload`: multipart form with a `file` part and a `path` part.
///
/// Browser clients send `file` before `path`, so the bytes are staged in an
/// anonymous temporary file and only written into the root once the form is
/// complete. An existing file with the same name is overwritten. The size
/// limit is the route's `DefaultBodyLimit`; hitting it yields 413.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut staged: Option<(StagedUpload, String)> = None;
    let mut dir: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" if staged.is_none() => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let reader = StreamReader::new(field.map_err(std::io::Error::other));
                tokio::pin!(reader);
                let upload = stage_upload(reader)
                    .await
                    .map_err(AppError::from_upload_stream)?;
                staged = Some((upload, file_name));
            }
            "path" => dir = Some(field.text().await?),
            _ => {
                tracing::debug!(field = %name, "ignoring extra form field");
            }
        }
    }

    let (staged, file_name) = staged
        .ok_or_else(|| AppError::BadRequest("No file uploaded or file is empty.".to_string()))?;
    let dir = dir.unwrap_or_default();

    let root = state.root.clone();
    let upload =
        tokio::task::spawn_blocking(move || commit_upload(&root, staged, &dir, &file_name))
            .await
            .map_err(|e| AppError::Internal(format!("upload task failed: {e}")))??;

    Ok(Json(upload.into()))
}

/// Builds an `attachment` disposition. Names that are not plain ASCII get an
/// underscore-substituted `filename` plus a UTF-8 `filename*`.
fn content_disposition(file_name: &str) -> Result<HeaderValue, AppError> {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let value = if fallback == file_name {
        format!("attachment; filename=\"{fallback}\"")
    } else {
        let encoded = utf8_percent_encode(file_name, ATTR_CHAR);
        format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
    };

    HeaderValue::from_str(&value)
        .map_err(|e| AppError::Internal(format!("invalid disposition header: {e}")))
}
