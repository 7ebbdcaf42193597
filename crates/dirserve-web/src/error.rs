use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dirserve_core::CoreError;
use serde::Serialize;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Forbidden,
    NotFound(String),
    PayloadTooLarge(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Access denied.".to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg),
            AppError::Internal(msg) => {
                // Log the real error server-side, return generic message to client
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred.".to_string(),
                )
            }
        };

        (status, axum::Json(ErrorBody { error: message })).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::AccessDenied => AppError::Forbidden,
            CoreError::InvalidPath(_) => AppError::BadRequest("Invalid path.".to_string()),
            CoreError::EmptyQuery => {
                AppError::BadRequest("Query parameter is required.".to_string())
            }
            CoreError::EmptyUpload => {
                AppError::BadRequest("No file uploaded or file is empty.".to_string())
            }
            CoreError::InvalidName(_) => AppError::BadRequest("Invalid file name.".to_string()),
            CoreError::DirectoryNotFound(_) => {
                AppError::NotFound("Directory not found.".to_string())
            }
            CoreError::FileNotFound(_) => AppError::NotFound("File not found.".to_string()),
            e @ (CoreError::InvalidRoot(_) | CoreError::Io(_)) => AppError::Internal(e.to_string()),
        }
    }
}

impl AppError {
    fn from_multipart(e: &MultipartError) -> Self {
        tracing::debug!("Rejected multipart body: {}", e.body_text());
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge("Uploaded file is too large.".to_string())
        } else {
            AppError::BadRequest(e.body_text())
        }
    }

    /// Maps a failure while staging the file part. The part is read through an
    /// `io::Error` adapter, so a multipart error (the body limit included)
    /// arrives wrapped in [`CoreError::Io`] and is unwrapped here.
    pub fn from_upload_stream(e: CoreError) -> Self {
        if let CoreError::Io(io) = &e {
            let multipart = io
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<MultipartError>());
            if let Some(multipart) = multipart {
                return Self::from_multipart(multipart);
            }
        }
        e.into()
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        Self::from_multipart(&e)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(format!("{e:#}"))
    }
}
