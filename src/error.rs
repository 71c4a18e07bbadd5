use crate::filter::FilterError;
use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by the HTTP handlers
///
/// Client errors carry a descriptive message. Server errors render a
/// generic message and keep their cause for the server log only.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No file uploaded")]
    NoFileUploaded,

    #[error("Only Excel files are allowed")]
    UnsupportedFileType(Option<String>),

    #[error("Uploaded file not found")]
    UploadedFileNotFound,

    #[error("No valid columns selected")]
    NoValidColumns,

    #[error("No columns selected")]
    NoColumnsRequested,

    #[error("Invalid file name")]
    InvalidFileName,

    #[error("Invalid request body")]
    InvalidBody(String),

    #[error("{}", multipart_message(.0))]
    Multipart(#[from] MultipartError),

    #[error("Server error during file upload")]
    Upload(#[source] BoxError),

    #[error("Server error during file filtering")]
    Filter(#[source] BoxError),
}

impl AppError {
    pub fn upload(source: impl Into<BoxError>) -> Self {
        AppError::Upload(source.into())
    }

    pub fn filter(source: impl Into<BoxError>) -> Self {
        AppError::Filter(source.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NoFileUploaded
            | AppError::UnsupportedFileType(_)
            | AppError::UploadedFileNotFound
            | AppError::NoValidColumns
            | AppError::NoColumnsRequested
            | AppError::InvalidFileName
            | AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AppError::Multipart(e) => e.status(),
            AppError::Upload(_) | AppError::Filter(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn multipart_message(err: &MultipartError) -> String {
    match err.status() {
        StatusCode::PAYLOAD_TOO_LARGE => "File too large".to_string(),
        _ => err.body_text(),
    }
}

impl From<FilterError> for AppError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::NoMatchingColumns => AppError::NoValidColumns,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Upload(source) | AppError::Filter(source) => {
                log::error!("{}: {}", self, source);
            }
            AppError::UnsupportedFileType(content_type) => {
                log::info!("Rejected upload with content type {:?}", content_type);
            }
            AppError::InvalidBody(detail) => {
                log::info!("Rejected filter request: {}", detail);
            }
            _ => {}
        }

        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
