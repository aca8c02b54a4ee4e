//! Typed error hierarchy for sitepress.
//!
//! Two enums cover the two layers:
//! - `PathError`: malformed flat keys handed to `unflatten`
//! - `SiteError`: template, data file and request failures in the server

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors from rebuilding a nested document out of flat keys.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("Flat key '{key}' has an empty segment")]
    EmptySegment { key: String },

    #[error("Index segment '{segment}' in flat key '{key}' is out of range")]
    IndexOverflow { key: String, segment: String },
}

/// Errors from the site server.
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("Invalid form data: {0}")]
    Path(#[from] PathError),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl SiteError {
    /// Wrap an I/O error, keeping missing files distinguishable.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            SiteError::NotFound { path }
        } else {
            SiteError::Io { path, source }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            SiteError::NotFound { .. } => StatusCode::NOT_FOUND,
            SiteError::Path(_) | SiteError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SiteError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            SiteError::NotFound { .. } => "Not found".to_string(),
            _ if status.is_server_error() => {
                tracing::error!(error = %self, "request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, message).into_response()
    }
}
