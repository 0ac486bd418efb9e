use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Per-target failure raised anywhere between the provider call and the artifact write.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The provider answered with a non-2xx status.
    #[error("{provider} request failed ({status}): {message}")]
    Http {
        provider: String,
        status: u16,
        message: String,
    },

    /// The request never produced a response (connect, timeout, body read).
    #[error("{provider} request failed: {message}")]
    Transport { provider: String, message: String },

    #[error("{provider} returned no image data for {model}")]
    NoImageData { provider: String, model: String },

    #[error("{provider} returned an invalid response: {message}")]
    InvalidResponse { provider: String, message: String },

    #[error("image download failed: {message}")]
    Download { message: String },

    #[error("no image data (neither URL nor bytes) for {model}")]
    NoData { model: String },

    #[error(transparent)]
    FileSystem(#[from] FileSystemError),

    #[error("{0}")]
    Other(String),
}

impl GenerationError {
    /// Provider status used for classification. Download statuses are not included: a 404 on
    /// an image URL says nothing about the deployment name.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSystemErrorKind {
    PermissionDenied,
    Io,
    Other,
}

#[derive(Debug, Error)]
#[error("failed to write {}: {source}", .path.display())]
pub struct FileSystemError {
    pub kind: FileSystemErrorKind,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl FileSystemError {
    pub fn new(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let kind = match source.kind() {
            io::ErrorKind::PermissionDenied => FileSystemErrorKind::PermissionDenied,
            io::ErrorKind::Other => FileSystemErrorKind::Other,
            _ => FileSystemErrorKind::Io,
        };
        Self {
            kind,
            path: path.into(),
            source,
        }
    }
}

/// Session-ending failure: nothing left to generate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("no valid deployments were configured")]
    NoDeployments,
    #[error("no models were selected")]
    NoModels,
}

/// Rejected field input. Callers re-prompt; it never ends the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Unauthorized,
    RateLimited,
    NotFound,
    Other,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate_limited",
            Self::NotFound => "not_found",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: ErrorCategory,
    pub message: String,
}

pub fn classify_status(status: Option<u16>) -> ErrorCategory {
    match status {
        Some(401) => ErrorCategory::Unauthorized,
        Some(429) => ErrorCategory::RateLimited,
        Some(404) => ErrorCategory::NotFound,
        _ => ErrorCategory::Other,
    }
}

/// Maps any failure to a category and a one-line message. Never fails.
pub fn classify(err: &GenerationError) -> Classification {
    let category = classify_status(err.status());
    let message = match category {
        ErrorCategory::Unauthorized => {
            "Unauthorized (401): check your API key.".to_string()
        }
        ErrorCategory::RateLimited => {
            "Rate limited (429): retry later. No automatic retry is performed.".to_string()
        }
        ErrorCategory::NotFound => {
            "Not found (404): check the deployment or model name.".to_string()
        }
        ErrorCategory::Other => err.to_string(),
    };
    Classification { category, message }
}
