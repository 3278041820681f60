use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend responded {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to upload photos")]
    MissingUploadUrls,

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

impl BackendError {
    /// HTTP status returned by the backend, if the request got that far.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status(),
            _ => None,
        }
    }
}
