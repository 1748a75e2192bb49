use std::path::PathBuf;

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{dataset}: required column `{column}` not found")]
    MissingColumn {
        dataset: String,
        column: &'static str,
    },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{dataset}: {source}")]
    Csv {
        dataset: String,
        #[source]
        source: csv::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider responded with status {0}")]
    Status(StatusCode),
    #[error("unexpected provider response: {0}")]
    Parse(String),
}

impl Error {
    /// Whether a fetch may succeed if attempted again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Error::Status(status) => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
