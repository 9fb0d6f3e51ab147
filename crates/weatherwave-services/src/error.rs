//! HTTP fetch errors.

use thiserror::Error;
use weatherwave_core::NetworkError;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}: {body}")]
    Status { status: u16, url: String, body: String },
}

impl From<FetchError> for NetworkError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Transport(e) => e.into(),
            FetchError::Status { status, body, .. } => NetworkError::Status {
                status,
                message: body,
            },
        }
    }
}
