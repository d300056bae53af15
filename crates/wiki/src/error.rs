//! Errors from the wiki client and image fetcher.

use loreforge_core::error::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum WikiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The wiki returned a non-2xx status code.
    #[error("Wiki API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("Unexpected wiki response: {0}")]
    Decode(String),

    #[error(transparent)]
    UnsupportedUniverse(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for WikiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
