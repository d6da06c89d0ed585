use std::time::Duration;

use thiserror::Error;

/// Everything that can end a call to the inference server.
#[derive(Error, Debug)]
pub enum Error {
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no response within {0:?}")]
    Timeout(Duration),

    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("missing field `{0}` in response")]
    MissingField(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("unknown language code: {0}")]
    UnknownLanguage(String),

    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Timeouts reported by reqwest carry no duration, so the caller supplies the
/// window it configured.
pub fn map_reqwest_error(err: reqwest::Error, window: Duration) -> Error {
    if err.is_timeout() {
        Error::Timeout(window)
    } else {
        Error::Http(err)
    }
}
