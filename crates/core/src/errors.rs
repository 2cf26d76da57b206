use thiserror::Error;

/// Failure of a single outbound HTTP call. Backend-reported error bodies are
/// not transport errors; they decode and pass through as regular values.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("could not connect to {url}: {message}")]
    Connect { url: String, message: String },
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("response from {url} is not valid JSON: {message}")]
    Decode { url: String, message: String },
}

impl TransportError {
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url }
            | Self::Connect { url, .. }
            | Self::Request { url, .. }
            | Self::Decode { url, .. } => url,
        }
    }

    pub fn class(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Connect { .. } => "connect",
            Self::Request { .. } => "request",
            Self::Decode { .. } => "decode",
        }
    }

    pub(crate) fn from_reqwest(url: &str, error: &reqwest::Error) -> Self {
        let url = url.to_owned();
        if error.is_timeout() {
            Self::Timeout { url }
        } else if error.is_connect() {
            Self::Connect { url, message: error.to_string() }
        } else if error.is_decode() {
            Self::Decode { url, message: error.to_string() }
        } else {
            Self::Request { url, message: error.to_string() }
        }
    }
}
