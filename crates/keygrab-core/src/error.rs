//! Error types for keygrab

use thiserror::Error;

/// Result type alias for keygrab operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure classes, used when reporting why a channel was skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Timeout, connection failure or HTTP error status
    Transport,
    /// The remote side answered, but not with what we expected
    Protocol,
    /// Local I/O or configuration problem that ends the run
    Fatal,
}

/// keygrab error types
#[derive(Error, Debug)]
pub enum Error {
    // Transport errors
    #[error("Request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    // Authorization errors
    #[error("Authorization returned non-ok status: {status}")]
    StatusNotOk { status: String },

    #[error("Malformed authorization response: {0}")]
    InvalidAcknowledgement(String),

    // Playlist errors
    #[error("#EXT-X-KEY line not found in {url}")]
    KeyLineNotFound { url: String },

    #[error("No URI attribute in key line: {line}")]
    KeyUriNotFound { line: String },

    #[error("Invalid key URI '{uri}': {reason}")]
    InvalidKeyUri { uri: String, reason: String },

    // Key errors
    #[error("Expected {expected} key bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("Invalid base64 key: {0}")]
    InvalidKeyEncoding(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify a reqwest error against the URL it was issued for
    pub fn request(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            return Error::Timeout { url };
        }
        if let Some(status) = source.status() {
            return Error::HttpStatus {
                url,
                status: status.as_u16(),
            };
        }
        Error::Request { url, source }
    }

    /// Returns the failure class of this error
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::Request { .. } | Error::Timeout { .. } | Error::HttpStatus { .. } => {
                FailureKind::Transport
            }
            Error::StatusNotOk { .. }
            | Error::InvalidAcknowledgement(_)
            | Error::KeyLineNotFound { .. }
            | Error::KeyUriNotFound { .. }
            | Error::InvalidKeyUri { .. }
            | Error::InvalidKeyLength { .. }
            | Error::InvalidKeyEncoding(_) => FailureKind::Protocol,
            Error::InvalidConfig(_) | Error::Json(_) | Error::Io(_) => FailureKind::Fatal,
        }
    }

    /// Returns the error code used in run reports
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Request { .. } => "REQUEST",
            Error::Timeout { .. } => "TIMEOUT",
            Error::HttpStatus { .. } => "HTTP_STATUS",
            Error::StatusNotOk { .. } => "STATUS_NOT_OK",
            Error::InvalidAcknowledgement(_) => "BAD_ACK",
            Error::KeyLineNotFound { .. } => "LINE_NOT_FOUND",
            Error::KeyUriNotFound { .. } => "URI_NOT_FOUND",
            Error::InvalidKeyUri { .. } => "INVALID_KEY_URI",
            Error::InvalidKeyLength { .. } => "KEY_LENGTH",
            Error::InvalidKeyEncoding(_) => "KEY_ENCODING",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Json(_) => "JSON",
            Error::Io(_) => "IO",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let e = Error::StatusNotOk { status: "fail".into() };
        assert_eq!(e.kind(), FailureKind::Protocol);

        let e = Error::Timeout { url: "http://x".into() };
        assert_eq!(e.kind(), FailureKind::Transport);
        assert_eq!(e.error_code(), "TIMEOUT");

        let e = Error::InvalidConfig("bad".into());
        assert_eq!(e.kind(), FailureKind::Fatal);
    }

    #[test]
    fn test_line_not_found_message() {
        let e = Error::KeyLineNotFound { url: "http://x/1/mono.m3u8".into() };
        assert!(e.to_string().contains("line not found"));
    }
}
