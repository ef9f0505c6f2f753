use std::fmt;
use std::time::Duration;

use crate::headers::Headers;

/// Convenient result alias for executor operations.
pub type Result<T> = std::result::Result<T, HttpError>;

/// Errors surfaced by the download and API executors.
///
/// Nothing in this crate retries internally; every variant reaches the
/// caller of the logical call that produced it.
#[derive(thiserror::Error, Debug)]
pub enum HttpError {
    /// No bytes were exchanged within the idle window of one attempt.
    #[error("request to {url} timed out: no activity for {}ms", .idle.as_millis())]
    Timeout {
        /// URL of the attempt that stalled.
        url: String,
        /// Idle window that elapsed.
        idle: Duration,
    },
    /// Connection-level failure reported by reqwest (reset, DNS, TLS).
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    /// Filesystem or socket I/O failure.
    #[error("I/O operation failed: {0}")]
    Io(#[from] std::io::Error),
    /// A download attempt answered with status >= 400.
    #[error("cannot download \"{url}\", status {status}: {message}")]
    Status {
        /// URL of the failing attempt.
        url: String,
        /// HTTP status code.
        status: u16,
        /// HTTP status message.
        message: String,
    },
    /// The download path followed more redirects than allowed.
    #[error("too many redirects while downloading (more than {limit})")]
    DownloadRedirectLimit {
        /// Maximum number of hops.
        limit: usize,
    },
    /// The API path followed more redirects than allowed.
    #[error("too many redirects (> {limit})")]
    ApiRedirectLimit {
        /// Maximum number of hops.
        limit: usize,
    },
    /// 404 on the API path. Hosting services answer 404 for missing
    /// permissions as well, so the message points at the token.
    #[error(
        "cannot find {method} https://{host}{path}; please double check that your authentication token is correct and has the required permissions"
    )]
    NotFound {
        /// Request method.
        method: String,
        /// Request host.
        host: String,
        /// Request path.
        path: String,
    },
    /// The API answered with status >= 400.
    #[error("{0}")]
    Api(ErrorEnvelope),
    /// JSON body could not be decoded.
    #[error("JSON decoding failed: {0}")]
    Json(#[from] serde_json::Error),
    /// YAML body could not be decoded.
    #[error("YAML decoding failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// URL or redirect target could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The caller cancelled the logical call.
    #[error("request cancelled")]
    Cancelled,
    /// Downloaded bytes do not hash to the expected digest.
    #[error("{algorithm} checksum mismatch (expected {expected}, got {actual})")]
    ChecksumMismatch {
        /// Digest algorithm name.
        algorithm: &'static str,
        /// Expected digest.
        expected: String,
        /// Actual digest.
        actual: String,
    },
    /// Downloaded size differs from the expected size.
    #[error("downloaded size mismatch (expected {expected} bytes, got {actual} bytes)")]
    SizeMismatch {
        /// Expected size in bytes.
        expected: u64,
        /// Actual size in bytes.
        actual: u64,
    },
    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl HttpError {
    /// Helper for wrapping validation failures.
    pub fn validation(msg: impl Into<String>) -> Self {
        HttpError::Other(msg.into())
    }

    /// Status code carried by the error, if any response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            HttpError::Api(envelope) => Some(envelope.status),
            HttpError::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}

/// Response metadata of a failed API call, kept so callers can render a
/// diagnostic without re-requesting.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEnvelope {
    /// HTTP status code.
    pub status: u16,
    /// HTTP status message.
    pub status_message: String,
    /// Response headers.
    pub headers: Headers,
    /// Parsed error body, present only for JSON responses.
    pub description: Option<serde_json::Value>,
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.status_message)?;
        if let Some(description) = &self.description {
            write!(f, "\n{description}")?;
        }
        if !self.headers.is_empty() {
            write!(f, "\nHeaders: {}", self.headers)?;
        }
        Ok(())
    }
}
