//! Error types shared by the backend adapters, the board and the content sync.

use thiserror::Error;

/// Failure of a single remote (or local) store operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Request never produced an HTTP response (DNS, connect, timeout, body read).
    #[error("transport error: {message}")]
    Transport { message: String },

    /// Store answered with a non-success status.
    #[error("store returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Response arrived but could not be decoded.
    #[error("unexpected response: {message}")]
    Decode { message: String },

    /// Local storage could not be read or written.
    #[error("local storage error: {message}")]
    Storage { message: String },

    /// The store does not implement this operation.
    #[error("{operation} is not supported by the {backend} store")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },
}

impl BackendError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// HTTP status of the failed call, when there was one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(s) => Self::status(s.as_u16(), err.to_string()),
            None if err.is_decode() => Self::decode(err.to_string()),
            None => Self::transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err.to_string())
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Turn a non-2xx response into [`BackendError::Status`], keeping the body text
/// (PostgREST and Firebase both put the useful message there).
pub(crate) async fn check_status(resp: reqwest::Response) -> BackendResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        body.trim().to_string()
    };
    Err(BackendError::status(status.as_u16(), message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_only_for_status_errors() {
        assert_eq!(BackendError::status(403, "nope").status_code(), Some(403));
        assert_eq!(BackendError::transport("down").status_code(), None);
    }

    #[test]
    fn display_carries_status_and_message() {
        let e = BackendError::status(401, "JWT expired");
        assert_eq!(e.to_string(), "store returned 401: JWT expired");
    }
}
