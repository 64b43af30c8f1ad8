use std::fmt;

use crate::storage::StorageError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Timeout,
    Network,
    /// The backend rejected the credentials and no refresh could help.
    Unauthorized,
    /// The token refresh failed; the stored session has been wiped.
    SessionExpired,
    HttpStatus(u16),
    /// A 2xx response whose body reported failure.
    Backend,
    /// Input rejected before any request was sent.
    Validation,
    Decode,
    Storage,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Unauthorized => write!(f, "unauthorized"),
            FailureKind::SessionExpired => write!(f, "session expired"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Backend => write!(f, "backend error"),
            FailureKind::Validation => write!(f, "validation error"),
            FailureKind::Decode => write!(f, "invalid response body"),
            FailureKind::Storage => write!(f, "storage error"),
        }
    }
}

/// Error surfaced by every client operation.
///
/// `message` is meant for the user. When the backend supplied one it is kept
/// verbatim; otherwise operations replace it with their own fallback text
/// through [`ApiError::with_fallback`]. The failure kind is never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
    from_backend: bool,
}

impl ApiError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            from_backend: false,
        }
    }

    pub(crate) fn from_backend(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            from_backend: true,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, message)
    }

    /// True when `message` came from the backend response body.
    pub fn is_backend_message(&self) -> bool {
        self.from_backend
    }

    /// Replaces a transport-level message with `fallback`, keeping backend
    /// messages and client-side validation messages as they are.
    pub fn with_fallback(mut self, fallback: &str) -> Self {
        if !self.from_backend && self.kind != FailureKind::Validation {
            self.message = fallback.to_string();
        }
        self
    }

    pub(crate) fn with_kind(mut self, kind: FailureKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == FailureKind::Timeout
    }

    /// True when the caller has to log in again.
    pub fn requires_login(&self) -> bool {
        matches!(
            self.kind,
            FailureKind::Unauthorized | FailureKind::SessionExpired
        )
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::new(FailureKind::Storage, err.to_string())
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(FailureKind::Timeout, "request timed out");
    }
    if err.is_decode() {
        return ApiError::new(FailureKind::Decode, err.to_string());
    }
    ApiError::new(FailureKind::Network, err.to_string())
}
