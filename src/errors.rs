use thiserror::Error;

/// Failure to get any HTTP reply at all
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("Request failed: {0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

/// Why a store operation did not apply
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Malformed local input, caught before any request
    #[error("{0}")]
    Validation(String),
    /// Network failure or non-2xx reply
    #[error("{message}")]
    Remote { status: Option<u16>, message: String },
    /// The backend answered 401
    #[error("unauthorized")]
    Unauthorized,
    /// The session changed while the request was in flight
    #[error("session changed while request was in flight")]
    Superseded,
}

impl StoreError {
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        StoreError::Remote {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Remote { status, .. } => *status,
            StoreError::Unauthorized => Some(401),
            _ => None,
        }
    }
}
