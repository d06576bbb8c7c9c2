//! Application constants
//!
//! Centralized location for magic strings and configuration defaults.

/// Default base address of the tracker backend
pub const DEFAULT_API_URL: &str = "https://tracker-beckend.onrender.com/api/v1/";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Key under which the bearer token is persisted
pub const TOKEN_KEY: &str = "token";

/// File holding the persisted session
pub const SESSION_FILE: &str = "session.yaml";

/// Prefix of tokens synthesized when the guest endpoint is unavailable
pub const LOCAL_GUEST_PREFIX: &str = "guest-local-";

/// Error shown after the backend rejects the current token
pub const SESSION_EXPIRED: &str = "Session expired. Please log in again.";

/// Error shown when the login route rejects the credentials
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Error shown when the register route answers 401
pub const REGISTRATION_REJECTED: &str = "Registration was rejected by the server";

/// Application name
pub const APP_NAME: &str = "ledgerline";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
