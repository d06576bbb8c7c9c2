//! # Ledgerline
//!
//! Client for a personal-finance tracker REST service.
//!
//! ## Features
//! - Login, sign-up and guest sessions (with an offline fallback)
//! - Income and expense collections kept in step with the server
//! - Totals always derived from the current collections
//! - Bearer token persisted across restarts
//! - Forced logout on any 401 reply
//!
//! ## Architecture
//! - Network Layer - transport seam, reqwest transport, bearer decorator
//! - App Layer - the session/data store and an actor driving it
//! - Shell - line commands in, snapshots out

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod messages;
pub mod models;
pub mod network;
pub mod storage;

// Re-export commonly used types
pub use app::{AppActor, SessionHandle, SessionKind, Store};
pub use config::Config;
pub use errors::{StoreError, TransportError};
pub use messages::{StoreCommand, StoreSnapshot};
pub use models::{AmountRange, Credentials, NewRecord, Record, RecordKind, Registration, Totals};
pub use network::{BearerAuth, HttpTransport, Transport};
pub use storage::TokenStore;
