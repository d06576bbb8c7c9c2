//! Network layer - the remote access facade
//!
//! Requests flow through a small pipeline:
//! [`BearerAuth`] attaches the live session token, then a [`Transport`]
//! (normally [`HttpTransport`]) performs the call and hands back the raw
//! status and body. Interpreting statuses is left to the store.

pub mod auth;
pub mod client;
pub mod transport;

#[cfg(test)]
pub mod fake;

pub use auth::BearerAuth;
pub use client::HttpTransport;
pub use transport::{ApiReply, ApiRequest, Transport};
