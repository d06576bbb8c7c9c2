//! Message types for communication between the shell and the app actor.

pub mod commands;
pub mod snapshot;

pub use commands::StoreCommand;
pub use snapshot::StoreSnapshot;
