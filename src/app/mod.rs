//! App layer - the session/data store and the actor that drives it
//!
//! The store owns the token, both record collections and the loading/error
//! flags. The actor receives commands, runs them against the store and
//! publishes snapshots.

pub mod actor;
pub mod session;
pub mod state;
pub mod store;

pub use actor::AppActor;
pub use session::{SessionHandle, SessionKind};
pub use state::StoreState;
pub use store::Store;
