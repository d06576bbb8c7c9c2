//! Store commands - messages from the shell to the app actor

use crate::models::{Credentials, NewRecord, RecordKind, Registration};

#[derive(Debug, Clone)]
pub enum StoreCommand {
    // Session
    Login(Credentials),
    Register(Registration),
    GuestLogin,
    Logout,
    /// Pick up the token persisted by a previous run
    Restore,

    // Data
    FetchIncomes,
    FetchExpenses,
    Refresh,
    AddRecord { kind: RecordKind, record: NewRecord },
    DeleteRecord { kind: RecordKind, id: String },

    ClearError,

    /// Stop the actor
    Shutdown,
}
