//! Snapshot - read-only view of the store sent to consumers

use crate::app::session::SessionKind;
use crate::models::{Record, Totals};

/// Complete state needed to render the application
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub authenticated: bool,
    pub session_kind: Option<SessionKind>,
    pub incomes: Vec<Record>,
    pub expenses: Vec<Record>,
    pub loading: bool,
    pub error: Option<String>,
    /// Computed from the two collections when the snapshot was taken
    pub totals: Totals,
}
