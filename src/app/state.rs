//! Store state - pure data structure with no I/O logic

use crate::app::session::SessionHandle;
use crate::messages::StoreSnapshot;
use crate::models::{Record, RecordKind, Totals};

/// Everything the store guards besides the token itself
#[derive(Debug, Default)]
pub struct StoreState {
    pub incomes: Vec<Record>,
    pub expenses: Vec<Record>,
    /// Fetches issued in the current epoch that have not settled yet
    pub in_flight_fetches: usize,
    pub error: Option<String>,
    /// Bumped on every token transition; replies from older epochs are dropped
    pub epoch: u64,
}

impl StoreState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(&self, kind: RecordKind) -> &[Record] {
        match kind {
            RecordKind::Income => &self.incomes,
            RecordKind::Expense => &self.expenses,
        }
    }

    pub fn collection_mut(&mut self, kind: RecordKind) -> &mut Vec<Record> {
        match kind {
            RecordKind::Income => &mut self.incomes,
            RecordKind::Expense => &mut self.expenses,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight_fetches > 0
    }

    pub fn totals(&self) -> Totals {
        Totals::compute(&self.incomes, &self.expenses)
    }

    /// Start a new epoch with nothing loaded
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.incomes.clear();
        self.expenses.clear();
        self.in_flight_fetches = 0;
    }

    /// Convert state to a snapshot for consumers
    pub fn to_snapshot(&self, session: &SessionHandle) -> StoreSnapshot {
        StoreSnapshot {
            authenticated: session.is_authenticated(),
            session_kind: session.kind(),
            incomes: self.incomes.clone(),
            expenses: self.expenses.clone(),
            loading: self.is_loading(),
            error: self.error.clone(),
            totals: self.totals(),
        }
    }
}
