//! App actor - message loop running store commands and publishing snapshots

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::app::store::Store;
use crate::messages::{StoreCommand, StoreSnapshot};
use crate::network::Transport;

/// Runs each command against the shared store.
///
/// Network-bound commands run as separate tasks so a logout is handled
/// while a fetch is still in flight. A snapshot is published after every
/// command settles.
pub struct AppActor<T> {
    store: Arc<Store<T>>,
    snapshot_tx: mpsc::UnboundedSender<StoreSnapshot>,
    tasks: JoinSet<()>,
}

impl<T: Transport + 'static> AppActor<T> {
    pub fn new(store: Arc<Store<T>>, snapshot_tx: mpsc::UnboundedSender<StoreSnapshot>) -> Self {
        AppActor {
            store,
            snapshot_tx,
            tasks: JoinSet::new(),
        }
    }

    /// Run the actor message loop until `Shutdown` or the sender is dropped
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<StoreCommand>) {
        // Send initial snapshot
        let _ = self.snapshot_tx.send(self.store.snapshot());

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(StoreCommand::Shutdown) | None => break,
                        Some(cmd) => self.handle_command(cmd),
                    }
                }

                // Clean up completed tasks
                Some(result) = self.tasks.join_next() => {
                    if let Err(e) = result {
                        tracing::error!(error = %e, "Store task failed");
                    }
                }
            }
        }

        tracing::info!(pending = self.tasks.len(), "Shutting down");
        self.tasks.shutdown().await;
    }

    fn handle_command(&mut self, cmd: StoreCommand) {
        tracing::debug!(command = ?cmd, "Handling command");
        match cmd {
            // Purely local, applied in order
            StoreCommand::Logout => {
                self.store.logout();
                self.publish();
            }
            StoreCommand::ClearError => {
                self.store.clear_error();
                self.publish();
            }

            StoreCommand::Login(credentials) => self.spawn(move |store| async move {
                store.login(credentials).await;
            }),
            StoreCommand::Register(registration) => self.spawn(move |store| async move {
                store.register(registration).await;
            }),
            StoreCommand::GuestLogin => self.spawn(|store| async move {
                store.guest_login().await;
            }),
            StoreCommand::Restore => self.spawn(|store| async move {
                store.restore().await;
            }),
            StoreCommand::FetchIncomes => self.spawn(|store| async move {
                store.fetch_incomes().await;
            }),
            StoreCommand::FetchExpenses => self.spawn(|store| async move {
                store.fetch_expenses().await;
            }),
            StoreCommand::Refresh => self.spawn(|store| async move {
                store.refresh().await;
            }),
            StoreCommand::AddRecord { kind, record } => self.spawn(move |store| async move {
                store.add_record(kind, record).await;
            }),
            StoreCommand::DeleteRecord { kind, id } => self.spawn(move |store| async move {
                store.delete_record(kind, &id).await;
            }),

            StoreCommand::Shutdown => {}
        }
    }

    fn spawn<F, Fut>(&mut self, op: F)
    where
        F: FnOnce(Arc<Store<T>>) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let store = self.store.clone();
        let snapshot_tx = self.snapshot_tx.clone();
        let fut = op(store.clone());
        self.tasks.spawn(async move {
            fut.await;
            let _ = snapshot_tx.send(store.snapshot());
        });
    }

    fn publish(&self) {
        let _ = self.snapshot_tx.send(self.store.snapshot());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewRecord, RecordKind};
    use crate::network::fake::FakeTransport;
    use crate::storage::TokenStore;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_commands_produce_snapshots() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::new(FakeTransport::new(), TokenStore::new(temp_dir.path())));

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (snap_tx, mut snap_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(AppActor::new(store.clone(), snap_tx).run(cmd_rx));

        let initial = snap_rx.recv().await.unwrap();
        assert!(!initial.authenticated);

        // No guest endpoint on the fake backend: the session stays local
        cmd_tx.send(StoreCommand::GuestLogin).unwrap();
        let after_guest = snap_rx.recv().await.unwrap();
        assert!(after_guest.authenticated);

        let record = NewRecord::new("x", Decimal::from(5), "c", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        cmd_tx
            .send(StoreCommand::AddRecord { kind: RecordKind::Expense, record })
            .unwrap();
        let after_add = snap_rx.recv().await.unwrap();
        assert_eq!(after_add.expenses.len(), 1);
        assert_eq!(after_add.totals.balance, Decimal::from(-5));

        cmd_tx.send(StoreCommand::Logout).unwrap();
        let after_logout = snap_rx.recv().await.unwrap();
        assert!(!after_logout.authenticated);
        assert!(after_logout.expenses.is_empty());

        cmd_tx.send(StoreCommand::Shutdown).unwrap();
        handle.await.unwrap();
    }
}
