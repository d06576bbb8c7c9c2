//! Session/data store - keeps local state consistent with server confirmation
//!
//! Every operation reports failure through the `error` field instead of
//! returning it. Replies are applied only if the session epoch they were
//! issued in is still current, so a logout can never be undone by a
//! request that settles late.

use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use uuid::Uuid;

use crate::app::session::{SessionHandle, SessionKind};
use crate::app::state::StoreState;
use crate::constants::{INVALID_CREDENTIALS, LOCAL_GUEST_PREFIX, REGISTRATION_REJECTED, SESSION_EXPIRED};
use crate::errors::StoreError;
use crate::messages::StoreSnapshot;
use crate::models::{Credentials, HttpMethod, NewRecord, Record, RecordKind, Registration, Totals};
use crate::network::{ApiRequest, BearerAuth, Transport};
use crate::storage::TokenStore;

const NOT_LOGGED_IN: &str = "You must be logged in";

pub struct Store<T> {
    api: BearerAuth<T>,
    session: SessionHandle,
    tokens: TokenStore,
    state: Mutex<StoreState>,
}

impl<T: Transport> Store<T> {
    /// Build a logged-out store. Call [`Store::restore`] to pick up a
    /// persisted session.
    pub fn new(transport: T, tokens: TokenStore) -> Self {
        let session = SessionHandle::new();
        Store {
            api: BearerAuth::new(transport, session.clone()),
            session,
            tokens,
            state: Mutex::new(StoreState::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ========================
    // Accessors
    // ========================

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn transport(&self) -> &T {
        self.api.inner()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn token(&self) -> Option<String> {
        self.session.token()
    }

    pub fn incomes(&self) -> Vec<Record> {
        self.records(RecordKind::Income)
    }

    pub fn expenses(&self) -> Vec<Record> {
        self.records(RecordKind::Expense)
    }

    pub fn records(&self, kind: RecordKind) -> Vec<Record> {
        self.lock().collection(kind).to_vec()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().is_loading()
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn totals(&self) -> Totals {
        self.lock().totals()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.lock().to_snapshot(&self.session)
    }

    pub fn clear_error(&self) {
        self.lock().error = None;
    }

    fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(error = %message, "Store error");
        self.lock().error = Some(message);
    }

    // ========================
    // Session transitions
    // ========================

    /// Swap the token under the state lock. Returns false when `token` is
    /// already the active one.
    fn transition(&self, state: &mut StoreState, token: Option<String>) -> bool {
        if self.session.token() == token {
            return false;
        }

        state.reset();
        match &token {
            Some(token) => {
                if let Err(e) = self.tokens.save(token) {
                    tracing::warn!(error = %e, "Failed to persist token");
                }
            }
            None => {
                if let Err(e) = self.tokens.clear() {
                    tracing::warn!(error = %e, "Failed to discard persisted token");
                }
            }
        }
        self.session.replace(token);
        true
    }

    /// Install or drop the bearer token.
    ///
    /// A new server token triggers a fetch of both collections. Dropping the
    /// token clears both collections. Passing the active value does nothing.
    pub async fn set_token(&self, token: Option<String>) {
        let changed = {
            let mut state = self.lock();
            self.transition(&mut state, token.clone())
        };
        if !changed {
            return;
        }

        match token.as_deref().map(SessionKind::of) {
            Some(SessionKind::Server) => {
                tracing::info!("Session started");
                self.refresh().await;
            }
            Some(SessionKind::LocalGuest) => tracing::info!("Local guest session started"),
            None => tracing::info!("Session ended"),
        }
    }

    pub fn logout(&self) {
        let changed = {
            let mut state = self.lock();
            self.transition(&mut state, None)
        };
        if changed {
            tracing::info!("Logged out");
        }
    }

    /// Apply the logout effect for a 401, unless the session it belonged to
    /// is already gone.
    fn expire_session(&self, epoch: u64, message: &str) {
        let mut state = self.lock();
        if state.epoch != epoch {
            return;
        }
        self.transition(&mut state, None);
        state.error = Some(message.to_string());
        tracing::warn!(error = message, "Session invalidated");
    }

    /// Resume the session persisted by a previous run, if any
    pub async fn restore(&self) {
        match self.tokens.load() {
            Ok(Some(token)) => {
                tracing::info!("Restoring persisted session");
                self.set_token(Some(token)).await;
            }
            Ok(None) => tracing::debug!("No persisted session"),
            Err(e) => tracing::warn!(error = %e, "Failed to read persisted session"),
        }
    }

    pub async fn login(&self, credentials: Credentials) -> bool {
        let body = match serde_json::to_value(&credentials) {
            Ok(body) => body,
            Err(e) => {
                self.set_error(format!("Login failed: {}", e));
                return false;
            }
        };

        let epoch = self.lock().epoch;
        match self.call(epoch, ApiRequest::post("login", body), "Login failed").await {
            Ok(reply) => match extract_token(&reply) {
                Some(token) => {
                    self.clear_error();
                    self.set_token(Some(token)).await;
                    true
                }
                None => {
                    self.set_error("Login failed: no token in response");
                    false
                }
            },
            Err(StoreError::Unauthorized) => {
                self.expire_session(epoch, INVALID_CREDENTIALS);
                false
            }
            Err(e) => {
                self.report(epoch, e);
                false
            }
        }
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, registration: Registration) -> bool {
        let body = match serde_json::to_value(&registration) {
            Ok(body) => body,
            Err(e) => {
                self.set_error(format!("Registration failed: {}", e));
                return false;
            }
        };

        let epoch = self.lock().epoch;
        match self
            .call(epoch, ApiRequest::post("register", body), "Registration failed")
            .await
        {
            Ok(_) => {
                tracing::info!(username = %registration.username, "Registered");
                true
            }
            // No session is involved yet, so this is a refusal, not an expiry
            Err(StoreError::Unauthorized) => {
                self.set_error(REGISTRATION_REJECTED);
                false
            }
            Err(e) => {
                self.report(epoch, e);
                false
            }
        }
    }

    /// Log in with a disposable guest credential.
    ///
    /// When the backend has no guest endpoint (404) a local token is
    /// synthesized instead. That session never reaches the server: fetches
    /// are skipped and records live only in memory.
    pub async fn guest_login(&self) -> bool {
        let epoch = self.lock().epoch;
        let request = ApiRequest::new(HttpMethod::POST, "guest-login");
        match self.call(epoch, request, "Guest login failed").await {
            Ok(reply) => match extract_token(&reply) {
                Some(token) => {
                    self.clear_error();
                    self.set_token(Some(token)).await;
                    true
                }
                None => {
                    self.set_error("Guest login failed: no token in response");
                    false
                }
            },
            Err(e) if e.status() == Some(404) => {
                tracing::warn!("Guest endpoint unavailable, starting a local guest session");
                let token = format!("{}{}", LOCAL_GUEST_PREFIX, Uuid::new_v4().simple());
                self.clear_error();
                self.set_token(Some(token)).await;
                true
            }
            Err(e) => {
                self.report(epoch, e);
                false
            }
        }
    }

    // ========================
    // Records
    // ========================

    pub async fn fetch_incomes(&self) {
        self.fetch(RecordKind::Income).await
    }

    pub async fn fetch_expenses(&self) {
        self.fetch(RecordKind::Expense).await
    }

    /// Fetch both collections concurrently
    pub async fn refresh(&self) {
        tokio::join!(self.fetch_incomes(), self.fetch_expenses());
    }

    /// Replace a collection with the server's listing
    pub async fn fetch(&self, kind: RecordKind) {
        let epoch = {
            let mut state = self.lock();
            if self.session.kind() != Some(SessionKind::Server) {
                return;
            }
            state.in_flight_fetches += 1;
            state.epoch
        };

        let result = self
            .call(epoch, ApiRequest::get(kind.list_path()), &kind.fetch_failed())
            .await
            .map(|body| parse_listing(kind, body));

        {
            let mut state = self.lock();
            if state.epoch == epoch {
                state.in_flight_fetches = state.in_flight_fetches.saturating_sub(1);
                if let Ok(records) = &result {
                    tracing::debug!(kind = kind.as_str(), count = records.len(), "Collection loaded");
                    *state.collection_mut(kind) = records.clone();
                }
            }
        }

        if let Err(e) = result {
            self.report(epoch, e);
        }
    }

    /// Validate, post, and append the record the server hands back
    pub async fn add_record(&self, kind: RecordKind, record: NewRecord) {
        let (epoch, session_kind) = {
            let state = self.lock();
            (state.epoch, self.session.kind())
        };
        if !record.is_valid() {
            return self.report(epoch, StoreError::Validation(kind.invalid_data()));
        }
        match session_kind {
            None => return self.report(epoch, StoreError::Validation(NOT_LOGGED_IN.to_string())),
            Some(SessionKind::LocalGuest) => {
                let record = record.into_record(Uuid::new_v4().to_string());
                self.lock().collection_mut(kind).push(record);
                return;
            }
            Some(SessionKind::Server) => {}
        }

        let body = match serde_json::to_value(&record) {
            Ok(body) => body,
            Err(_) => return self.report(epoch, StoreError::Validation(kind.invalid_data())),
        };

        let fallback = kind.add_failed();
        let created = match self
            .call(epoch, ApiRequest::post(kind.add_path(), body), &fallback)
            .await
        {
            Ok(reply) => parse_created(kind, reply),
            Err(e) => return self.report(epoch, e),
        };

        match created {
            Some(created) => {
                let mut state = self.lock();
                if state.epoch == epoch {
                    tracing::debug!(kind = kind.as_str(), id = %created.id, "Record added");
                    state.collection_mut(kind).push(created);
                }
            }
            None => {
                // Accepted, but the reply does not say what was stored
                tracing::warn!(kind = kind.as_str(), "Add reply carried no record, reloading");
                self.fetch(kind).await;
            }
        }
    }

    /// Delete by id; the local entry goes only once the server confirms
    pub async fn delete_record(&self, kind: RecordKind, id: &str) {
        let (epoch, session_kind) = {
            let state = self.lock();
            (state.epoch, self.session.kind())
        };
        let id = id.trim();
        if id.is_empty() {
            return self.report(epoch, StoreError::Validation(kind.invalid_id()));
        }
        match session_kind {
            None => return self.report(epoch, StoreError::Validation(NOT_LOGGED_IN.to_string())),
            Some(SessionKind::LocalGuest) => {
                let removed = {
                    let mut state = self.lock();
                    let records = state.collection_mut(kind);
                    let before = records.len();
                    records.retain(|r| r.id != id);
                    records.len() != before
                };
                if !removed {
                    self.report(epoch, StoreError::remote(Some(404), kind.delete_failed()));
                }
                return;
            }
            Some(SessionKind::Server) => {}
        }

        let fallback = kind.delete_failed();
        match self
            .call(epoch, ApiRequest::delete(kind.delete_path(id)), &fallback)
            .await
        {
            Ok(_) => {
                let mut state = self.lock();
                if state.epoch == epoch {
                    tracing::debug!(kind = kind.as_str(), id, "Record deleted");
                    state.collection_mut(kind).retain(|r| r.id != id);
                }
            }
            Err(e) => self.report(epoch, e),
        }
    }

    // ========================
    // Request plumbing
    // ========================

    /// Send a request and classify the reply.
    ///
    /// 401 becomes [`StoreError::Unauthorized`]; other non-2xx replies and
    /// transport failures become [`StoreError::Remote`] with the body's
    /// message or `fallback`.
    async fn call(&self, epoch: u64, request: ApiRequest, fallback: &str) -> Result<Value, StoreError> {
        let method = request.method;
        let path = request.path.clone();
        let outcome = self.api.send(request).await;

        if self.lock().epoch != epoch {
            tracing::debug!(method = method.as_str(), path = %path, "Dropping reply from a previous session");
            return Err(StoreError::Superseded);
        }

        let reply = outcome.map_err(|e| {
            tracing::warn!(method = method.as_str(), path = %path, error = %e, "Transport error");
            StoreError::remote(None, format!("{}: {}", fallback, e))
        })?;

        if reply.is_unauthorized() {
            return Err(StoreError::Unauthorized);
        }
        if !reply.is_success() {
            let message = reply.message().unwrap_or_else(|| fallback.to_string());
            return Err(StoreError::remote(Some(reply.status), message));
        }
        Ok(reply.body)
    }

    fn report(&self, epoch: u64, error: StoreError) {
        match error {
            StoreError::Unauthorized => self.expire_session(epoch, SESSION_EXPIRED),
            StoreError::Superseded => {}
            other => self.set_error(other.to_string()),
        }
    }
}

fn extract_token(body: &Value) -> Option<String> {
    body.get("token")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Accept a bare array or `{"incomes": [...]}`; anything else is an empty listing
fn parse_listing(kind: RecordKind, body: Value) -> Vec<Record> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(kind.collection_key()) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Record>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(kind = kind.as_str(), error = %e, "Skipping malformed record");
                None
            }
        })
        .collect()
}

/// The created record, either bare or wrapped as `{"income": {...}}` / `{"data": {...}}`
fn parse_created(kind: RecordKind, body: Value) -> Option<Record> {
    if let Ok(record) = serde_json::from_value::<Record>(body.clone()) {
        return Some(record);
    }
    [kind.as_str(), "data"]
        .iter()
        .filter_map(|key| body.get(key))
        .find_map(|inner| serde_json::from_value::<Record>(inner.clone()).ok())
}
