//! Session handle - the process-wide bearer token, shared explicitly

use std::sync::{Arc, RwLock};

use crate::constants::LOCAL_GUEST_PREFIX;

/// Where the current token came from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionKind {
    /// Issued by the backend
    Server,
    /// Synthesized locally because the guest endpoint was unavailable.
    /// The backend has never seen it.
    LocalGuest,
}

impl SessionKind {
    pub fn of(token: &str) -> Self {
        if token.starts_with(LOCAL_GUEST_PREFIX) {
            SessionKind::LocalGuest
        } else {
            SessionKind::Server
        }
    }
}

/// Shared view of the current bearer token.
///
/// Cloning hands out another reader of the same cell. Only the store
/// replaces the token; every reader sees the latest value at call time.
#[derive(Clone, Debug, Default)]
pub struct SessionHandle {
    token: Arc<RwLock<Option<String>>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }

    pub fn kind(&self) -> Option<SessionKind> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_deref()
            .map(SessionKind::of)
    }

    /// Swap in a new token, returning the previous one
    pub(crate) fn replace(&self, token: Option<String>) -> Option<String> {
        let mut guard = self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *guard, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_observe_latest_token() {
        let handle = SessionHandle::new();
        let reader = handle.clone();
        assert!(!reader.is_authenticated());

        handle.replace(Some("jwt".to_string()));
        assert_eq!(reader.token(), Some("jwt".to_string()));
        assert_eq!(reader.kind(), Some(SessionKind::Server));

        let previous = handle.replace(Some(format!("{}abc", LOCAL_GUEST_PREFIX)));
        assert_eq!(previous, Some("jwt".to_string()));
        assert_eq!(reader.kind(), Some(SessionKind::LocalGuest));

        handle.replace(None);
        assert_eq!(reader.kind(), None);
    }
}
