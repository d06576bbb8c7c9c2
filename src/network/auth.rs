//! Bearer-token request decorator

use futures_util::future::BoxFuture;

use crate::app::session::SessionHandle;
use crate::errors::TransportError;
use crate::network::transport::{ApiReply, ApiRequest, Transport};

/// Wraps a transport and stamps `Authorization: Bearer <token>` on every
/// request while a token is present.
///
/// The token is read from the [`SessionHandle`] when the request is sent,
/// never captured when the decorator is built.
pub struct BearerAuth<T> {
    inner: T,
    session: SessionHandle,
}

impl<T> BearerAuth<T> {
    pub fn new(inner: T, session: SessionHandle) -> Self {
        BearerAuth { inner, session }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: Transport> Transport for BearerAuth<T> {
    fn send(&self, mut request: ApiRequest) -> BoxFuture<'_, Result<ApiReply, TransportError>> {
        if let Some(token) = self.session.token() {
            request.set_header("Authorization", format!("Bearer {}", token));
        }
        self.inner.send(request)
    }
}
