//! Scripted in-memory transport for tests

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use futures_util::future::{BoxFuture, FutureExt};
use serde_json::{json, Value};
use tokio::sync::Notify;

use crate::errors::TransportError;
use crate::models::HttpMethod;
use crate::network::transport::{ApiReply, ApiRequest, Transport};

type RouteKey = (HttpMethod, String);

/// Answers requests from per-route queues of scripted replies.
///
/// The last scripted reply of a route is repeated once its queue drains.
/// Unscripted routes answer 404.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<RouteKey, VecDeque<Result<ApiReply, TransportError>>>>,
    gates: Mutex<HashMap<RouteKey, Arc<Notify>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, method: HttpMethod, path: &str, status: u16, body: Value) -> &Self {
        self.push(method, path, Ok(ApiReply::new(status, body)))
    }

    pub fn fail(&self, method: HttpMethod, path: &str, error: TransportError) -> &Self {
        self.push(method, path, Err(error))
    }

    fn push(&self, method: HttpMethod, path: &str, outcome: Result<ApiReply, TransportError>) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(outcome);
        self
    }

    /// Hold replies on a route until the returned gate is notified
    pub fn hold(&self, method: HttpMethod, path: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert((method, path.to_string()), gate.clone());
        gate
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: HttpMethod, path: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    fn next_outcome(&self, key: &RouteKey) -> Result<ApiReply, TransportError> {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Ok(ApiReply::new(404, json!({ "message": "Not found" }))),
        }
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiReply, TransportError>> {
        let key = (request.method, request.path.clone());
        self.requests.lock().unwrap().push(request);
        let gate = self.gates.lock().unwrap().get(&key).cloned();

        async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            self.next_outcome(&key)
        }
        .boxed()
    }
}
