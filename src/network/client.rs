//! HTTP transport - executes API requests with reqwest

use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt};

use crate::errors::TransportError;
use crate::models::HttpMethod;
use crate::network::transport::{ApiReply, ApiRequest, Transport};

/// Talks to the real backend over HTTP
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// `base_url` should end with `/`; routes are appended to it verbatim.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        Ok(HttpTransport {
            client: create_client(timeout)?,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Build a request from the given parameters
    fn build_request(&self, request: &ApiRequest) -> reqwest::RequestBuilder {
        let url = self.url(&request.path);

        let mut req_builder = match request.method {
            HttpMethod::GET => self.client.get(&url),
            HttpMethod::POST => self.client.post(&url),
            HttpMethod::DELETE => self.client.delete(&url),
        };

        req_builder = req_builder.header("Accept", "application/json");
        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        if request.method.has_body() {
            if let Some(body) = &request.body {
                req_builder = req_builder.json(body);
            }
        }

        req_builder
    }

    /// Execute a request and return the buffered reply
    async fn execute(&self, request: ApiRequest) -> Result<ApiReply, TransportError> {
        let start = Instant::now();
        let req_builder = self.build_request(&request);

        tracing::debug!(method = request.method.as_str(), path = %request.path, "Sending request");
        let resp = req_builder.send().await?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| TransportError::Other(format!("Error reading body: {}", e)))?;

        tracing::debug!(
            method = request.method.as_str(),
            path = %request.path,
            status,
            time_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );
        Ok(ApiReply::from_text(status, &body))
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiReply, TransportError>> {
        self.execute(request).boxed()
    }
}

/// Create an HTTP client whose every request is bounded by `timeout`
pub fn create_client(timeout: Duration) -> Result<reqwest::Client, TransportError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| TransportError::Other(format!("Failed to build HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::session::SessionHandle;
    use crate::network::auth::BearerAuth;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve exactly one HTTP exchange and hand back the raw request text
    async fn serve_once(status: u16, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 1024];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&raw).to_string();
                if let Some(split) = text.find("\r\n\r\n") {
                    let content_length = text[..split]
                        .lines()
                        .find_map(|line| {
                            let (k, v) = line.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length")
                                .then(|| v.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if raw.len() >= split + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = tx.send(String::from_utf8_lossy(&raw).to_string());
        });

        (format!("http://{}/api/v1/", addr), rx)
    }

    #[tokio::test]
    async fn test_bearer_token_reaches_the_wire() {
        let (base, seen) = serve_once(200, r#"[{"_id":"1","title":"Pay","amount":100,"category":"salary","date":"2024-01-01"}]"#).await;
        let session = SessionHandle::new();
        session.replace(Some("tok-1".to_string()));
        let api = BearerAuth::new(HttpTransport::new(base, Duration::from_secs(5)).unwrap(), session);

        let reply = api.send(ApiRequest::get("get-incomes")).await.unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body[0]["_id"], "1");

        let raw = seen.await.unwrap().to_lowercase();
        assert!(raw.starts_with("get /api/v1/get-incomes http/1.1"));
        assert!(raw.contains("authorization: bearer tok-1"));
    }

    #[tokio::test]
    async fn test_post_sends_json_and_surfaces_status() {
        let (base, seen) = serve_once(401, r#"{"message":"jwt expired"}"#).await;
        let transport = HttpTransport::new(base, Duration::from_secs(5)).unwrap();

        let reply = transport
            .send(ApiRequest::post("add-expense", json!({"title": "x", "amount": 5.0})))
            .await
            .unwrap();
        assert!(reply.is_unauthorized());
        assert_eq!(reply.message(), Some("jwt expired".to_string()));

        let raw = seen.await.unwrap();
        assert!(raw.to_lowercase().contains("content-type: application/json"));
        assert!(raw.contains(r#""title":"x""#));
    }

    #[tokio::test]
    async fn test_connection_refused_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(format!("http://{}/", addr), Duration::from_secs(5)).unwrap();
        let err = transport.send(ApiRequest::get("get-incomes")).await.unwrap_err();
        assert!(matches!(err, TransportError::Connect(_) | TransportError::Other(_)));
    }

    #[tokio::test]
    async fn test_configured_timeout_bounds_a_silent_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold the connection without ever answering
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(socket);
        });

        let transport = HttpTransport::new(format!("http://{}/", addr), Duration::from_millis(200)).unwrap();
        let started = Instant::now();
        let err = transport.send(ApiRequest::get("get-incomes")).await.unwrap_err();

        assert!(matches!(err, TransportError::Timeout));
        assert!(started.elapsed() < Duration::from_secs(5));
        server.abort();
    }
}
