//! Chat relay: a small HTTP/1.1 server that forwards chat requests upstream.
//!
//! Browsers call the relay instead of the upstream provider so the API key never leaves the
//! server. A `POST` carrying `{"messages": [...]}` is forwarded as
//! `{"messages": [...], "model": <default_model>}` with a bearer token, and the upstream JSON
//! comes back unchanged. Every response carries `Access-Control-Allow-Origin: *`.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::RelayConfig;
use crate::error::{OmniverseError, Result};

const REQUEST_ID_HEADER: &str = "x-request-id";
const ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(120);
/// Largest request body the relay will read.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Why a relayed request failed. The message is returned to the client as `{"error": ...}`.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Request body has no \"messages\" field")]
    MissingMessages,

    #[error("Upstream API key is not configured")]
    MissingApiKey,

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Upstream returned invalid JSON: {0}")]
    InvalidUpstreamBody(String),
}

/// Shared, immutable state for all connections.
#[derive(Debug)]
struct RelayState {
    config: RelayConfig,
    client: reqwest::Client,
}

/// The chat relay server.
#[derive(Debug)]
pub struct ChatRelay {
    state: Arc<RelayState>,
}

/// A relay running in the background.
#[derive(Debug)]
pub struct RelayHandle {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl RelayHandle {
    /// Address the relay is listening on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections and waits for the accept loop to exit.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "Relay accept loop panicked");
        }
    }
}

impl ChatRelay {
    /// Creates a relay for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: RelayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .map_err(|e| OmniverseError::Relay(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { state: Arc::new(RelayState { config, client }) })
    }

    /// Binds the configured address and serves until `shutdown` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn serve(self, shutdown: CancellationToken) -> Result<()> {
        let listener = self.bind_listener().await?;
        accept_loop(listener, self.state, shutdown).await;
        Ok(())
    }

    /// Binds the configured address and serves in a background task.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn spawn(self) -> Result<RelayHandle> {
        let listener = self.bind_listener().await?;
        let local_addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(accept_loop(listener, self.state, shutdown.clone()));
        Ok(RelayHandle { local_addr, shutdown, task })
    }

    async fn bind_listener(&self) -> Result<TcpListener> {
        let addr = self.state.config.address;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| OmniverseError::Relay(format!("Failed to bind to {}: {}", addr, e)))?;

        info!(
            address = %listener.local_addr().unwrap_or(addr),
            upstream = %self.state.config.upstream_url,
            model = %self.state.config.default_model,
            "Chat relay listening"
        );
        if self.state.config.api_key.is_none() {
            warn!("No upstream API key configured; POST requests will fail");
        }
        Ok(listener)
    }
}

async fn accept_loop(listener: TcpListener, state: Arc<RelayState>, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        debug!(%addr, "New relay connection");
                        tokio::spawn(handle_connection(stream, Arc::clone(&state), shutdown.clone()));
                    }
                    Err(e) => {
                        error!(error = %e, "Error accepting connection");
                    }
                }
            }
            () = shutdown.cancelled() => {
                info!("Shutdown signal received, stopping relay");
                break;
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, state: Arc<RelayState>, shutdown: CancellationToken) {
    let io = TokioIo::new(stream);
    let service = service_fn(move |req: Request<Incoming>| handle_request(req, Arc::clone(&state)));

    let conn = http1::Builder::new().serve_connection(io, service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => {
            if let Err(e) = result {
                debug!(error = %e, "Error serving connection");
            }
        }
        () = shutdown.cancelled() => {
            conn.as_mut().graceful_shutdown();
            if let Err(e) = conn.await {
                debug!(error = %e, "Error while draining connection");
            }
        }
    }
}

async fn handle_request(
    req: Request<Incoming>,
    state: Arc<RelayState>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), ToString::to_string);

    let method = req.method().clone();
    let span = info_span!("relay_request", request_id = %request_id, method = %method, uri = %req.uri().path());

    async move {
        let start = Instant::now();
        let mut response = match method {
            Method::OPTIONS => preflight(),
            Method::POST => match forward(req, &state).await {
                Ok(body) => json_response(StatusCode::OK, body),
                Err(e) => {
                    warn!(error = %e, "Relay request failed");
                    json_response(StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": e.to_string() }).to_string())
                }
            },
            _ => method_not_allowed(),
        };

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }

        info!(
            status = response.status().as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );
        Ok(response)
    }
    .instrument(span)
    .await
}

async fn forward(req: Request<Incoming>, state: &RelayState) -> std::result::Result<String, RelayError> {
    let body = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| RelayError::InvalidBody(e.to_string()))?
        .to_bytes();
    let mut payload: Value =
        serde_json::from_slice(&body).map_err(|e| RelayError::InvalidBody(e.to_string()))?;

    if let Some(requested) = payload.get("model").and_then(Value::as_str) {
        debug!(requested_model = %requested, "Ignoring client model");
    }
    let messages = payload.get_mut("messages").map(Value::take).ok_or(RelayError::MissingMessages)?;
    let api_key = state.config.api_key.as_deref().ok_or(RelayError::MissingApiKey)?;

    debug!(
        message_count = messages.as_array().map_or(0, Vec::len),
        upstream = %state.config.upstream_url,
        "Forwarding chat request"
    );

    let upstream = state
        .client
        .post(&state.config.upstream_url)
        .bearer_auth(api_key)
        .json(&json!({ "messages": messages, "model": state.config.default_model }))
        .send()
        .await?;

    let status = upstream.status();
    let text = upstream.text().await?;
    if !status.is_success() {
        warn!(status = status.as_u16(), "Upstream returned an error status");
    }

    // Parsed only to reject non-JSON; the client gets the upstream bytes as sent.
    serde_json::from_str::<Value>(&text).map_err(|e| RelayError::InvalidUpstreamBody(e.to_string()))?;
    Ok(text)
}

fn with_cors(builder: hyper::http::response::Builder) -> hyper::http::response::Builder {
    builder.header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
}

fn build(builder: hyper::http::response::Builder, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    builder.body(Full::new(body.into())).unwrap_or_else(|e| {
        error!(error = %e, "Failed to build response");
        let mut response = Response::new(Full::new(Bytes::new()));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        response
    })
}

fn preflight() -> Response<Full<Bytes>> {
    let builder = with_cors(Response::builder().status(StatusCode::OK))
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, "POST")
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, ALLOW_HEADERS);
    build(builder, "ok")
}

fn json_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    let builder = with_cors(Response::builder().status(status)).header(header::CONTENT_TYPE, "application/json");
    build(builder, body)
}

fn method_not_allowed() -> Response<Full<Bytes>> {
    let builder = with_cors(Response::builder().status(StatusCode::METHOD_NOT_ALLOWED))
        .header(header::ALLOW, "POST, OPTIONS");
    build(builder, "Method not allowed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    async fn start(upstream_url: String, api_key: Option<&str>) -> RelayHandle {
        let config = RelayConfig {
            address: "127.0.0.1:0".parse().unwrap(),
            upstream_url,
            default_model: "deepseek-ai/DeepSeek-V3".to_string(),
            api_key: api_key.map(ToString::to_string),
        };
        ChatRelay::new(config).unwrap().spawn().await.unwrap()
    }

    fn url(handle: &RelayHandle) -> String {
        format!("http://{}/chat", handle.local_addr())
    }

    #[tokio::test]
    async fn test_preflight() {
        let handle = start("http://127.0.0.1:9/unused".to_string(), None).await;

        let response = reqwest::Client::new().request(reqwest::Method::OPTIONS, url(&handle)).send().await.unwrap();
        assert_eq!(response.status(), 200);
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*");
        assert_eq!(headers["access-control-allow-methods"], "POST");
        assert_eq!(headers["access-control-allow-headers"], ALLOW_HEADERS);
        assert_eq!(response.text().await.unwrap(), "ok");

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_post_forwards_and_returns_upstream_json() {
        let mut server = mockito::Server::new_async().await;
        let upstream_body =
            r#"{"id":"abc","choices":[{"message":{"role":"assistant","content":"Hi!"}}],"big":123456789012345678901234567890}"#;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::Json(json!({
                "messages": [{"role": "user", "content": "Hello"}],
                "model": "deepseek-ai/DeepSeek-V3"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(upstream_body)
            .create_async()
            .await;

        let handle = start(format!("{}/v1/chat/completions", server.url()), Some("test-key")).await;

        let response = reqwest::Client::new()
            .post(url(&handle))
            .header(REQUEST_ID_HEADER, "req-42")
            .json(&json!({"messages": [{"role": "user", "content": "Hello"}], "model": "GPT-5.2"}))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-42");
        assert_eq!(response.text().await.unwrap(), upstream_body);

        mock.assert_async().await;
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_upstream_non_json_is_500() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server.mock("POST", "/").with_status(502).with_body("Bad Gateway").create_async().await;

        let handle = start(format!("{}/", server.url()), Some("k")).await;
        let response = reqwest::Client::new()
            .post(url(&handle))
            .json(&json!({"messages": []}))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 500);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("invalid JSON"));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_bad_body_is_500() {
        let handle = start("http://127.0.0.1:9/unused".to_string(), Some("k")).await;
        let response = reqwest::Client::new().post(url(&handle)).body("not json").send().await.unwrap();

        assert_eq!(response.status(), 500);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_oversized_body_is_500() {
        let handle = start("http://127.0.0.1:9/unused".to_string(), Some("k")).await;
        let response =
            reqwest::Client::new().post(url(&handle)).body(vec![b' '; MAX_BODY_BYTES + 1]).send().await.unwrap();

        assert_eq!(response.status(), 500);
        let body: Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_api_key_is_500() {
        let handle = start("http://127.0.0.1:9/unused".to_string(), None).await;
        let response = reqwest::Client::new()
            .post(url(&handle))
            .json(&json!({"messages": []}))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 500);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Upstream API key is not configured");

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_other_methods_rejected() {
        let handle = start("http://127.0.0.1:9/unused".to_string(), None).await;
        let response = reqwest::Client::new().get(url(&handle)).send().await.unwrap();
        assert_eq!(response.status(), 405);
        assert_eq!(response.headers()["allow"], "POST, OPTIONS");
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_accepting() {
        let handle = start("http://127.0.0.1:9/unused".to_string(), None).await;
        let addr = handle.local_addr();
        handle.shutdown().await;

        assert!(TcpStream::connect(addr).await.is_err());
    }
}
