//! # triton-test-server
//!
//! Scripted axum servers standing in for CloudAPI in integration tests.
//!
//! - [`TestServer`] records every HTTP request and answers it with the
//!   [`Reply`] returned by a handler closure.
//! - [`FeedServer`] accepts one change-feed websocket, records the
//!   subscription and pushes a fixed list of events.
//!
//! Responses carry `Connection: close`, so each request uses a fresh
//! connection.
//!
//! ```rust,no_run
//! use serde_json::json;
//! use triton_test_server::{Reply, TestServer};
//!
//! # async fn example() -> std::io::Result<()> {
//! let server = TestServer::start(|req| match req.path.as_str() {
//!     "/alice/machines" => Reply::json(200, &json!([])),
//!     _ => Reply::error(404, "ResourceNotFound", "not found"),
//! })
//! .await?;
//! assert!(server.url().starts_with("http://127.0.0.1:"));
//! server.shutdown().await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::collections::{BTreeMap, HashMap};
use std::io::Write as _;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::header::{CONNECTION, CONTENT_LENGTH};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use futures::StreamExt;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One request as the server saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request method, upper case.
    pub method: String,
    /// Path as sent (still percent-encoded).
    pub path: String,
    /// Decoded query parameters.
    pub query: BTreeMap<String, String>,
    /// Headers with lower-cased names.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Vec<u8>,
}

impl RecordedRequest {
    fn from_parts(method: &Method, uri: &Uri, headers: &HeaderMap, body: Vec<u8>) -> Self {
        let query = uri
            .query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();
        let headers = headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        Self {
            method: method.as_str().to_string(),
            path: uri.path().to_string(),
            query,
            headers,
            body,
        }
    }

    /// Header value by (case-insensitive) name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Query parameter value.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Body parsed as JSON, if it is JSON.
    #[must_use]
    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    /// `"<METHOD> <path>"`, handy for matching in handlers.
    #[must_use]
    pub fn route(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// A scripted response.
#[derive(Debug, Clone)]
pub struct Reply {
    /// Status code.
    pub status: u16,
    /// Extra headers.
    pub headers: Vec<(String, String)>,
    /// Body bytes as written on the wire.
    pub body: Vec<u8>,
    /// `Content-Length` to declare; `None` streams the body without one.
    ///
    /// A length larger than the body truncates the response: the body is
    /// written and the connection is dropped before the declared length is
    /// reached.
    pub content_length: Option<usize>,
}

impl Reply {
    /// Raw body with a matching `Content-Length`.
    #[must_use]
    pub fn raw(status: u16, body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        Self {
            status,
            headers: Vec::new(),
            content_length: Some(body.len()),
            body,
        }
    }

    /// Empty body.
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self::raw(status, Vec::new())
    }

    /// JSON body.
    #[must_use]
    pub fn json(status: u16, value: &Value) -> Self {
        Self::raw(status, value.to_string()).with_header("content-type", "application/json")
    }

    /// Gzip-compressed JSON body, sent without `Content-Length`.
    #[must_use]
    pub fn gzip_json(status: u16, value: &Value) -> Self {
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        let compressed = enc
            .write_all(value.to_string().as_bytes())
            .and_then(|()| enc.finish())
            .unwrap_or_default();
        Self {
            status,
            headers: vec![
                ("content-type".to_string(), "application/json".to_string()),
                ("content-encoding".to_string(), "gzip".to_string()),
            ],
            body: compressed,
            content_length: None,
        }
    }

    /// CloudAPI error envelope `{code, message}`.
    #[must_use]
    pub fn error(status: u16, code: &str, message: &str) -> Self {
        Self::json(
            status,
            &serde_json::json!({ "code": code, "message": message }),
        )
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Overrides the declared `Content-Length`.
    #[must_use]
    pub fn with_content_length(mut self, length: Option<usize>) -> Self {
        self.content_length = length;
        self
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut builder = Response::builder().status(status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = builder.header(CONNECTION, "close");

        let body = match self.content_length {
            Some(length) if length == self.body.len() => Body::from(self.body),
            Some(length) => {
                builder = builder.header(CONTENT_LENGTH, length);
                truncated_body(self.body)
            }
            None => Body::from_stream(futures::stream::once(async move {
                Ok::<_, std::io::Error>(Bytes::from(self.body))
            })),
        };
        builder
            .body(body)
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
    }
}

/// Writes `data`, lets it flush, then aborts the body so the peer sees the
/// connection end short of the declared length.
fn truncated_body(data: Vec<u8>) -> Body {
    let head = futures::stream::once(async move { Ok(Bytes::from(data)) });
    let abort = futures::stream::once(async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Err(std::io::Error::other("body truncated"))
    });
    Body::from_stream(head.chain(abort))
}

type Handler = dyn Fn(&RecordedRequest) -> Reply + Send + Sync;
type Recorded = Arc<Mutex<Vec<RecordedRequest>>>;

#[derive(Clone)]
struct Scripted {
    handler: Arc<Handler>,
    recorded: Recorded,
}

async fn scripted(
    State(state): State<Scripted>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Reply {
    let request = RecordedRequest::from_parts(&method, &uri, &headers, body.to_vec());
    debug!(route = %request.route(), "test server request");
    let reply = (state.handler)(&request);
    record(&state.recorded, request);
    reply
}

fn record<T>(log: &Mutex<Vec<T>>, item: T) {
    log.lock().unwrap_or_else(PoisonError::into_inner).push(item);
}

/// Serves `router` on `127.0.0.1:0` until the returned sender fires.
async fn spawn_router(
    router: Router,
) -> std::io::Result<(SocketAddr, oneshot::Sender<()>, JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        let shutdown = async {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
        {
            warn!(error = %e, "test server failed");
        }
    });
    debug!(%addr, "test server listening");
    Ok((addr, shutdown_tx, handle))
}

/// A running scripted server.
pub struct TestServer {
    addr: SocketAddr,
    requests: Recorded,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for TestServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestServer")
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

impl TestServer {
    /// Binds `127.0.0.1:0` and serves `handler` until shut down.
    pub async fn start<F>(handler: F) -> std::io::Result<Self>
    where
        F: Fn(&RecordedRequest) -> Reply + Send + Sync + 'static,
    {
        let requests: Recorded = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new().fallback(scripted).with_state(Scripted {
            handler: Arc::new(handler),
            recorded: Arc::clone(&requests),
        });
        let (addr, shutdown_tx, handle) = spawn_router(router).await?;
        Ok(Self {
            addr,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Bound address.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL, `http://127.0.0.1:<port>`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of requests received so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Stops accepting connections.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[derive(Clone)]
struct Feed {
    events: Arc<Vec<Value>>,
    upgrades: Recorded,
    subscriptions: Arc<Mutex<Vec<Value>>>,
}

async fn feed_upgrade(
    State(feed): State<Feed>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let request = RecordedRequest::from_parts(&method, &uri, &headers, Vec::new());
    debug!(route = %request.route(), "change feed upgrade");
    record(&feed.upgrades, request);
    ws.on_upgrade(move |socket| run_feed(socket, feed))
}

async fn run_feed(mut socket: WebSocket, feed: Feed) {
    let first = socket.recv().await;
    let Some(Ok(Message::Text(text))) = first else {
        warn!(message = ?first, "change feed closed before subscribing");
        return;
    };
    match serde_json::from_str::<Value>(text.as_str()) {
        Ok(subscription) => record(&feed.subscriptions, subscription),
        Err(e) => warn!(error = %e, "change feed subscription is not JSON"),
    }

    for event in feed.events.iter() {
        if socket
            .send(Message::Text(event.to_string().into()))
            .await
            .is_err()
        {
            return;
        }
    }
    let _ = socket.send(Message::Close(None)).await;
    while let Some(Ok(message)) = socket.recv().await {
        if matches!(message, Message::Close(_)) {
            break;
        }
    }
}

/// A change-feed websocket endpoint that pushes `events` to each
/// subscriber and then closes.
pub struct FeedServer {
    addr: SocketAddr,
    upgrades: Recorded,
    subscriptions: Arc<Mutex<Vec<Value>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for FeedServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedServer")
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

impl FeedServer {
    /// Binds `127.0.0.1:0` and accepts websocket upgrades on any path.
    pub async fn start(events: Vec<Value>) -> std::io::Result<Self> {
        let upgrades: Recorded = Arc::new(Mutex::new(Vec::new()));
        let subscriptions = Arc::new(Mutex::new(Vec::new()));
        let router = Router::new().fallback(feed_upgrade).with_state(Feed {
            events: Arc::new(events),
            upgrades: Arc::clone(&upgrades),
            subscriptions: Arc::clone(&subscriptions),
        });
        let (addr, shutdown_tx, handle) = spawn_router(router).await?;
        Ok(Self {
            addr,
            upgrades,
            subscriptions,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Base URL, `http://127.0.0.1:<port>`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Upgrade requests received so far.
    #[must_use]
    pub fn upgrades(&self) -> Vec<RecordedRequest> {
        self.upgrades
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Subscription messages received so far.
    #[must_use]
    pub fn subscriptions(&self) -> Vec<Value> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stops accepting connections.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for FeedServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn raw_exchange(addr: SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.expect("connect");
        stream.write_all(request.as_bytes()).await.expect("write");
        let mut out = Vec::new();
        let _ = stream.read_to_end(&mut out).await;
        String::from_utf8_lossy(&out).into_owned()
    }

    #[tokio::test]
    async fn test_records_and_replies() {
        let server = TestServer::start(|req| {
            Reply::json(201, &serde_json::json!({ "got": req.query_param("name") }))
        })
        .await
        .expect("start");

        let response = raw_exchange(
            server.addr(),
            "POST /alice/machines?name=web%201 HTTP/1.1\r\nHost: x\r\nContent-Length: 2\r\n\r\n{}",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 201 Created"));
        assert!(response.ends_with(r#"{"got":"web 1"}"#));

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].route(), "POST /alice/machines");
        assert_eq!(requests[0].header("HOST"), Some("x"));
        assert_eq!(requests[0].json(), Some(serde_json::json!({})));
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let server = TestServer::start(|_| {
            Reply::raw(200, "ignored").with_header("x-resource-count", "3")
        })
        .await
        .expect("start");
        let response = raw_exchange(server.addr(), "HEAD /a HTTP/1.1\r\nHost: x\r\n\r\n").await;
        assert!(response.contains("x-resource-count: 3"));
        assert!(response.ends_with("\r\n\r\n"));
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_short_body_stops_before_declared_length() {
        let server = TestServer::start(|_| Reply::raw(200, "{}").with_content_length(Some(12)))
            .await
            .expect("start");
        let response = raw_exchange(server.addr(), "GET /a HTTP/1.1\r\nHost: x\r\n\r\n").await;
        assert!(response.contains("content-length: 12"));
        assert!(response.ends_with("\r\n\r\n{}"));
        server.shutdown().await;
    }
}
