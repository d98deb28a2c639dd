#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use devspeedtest::engine::client::build_client;
use devspeedtest::engine::endpoint::Endpoint;
use devspeedtest::engine::types::{SessionEvent, SpeedTestConfig};

/// Behaviour knobs for the local test server.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub ping_delay: Duration,
    pub ping_status: StatusCode,
    pub download_delay: Duration,
    /// `conn` indices whose downloads answer 500.
    pub failing_conns: Vec<u32>,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            ping_delay: Duration::ZERO,
            ping_status: StatusCode::OK,
            download_delay: Duration::ZERO,
            failing_conns: Vec::new(),
        }
    }
}

struct ServerState {
    options: ServerOptions,
    uploaded: AtomicU64,
    downloads: AtomicU64,
}

pub struct TestServer {
    pub addr: SocketAddr,
    state: Arc<ServerState>,
}

impl TestServer {
    pub async fn spawn(options: ServerOptions) -> Self {
        let state = Arc::new(ServerState {
            options,
            uploaded: AtomicU64::new(0),
            downloads: AtomicU64::new(0),
        });
        let app = Router::new()
            .route("/ping", get(ping))
            .route("/bytes/{n}", get(download))
            .route("/upload", post(upload))
            .route("/info", get(info))
            .layer(DefaultBodyLimit::disable())
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, state }
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(format!("http://{}", self.addr), "/bytes/", "/upload", "/ping")
    }

    pub fn info_url(&self) -> String {
        format!("http://{}/info", self.addr)
    }

    /// Body bytes received by the upload sink so far.
    pub fn uploaded(&self) -> u64 {
        self.state.uploaded.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> u64 {
        self.state.downloads.load(Ordering::SeqCst)
    }
}

async fn ping(State(state): State<Arc<ServerState>>) -> (StatusCode, &'static str) {
    tokio::time::sleep(state.options.ping_delay).await;
    (state.options.ping_status, "pong")
}

async fn download(
    State(state): State<Arc<ServerState>>,
    Path(n): Path<u64>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Vec<u8>, StatusCode> {
    state.downloads.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(state.options.download_delay).await;
    let conn: Option<u32> = query.get("conn").and_then(|c| c.parse().ok());
    if conn.is_some_and(|c| state.options.failing_conns.contains(&c)) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(vec![0u8; n as usize])
}

async fn upload(State(state): State<Arc<ServerState>>, body: Bytes) -> StatusCode {
    state
        .uploaded
        .fetch_add(body.len() as u64, Ordering::SeqCst);
    StatusCode::OK
}

async fn info() -> Json<Value> {
    Json(json!({
        "ip": "127.0.0.1",
        "org": "AS64500 Loopback Networks",
        "city": "Localhost",
        "country": "ZZ"
    }))
}

/// An address nothing listens on; connections are refused straight away.
pub fn dead_endpoint() -> Endpoint {
    Endpoint::new("http://127.0.0.1:1", "/bytes/", "/upload", "/ping")
}

/// Small, fast configuration aimed at `server`.
pub fn config_for(server: &TestServer) -> SpeedTestConfig {
    SpeedTestConfig {
        endpoints: vec![server.endpoint()],
        latency_probes: 3,
        download_sizes_mb: vec![0.25, 0.5],
        upload_sizes_mb: vec![0.25],
        download_connections: 2,
        upload_connections: 2,
        probe_timeout: Duration::from_millis(500),
        update_interval: Duration::from_millis(50),
        metadata_urls: vec![server.info_url()],
        ..Default::default()
    }
}

pub fn client() -> reqwest::Client {
    build_client(None).unwrap()
}

/// Receive events until `pred` matches, giving up after `limit`.
pub async fn wait_for<F>(
    rx: &mut broadcast::Receiver<SessionEvent>,
    limit: Duration,
    mut pred: F,
) -> Vec<SessionEvent>
where
    F: FnMut(&SessionEvent) -> bool,
{
    let mut seen = Vec::new();
    tokio::time::timeout(limit, async {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let done = pred(&event);
                    seen.push(event);
                    if done {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
    .await
    .expect("timed out waiting for session event");
    seen
}
