//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use ddns_agent::config::{ConfigStore, DdnsConfig, RuntimeContext};
use ddns_agent::http::AppState;
use ddns_agent::net::{Probe, ProbeError};
use ddns_agent::observability::{Lang, LogBuffer};
use ddns_agent::scheduler::UpdateCycle;

/// A request seen by a recording backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

pub type Recorder = Arc<Mutex<Vec<RecordedRequest>>>;

/// Start a mock backend on an ephemeral port that records every request
/// and answers with whatever `respond` returns.
pub async fn start_recording_backend<F>(respond: F) -> (SocketAddr, Recorder)
where
    F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorder: Recorder = Arc::default();
    let respond = Arc::new(respond);

    let seen = recorder.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let seen = seen.clone();
                    let respond = respond.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        let (status, body) = respond(&request);
                        seen.lock().unwrap().push(request);

                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, recorder)
}

/// Start a backend that always answers 200 with `body`.
pub async fn start_mock_backend(body: &'static str) -> (SocketAddr, Recorder) {
    start_recording_backend(move |_| (200, body.to_string())).await
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let mut request_line = head.lines().next()?.split_whitespace();
    Some(RecordedRequest {
        method: request_line.next()?.to_string(),
        path: request_line.next()?.to_string(),
        body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
    })
}

/// Temporary directory with a config path inside it (file not created).
pub fn temp_config_path() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    (dir, path)
}

/// Temporary directory with `contents` written to `config.toml`.
pub fn write_temp_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let (dir, path) = temp_config_path();
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

/// Runtime context pointing at `config_path`.
pub fn test_context(config_path: PathBuf) -> Arc<RuntimeContext> {
    Arc::new(RuntimeContext {
        version: "test".into(),
        config_path,
        cache_times: 5,
        custom_dns: None,
        skip_verify: false,
        listen: "127.0.0.1:0".parse().unwrap(),
    })
}

/// HTTP client that never goes through an environment proxy.
pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

/// Web state backed by a store at `config_path`, seeded with `config`.
pub fn test_state(config_path: PathBuf, config: Option<DdnsConfig>) -> AppState {
    let store = Arc::new(ConfigStore::new(config_path.clone()));
    match config {
        Some(config) => store.save(config).unwrap(),
        None => {
            store.cached_or_default().unwrap();
        }
    }
    AppState::new(
        test_context(config_path),
        store,
        LogBuffer::default(),
        test_client(),
        Lang::En,
    )
}

/// Probe that fails a fixed number of times, then succeeds.
pub struct FlakyProbe {
    fail_for: u64,
    pub probes: Arc<AtomicU64>,
}

impl FlakyProbe {
    pub fn new(fail_for: u64) -> Self {
        Self {
            fail_for,
            probes: Arc::default(),
        }
    }
}

impl Probe for FlakyProbe {
    async fn probe(&self, target: &str) -> Result<(), ProbeError> {
        let n = self.probes.fetch_add(1, Ordering::SeqCst);
        if n < self.fail_for {
            Err(ProbeError::InvalidTarget(target.to_string()))
        } else {
            Ok(())
        }
    }
}

/// Cycle that counts its runs and remembers how many probes preceded the first.
pub struct CountingCycle {
    pub runs: AtomicU32,
    pub probes_at_first_run: AtomicU64,
    probes: Arc<AtomicU64>,
}

impl CountingCycle {
    pub fn new(probes: Arc<AtomicU64>) -> Arc<Self> {
        Arc::new(Self {
            runs: AtomicU32::new(0),
            probes_at_first_run: AtomicU64::new(u64::MAX),
            probes,
        })
    }

    pub fn runs(&self) -> u32 {
        self.runs.load(Ordering::SeqCst)
    }
}

impl UpdateCycle for CountingCycle {
    async fn run_cycle(&self) {
        if self.runs.fetch_add(1, Ordering::SeqCst) == 0 {
            self.probes_at_first_run
                .store(self.probes.load(Ordering::SeqCst), Ordering::SeqCst);
        }
    }
}

/// Poll `check` until it holds or `timeout` elapses.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
