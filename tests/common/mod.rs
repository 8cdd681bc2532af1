//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use vhost_proxy::config::{ProxyConfig, VhostConfig};
use vhost_proxy::http::HttpServer;
use vhost_proxy::lifecycle::Shutdown;
use vhost_proxy::net::Listener;

/// A request as seen by a mock backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    /// All values of a header, case-insensitive.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.header_values(name).into_iter().next()
    }
}

/// Counts connections and keeps every request a mock backend received.
#[derive(Debug, Default)]
pub struct Recorder {
    connections: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl Recorder {
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

/// Read one request head from `socket`.
async fn read_head(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            return Some(String::from_utf8_lossy(&buf[..end]).into_owned());
        }
    }
}

fn parse_head(head: &str) -> RecordedRequest {
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split(' ');
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    RecordedRequest { method, target, headers }
}

/// Start a backend that records each request and answers with `response`
/// (a complete raw HTTP/1.1 response).
pub async fn start_raw_backend(response: String) -> (SocketAddr, Arc<Recorder>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorder = Arc::new(Recorder::default());
    let response = Arc::new(response);

    let rec = recorder.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    rec.connections.fetch_add(1, Ordering::SeqCst);
                    let rec = rec.clone();
                    let response = response.clone();
                    tokio::spawn(async move {
                        if let Some(head) = read_head(&mut socket).await {
                            rec.requests.lock().unwrap().push(parse_head(&head));
                            let _ = socket.write_all(response.as_bytes()).await;
                        }
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, recorder)
}

/// Start a backend answering 200 with `body`.
pub async fn start_recording_backend(body: &str) -> (SocketAddr, Arc<Recorder>) {
    start_raw_backend(format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    ))
    .await
}

/// Start a backend that accepts connections and never answers.
pub async fn start_silent_backend() -> (SocketAddr, Arc<Recorder>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorder = Arc::new(Recorder::default());

    let rec = recorder.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            rec.connections.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let _socket = socket;
                tokio::time::sleep(Duration::from_secs(60)).await;
            });
        }
    });

    (addr, recorder)
}

/// Start a backend that writes `partial` (a response head and part of its
/// body) and then holds the connection open without sending more.
pub async fn start_stalling_backend(partial: String) -> (SocketAddr, Arc<Recorder>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorder = Arc::new(Recorder::default());
    let partial = Arc::new(partial);

    let rec = recorder.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            rec.connections.fetch_add(1, Ordering::SeqCst);
            let rec = rec.clone();
            let partial = partial.clone();
            tokio::spawn(async move {
                if let Some(head) = read_head(&mut socket).await {
                    rec.requests.lock().unwrap().push(parse_head(&head));
                    let _ = socket.write_all(partial.as_bytes()).await;
                }
                tokio::time::sleep(Duration::from_secs(60)).await;
            });
        }
    });

    (addr, recorder)
}

/// A running proxy instance.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl Drop for TestProxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start a proxy for `vhosts` on an ephemeral port.
pub async fn start_proxy(vhosts: Vec<VhostConfig>, timeout_secs: u64) -> TestProxy {
    let mut config = ProxyConfig::default();
    config.host = "127.0.0.1".into();
    config.port = 0;
    config.timeout = timeout_secs;
    config.vhosts = vhosts;

    let server = HttpServer::new(&config).unwrap();
    let listener = Listener::bind(&config.bind_address()).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestProxy { addr, shutdown }
}

/// A response read off a raw client connection.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub head: String,
    pub body: String,
}

/// Send a raw HTTP/1.1 request with the given `Host` and extra header lines,
/// then read until the proxy closes the connection.
pub async fn send_request(proxy: SocketAddr, host: &str, target: &str, extra: &[&str]) -> RawResponse {
    let mut stream = TcpStream::connect(proxy).await.unwrap();

    let mut request = format!("GET {} HTTP/1.1\r\nHost: {}\r\n", target, host);
    for line in extra {
        request.push_str(line);
        request.push_str("\r\n");
    }
    request.push_str("Connection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let raw = String::from_utf8_lossy(&raw).into_owned();

    let (head, body) = raw.split_once("\r\n\r\n").unwrap_or((raw.as_str(), ""));
    let status = head
        .split(' ')
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    RawResponse {
        status,
        head: head.to_string(),
        body: body.to_string(),
    }
}
