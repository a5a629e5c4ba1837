//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use api_gateway::config::{GatewayConfig, CHAT_UPSTREAM};
use api_gateway::lifecycle::Shutdown;
use api_gateway::routing::RouteTable;
use api_gateway::HttpServer;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// What a mock upstream observed.
#[derive(Default)]
pub struct Tally {
    pub accepted: AtomicU32,
    pub completed: AtomicBool,
    pub disconnected: AtomicBool,
    pub requests: Mutex<Vec<String>>,
}

impl Tally {
    pub fn accepted(&self) -> u32 {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<String> {
        self.requests.lock().unwrap().last().cloned()
    }
}

/// Read one request (head and `Content-Length` body) as text.
async fn read_request(socket: &mut TcpStream) -> Option<String> {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    let head_end = loop {
        let n = socket.read(&mut buf).await.ok()?;
        if n == 0 {
            return None;
        }
        raw.extend_from_slice(&buf[..n]);
        if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&raw[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while raw.len() < head_end + content_length {
        let n = socket.read(&mut buf).await.ok()?;
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);
    }
    Some(String::from_utf8_lossy(&raw).to_string())
}

/// Start a mock upstream that replies with `chunks`, one every `delay`,
/// using chunked transfer encoding. Stops writing as soon as the peer
/// goes away and records that in the tally.
pub async fn start_chunked_backend(chunks: Vec<&'static str>, delay: Duration) -> (SocketAddr, Arc<Tally>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let tally = Arc::new(Tally::default());
    let p = tally.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            p.accepted.fetch_add(1, Ordering::SeqCst);
            let p = p.clone();
            let chunks = chunks.clone();
            tokio::spawn(async move {
                let Some(request) = read_request(&mut socket).await else {
                    return;
                };
                p.requests.lock().unwrap().push(request);

                let head = "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nTransfer-Encoding: chunked\r\n\r\n";
                if socket.write_all(head.as_bytes()).await.is_err() {
                    p.disconnected.store(true, Ordering::SeqCst);
                    return;
                }

                let mut peek_buf = [0u8; 64];
                for chunk in chunks {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        read = socket.read(&mut peek_buf) => {
                            // Nothing more is sent after the request, so any read completion is a close.
                            if matches!(read, Ok(0) | Err(_)) {
                                p.disconnected.store(true, Ordering::SeqCst);
                                return;
                            }
                        }
                    }
                    let frame = format!("{:x}\r\n{}\r\n", chunk.len(), chunk);
                    if socket.write_all(frame.as_bytes()).await.is_err() {
                        p.disconnected.store(true, Ordering::SeqCst);
                        return;
                    }
                }

                if socket.write_all(b"0\r\n\r\n").await.is_ok() {
                    p.completed.store(true, Ordering::SeqCst);
                }
            });
        }
    });

    (addr, tally)
}

/// Start a mock upstream that records each request and answers `200 ok`.
pub async fn start_recording_backend() -> (SocketAddr, Arc<Tally>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let tally = Arc::new(Tally::default());
    let p = tally.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            p.accepted.fetch_add(1, Ordering::SeqCst);
            let p = p.clone();
            tokio::spawn(async move {
                let Some(request) = read_request(&mut socket).await else {
                    return;
                };
                p.requests.lock().unwrap().push(request);
                let response = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 11\r\nConnection: close\r\n\r\n{\"ok\":true}";
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
                p.completed.store(true, Ordering::SeqCst);
            });
        }
    });

    (addr, tally)
}

/// Start a mock upstream that accepts connections and closes them at once.
pub async fn start_closing_backend() -> (SocketAddr, Arc<Tally>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let tally = Arc::new(Tally::default());
    let p = tally.clone();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            p.accepted.fetch_add(1, Ordering::SeqCst);
            drop(socket);
        }
    });

    (addr, tally)
}

/// Start a mock upstream that reads the request and never answers.
/// Records a disconnect when the peer closes the connection.
pub async fn start_silent_backend() -> (SocketAddr, Arc<Tally>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let tally = Arc::new(Tally::default());
    let p = tally.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            p.accepted.fetch_add(1, Ordering::SeqCst);
            let p = p.clone();
            tokio::spawn(async move {
                let Some(request) = read_request(&mut socket).await else {
                    return;
                };
                p.requests.lock().unwrap().push(request);

                let mut buf = [0u8; 64];
                let closed = tokio::time::timeout(Duration::from_secs(30), async {
                    loop {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => break,
                            Ok(_) => {}
                        }
                    }
                })
                .await;
                if closed.is_ok() {
                    p.disconnected.store(true, Ordering::SeqCst);
                }
            });
        }
    });

    (addr, tally)
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Default config with the chat upstream pointed at `addr`.
pub fn config_with_chat(addr: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    if let Some(chat) = config.upstreams.get_mut(CHAT_UPSTREAM) {
        chat.base_url = format!("http://{}", addr);
        chat.env = None;
    }
    config
}

/// A running gateway on an ephemeral port.
pub struct Gateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
}

impl Gateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the full gateway with `config`.
pub async fn spawn_gateway(config: GatewayConfig) -> Gateway {
    let server = HttpServer::new(config).expect("route catalog must build");
    serve(server).await
}

/// Start a gateway serving a hand-built route table.
pub async fn spawn_with_routes(config: GatewayConfig, routes: RouteTable) -> Gateway {
    serve(HttpServer::with_routes(config, routes)).await
}

async fn serve(server: HttpServer) -> Gateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    Gateway { addr, shutdown }
}

/// HTTP client that never pools or proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
