//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use muzhvay::config::ServerConfig;
use muzhvay::http::{HttpServer, ServerError};
use muzhvay::lifecycle::Shutdown;
use muzhvay::session::SessionStore;

/// A server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub sessions: SessionStore,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    /// Stop the server and wait for `run` to return.
    pub async fn stop(self) -> Result<(), ServerError> {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
    }
}

pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.timeouts.read_secs = 5;
    config.timeouts.write_secs = 5;
    config
}

/// Bind `server` and run it in the background.
pub async fn start(server: HttpServer) -> TestServer {
    let listener = server.bind().await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let sessions = server.sessions().clone();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));
    TestServer {
        addr,
        sessions,
        shutdown,
        handle,
    }
}

/// Parsed view of a raw response.
#[derive(Debug)]
pub struct RawResponse {
    pub status_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn status(&self) -> u16 {
        self.status_line
            .split(' ')
            .nth(1)
            .and_then(|code| code.parse().ok())
            .expect("status code")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_names(&self) -> Vec<&str> {
        self.headers.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Session id from the `Set-Cookie` header, if one was sent.
    pub fn session_cookie(&self, cookie_name: &str) -> Option<String> {
        let value = self.header("Set-Cookie")?;
        let pair = value.split(';').next()?;
        let (name, id) = pair.split_once('=')?;
        (name == cookie_name).then(|| id.to_string())
    }
}

/// Send raw bytes and read until the server closes the connection.
pub async fn send_raw(addr: SocketAddr, request: &[u8]) -> RawResponse {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    stream.write_all(request).await.expect("write request");

    let mut raw = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut raw))
        .await
        .expect("response timed out")
        .expect("read response");
    parse_response(&raw)
}

pub async fn get(addr: SocketAddr, path: &str, cookie: Option<&str>) -> RawResponse {
    let mut request = format!("GET {} HTTP/1.1\r\nHost: localhost\r\n", path);
    if let Some(cookie) = cookie {
        request.push_str(&format!("Cookie: {}\r\n", cookie));
    }
    request.push_str("\r\n");
    send_raw(addr, request.as_bytes()).await
}

pub fn parse_response(raw: &[u8]) -> RawResponse {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("end of response head");
    let head = String::from_utf8(raw[..split].to_vec()).expect("utf-8 head");
    let mut lines = head.split("\r\n");
    let status_line = lines.next().expect("status line").to_string();
    let headers = lines
        .map(|line| {
            let (name, value) = line.split_once(": ").expect("header line");
            (name.to_string(), value.to_string())
        })
        .collect();
    RawResponse {
        status_line,
        headers,
        body: raw[split + 4..].to_vec(),
    }
}
