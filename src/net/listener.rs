//! TCP listener.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections
//! - Hand each socket over as a blocking stream with timeouts applied
//!
//! # Design Decisions
//! - No connection cap: every accepted socket gets its own worker
//! - Accept errors are returned, the accept loop decides to carry on

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ListenerConfig, TimeoutConfig};

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    Bind(std::io::Error),
    /// Failed to accept connection.
    #[error("Failed to accept: {0}")]
    Accept(std::io::Error),
}

/// Accepts connections and prepares them for blocking workers.
pub struct Listener {
    /// The underlying TCP listener.
    inner: TcpListener,
    /// Timeouts applied to every accepted socket.
    timeouts: TimeoutConfig,
}

impl Listener {
    /// Bind to the configured address.
    pub async fn bind(config: &ListenerConfig, timeouts: TimeoutConfig) -> Result<Self, ListenerError> {
        let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
            ListenerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;

        let listener = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;
        Ok(Self::from_tokio(listener, timeouts))
    }

    /// Wrap an already bound listener.
    pub fn from_tokio(inner: TcpListener, timeouts: TimeoutConfig) -> Self {
        Self { inner, timeouts }
    }

    /// Accept a connection as a blocking `std` stream.
    pub async fn accept(&self) -> Result<(std::net::TcpStream, SocketAddr), ListenerError> {
        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;
        let stream = stream.into_std().map_err(ListenerError::Accept)?;
        stream.set_nonblocking(false).map_err(ListenerError::Accept)?;
        stream
            .set_read_timeout(self.timeouts.read())
            .map_err(ListenerError::Accept)?;
        stream
            .set_write_timeout(self.timeouts.write())
            .map_err(ListenerError::Accept)?;

        tracing::debug!(peer_addr = %addr, "Connection accepted");
        Ok((stream, addr))
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[tokio::test]
    async fn bind_rejects_bad_address() {
        let config = ListenerConfig {
            bind_address: "nope".into(),
        };
        let err = Listener::bind(&config, TimeoutConfig::default()).await.err().unwrap();
        assert!(matches!(err, ListenerError::Bind(_)));
    }

    #[tokio::test]
    async fn accepted_stream_is_blocking() {
        let config = ListenerConfig {
            bind_address: "127.0.0.1:0".into(),
        };
        let listener = Listener::bind(&config, TimeoutConfig::default()).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = tokio::task::spawn_blocking(move || {
            let mut s = std::net::TcpStream::connect(addr).unwrap();
            s.write_all(b"ping").unwrap();
        });

        let (mut stream, _) = listener.accept().await.unwrap();
        let echoed = tokio::task::spawn_blocking(move || {
            let mut buf = [0u8; 4];
            stream.read_exact(&mut buf).unwrap();
            buf
        })
        .await
        .unwrap();
        client.await.unwrap();
        assert_eq!(&echoed, b"ping");
    }
}
