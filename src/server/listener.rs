//! TCP listener for the Telnet server.
//!
//! Binding goes through `socket2` rather than `TcpListener::bind` directly so
//! `SO_REUSEADDR` and the listen backlog can be set explicitly, instead of
//! relying on whatever defaults the platform picks.

use std::net::SocketAddr;
use std::sync::Arc;

use socket2::{Domain, Socket, Type};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::config::ServerConfig;
use crate::{ParlorError, Result};

/// Telnet server that accepts TCP connections.
pub struct TelnetServer {
    listener: TcpListener,
    semaphore: Arc<Semaphore>,
    max_connections: usize,
}

impl TelnetServer {
    /// Create a new TelnetServer bound to the specified address.
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| ParlorError::Bind(format!("invalid bind address: {e}")))?;

        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, None)
            .map_err(|e| ParlorError::Bind(e.to_string()))?;
        socket
            .set_reuse_address(true)
            .map_err(|e| ParlorError::Bind(e.to_string()))?;
        socket
            .bind(&addr.into())
            .map_err(|e| ParlorError::Bind(e.to_string()))?;
        socket
            .listen(config.backlog)
            .map_err(|e| ParlorError::Bind(e.to_string()))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| ParlorError::Bind(e.to_string()))?;

        let listener = TcpListener::from_std(socket.into())
            .map_err(|e| ParlorError::Bind(e.to_string()))?;
        let local_addr = listener.local_addr()?;

        info!("Telnet server listening on {}", local_addr);

        Ok(Self {
            listener,
            semaphore: Arc::new(Semaphore::new(config.max_connections)),
            max_connections: config.max_connections,
        })
    }

    /// Get the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Get the maximum number of connections allowed.
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Get the number of available connection slots.
    pub fn available_connections(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Get the number of active connections.
    pub fn active_connections(&self) -> usize {
        self.max_connections - self.semaphore.available_permits()
    }

    /// Accept the next incoming connection, whether or not a slot is free.
    ///
    /// Returns the TCP stream and the peer address. Callers must check
    /// [`TelnetServer::try_reserve`] themselves to decide whether to keep
    /// the connection or reject it; this method never blocks waiting for
    /// capacity.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr)> {
        let (stream, addr) = self.listener.accept().await?;
        debug!("Accepted connection from {}", addr);
        Ok((stream, addr))
    }

    /// Try to reserve one of the `max_connections` slots without blocking.
    ///
    /// Returns `None` when the connected set is already at capacity, in
    /// which case the caller should send a short rejection banner and
    /// close the socket rather than hand it to a connection task.
    pub fn try_reserve(&self) -> Option<ConnectionPermit> {
        self.semaphore
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| ConnectionPermit { _permit: permit })
    }

    /// Run the server, accepting connections and spawning handlers.
    ///
    /// A connection accepted while the connected set is already at
    /// [`TelnetServer::max_connections`] is sent a short rejection banner
    /// and closed immediately: new peers are refused, not queued, once
    /// capacity is exhausted.
    pub async fn run<F, Fut>(self, handler: F) -> Result<()>
    where
        F: Fn(TcpStream, SocketAddr) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let handler = Arc::new(handler);

        loop {
            match self.accept().await {
                Ok((mut stream, addr)) => match self.try_reserve() {
                    Some(permit) => {
                        let handler = handler.clone();
                        tokio::spawn(async move {
                            handler(stream, addr).await;
                            // Permit is dropped here, releasing the connection slot
                            drop(permit);
                        });
                    }
                    None => {
                        debug!("rejecting {} - server at max connections", addr);
                        tokio::spawn(async move {
                            let _ = stream.write_all(MAX_CONNECTIONS_BANNER).await;
                            let _ = stream.shutdown().await;
                        });
                    }
                },
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                }
            }
        }
    }
}

/// Sent to a peer rejected for having arrived once the connected set was
/// already at `max_connections`, then the socket is closed.
const MAX_CONNECTIONS_BANNER: &[u8] = b"Sorry, this server is full. Please try again later.\r\n";

/// A permit that represents an active connection slot.
///
/// When this permit is dropped, the connection slot is released.
pub struct ConnectionPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
}
