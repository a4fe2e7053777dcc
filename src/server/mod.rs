//! The TCP acceptor and per-connection task that drive the core against a
//! real socket. Everything wire-level (parsing, negotiation, buffering)
//! lives in [`crate::protocol`], [`crate::session`], and friends; this
//! module is the thin layer that owns actual sockets.

mod connection_task;
mod listener;

use std::sync::Arc;

pub use listener::{ConnectionPermit, TelnetServer};

use crate::config::ServerConfig;
use crate::facade::ConnectionFactory;
use crate::Result;

/// Accept connections forever, spawning one [`connection_task::run`] per
/// socket via a fresh [`ConnectionFactory::Handler`].
///
/// This is the façade-facing entry point: an application builds a
/// [`TelnetServer`] with [`TelnetServer::bind`], implements
/// [`ConnectionFactory`], and hands both to `serve`.
pub async fn serve<F>(server: TelnetServer, config: Arc<ServerConfig>, factory: F) -> Result<()>
where
    F: ConnectionFactory + 'static,
{
    let factory = Arc::new(factory);
    server
        .run(move |stream, peer_addr| {
            let config = config.clone();
            let factory = factory.clone();
            async move {
                let handler = factory.new_connection(peer_addr);
                connection_task::run(stream, peer_addr, config, handler).await;
            }
        })
        .await
}
