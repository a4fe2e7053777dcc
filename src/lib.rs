//! Parlor - a multi-user TELNET chat server core.
//!
//! This crate is the wire-level engine: IAC parsing, option negotiation,
//! line/character input assembly, output buffering with backpressure, the
//! auto-sense capability probe, and the TCP acceptor/connection-task pair
//! that drives it all against real sockets. Chat semantics (commands, user
//! presence, color formatting) are deliberately not here: an application
//! implements [`facade::ConnectionHandler`]/[`facade::ConnectionFactory`]
//! and hands them to [`server::serve`].

pub mod autosense;
pub mod config;
pub mod encoding;
pub mod error;
pub mod facade;
pub mod input;
pub mod logging;
pub mod output;
pub mod protocol;
pub mod server;
pub mod session;
pub mod timers;

pub use config::Config;
pub use error::{ParlorError, Result};
pub use facade::{ConnectionFactory, ConnectionHandle, ConnectionHandler, ConnectionInfo};
pub use server::{serve, ConnectionPermit, TelnetServer};
pub use session::Connection;
