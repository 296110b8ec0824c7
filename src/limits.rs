//! Server configuration limits and timeouts
//!
//! # Defaults
//!
//! The defaults reproduce the classic single-connection behavior:
//! - one `1024`-byte read per connection
//! - no read or write timeout on the peer socket
//! - a `1` second accept poll so a shutdown request is noticed promptly
//! - any transport failure stops the whole server
//!
//! # Examples
//!
//! ```no_run
//! use json_route::{Server, limits::{ConnLimits, ErrorPolicy, ServerLimits}};
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> json_route::Result<()> {
//! Server::builder()
//!     .port(8080)
//!     .server_limits(ServerLimits {
//!         error_policy: ErrorPolicy::IsolateConnection,
//!         ..ServerLimits::default()
//!     })
//!     .connection_limits(ConnLimits {
//!         socket_read_timeout: Some(Duration::from_secs(5)),
//!         ..ConnLimits::default()
//!     })
//!     .build()
//!     .launch()
//!     .await
//! # }
//! ```

use std::time::Duration;

/// Controls the listening socket and the accept loop.
#[derive(Debug, Clone)]
pub struct ServerLimits {
    /// Upper bound on a single wait in `accept` (default: `1 second`).
    ///
    /// The loop re-checks the shutdown signal every time this elapses
    /// without a new connection.
    pub accept_poll_interval: Duration,

    /// Length of the kernel accept queue passed to `listen` (default: `128`).
    pub backlog: i32,

    /// What a transport failure on one connection does to the server
    /// (default: [`ErrorPolicy::StopServer`]).
    pub error_policy: ErrorPolicy,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            accept_poll_interval: Duration::from_secs(1),
            backlog: 128,
            error_policy: ErrorPolicy::StopServer,

            _priv: (),
        }
    }
}

/// Reaction to a failed `accept`, read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Log the error, stop accepting and shut the server down.
    ///
    /// One misbehaving peer can take the whole server with it.
    StopServer,

    /// Log the error, drop that connection and keep accepting.
    IsolateConnection,
}

/// Per-connection limits.
#[derive(Debug, Clone)]
pub struct ConnLimits {
    /// Size of the single read that collects the request (default: `1024`).
    ///
    /// Whatever does not fit is ignored, so a long body is truncated and a
    /// request split across TCP segments may be seen only partially.
    pub read_buffer_size: usize,

    /// Maximum wait for the request bytes (default: `None`, wait forever).
    pub socket_read_timeout: Option<Duration>,

    /// Maximum wait for the response to be written (default: `None`).
    pub socket_write_timeout: Option<Duration>,

    #[doc(hidden)]
    #[allow(dead_code)]
    pub _priv: (),
}

impl Default for ConnLimits {
    #[inline(always)]
    fn default() -> Self {
        Self {
            read_buffer_size: 1024,
            socket_read_timeout: None,
            socket_write_timeout: None,

            _priv: (),
        }
    }
}
