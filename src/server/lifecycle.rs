//! Server lifecycle
//!
//! ```text
//! Stopped ──launch──▶ Listening ──stop requested / fatal error──▶ Stopping ──▶ Stopped
//! ```
//!
//! "Stop requested" and "stopped" are kept apart: a [`ServerHandle`] can
//! request a stop at any time, but the state only moves once the accept loop
//! has observed the request and closed the listener.

use std::{net::SocketAddr, sync::Arc};
use tokio::sync::watch;
use tracing::debug;

/// Where the server is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Not bound. Initial and final state.
    Stopped,
    /// Bound and accepting connections.
    Listening { addr: SocketAddr },
    /// Accept loop has exited and the listener is being closed.
    Stopping,
}

/// Remote control for a running [`Server`](crate::Server).
///
/// Obtained from [`Server::handle`](crate::Server::handle) before launching.
/// Cheap to clone.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    stop: Arc<watch::Sender<bool>>,
    state: watch::Receiver<State>,
}

impl ServerHandle {
    /// Requests a graceful stop.
    ///
    /// The connection being handled, if any, is answered first. Calling this
    /// more than once has no further effect.
    #[inline]
    pub fn shutdown(&self) {
        self.stop.send_replace(true);
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> State {
        *self.state.borrow()
    }

    /// Waits until the server is listening and returns the bound address.
    ///
    /// Returns `None` if the server stopped (or its task was dropped)
    /// before ever listening.
    pub async fn listening(&mut self) -> Option<SocketAddr> {
        loop {
            if let State::Listening { addr } = *self.state.borrow_and_update() {
                return Some(addr);
            }
            if self.state.changed().await.is_err() {
                return None;
            }
        }
    }

    /// Waits until the server has fully stopped after having been launched.
    ///
    /// Also returns once the server is dropped.
    pub async fn stopped(&mut self) {
        while self.state.changed().await.is_ok() {
            if *self.state.borrow_and_update() == State::Stopped {
                return;
            }
        }
    }
}

/// Lifecycle state owned by the server.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: watch::Sender<State>,
    stop: Arc<watch::Sender<bool>>,
    stop_rx: watch::Receiver<bool>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(State::Stopped);
        let (stop, stop_rx) = watch::channel(false);

        Lifecycle {
            state,
            stop: Arc::new(stop),
            stop_rx,
        }
    }

    pub(crate) fn handle(&self) -> ServerHandle {
        ServerHandle {
            stop: self.stop.clone(),
            state: self.state.subscribe(),
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> State {
        *self.state.borrow()
    }

    pub(crate) fn transition(&self, to: State) {
        let from = self.state.send_replace(to);
        debug!(?from, ?to, "lifecycle transition");
    }

    #[inline]
    pub(crate) fn stop_requested(&self) -> bool {
        *self.stop_rx.borrow()
    }

    /// Resolves once a stop has been requested.
    pub(crate) async fn stop_signal(&mut self) {
        loop {
            if *self.stop_rx.borrow_and_update() {
                return;
            }
            // `self.stop` keeps the channel open.
            if self.stop_rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }
}
