use std::{io, net::SocketAddr};
use thiserror::Error;

/// Errors surfaced by the server.
///
/// Request-level problems (bad `Content-Type`, denied authorization, unknown
/// route) are answered with a [`Response`](crate::Response) and never show up
/// here. Everything in this enum is a transport or construction failure.
#[derive(Debug, Error)]
pub enum Error {
    /// The listening socket could not be created, bound or put into listen mode.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Configured host and port do not form a socket address.
    #[error("invalid listen address `{0}`")]
    InvalidAddress(String),

    /// `accept` failed with something other than the poll timeout.
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// Reading the request from the peer failed.
    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    /// Writing the response to the peer failed.
    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    /// A configured socket timeout elapsed.
    #[error("{0} timed out")]
    Timeout(&'static str),

    /// Response content must be a JSON object.
    #[error("response content must be a JSON object, got {0}")]
    InvalidContent(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Name of the I/O stage that failed, used in log fields.
    pub(crate) fn stage(&self) -> &'static str {
        match self {
            Error::Bind { .. } | Error::InvalidAddress(_) => "bind",
            Error::Accept(_) => "accept",
            Error::Read(_) => "read",
            Error::Write(_) => "write",
            Error::Timeout(stage) => *stage,
            Error::InvalidContent(_) => "response",
        }
    }
}
