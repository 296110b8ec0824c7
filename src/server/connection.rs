use crate::{
    auth::Authorizer,
    errors::Result,
    http::{request::Request, response::Response, types::StatusCode},
    limits::ConnLimits,
    router::RouteTable,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

/// Answers one connection at a time.
///
/// ```text
/// read ─▶ parse ─▶ Content-Type guard ─▶ authorization guard ─▶ route ─▶ write ─▶ close
///                        │ 400                   │ 403              │ 404
///                        └───────────────────────┴──────────────────┴─▶ write ─▶ close
/// ```
///
/// Every stage runs at most once and never goes back to an earlier one.
pub(crate) struct HttpConnection {
    routes: RouteTable,
    authorizer: Option<Arc<dyn Authorizer>>,
    conn_limits: ConnLimits,
    buffer: Box<[u8]>,
}

impl HttpConnection {
    const JSON: &'static str = "application/json";
    const CONTENT_TYPE: &'static str = "Content-Type";

    #[inline]
    pub(crate) fn new(
        routes: RouteTable,
        authorizer: Option<Arc<dyn Authorizer>>,
        conn_limits: ConnLimits,
    ) -> Self {
        let buffer = vec![0; conn_limits.read_buffer_size].into_boxed_slice();

        Self {
            routes,
            authorizer,
            conn_limits,
            buffer,
        }
    }

    /// Handles a whole connection and closes it.
    ///
    /// Returns the status sent, or `None` when the peer closed without
    /// sending anything (nothing is written back in that case).
    pub(crate) async fn run<S>(&mut self, stream: &mut S, peer: SocketAddr) -> Result<Option<StatusCode>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let len = reader::read_once(stream, &mut self.buffer, &self.conn_limits).await?;
        if len == 0 {
            debug!(peer = %peer.ip(), "peer closed without sending a request");
            return Ok(None);
        }

        let request = Request::parse(&self.buffer[..len]);
        let response = self.respond(&request);

        writer::write_response(stream, &response, &self.conn_limits).await?;
        writer::close(stream).await;

        info!(
            peer = %peer.ip(),
            path = request.path(),
            status = response.status().as_u16(),
            reason = response.status_text(),
            "Request from {} for {} resulted in {}",
            peer.ip(),
            request.path(),
            response.status(),
        );

        Ok(Some(response.status()))
    }

    /// Runs the guards and the route table against a parsed request.
    ///
    /// An unparseable request reaches routing as the empty request and, since
    /// no route is registered for an empty path, ends up as `404`.
    pub(crate) fn respond(&self, request: &Request) -> Response {
        if let Some(content_type) = request.header(Self::CONTENT_TYPE) {
            if content_type != Self::JSON {
                return Response::error(StatusCode::BAD_REQUEST, "Invalid Content-Type");
            }
        }

        if let Some(authorizer) = &self.authorizer {
            if !authorizer.authorize(request.headers()) {
                return Response::error(StatusCode::FORBIDDEN, "Forbidden");
            }
        }

        match self.routes.matches(request.method(), request.path()) {
            Some(route) => route.handle(request),
            None => Response::error(StatusCode::NOT_FOUND, "Route not found"),
        }
    }
}

pub(crate) mod reader {
    use crate::{
        errors::{Error, Result},
        limits::ConnLimits,
    };
    use tokio::{
        io::{AsyncRead, AsyncReadExt},
        time::timeout,
    };

    /// One best-effort read, no reassembly across segments.
    #[inline]
    pub(crate) async fn read_once<S>(stream: &mut S, buffer: &mut [u8], limits: &ConnLimits) -> Result<usize>
    where
        S: AsyncRead + Unpin,
    {
        match limits.socket_read_timeout {
            Some(time) => timeout(time, stream.read(buffer))
                .await
                .map_err(|_| Error::Timeout("read"))?
                .map_err(Error::Read),
            None => stream.read(buffer).await.map_err(Error::Read),
        }
    }
}

pub(crate) mod writer {
    use crate::{
        errors::{Error, Result},
        http::response::Response,
        limits::ConnLimits,
    };
    use tokio::{
        io::{AsyncWrite, AsyncWriteExt},
        time::timeout,
    };

    #[inline]
    pub(crate) async fn write_response<S>(stream: &mut S, response: &Response, limits: &ConnLimits) -> Result<()>
    where
        S: AsyncWrite + Unpin,
    {
        let bytes = response.to_wire();

        match limits.socket_write_timeout {
            Some(time) => timeout(time, stream.write_all(&bytes))
                .await
                .map_err(|_| Error::Timeout("write"))?
                .map_err(Error::Write),
            None => stream.write_all(&bytes).await.map_err(Error::Write),
        }
    }

    /// Sends FIN. The socket itself is released when the stream is dropped.
    #[inline]
    pub(crate) async fn close<S>(stream: &mut S)
    where
        S: AsyncWrite + Unpin,
    {
        let _ = stream.shutdown().await;
    }
}
