use crate::{
    auth::Authorizer,
    errors::{Error, Result},
    limits::{ConnLimits, ErrorPolicy, ServerLimits},
    router::{Handler, Route, RouteTable},
    server::{
        connection::HttpConnection,
        lifecycle::{Lifecycle, ServerHandle, State},
    },
};
use socket2::{Domain, Protocol, Socket, Type};
use std::{
    future::Future,
    net::{IpAddr, SocketAddr},
    sync::Arc,
};
use tokio::{net::TcpListener, time::timeout};
use tracing::{error, info, warn};

/// Single-connection HTTP server.
///
/// Accepts one connection, answers it, closes it and only then accepts the
/// next one. Nothing runs concurrently, so the route table and the
/// authorizer are shared read-only for the whole run.
///
/// # Examples
///
/// ```no_run
/// use json_route::{Request, Response, Server, StatusCode};
/// use serde_json::json;
///
/// fn hello(_: &Request) -> Response {
///     Response::from_json(StatusCode::OK, json!({"message": "Hello, world!"})).unwrap()
/// }
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> json_route::Result<()> {
///     Server::builder()
///         .host("127.0.0.1")
///         .port(8080)
///         .route("GET", "/", hello)
///         .build()
///         .launch()
///         .await
/// }
/// ```
pub struct Server {
    bind: Bind,
    connection: HttpConnection,
    server_limits: ServerLimits,
    lifecycle: Lifecycle,
}

enum Bind {
    Addr { host: String, port: u16 },
    Listener(TcpListener),
}

impl Server {
    /// Creates a new builder for configuring the server instance.
    #[inline]
    pub fn builder() -> ServerBuilder {
        ServerBuilder {
            host: ServerBuilder::DEFAULT_HOST.to_owned(),
            port: ServerBuilder::DEFAULT_PORT,
            listener: None,
            routes: RouteTable::new(),
            authorizer: None,

            server_limits: None,
            connection_limits: None,
        }
    }

    /// Handle for observing the lifecycle and requesting a stop.
    ///
    /// Must be taken before [`launch`](Self::launch), which consumes the server.
    #[inline]
    pub fn handle(&self) -> ServerHandle {
        self.lifecycle.handle()
    }

    /// Binds, serves until interrupted with Ctrl+C or stopped through a
    /// [`ServerHandle`], then closes the listener.
    ///
    /// # Errors
    ///
    /// Binding failures, and with [`ErrorPolicy::StopServer`] the first
    /// accept, read or write failure. The listener is closed before the
    /// error is returned.
    pub async fn launch(self) -> Result<()> {
        self.launch_with_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                // No signal handler available: only a handle can stop us.
                std::future::pending::<()>().await;
            }
            info!("Interrupt received, shutting down");
        })
        .await
    }

    /// Like [`launch`](Self::launch), but stops when `signal` completes
    /// instead of on Ctrl+C.
    pub async fn launch_with_shutdown<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let Server {
            bind: address,
            mut connection,
            server_limits,
            mut lifecycle,
        } = self;

        let listener = match address {
            Bind::Listener(listener) => listener,
            Bind::Addr { host, port } => bind(&host, port, server_limits.backlog)?,
        };

        let addr = listener.local_addr().map_err(Error::Accept)?;
        lifecycle.transition(State::Listening { addr });
        info!(%addr, "Server started on {addr}");

        let result = Self::accept_loop(
            &listener,
            &mut connection,
            &mut lifecycle,
            &server_limits,
            signal,
        )
        .await;

        lifecycle.transition(State::Stopping);
        info!("Shutting down the server...");
        drop(listener);
        lifecycle.transition(State::Stopped);

        result
    }

    async fn accept_loop<F>(
        listener: &TcpListener,
        connection: &mut HttpConnection,
        lifecycle: &mut Lifecycle,
        limits: &ServerLimits,
        signal: F,
    ) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(signal);

        while !lifecycle.stop_requested() {
            let accepted = tokio::select! {
                biased;

                _ = &mut signal => return Ok(()),
                _ = lifecycle.stop_signal() => return Ok(()),
                accepted = timeout(limits.accept_poll_interval, listener.accept()) => accepted,
            };

            let result = match accepted {
                Err(_elapsed) => continue,
                Ok(Err(err)) => Err(Error::Accept(err)),
                Ok(Ok((mut stream, peer))) => connection.run(&mut stream, peer).await.map(drop),
            };

            if let Err(err) = result {
                match limits.error_policy {
                    ErrorPolicy::StopServer => {
                        error!(stage = err.stage(), "An error occurred: {err}");
                        return Err(err);
                    }
                    ErrorPolicy::IsolateConnection => {
                        warn!(stage = err.stage(), "connection dropped: {err}");
                    }
                }
            }
        }

        Ok(())
    }
}

/// Creates the listening socket with `SO_REUSEADDR`, so a restart does not
/// have to wait for old connections to leave `TIME_WAIT`.
fn bind(host: &str, port: u16, backlog: i32) -> Result<TcpListener> {
    let ip: IpAddr = host
        .parse()
        .map_err(|_| Error::InvalidAddress(host.to_owned()))?;
    let addr = SocketAddr::new(ip, port);
    let bind_err = |source| Error::Bind { addr, source };

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(bind_err)?;
    socket.set_reuse_address(true).map_err(bind_err)?;
    socket.set_nonblocking(true).map_err(bind_err)?;
    socket.bind(&addr.into()).map_err(bind_err)?;
    socket.listen(backlog).map_err(bind_err)?;

    TcpListener::from_std(socket.into()).map_err(bind_err)
}

//

/// Builder for configuring and creating [`Server`] instances.
///
/// | Option           | Default        |
/// |------------------|----------------|
/// | `host`           | `"0.0.0.0"`    |
/// | `port`           | `65432`        |
/// | routes           | none           |
/// | `auth_handler`   | none (open)    |
pub struct ServerBuilder {
    host: String,
    port: u16,
    listener: Option<TcpListener>,
    routes: RouteTable,
    authorizer: Option<Arc<dyn Authorizer>>,

    server_limits: Option<ServerLimits>,
    connection_limits: Option<ConnLimits>,
}

impl ServerBuilder {
    pub const DEFAULT_HOST: &'static str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 65432;

    /// IP address to bind (default: `0.0.0.0`).
    #[inline(always)]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Port to bind (default: `65432`).
    #[inline(always)]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Serves on an already bound listener. `host` and `port` are ignored.
    #[inline(always)]
    pub fn listener(mut self, listener: TcpListener) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Registers a route after the ones already registered.
    #[inline(always)]
    pub fn route<H: Handler>(mut self, method: impl Into<String>, path: impl Into<String>, handler: H) -> Self {
        self.routes.push(Route::new(method, path, handler));
        self
    }

    /// Appends a whole table after the routes already registered.
    #[inline(always)]
    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes.extend(routes);
        self
    }

    /// Installs the authorization collaborator.
    ///
    /// Without one, every request is admitted.
    #[inline(always)]
    pub fn auth_handler<A: Authorizer>(mut self, authorizer: A) -> Self {
        self.authorizer = Some(Arc::new(authorizer));
        self
    }

    #[inline(always)]
    pub fn server_limits(mut self, limits: ServerLimits) -> Self {
        self.server_limits = Some(limits);
        self
    }

    #[inline(always)]
    pub fn connection_limits(mut self, limits: ConnLimits) -> Self {
        self.connection_limits = Some(limits);
        self
    }

    /// Finalizes the builder. Nothing is bound until [`Server::launch`].
    #[inline]
    pub fn build(self) -> Server {
        let bind = match self.listener {
            Some(listener) => Bind::Listener(listener),
            None => Bind::Addr {
                host: self.host,
                port: self.port,
            },
        };

        Server {
            bind,
            connection: HttpConnection::new(
                self.routes,
                self.authorizer,
                self.connection_limits.unwrap_or_default(),
            ),
            server_limits: self.server_limits.unwrap_or_default(),
            lifecycle: Lifecycle::new(),
        }
    }
}

#[cfg(test)]
mod server_tests {
    use super::*;
    use crate::{server::connection::test_conn, tools::*, Headers};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpStream,
        task::JoinHandle,
    };

    async fn spawn(builder: ServerBuilder) -> (SocketAddr, ServerHandle, JoinHandle<Result<()>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = builder
            .listener(listener)
            .server_limits(ServerLimits {
                accept_poll_interval: Duration::from_millis(20),
                ..ServerLimits::default()
            })
            .build();
        let handle = server.handle();
        let task = tokio::spawn(server.launch_with_shutdown(std::future::pending()));

        (addr, handle, task)
    }

    async fn send(addr: SocketAddr, raw: &[u8]) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw).await.unwrap();

        let mut out = Vec::new();
        stream.read_to_end(&mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    fn body(wire: &str) -> Value {
        serde_json::from_str(split_wire(wire.as_bytes()).1).unwrap()
    }

    #[tokio::test]
    async fn hello_world() {
        let (addr, handle, task) = spawn(Server::builder().routes(test_conn::routes())).await;

        let wire = send(addr, b"GET / HTTP/1.1\r\n\r\n").await;
        assert!(wire.starts_with("HTTP/1.1 200 OK"));
        assert_eq!(body(&wire), json!({"message": "Hello, world!"}));

        let wire = send(addr, b"GET /missing HTTP/1.1\r\n\r\n").await;
        assert!(wire.starts_with("HTTP/1.1 404 Not Found"));
        assert_eq!(body(&wire), json!({"error": "Route not found"}));

        handle.shutdown();
        task.await.unwrap().unwrap();
        assert_eq!(handle.state(), State::Stopped);
    }

    #[tokio::test]
    async fn serves_in_acceptance_order() {
        let (addr, handle, task) = spawn(Server::builder().routes(test_conn::routes())).await;

        for i in 0..5 {
            let raw = format!("POST /echo HTTP/1.1\r\n\r\n{i}");
            let wire = send(addr, raw.as_bytes()).await;

            assert_eq!(body(&wire), json!({"body": i.to_string()}));
        }

        handle.shutdown();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn authorization() {
        let builder = Server::builder()
            .routes(test_conn::routes())
            .auth_handler(|headers: &Headers| headers.contains_key("Authorization"));
        let (addr, handle, task) = spawn(builder).await;

        let wire = send(addr, b"GET / HTTP/1.1\r\n\r\n").await;
        assert!(wire.starts_with("HTTP/1.1 403 Forbidden"));
        assert_eq!(body(&wire), json!({"error": "Forbidden"}));

        let wire = send(addr, b"GET / HTTP/1.1\r\nAuthorization: t\r\n\r\n").await;
        assert!(wire.starts_with("HTTP/1.1 200 OK"));

        handle.shutdown();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn empty_connection_keeps_server_alive() {
        let (addr, handle, task) = spawn(Server::builder().routes(test_conn::routes())).await;

        let stream = TcpStream::connect(addr).await.unwrap();
        drop(stream);

        let wire = send(addr, b"GET / HTTP/1.1\r\n\r\n").await;
        assert!(wire.starts_with("HTTP/1.1 200 OK"));

        handle.shutdown();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn shutdown_while_idle() {
        let (_, mut handle, task) = spawn(Server::builder()).await;

        assert!(handle.listening().await.is_some());
        handle.shutdown();

        tokio::time::timeout(Duration::from_secs(2), handle.stopped())
            .await
            .unwrap();
        task.await.unwrap().unwrap();
        assert_eq!(handle.state(), State::Stopped);
    }

    #[tokio::test]
    async fn listener_closed_after_shutdown() {
        let (addr, handle, task) = spawn(Server::builder()).await;

        handle.shutdown();
        task.await.unwrap().unwrap();

        assert!(TcpStream::connect(addr).await.is_err());
    }

    #[tokio::test]
    async fn external_signal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let server = Server::builder().listener(listener).build();
        let task = tokio::spawn(server.launch_with_shutdown(async {
            let _ = rx.await;
        }));

        tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn binds_host_and_port() {
        let server = Server::builder().host("127.0.0.1").port(0).build();
        let mut handle = server.handle();
        let task = tokio::spawn(server.launch_with_shutdown(std::future::pending()));

        let addr = handle.listening().await.unwrap();
        assert_eq!(addr.ip(), "127.0.0.1".parse::<IpAddr>().unwrap());
        assert_ne!(addr.port(), 0);

        let wire = send(addr, b"GET / HTTP/1.1\r\n\r\n").await;
        assert!(wire.starts_with("HTTP/1.1 404 Not Found"));

        handle.shutdown();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn invalid_host() {
        let server = Server::builder().host("localhost:80").build();
        let mut handle = server.handle();

        assert!(matches!(
            server.launch_with_shutdown(std::future::pending()).await,
            Err(Error::InvalidAddress(host)) if host == "localhost:80"
        ));
        assert_eq!(handle.listening().await, None);
    }

    fn stalling_peer_limits() -> ConnLimits {
        ConnLimits {
            socket_read_timeout: Some(Duration::from_millis(20)),
            ..ConnLimits::default()
        }
    }

    #[tokio::test]
    async fn connection_error_stops_server() {
        let builder = Server::builder()
            .routes(test_conn::routes())
            .connection_limits(stalling_peer_limits());
        let (addr, handle, task) = spawn(builder).await;

        let _silent = TcpStream::connect(addr).await.unwrap();

        let result = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(Error::Timeout("read"))));
        assert_eq!(handle.state(), State::Stopped);
    }

    #[tokio::test]
    async fn connection_error_isolated() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Server::builder()
            .listener(listener)
            .routes(test_conn::routes())
            .connection_limits(stalling_peer_limits())
            .server_limits(ServerLimits {
                error_policy: ErrorPolicy::IsolateConnection,
                accept_poll_interval: Duration::from_millis(20),
                ..ServerLimits::default()
            })
            .build();
        let handle = server.handle();
        let task = tokio::spawn(server.launch_with_shutdown(std::future::pending()));

        let silent = TcpStream::connect(addr).await.unwrap();
        let wire = send(addr, b"GET / HTTP/1.1\r\n\r\n").await;
        drop(silent);

        assert!(wire.starts_with("HTTP/1.1 200 OK"));
        handle.shutdown();
        task.await.unwrap().unwrap();
    }

    #[test]
    fn builder_defaults() {
        let builder = Server::builder();

        assert_eq!(builder.host, "0.0.0.0");
        assert_eq!(builder.port, 65432);
        assert!(builder.routes.is_empty());
        assert!(builder.authorizer.is_none());
    }
}
