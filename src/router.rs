//! Static route table
//!
//! Routes are matched by exact string equality on both the method and the
//! path. There are no wildcards, no path parameters and no trailing-slash
//! normalization. When several routes share a method and path, the one
//! registered first wins.

use crate::http::{request::Request, response::Response};
use std::{fmt, sync::Arc};

/// Turns a parsed request into a response.
///
/// Implemented for every `Fn(&Request) -> Response`, so plain functions and
/// closures can be registered directly. Implement it on a type for handlers
/// that carry their own state.
///
/// # Examples
///
/// ```
/// use json_route::{Handler, Request, Response, StatusCode};
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// struct Counter(AtomicUsize);
///
/// impl Handler for Counter {
///     fn handle(&self, _: &Request) -> Response {
///         let n = self.0.fetch_add(1, Ordering::Relaxed) + 1;
///         Response::from_json(StatusCode::OK, serde_json::json!({"count": n})).unwrap()
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Produces the response for `request`.
    ///
    /// A panic here is not caught by the server.
    fn handle(&self, request: &Request) -> Response;
}

impl<F> Handler for F
where
    F: Fn(&Request) -> Response + Send + Sync + 'static,
{
    #[inline(always)]
    fn handle(&self, request: &Request) -> Response {
        self(request)
    }
}

/// Binding of a method and an exact path to a handler.
#[derive(Clone)]
pub struct Route {
    method: String,
    path: String,
    handler: Arc<dyn Handler>,
}

impl Route {
    pub fn new<H: Handler>(method: impl Into<String>, path: impl Into<String>, handler: H) -> Self {
        Route {
            method: method.into(),
            path: path.into(),
            handler: Arc::new(handler),
        }
    }

    #[inline(always)]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[inline(always)]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline(always)]
    pub fn matches(&self, method: &str, path: &str) -> bool {
        self.method == method && self.path == path
    }

    #[inline(always)]
    pub fn handle(&self, request: &Request) -> Response {
        self.handler.handle(request)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Ordered list of routes, searched front to back.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a route. Builder-style counterpart of [`RouteTable::push`].
    #[inline]
    pub fn route<H: Handler>(
        mut self,
        method: impl Into<String>,
        path: impl Into<String>,
        handler: H,
    ) -> Self {
        self.push(Route::new(method, path, handler));
        self
    }

    #[inline]
    pub fn push(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// First route registered for exactly this method and path.
    #[inline]
    pub fn matches(&self, method: &str, path: &str) -> Option<&Route> {
        self.routes.iter().find(|route| route.matches(method, path))
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl FromIterator<Route> for RouteTable {
    fn from_iter<I: IntoIterator<Item = Route>>(iter: I) -> Self {
        RouteTable {
            routes: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RouteTable {
    type Item = Route;
    type IntoIter = std::vec::IntoIter<Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.into_iter()
    }
}

impl Extend<Route> for RouteTable {
    fn extend<I: IntoIterator<Item = Route>>(&mut self, iter: I) {
        self.routes.extend(iter);
    }
}
