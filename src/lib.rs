//! json_route - minimal HTTP/1.1 JSON server with a static route table
//!
//! Accepts TCP connections one at a time, reads a single request from each,
//! runs it through a fixed pipeline and answers with a JSON body before
//! closing the connection.
//!
//! # Pipeline
//!
//! ```text
//! bytes ─▶ Request ─▶ Content-Type guard ─▶ authorization ─▶ route table ─▶ Response ─▶ bytes
//! ```
//!
//! | Outcome                                   | Status | Body                                |
//! |-------------------------------------------|--------|-------------------------------------|
//! | `Content-Type` present and not JSON       | `400`  | `{"error": "Invalid Content-Type"}` |
//! | authorizer returned `false`               | `403`  | `{"error": "Forbidden"}`            |
//! | no route for the method and path          | `404`  | `{"error": "Route not found"}`      |
//! | matching route                            | any    | whatever the handler returned       |
//!
//! A request that cannot be parsed is treated as the empty request, which
//! no route matches, so it is answered with `404` rather than `400`.
//!
//! # Protocol Support
//!
//! - One request per connection, the connection is closed after the response
//! - No keep-alive, pipelining, chunked bodies or TLS
//! - The request is read with a single `1024`-byte read (see [`limits::ConnLimits`])
//! - Responses carry only `Content-Type: application/json`, no `Content-Length`
//!
//! # Examples
//!
//! ```no_run
//! use json_route::{auth::RequireHeader, Request, Response, Server, StatusCode};
//! use serde_json::json;
//!
//! fn about(_: &Request) -> Response {
//!     Response::from_json(StatusCode::OK, json!({"message": "This is the about page"})).unwrap()
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> json_route::Result<()> {
//!     Server::builder()
//!         .route("GET", "/about", about)
//!         .auth_handler(RequireHeader::new("Authorization"))
//!         .build()
//!         .launch()
//!         .await
//! }
//! ```

pub(crate) mod http {
    pub(crate) mod request;
    pub(crate) mod response;
    pub(crate) mod types;
}
pub(crate) mod server {
    pub(crate) mod connection;
    pub(crate) mod lifecycle;
    pub(crate) mod server_impl;
}
pub mod auth;
pub(crate) mod errors;
pub mod limits;
pub mod router;

pub use crate::{
    auth::Authorizer,
    errors::{Error, Result},
    http::{
        request::Request,
        response::Response,
        types::{Headers, StatusCode, UNKNOWN_REASON},
    },
    router::{Handler, Route, RouteTable},
    server::{
        lifecycle::{ServerHandle, State},
        server_impl::{Server, ServerBuilder},
    },
};

#[cfg(test)]
pub mod tools {
    use std::str::from_utf8;

    #[inline]
    pub fn str_op(value: &[u8]) -> &str {
        from_utf8(value).unwrap()
    }

    /// Splits a serialized response into its head and its body.
    #[inline]
    pub fn split_wire(value: &[u8]) -> (&str, &str) {
        str_op(value).split_once("\r\n\r\n").unwrap()
    }
}
