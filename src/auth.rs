//! Authorization collaborator
//!
//! Consulted once per request, after the `Content-Type` check and before
//! routing. Without an authorizer every request is admitted.

use crate::http::types::Headers;

/// Decides whether a request may proceed, from its headers alone.
///
/// Returning `false` answers the request with `403 Forbidden`.
/// Implemented for every `Fn(&Headers) -> bool`.
pub trait Authorizer: Send + Sync + 'static {
    fn authorize(&self, headers: &Headers) -> bool;
}

impl<F> Authorizer for F
where
    F: Fn(&Headers) -> bool + Send + Sync + 'static,
{
    #[inline(always)]
    fn authorize(&self, headers: &Headers) -> bool {
        self(headers)
    }
}

/// Admits requests that carry a header with the given exact name.
///
/// The value is not inspected.
///
/// ```
/// use json_route::{auth::{Authorizer, RequireHeader}, Headers};
///
/// let auth = RequireHeader::new("Authorization");
/// let mut headers = Headers::new();
///
/// assert!(!auth.authorize(&headers));
/// headers.insert("Authorization".into(), "Bearer t".into());
/// assert!(auth.authorize(&headers));
/// ```
#[derive(Debug, Clone)]
pub struct RequireHeader {
    name: String,
}

impl RequireHeader {
    pub fn new(name: impl Into<String>) -> Self {
        RequireHeader { name: name.into() }
    }
}

impl Authorizer for RequireHeader {
    #[inline]
    fn authorize(&self, headers: &Headers) -> bool {
        headers.contains_key(&self.name)
    }
}

#[cfg(test)]
mod auth_tests {
    use super::*;

    #[test]
    fn require_header() {
        let auth = RequireHeader::new("Authorization");

        #[rustfmt::skip]
        let cases = [
            (vec![],                                   false),
            (vec![("Authorization", "")],              true),
            (vec![("Authorization", "Basic abc")],     true),
            (vec![("authorization", "Basic abc")],     false),
            (vec![("Host", "x"), ("Authorization", "t")], true),
        ];

        for (pairs, expected) in cases {
            let headers: Headers = pairs
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();

            assert_eq!(auth.authorize(&headers), expected, "{headers:?}");
        }
    }

    #[test]
    fn closure() {
        let deny_all = |_: &Headers| false;
        assert!(!deny_all.authorize(&Headers::new()));
    }
}
