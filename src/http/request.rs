use crate::http::types::Headers;
use memchr::memmem;
use std::str;

/// Parsed HTTP request.
///
/// Built once per connection by [`Request::parse`] and never mutated
/// afterwards. A request is either fully parsed or the *empty* request
/// (every field empty), which stands in for any input that could not be
/// parsed.
///
/// # Accepted input
///
/// - `SP`: any ASCII whitespace
/// - `CRLF`: `"\r\n"`
///
/// ```text
/// [METHOD] SP [PATH] SP [VERSION] CRLF
/// [NAME]: [VALUE] CRLF
/// ...
/// CRLF
/// [BODY]
/// ```
///
/// - The request line must split into exactly three tokens. The version
///   token is required but not interpreted.
/// - A header line is split on the first `": "`. Lines without it are
///   skipped. Names are kept as sent and a repeated name keeps its last value.
/// - The body is everything after the first blank line, as far as it was read.
///   `Content-Length` is not consulted.
///
/// The method is not case-normalized and the path is neither percent-decoded
/// nor split into query and fragment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Request {
    method: String,
    path: String,
    headers: Headers,
    body: String,
}

impl Request {
    const HEAD_END: &'static [u8] = b"\r\n\r\n";
    const LINE_END: &'static str = "\r\n";
    const HEADER_DELIMITER: &'static str = ": ";

    /// The empty request produced for unparseable input.
    #[inline(always)]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a request from already separated parts.
    #[inline]
    pub fn from_parts(
        method: impl Into<String>,
        path: impl Into<String>,
        headers: Headers,
        body: impl Into<String>,
    ) -> Self {
        Request {
            method: method.into(),
            path: path.into(),
            headers,
            body: body.into(),
        }
    }

    /// Parses raw request bytes.
    ///
    /// Never fails: malformed input yields [`Request::empty`].
    pub fn parse(raw: &[u8]) -> Self {
        Self::try_parse(raw).unwrap_or_default()
    }

    fn try_parse(raw: &[u8]) -> Option<Self> {
        let head_end = memmem::find(raw, Self::HEAD_END)?;
        let head = simdutf8::basic::from_utf8(&raw[..head_end]).ok()?;
        let body = &raw[head_end + Self::HEAD_END.len()..];

        let mut lines = head.split(Self::LINE_END);
        let (method, path) = Self::parse_request_line(lines.next()?)?;

        let headers = lines
            .filter_map(|line| line.split_once(Self::HEADER_DELIMITER))
            .map(|(name, value)| (name.to_owned(), value.to_owned()))
            .collect();

        Some(Request {
            method: method.to_owned(),
            path: path.to_owned(),
            headers,
            // The read buffer may cut a multi-byte character in half.
            body: String::from_utf8_lossy(body).into_owned(),
        })
    }

    #[inline]
    fn parse_request_line(line: &str) -> Option<(&str, &str)> {
        let mut parts = line.split_whitespace();

        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(method), Some(path), Some(_version), None) => Some((method, path)),
            _ => None,
        }
    }
}

// Public API
impl Request {
    #[inline(always)]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[inline(always)]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[inline(always)]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the header value for an exact, case-sensitive name.
    #[inline(always)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Everything that followed the blank line, decoded as text.
    #[inline(always)]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// `true` for the request produced by unparseable input.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.method.is_empty()
            && self.path.is_empty()
            && self.headers.is_empty()
            && self.body.is_empty()
    }
}
