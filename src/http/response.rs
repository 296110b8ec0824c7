use crate::{
    errors::{Error, Result},
    http::types::StatusCode,
};
use serde_json::{Map, Value};

/// JSON response.
///
/// A status code and a JSON object. Serialized exactly once, by the
/// connection that answers with it.
///
/// # Wire format
///
/// ```text
/// HTTP/1.1 [CODE] [REASON]\r
/// Content-Type: application/json\r
/// \r
/// [JSON OBJECT]
/// ```
///
/// No other header is ever written. There is no `Content-Length`, the end of
/// the body is signalled by closing the connection.
///
/// # Examples
///
/// ```
/// use json_route::{Response, StatusCode};
/// use serde_json::json;
///
/// let resp = Response::from_json(StatusCode::OK, json!({"message": "Hello, world!"})).unwrap();
///
/// assert_eq!(
///     resp.to_wire(),
///     b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"message\":\"Hello, world!\"}"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    content: Map<String, Value>,
}

impl Response {
    const CONTENT_TYPE_LINE: &'static [u8] = b"Content-Type: application/json\r\n\r\n";

    #[inline]
    pub fn new(status: impl Into<StatusCode>, content: Map<String, Value>) -> Self {
        Response {
            status: status.into(),
            content,
        }
    }

    /// Response with an empty `{}` body.
    #[inline]
    pub fn empty(status: impl Into<StatusCode>) -> Self {
        Self::new(status, Map::new())
    }

    /// Builds a response from any JSON value.
    ///
    /// `null` is treated as an empty object. Any other non-object value is
    /// rejected with [`Error::InvalidContent`].
    pub fn from_json(status: impl Into<StatusCode>, content: Value) -> Result<Self> {
        match content {
            Value::Object(map) => Ok(Self::new(status, map)),
            Value::Null => Ok(Self::empty(status)),
            Value::Bool(_) => Err(Error::InvalidContent("a boolean")),
            Value::Number(_) => Err(Error::InvalidContent("a number")),
            Value::String(_) => Err(Error::InvalidContent("a string")),
            Value::Array(_) => Err(Error::InvalidContent("an array")),
        }
    }

    /// `{"error": message}` with the given status.
    #[inline]
    pub fn error(status: impl Into<StatusCode>, message: &str) -> Self {
        let mut content = Map::with_capacity(1);
        content.insert("error".to_owned(), Value::String(message.to_owned()));

        Self::new(status, content)
    }
}

// Public API
impl Response {
    #[inline(always)]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Reason phrase from the status table, `"Unknown"` when missing.
    #[inline(always)]
    pub const fn status_text(&self) -> &'static str {
        self.status.reason()
    }

    #[inline(always)]
    pub const fn content(&self) -> &Map<String, Value> {
        &self.content
    }

    /// Serializes the response into the bytes written to the socket.
    pub fn to_wire(&self) -> Vec<u8> {
        let body = Value::Object(self.content.clone()).to_string();
        let first_line = format!(
            "HTTP/1.1 {} {}\r\n",
            self.status.as_u16(),
            self.status.reason()
        );

        let mut buffer =
            Vec::with_capacity(first_line.len() + Self::CONTENT_TYPE_LINE.len() + body.len());
        buffer.extend_from_slice(first_line.as_bytes());
        buffer.extend_from_slice(Self::CONTENT_TYPE_LINE);
        buffer.extend_from_slice(body.as_bytes());
        buffer
    }
}

#[cfg(test)]
mod wire_tests {
    use super::*;
    use crate::tools::*;
    use serde_json::json;

    #[test]
    fn first_line() {
        let cases = [
            (200u16, "HTTP/1.1 200 OK\r\n"),
            (400, "HTTP/1.1 400 Bad Request\r\n"),
            (403, "HTTP/1.1 403 Forbidden\r\n"),
            (404, "HTTP/1.1 404 Not Found\r\n"),
            (302, "HTTP/1.1 302 Unknown\r\n"),
            (999, "HTTP/1.1 999 Unknown\r\n"),
        ];

        for (code, line) in cases {
            let resp = Response::empty(code);
            let wire = resp.to_wire();

            assert!(str_op(&wire).starts_with(line), "{code}");
        }
    }

    #[test]
    fn exact_bytes() {
        let resp = Response::error(StatusCode::NOT_FOUND, "Route not found");

        assert_eq!(
            str_op(&resp.to_wire()),
            "HTTP/1.1 404 Not Found\r\n\
             Content-Type: application/json\r\n\
             \r\n\
             {\"error\":\"Route not found\"}"
        );
    }

    #[test]
    fn content_survives_serialization() {
        let cases = [
            json!({}),
            json!({"message": "Hello, world!"}),
            json!({"nested": {"list": [1, 2.5, null, true]}, "quote": "a\"b\\c\r\n"}),
            json!({"unicode": "привет 🌍"}),
        ];

        for content in cases {
            let wire = Response::from_json(201u16, content.clone()).unwrap().to_wire();
            let (head, body) = split_wire(&wire);

            assert_eq!(
                head,
                "HTTP/1.1 201 Unknown\r\nContent-Type: application/json"
            );
            assert_eq!(serde_json::from_str::<Value>(body).unwrap(), content);
        }
    }

    #[test]
    fn no_other_headers() {
        let wire = Response::from_json(200u16, json!({"a": 1})).unwrap().to_wire();
        let (head, _) = split_wire(&wire);

        assert_eq!(head.lines().count(), 2);
        assert!(!head.to_ascii_lowercase().contains("content-length"));
        assert!(!head.to_ascii_lowercase().contains("connection"));
    }

    #[test]
    fn from_json_rejects_non_objects() {
        let cases = [json!(1), json!("x"), json!([1]), json!(false)];

        for content in cases {
            assert!(matches!(
                Response::from_json(200u16, content),
                Err(Error::InvalidContent(_))
            ));
        }

        assert_eq!(
            Response::from_json(200u16, Value::Null).unwrap(),
            Response::empty(200u16)
        );
    }

    #[test]
    fn status_text() {
        assert_eq!(Response::empty(403u16).status_text(), "Forbidden");
        assert_eq!(Response::empty(207u16).status_text(), "Unknown");
        assert_eq!(Response::empty(StatusCode::OK).status(), StatusCode::OK);
    }
}
