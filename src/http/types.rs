//! Core HTTP protocol types

use std::{collections::HashMap, fmt};

/// Request headers, keyed by the exact name sent by the client.
///
/// Lookups are case-sensitive and a repeated name keeps its last value.
pub type Headers = HashMap<String, String>;

// STATUS_CODE

/// Reason phrase for codes missing from the status table.
pub const UNKNOWN_REASON: &str = "Unknown";

/// HTTP status code.
///
/// Any `u16` is accepted. Only codes listed in the status table carry a
/// reason phrase, the rest report [`UNKNOWN_REASON`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusCode(u16);

macro_rules! set_status_codes {
    ($(
        $(#[$docs:meta])+
        $name:ident = ($num:literal, $str:literal);
    )+) => {
        impl StatusCode { $(
            #[doc = concat!(stringify!($num), " ", $str)]
            $(#[$docs])+
            pub const $name: StatusCode = StatusCode($num);
        )+

            /// Returns the reason phrase (`"OK"`, `"Not Found"`, ...) or
            /// `"Unknown"` for codes outside the table.
            #[inline]
            pub const fn reason(&self) -> &'static str {
                match self.0 {
                    $( $num => $str, )+
                    _ => UNKNOWN_REASON,
                }
            }
        }
    }
}

set_status_codes! {
    /// [[RFC9110, Section 15.3.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.3.1)]
    OK = (200, "OK");
    /// [[RFC9110, Section 15.5.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.1)]
    BAD_REQUEST = (400, "Bad Request");
    /// [[RFC9110, Section 15.5.4](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.4)]
    FORBIDDEN = (403, "Forbidden");
    /// [[RFC9110, Section 15.5.5](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.5)]
    NOT_FOUND = (404, "Not Found");
    /// [[RFC9110, Section 15.6.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.6.1)]
    INTERNAL_SERVER_ERROR = (500, "Internal Server Error");
}

impl StatusCode {
    #[inline(always)]
    pub const fn from_u16(code: u16) -> Self {
        StatusCode(code)
    }

    #[inline(always)]
    pub const fn as_u16(&self) -> u16 {
        self.0
    }
}

impl From<u16> for StatusCode {
    #[inline(always)]
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

impl From<StatusCode> for u16 {
    #[inline(always)]
    fn from(code: StatusCode) -> Self {
        code.0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.reason())
    }
}
