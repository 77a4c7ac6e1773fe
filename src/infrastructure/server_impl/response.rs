use crate::infrastructure::server_impl::headers::HeaderMap;
use bytes::Bytes;
use std::fmt::Write;
use strum::{EnumMessage, IntoStaticStr};

/// Connection-scoped headers that must not be echoed back from the request.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "content-length",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, IntoStaticStr, EnumMessage)]
#[repr(u16)]
pub enum StatusCode {
    #[strum(serialize = "200", message = "OK")]
    Ok = 200,
    #[strum(serialize = "201", message = "Created")]
    Created = 201,
    #[strum(serialize = "204", message = "No Content")]
    NoContent = 204,
    #[strum(serialize = "205", message = "Reset Content")]
    ResetContent = 205,
    #[strum(serialize = "400", message = "Bad Request")]
    BadRequest = 400,
    #[strum(serialize = "404", message = "Not Found")]
    NotFound = 404,
    #[strum(serialize = "405", message = "Method Not Allowed")]
    MethodNotAllowed = 405,
    #[strum(serialize = "500", message = "Internal Server Error")]
    InternalServerError = 500,
}

impl StatusCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn reason(self) -> &'static str {
        self.get_message().unwrap_or_default()
    }
}

/// The `(status, headers, body)` triple every handler produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub headers: HeaderMap,
    pub status_code: StatusCode,
    pub body: String,
}

impl Response {
    pub fn from_status_code(value: StatusCode, body: impl Into<String>) -> Self {
        Self {
            headers: Default::default(),
            status_code: value,
            body: body.into(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn status(&self) -> u16 {
        self.status_code.as_u16()
    }

    pub fn into_http(self) -> Bytes {
        let mut buf = String::with_capacity(128 + self.body.len());
        let status_code: &str = self.status_code.into();
        let status_message = self.status_code.reason();

        let _ = write!(
            buf,
            "HTTP/1.1 {status_code} {status_message}\r\n\
             Server: stackinabox\r\n"
        );

        for (name, value) in self.headers.iter() {
            // framing is ours to decide
            if HOP_BY_HOP.iter().any(|c| unicase::eq(*c, name)) {
                continue;
            }
            let _ = write!(buf, "{name}: {value}\r\n");
        }

        if !self.headers.contains("content-type") && !self.body.is_empty() {
            buf.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        }

        buf.push_str("Connection: close\r\n");

        // 204 carries neither a body nor a Content-Length
        if self.status_code == StatusCode::NoContent {
            buf.push_str("\r\n");
        } else {
            let length = self.body.len();
            let _ = write!(buf, "Content-Length: {length}\r\n\r\n{}", self.body);
        }

        buf.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_are_numeric() {
        assert_eq!(StatusCode::Created.as_u16(), 201);
        assert_eq!(StatusCode::ResetContent.as_u16(), 205);
        assert_eq!(StatusCode::NotFound.reason(), "Not Found");
    }

    #[test]
    fn serialises_empty_body() {
        let mut headers = HeaderMap::new();
        headers.insert("Location", "admin/abc/");
        let response = Response::from_status_code(StatusCode::Created, "").with_headers(headers);

        let raw = response.into_http();
        let raw = std::str::from_utf8(&raw).unwrap();
        assert!(raw.starts_with("HTTP/1.1 201 Created\r\n"));
        assert!(raw.contains("Location: admin/abc/\r\n"));
        assert!(!raw.contains("Content-Type"));
        assert!(raw.ends_with("Content-Length: 0\r\n\r\n"));
    }

    #[test]
    fn serialises_no_content() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Session-ID", "abc");
        let response = Response::from_status_code(StatusCode::NoContent, "").with_headers(headers);

        let raw = response.into_http();
        let raw = std::str::from_utf8(&raw).unwrap();
        assert!(raw.starts_with("HTTP/1.1 204 No Content\r\n"));
        assert!(raw.contains("X-Session-ID: abc\r\n"));
        assert!(!raw.contains("Content-Length"));
        assert!(raw.ends_with("Connection: close\r\n\r\n"));
    }

    #[test]
    fn drops_echoed_hop_by_hop_headers() {
        let headers: HeaderMap = [
            ("Transfer-Encoding", "chunked"),
            ("Keep-Alive", "timeout=5"),
            ("TE", "trailers"),
            ("Upgrade", "websocket"),
            ("Trailer", "Expires"),
            ("Connection", "keep-alive"),
            ("Location", "admin/abc/"),
        ]
        .into_iter()
        .collect();
        let response = Response::from_status_code(StatusCode::Created, "").with_headers(headers);

        let raw = response.into_http();
        let raw = std::str::from_utf8(&raw).unwrap().to_ascii_lowercase();
        assert!(!raw.contains("transfer-encoding"));
        assert!(!raw.contains("keep-alive"));
        assert!(!raw.contains("te: trailers"));
        assert!(!raw.contains("upgrade"));
        assert!(!raw.contains("trailer: expires"));
        assert!(raw.contains("location: admin/abc/\r\n"));
        assert_eq!(raw.matches("connection:").count(), 1);
        assert!(raw.ends_with("content-length: 0\r\n\r\n"));
    }

    #[test]
    fn serialises_text_body() {
        let mut headers = HeaderMap::new();
        headers.insert("content-length", "999");
        let response = Response::from_status_code(StatusCode::NotFound, "Invalid Session ID: x")
            .with_headers(headers);

        let raw = response.into_http();
        let raw = std::str::from_utf8(&raw).unwrap();
        assert!(raw.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(raw.contains("Content-Type: text/plain; charset=utf-8\r\n"));
        assert!(!raw.contains("999"));
        assert!(raw.ends_with("Content-Length: 21\r\n\r\nInvalid Session ID: x"));
    }
}
