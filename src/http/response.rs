//! HTTP response representation, parsing and serialization.

use tokio::io::AsyncRead;

use crate::http::{codec, Headers, HttpError};

/// A parsed HTTP/1.1 response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub version: String,
    pub status_code: u16,
    pub reason: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Read one response off the stream. A response with no framing headers
    /// runs to end of stream.
    pub async fn read_from<R>(stream: &mut R) -> Result<Self, HttpError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = Vec::new();
        let head_end = codec::read_head(stream, &mut buf).await?;
        let head = std::str::from_utf8(&buf[..head_end])
            .map_err(|_| HttpError::Parse("message head is not valid UTF-8".to_string()))?;
        let mut response = Self::parse_head(head)?;

        let rest = buf[head_end + 4..].to_vec();
        let framing = codec::body_framing(&response.headers, true)?;
        response.body = codec::read_body(stream, rest, framing).await?;
        Ok(response)
    }

    /// Parse the status line and header block. The body starts empty.
    fn parse_head(head: &str) -> Result<Self, HttpError> {
        let mut lines = head.split("\r\n");
        let start = lines
            .next()
            .ok_or_else(|| HttpError::Parse("empty response head".to_string()))?;

        let mut parts = start.splitn(3, ' ');
        let version = parts
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| HttpError::Parse(format!("invalid status line: {start:?}")))?;
        let status_code = parts
            .next()
            .and_then(|code| code.parse::<u16>().ok())
            .ok_or_else(|| HttpError::Parse(format!("invalid status code in: {start:?}")))?;
        let reason = parts.next().unwrap_or("").trim().to_string();

        Ok(Self {
            version: version.to_string(),
            status_code,
            reason,
            headers: codec::parse_header_lines(lines),
            body: Vec::new(),
        })
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        codec::header_get(&self.headers, name)
    }

    /// Serialize to wire bytes: status line, headers in map order, CRLF,
    /// body verbatim.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128 + self.body.len());
        out.extend_from_slice(
            format!("{} {} {}\r\n", self.version, self.status_code, self.reason).as_bytes(),
        );
        for (name, value) in &self.headers {
            out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
        out
    }

    /// A plain-text error response whose body equals the reason phrase.
    fn canned(status_code: u16, reason: &str) -> Self {
        let body = reason.as_bytes().to_vec();
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "text/plain".to_string());
        headers.insert("Content-Length".to_string(), body.len().to_string());
        Self {
            version: "HTTP/1.1".to_string(),
            status_code,
            reason: reason.to_string(),
            headers,
            body,
        }
    }

    pub fn not_found() -> Self {
        Self::canned(404, "Not Found")
    }

    pub fn internal_server_error() -> Self {
        Self::canned(500, "Internal Server Error")
    }

    pub fn bad_gateway() -> Self {
        Self::canned(502, "Bad Gateway")
    }

    pub fn service_unavailable() -> Self {
        Self::canned(503, "Service Unavailable")
    }

    pub fn gateway_timeout() -> Self {
        Self::canned(504, "Gateway Timeout")
    }
}
