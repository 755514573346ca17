//! HTTP request representation, parsing and serialization.

use tokio::io::AsyncRead;

use crate::http::{codec, Headers, HttpError};

/// A parsed HTTP/1.1 request.
///
/// Method, path and version are carried verbatim; the gateway forwards
/// requests without interpreting them beyond the path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub version: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Read one request off the stream: head, then body per framing rules.
    pub async fn read_from<R>(stream: &mut R) -> Result<Self, HttpError>
    where
        R: AsyncRead + Unpin,
    {
        let mut buf = Vec::new();
        let head_end = codec::read_head(stream, &mut buf).await?;
        let head = std::str::from_utf8(&buf[..head_end])
            .map_err(|_| HttpError::Parse("message head is not valid UTF-8".to_string()))?;
        let mut request = Self::parse_head(head)?;

        let rest = buf[head_end + 4..].to_vec();
        let framing = codec::body_framing(&request.headers, false)?;
        request.body = codec::read_body(stream, rest, framing).await?;
        Ok(request)
    }

    /// Parse the start line and header block. The body starts empty.
    fn parse_head(head: &str) -> Result<Self, HttpError> {
        let mut lines = head.split("\r\n");
        let start = lines
            .next()
            .ok_or_else(|| HttpError::Parse("empty request head".to_string()))?;

        let mut parts = start.split_whitespace();
        let (method, path, version) = match (parts.next(), parts.next(), parts.next(), parts.next())
        {
            (Some(method), Some(path), Some(version), None) => (method, path, version),
            _ => {
                return Err(HttpError::Parse(format!("invalid request line: {start:?}")));
            }
        };

        Ok(Self {
            method: method.to_string(),
            path: path.to_string(),
            version: version.to_string(),
            headers: codec::parse_header_lines(lines),
            body: Vec::new(),
        })
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        codec::header_get(&self.headers, name)
    }

    /// Serialize to wire bytes: request line, headers in map order, CRLF,
    /// body verbatim.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128 + self.body.len());
        out.extend_from_slice(
            format!("{} {} {}\r\n", self.method, self.path, self.version).as_bytes(),
        );
        for (name, value) in &self.headers {
            out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
        out
    }
}
