//! Wire-level reading and framing for HTTP/1.1 messages.
//!
//! # Responsibilities
//! - Accumulate bytes until the head terminator (`\r\n\r\n`)
//! - Parse header lines (keys and values trimmed, case-sensitive storage)
//! - Delimit the body by Content-Length, chunked coding, or stream end
//!
//! # Design Decisions
//! - Framing headers are located case-insensitively over the
//!   case-sensitive map
//! - Chunked bodies are kept verbatim so pass-through re-serialization
//!   is byte-exact
//! - Requests without framing headers take only the bytes already
//!   buffered past the head; waiting for EOF would stall clients that
//!   keep the connection open

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::http::{Headers, HttpError};

/// Upper bound on the size of a message head (start line + headers).
const MAX_HEAD_BYTES: usize = 64 * 1024;

const HEAD_END: &[u8] = b"\r\n\r\n";
const CHUNK_END: &[u8] = b"0\r\n\r\n";

/// How the remainder of a message body is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BodyFraming {
    /// Exactly this many bytes follow the head.
    ContentLength(usize),
    /// Chunked transfer coding; the body runs to the `0\r\n\r\n` marker.
    Chunked,
    /// No framing headers; read to end of stream.
    UntilClose,
    /// No framing headers; whatever is already buffered is the body.
    Buffered,
}

/// Read from `stream` into `buf` until the head terminator appears.
///
/// Returns the index of the terminator; `buf` may hold body bytes past it.
pub(crate) async fn read_head<R>(stream: &mut R, buf: &mut Vec<u8>) -> Result<usize, HttpError>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; 4096];
    loop {
        if let Some(pos) = find(buf, HEAD_END) {
            return Ok(pos);
        }
        if buf.len() > MAX_HEAD_BYTES {
            return Err(HttpError::HeadTooLarge(MAX_HEAD_BYTES));
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(HttpError::Parse(
                "connection closed before message head completed".to_string(),
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

/// Parse `Name: Value` lines. Keys and values are trimmed; lines without a
/// colon are skipped.
pub(crate) fn parse_header_lines<'a, I>(lines: I) -> Headers
where
    I: Iterator<Item = &'a str>,
{
    let mut headers = Headers::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        headers.insert(name.to_string(), value.trim().to_string());
    }
    headers
}

/// Case-insensitive header lookup over the case-sensitive map.
pub(crate) fn header_get<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Decide how the body is delimited.
///
/// `until_close` selects the fallback when no framing header is present:
/// responses read to EOF, requests keep only what is buffered.
pub(crate) fn body_framing(headers: &Headers, until_close: bool) -> Result<BodyFraming, HttpError> {
    if let Some(value) = header_get(headers, "Content-Length") {
        let len: usize = value.trim().parse().map_err(|_| {
            HttpError::Parse(format!("invalid Content-Length: {value:?}"))
        })?;
        return Ok(BodyFraming::ContentLength(len));
    }
    if let Some(value) = header_get(headers, "Transfer-Encoding") {
        if value.to_ascii_lowercase().contains("chunked") {
            return Ok(BodyFraming::Chunked);
        }
    }
    Ok(if until_close {
        BodyFraming::UntilClose
    } else {
        BodyFraming::Buffered
    })
}

/// Read the body. `rest` holds bytes already read past the head.
pub(crate) async fn read_body<R>(
    stream: &mut R,
    mut rest: Vec<u8>,
    framing: BodyFraming,
) -> Result<Vec<u8>, HttpError>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; 4096];
    match framing {
        BodyFraming::ContentLength(len) => {
            while rest.len() < len {
                let n = stream.read(&mut chunk).await?;
                if n == 0 {
                    return Err(HttpError::Parse(
                        "connection closed mid-body".to_string(),
                    ));
                }
                rest.extend_from_slice(&chunk[..n]);
            }
            rest.truncate(len);
            Ok(rest)
        }
        BodyFraming::Chunked => {
            loop {
                if chunked_complete(&rest) {
                    return Ok(rest);
                }
                let n = stream.read(&mut chunk).await?;
                if n == 0 {
                    return Err(HttpError::Parse(
                        "connection closed before final chunk".to_string(),
                    ));
                }
                rest.extend_from_slice(&chunk[..n]);
            }
        }
        BodyFraming::UntilClose => {
            stream.read_to_end(&mut rest).await?;
            Ok(rest)
        }
        BodyFraming::Buffered => Ok(rest),
    }
}

/// The chunked body is complete once the end marker sits at a chunk boundary.
fn chunked_complete(body: &[u8]) -> bool {
    if !body.ends_with(CHUNK_END) {
        return false;
    }
    body.len() == CHUNK_END.len() || body[..body.len() - CHUNK_END.len()].ends_with(b"\r\n")
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_head_finds_terminator() {
        let data = b"GET / HTTP/1.1\r\nHost: a\r\n\r\nbody".to_vec();
        let mut stream = &data[..];
        let mut buf = Vec::new();
        let pos = read_head(&mut stream, &mut buf).await.unwrap();
        assert_eq!(&buf[..pos], b"GET / HTTP/1.1\r\nHost: a");
    }

    #[tokio::test]
    async fn read_head_rejects_truncated_stream() {
        let data = b"GET / HTTP/1.1\r\nHost: a".to_vec();
        let mut stream = &data[..];
        let mut buf = Vec::new();
        let err = read_head(&mut stream, &mut buf).await.unwrap_err();
        assert!(matches!(err, HttpError::Parse(_)));
    }

    #[test]
    fn header_lines_are_trimmed_and_case_preserved() {
        let headers =
            parse_header_lines(["Host:  example  ", "X-Thing: 1", "garbage-line"].into_iter());
        assert_eq!(headers.get("Host").map(String::as_str), Some("example"));
        assert_eq!(headers.get("X-Thing").map(String::as_str), Some("1"));
        assert!(headers.get("host").is_none());
        assert_eq!(header_get(&headers, "hOsT"), Some("example"));
    }

    #[test]
    fn framing_prefers_content_length() {
        let mut headers = Headers::new();
        headers.insert("content-length".to_string(), "12".to_string());
        headers.insert("Transfer-Encoding".to_string(), "chunked".to_string());
        assert_eq!(
            body_framing(&headers, true).unwrap(),
            BodyFraming::ContentLength(12)
        );
    }

    #[test]
    fn framing_rejects_non_integer_content_length() {
        let mut headers = Headers::new();
        headers.insert("Content-Length".to_string(), "twelve".to_string());
        assert!(matches!(
            body_framing(&headers, true),
            Err(HttpError::Parse(_))
        ));
    }

    #[test]
    fn framing_recognises_chunked_case_insensitively() {
        let mut headers = Headers::new();
        headers.insert("Transfer-Encoding".to_string(), "Chunked".to_string());
        assert_eq!(body_framing(&headers, true).unwrap(), BodyFraming::Chunked);
    }

    #[test]
    fn framing_fallback_depends_on_side() {
        let headers = Headers::new();
        assert_eq!(
            body_framing(&headers, true).unwrap(),
            BodyFraming::UntilClose
        );
        assert_eq!(
            body_framing(&headers, false).unwrap(),
            BodyFraming::Buffered
        );
    }

    #[tokio::test]
    async fn content_length_body_is_exact() {
        let data = b"world and more".to_vec();
        let mut stream = &data[..];
        let body = read_body(&mut stream, b"hello ".to_vec(), BodyFraming::ContentLength(11))
            .await
            .unwrap();
        assert_eq!(body, b"hello world");
    }

    #[tokio::test]
    async fn chunked_body_keeps_wire_bytes() {
        let data = b"5\r\nhello\r\n0\r\n\r\n".to_vec();
        let mut stream = &data[..];
        let body = read_body(&mut stream, Vec::new(), BodyFraming::Chunked)
            .await
            .unwrap();
        assert_eq!(body, data);
    }

    #[tokio::test]
    async fn empty_chunked_body_is_just_the_marker() {
        let data = b"0\r\n\r\n".to_vec();
        let mut stream = &data[..];
        let body = read_body(&mut stream, Vec::new(), BodyFraming::Chunked)
            .await
            .unwrap();
        assert_eq!(body, data);
    }

    #[tokio::test]
    async fn until_close_reads_to_eof() {
        let data = b" tail".to_vec();
        let mut stream = &data[..];
        let body = read_body(&mut stream, b"head".to_vec(), BodyFraming::UntilClose)
            .await
            .unwrap();
        assert_eq!(body, b"head tail");
    }
}
