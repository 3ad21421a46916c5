//! Single-shot request parser.
//!
//! The request line and the header block must arrive within a fixed read
//! budget. [`parse_head`] is a pure function over those buffered bytes;
//! [`read_request`] fills the buffer from the connection, runs it, and then
//! reads the body that `Content-Length` announces.
//!
//! Validation is deliberately lopsided. Any defect in the request line or a
//! missing header terminator is an error, while a missing or unparseable
//! `Content-Length` on a `POST` just leaves the body empty.

use async_std::io::{Read, ReadExt};
use thiserror::Error;

use crate::http::HttpMethod;
use crate::http::request::{HttpRequest, header_value};
use crate::http::scanner::{self, CRLF, CRLF_CRLF};
use crate::http::status::HttpStatus;

/// Default header-read budget in bytes.
pub const READ_BUDGET: usize = 4096;

const CONTENT_LENGTH: &str = "Content-Length";

/// Reasons a request is rejected with `400 Bad Request`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParserError {
    #[error("no request line terminator within the read budget")]
    MissingRequestLine,

    #[error("request line has {0} tokens, expected 3")]
    TokenCount(usize),

    #[error("unsupported method {0:?}")]
    UnsupportedMethod(String),

    #[error("path {0:?} does not start with '/'")]
    InvalidPath(String),

    #[error("no header block terminator within the read budget")]
    MissingHeaderTerminator,
}

impl ParserError {
    pub fn into_http_status(self) -> HttpStatus {
        HttpStatus::BadRequest
    }
}

/// Errors raised while reading a request from a connection.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("i/o error while reading request: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed request: {0}")]
    Parser(#[from] ParserError),
}

/// Request line and headers, as located inside the budget buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct RequestHead {
    pub method: HttpMethod,
    pub path: String,
    pub protocol: String,
    pub headers: Vec<String>,
    /// Offset of the first body byte inside the buffer.
    pub body_start: usize,
}

impl RequestHead {
    /// Declared body length, if the header is present and numeric.
    pub fn content_length(&self) -> Option<usize> {
        header_value(&self.headers, CONTENT_LENGTH).and_then(|v| v.parse::<usize>().ok())
    }
}

/// Parses the request line and header block out of `buf`.
pub fn parse_head(buf: &[u8]) -> Result<RequestHead, ParserError> {
    let request_line_end =
        scanner::find(buf, CRLF, 0, buf.len()).ok_or(ParserError::MissingRequestLine)?;

    // Request line: METHOD PATH PROTOCOL
    let request_line = String::from_utf8_lossy(&buf[..request_line_end]);
    let parts: Vec<&str> = request_line.split(' ').collect();
    let [method, path, protocol] = parts.as_slice() else {
        return Err(ParserError::TokenCount(parts.len()));
    };

    let method = HttpMethod::from_token(method)
        .ok_or_else(|| ParserError::UnsupportedMethod(method.to_string()))?;
    if !path.starts_with('/') {
        return Err(ParserError::InvalidPath(path.to_string()));
    }

    // The search starts on the request line terminator itself so that a
    // request without any header line is still accepted.
    let headers_start = request_line_end + CRLF.len();
    let headers_end = scanner::find(buf, CRLF_CRLF, request_line_end, buf.len())
        .ok_or(ParserError::MissingHeaderTerminator)?;

    let headers = if headers_end > headers_start {
        String::from_utf8_lossy(&buf[headers_start..headers_end])
            .split("\r\n")
            .map(str::to_string)
            .collect()
    } else {
        Vec::new()
    };

    Ok(RequestHead {
        method,
        path: path.to_string(),
        protocol: protocol.to_string(),
        headers,
        body_start: headers_end + CRLF_CRLF.len(),
    })
}

/// Reads one request from `stream` using a header budget of `budget` bytes.
pub async fn read_request<R>(stream: &mut R, budget: usize) -> Result<HttpRequest, ReadError>
where
    R: Read + Unpin,
{
    let mut buffer = vec![0; budget];
    let filled = fill_head(stream, &mut buffer).await?;
    let head = parse_head(&buffer[..filled])?;

    // GET never carries a body
    let body = match (head.method, head.content_length()) {
        (HttpMethod::Get, _) | (_, None) => String::new(),
        (_, Some(len)) => read_body(stream, &buffer[head.body_start..filled], len).await?,
    };

    Ok(HttpRequest::new(
        head.method,
        head.path,
        head.protocol,
        head.headers,
        body,
    ))
}

/// Reads into `buffer` until the header terminator shows up, the buffer is
/// full, or the peer stops sending. Returns the number of bytes filled.
async fn fill_head<R>(stream: &mut R, buffer: &mut [u8]) -> std::io::Result<usize>
where
    R: Read + Unpin,
{
    let mut filled = 0;

    while filled < buffer.len() {
        let n = match stream.read(&mut buffer[filled..]).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        // The terminator may straddle two reads.
        let scan_from = filled.saturating_sub(CRLF_CRLF.len() - 1);
        filled += n;

        if scanner::find(buffer, CRLF_CRLF, scan_from, filled).is_some() {
            break;
        }
    }

    Ok(filled)
}

/// Collects exactly `len` body bytes, starting with those already buffered.
/// Stops early without error if the stream ends first.
async fn read_body<R>(stream: &mut R, buffered: &[u8], len: usize) -> std::io::Result<String>
where
    R: Read + Unpin,
{
    let taken = buffered.len().min(len);
    let mut body = buffered[..taken].to_vec();

    let remaining = (len - taken) as u64;
    if remaining > 0 {
        (&mut *stream).take(remaining).read_to_end(&mut body).await?;
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}
