//! Responses authored by the server itself.
//!
//! Only the two failure answers live here. Successful responses are written
//! by handlers through a [`ResponseSink`](crate::handler::ResponseSink).

use async_std::io::{Write, WriteExt};

use crate::http::status::HttpStatus;

const BAD_REQUEST: &[u8] = b"HTTP/1.1 400 Bad Request\r\n\
                             Content-Length: 0\r\n\
                             Connection: close\r\n\
                             \r\n";

const NOT_FOUND: &[u8] = b"HTTP/1.1 404 Not Found\r\n\
                           Content-Length: 0\r\n\
                           Connection: close\r\n\
                           \r\n";

/// Returns the wire bytes for `status`.
pub fn fixed_response(status: HttpStatus) -> &'static [u8] {
    match status {
        HttpStatus::BadRequest => BAD_REQUEST,
        HttpStatus::NotFound => NOT_FOUND,
    }
}

/// Writes the fixed response for `status` verbatim and flushes it.
pub async fn write_status<W>(out: &mut W, status: HttpStatus) -> std::io::Result<()>
where
    W: Write + Unpin,
{
    out.write_all(fixed_response(status)).await?;
    out.flush().await
}
