use std::io::{self, Write};

/// Output sink handed to a handler.
///
/// Handlers write raw response bytes into it; once the handler returns, the
/// connection drains the sink to the socket and closes. The sink belongs to a
/// single connection and is never shared.
#[derive(Debug, Default)]
pub struct ResponseSink {
    buf: Vec<u8>,
}

impl ResponseSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

impl Write for ResponseSink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
