use crate::http::HttpMethod;

/// A request parsed from a single connection.
///
/// Built once by [`read_request`](crate::http::parser::read_request) and then
/// moved into exactly one handler. There are no setters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: HttpMethod,
    path: String,
    protocol: String,
    headers: Vec<String>,
    body: String,
}

impl HttpRequest {
    pub(crate) fn new(
        method: HttpMethod,
        path: String,
        protocol: String,
        headers: Vec<String>,
        body: String,
    ) -> Self {
        Self {
            method,
            path,
            protocol,
            headers,
            body,
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The third request-line token, as sent by the client.
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Raw header lines in arrival order, duplicates included.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Value of the first header line starting with `name`.
    ///
    /// Matching is a literal, case-sensitive prefix test; the value is whatever
    /// follows the first space of the line, trimmed.
    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(&self.headers, name)
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

pub(crate) fn header_value<'a>(headers: &'a [String], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|line| line.starts_with(name))
        .and_then(|line| line.split_once(' '))
        .map(|(_, value)| value.trim())
}
