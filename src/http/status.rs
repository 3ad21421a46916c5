/// Statuses the server answers on its own.
/// Every other status is written by the registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    BadRequest = 400,
    NotFound = 404,
}

impl HttpStatus {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn reason(self) -> &'static str {
        match self {
            HttpStatus::BadRequest => "Bad Request",
            HttpStatus::NotFound => "Not Found",
        }
    }
}
