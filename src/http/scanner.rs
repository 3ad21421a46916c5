/// Request line terminator.
pub const CRLF: &[u8] = b"\r\n";

/// Header block terminator.
pub const CRLF_CRLF: &[u8] = b"\r\n\r\n";

/// Returns the index of the first occurrence of `needle` inside `haystack[start..limit]`.
///
/// `limit` is clamped to the haystack length, so callers can pass a read budget
/// without checking how many bytes actually arrived. An empty needle never matches.
pub fn find(haystack: &[u8], needle: &[u8], start: usize, limit: usize) -> Option<usize> {
    let limit = limit.min(haystack.len());
    if needle.is_empty() || start >= limit || limit - start < needle.len() {
        return None;
    }

    haystack[start..limit]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + start)
}
