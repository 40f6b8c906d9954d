//! Request ids.

use salvo::{Request, Response, http::header::HeaderValue};
use uuid::Uuid;

pub(super) const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_LEN: usize = 128;

/// Accept a caller's id only if it is short, visible ASCII; otherwise mint a v7 uuid.
pub(super) fn resolve(req: &Request) -> String {
    req.header::<String>(REQUEST_ID_HEADER)
        .map(|value| value.trim().to_owned())
        .filter(|value| is_acceptable(value))
        .unwrap_or_else(|| Uuid::now_v7().to_string())
}

fn is_acceptable(value: &str) -> bool {
    !value.is_empty() && value.len() <= MAX_LEN && value.bytes().all(|b| b.is_ascii_graphic())
}

pub(super) fn echo(res: &mut Response, request_id: &str) {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_ids_are_screened() {
        assert!(is_acceptable("req-123"));
        assert!(is_acceptable("0190a1b2-c3d4-7e5f-8a9b-0c1d2e3f4a5b"));
        assert!(!is_acceptable(""));
        assert!(!is_acceptable("has space"));
        assert!(!is_acceptable("ümlaut"));
        assert!(!is_acceptable(&"x".repeat(MAX_LEN + 1)));
    }
}
