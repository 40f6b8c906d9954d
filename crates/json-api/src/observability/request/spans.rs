//! HTTP span helpers.

use uuid::Uuid;

#[derive(Debug, Clone)]
pub(super) struct RequestSpanName {
    pub(super) otel_path: String,
    pub(super) otel_span_name: String,
}

pub(super) fn request_span_name(method: &str, path: &str) -> RequestSpanName {
    let otel_path = normalise_path_for_span_name(path);
    let otel_span_name = format!("{method} {otel_path}");

    RequestSpanName {
        otel_path,
        otel_span_name,
    }
}

/// Collapse identifiers so `/records/42` and `/records/43` share one route label.
fn normalise_path_for_span_name(path: &str) -> String {
    if path == "/" {
        return "/".to_owned();
    }

    let segments: Vec<&str> = path
        .trim_start_matches('/')
        .split('/')
        .map(|segment| {
            if is_numeric_id(segment) {
                "{id}"
            } else if Uuid::parse_str(segment).is_ok() {
                "{uuid}"
            } else {
                segment
            }
        })
        .collect();

    format!("/{}", segments.join("/"))
}

fn is_numeric_id(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|byte| byte.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_collapsed() {
        let names = request_span_name("GET", "/api/v1/card-detection/records/42");

        assert_eq!(names.otel_path, "/api/v1/card-detection/records/{id}");
        assert_eq!(
            names.otel_span_name,
            "GET /api/v1/card-detection/records/{id}"
        );

        assert_eq!(
            normalise_path_for_span_name("/x/0195b4a2-7d3e-7c1a-9b2f-3c4d5e6f7a8b"),
            "/x/{uuid}"
        );
        assert_eq!(
            normalise_path_for_span_name("/api/v1/auth/login"),
            "/api/v1/auth/login"
        );
        assert_eq!(normalise_path_for_span_name("/"), "/");
    }
}
