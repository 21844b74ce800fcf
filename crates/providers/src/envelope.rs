//! Provider response envelopes.
//!
//! Providers disagree on where the result URL lives. Every known location is
//! tried in order; nothing from a response is trusted until one matches.

use base64::Engine;
use fotoai_core::artifact::{ArtifactRef, ProviderError};
use serde_json::Value;

pub use fotoai_core::artifact::encode_data_uri;

/// JSON pointers to an artifact URL, in lookup order.
pub const ARTIFACT_URL_POINTERS: &[&str] = &[
    "/images/0/url",
    "/image/url",
    "/output/0/url",
    "/data/output/tmp_url",
];

/// Longest provider body kept in a diagnostic.
const MAX_DIAGNOSTIC_LEN: usize = 2048;

/// First non-empty artifact URL found in `body`.
pub fn extract_url(body: &Value) -> Option<&str> {
    ARTIFACT_URL_POINTERS
        .iter()
        .filter_map(|pointer| body.pointer(pointer))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|url| !url.is_empty())
}

/// Error reported inside a 2xx body (`error` or `detail` set to anything but null).
pub fn reported_error(body: &Value) -> Option<&Value> {
    ["error", "detail"]
        .iter()
        .filter_map(|key| body.get(key))
        .find(|value| !value.is_null())
}

/// Extract the artifact from a successful response body.
pub fn extract_artifact(body: &Value) -> Result<ArtifactRef, ProviderError> {
    let url = extract_url(body).ok_or_else(|| ProviderError::InvalidResponse {
        diagnostic: truncate(&body.to_string()),
    })?;
    artifact_from_url(url)
}

/// Turn a URL into an [`ArtifactRef`], decoding `data:` URIs inline.
pub fn artifact_from_url(url: &str) -> Result<ArtifactRef, ProviderError> {
    match decode_data_uri(url) {
        Some(decoded) => {
            let (bytes, content_type) = decoded?;
            Ok(ArtifactRef::Bytes {
                bytes,
                content_type,
            })
        }
        None => Ok(ArtifactRef::Url(url.to_string())),
    }
}

/// Decode a base64 `data:` URI. Returns `None` when `url` is not a data URI.
pub fn decode_data_uri(url: &str) -> Option<Result<(Vec<u8>, Option<String>), ProviderError>> {
    let rest = url.strip_prefix("data:")?;
    let Some((meta, payload)) = rest.split_once(',') else {
        return Some(Err(invalid_data_uri("missing ',' separator")));
    };
    let Some(mime) = meta.strip_suffix(";base64") else {
        return Some(Err(invalid_data_uri("only base64 data URIs are supported")));
    };
    let content_type = (!mime.is_empty()).then(|| mime.to_string());

    Some(
        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map(|bytes| (bytes, content_type))
            .map_err(|e| invalid_data_uri(&e.to_string())),
    )
}

fn invalid_data_uri(reason: &str) -> ProviderError {
    ProviderError::InvalidResponse {
        diagnostic: format!("invalid data URI: {reason}"),
    }
}

/// Cap a diagnostic payload so logs stay readable.
pub fn truncate(text: &str) -> String {
    if text.len() <= MAX_DIAGNOSTIC_LEN {
        return text.to_string();
    }
    let mut end = MAX_DIAGNOSTIC_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes total)", &text[..end], text.len())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[test]
    fn finds_url_in_every_known_shape() {
        let shapes = [
            json!({ "images": [{ "url": "https://a/1.png" }] }),
            json!({ "image": { "url": "https://a/1.png" } }),
            json!({ "output": [{ "url": "https://a/1.png" }] }),
            json!({ "data": { "output": { "tmp_url": "https://a/1.png" } } }),
        ];
        for body in shapes {
            assert_eq!(extract_url(&body), Some("https://a/1.png"), "shape {body}");
        }
    }

    #[test]
    fn earlier_shapes_win() {
        let body = json!({
            "images": [{ "url": "https://a/first.png" }],
            "output": [{ "url": "https://a/second.png" }]
        });
        assert_eq!(extract_url(&body), Some("https://a/first.png"));
    }

    #[test]
    fn empty_or_non_string_urls_are_skipped() {
        let body = json!({
            "images": [{ "url": "" }],
            "image": { "url": 42 },
            "output": [{ "url": "https://a/fallback.png" }]
        });
        assert_eq!(extract_url(&body), Some("https://a/fallback.png"));
    }

    #[test]
    fn unrecognised_body_is_invalid_response() {
        let body = json!({ "images": [], "seed": 1234 });
        assert_matches!(
            extract_artifact(&body),
            Err(ProviderError::InvalidResponse { diagnostic }) if diagnostic.contains("seed")
        );
    }

    #[test]
    fn data_uris_become_inline_bytes() {
        let uri = encode_data_uri(b"hello", "image/png");
        assert_eq!(
            artifact_from_url(&uri).unwrap(),
            ArtifactRef::Bytes {
                bytes: b"hello".to_vec(),
                content_type: Some("image/png".to_string()),
            }
        );
    }

    #[test]
    fn malformed_data_uris_are_rejected() {
        assert_matches!(
            artifact_from_url("data:image/png;base64,@@@"),
            Err(ProviderError::InvalidResponse { .. })
        );
        assert_matches!(
            artifact_from_url("data:text/plain,hello"),
            Err(ProviderError::InvalidResponse { .. })
        );
    }

    #[test]
    fn reported_errors_ignore_null() {
        assert!(reported_error(&json!({ "error": null })).is_none());
        assert_eq!(
            reported_error(&json!({ "detail": "quota exceeded" })),
            Some(&json!("quota exceeded"))
        );
    }

    #[test]
    fn long_diagnostics_are_truncated() {
        let long = "x".repeat(MAX_DIAGNOSTIC_LEN * 2);
        let cut = truncate(&long);
        assert!(cut.len() < long.len());
        assert!(cut.ends_with(&format!("({} bytes total)", long.len())));
    }
}
