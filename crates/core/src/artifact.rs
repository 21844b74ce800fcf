//! Artifacts returned by AI providers, and provider-level errors.

use std::borrow::Cow;

use base64::Engine;
use image::ImageFormat;

/// Reference to an image produced by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactRef {
    /// Fetchable URL hosted by the provider.
    Url(String),
    /// Inline payload (the provider answered with a `data:` URI).
    Bytes {
        bytes: Vec<u8>,
        content_type: Option<String>,
    },
}

impl ArtifactRef {
    /// The hosted URL, if this artifact has one.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url),
            Self::Bytes { .. } => None,
        }
    }

    /// A URL another provider can read: the hosted URL, or the inline
    /// payload re-encoded as a `data:` URI.
    pub fn fetchable_url(&self) -> Cow<'_, str> {
        match self {
            Self::Url(url) => Cow::Borrowed(url),
            Self::Bytes {
                bytes,
                content_type,
            } => {
                let mime = content_type
                    .as_deref()
                    .unwrap_or_else(|| sniff_image_type(bytes).0);
                Cow::Owned(encode_data_uri(bytes, mime))
            }
        }
    }
}

/// Encode bytes as a base64 `data:` URI.
pub fn encode_data_uri(bytes: &[u8], content_type: &str) -> String {
    format!(
        "data:{content_type};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Errors from a single provider call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Transport failure, timeout, non-2xx status, or an `error` field in the
    /// response body. `diagnostic` holds whatever the provider sent back.
    #[error("Provider call failed (status {status:?}): {diagnostic}")]
    Call {
        status: Option<u16>,
        diagnostic: String,
    },

    /// The call succeeded but no known artifact field could be found.
    #[error("Provider response did not contain an artifact: {diagnostic}")]
    InvalidResponse { diagnostic: String },
}

/// MIME type and file extension of an image payload, sniffed from its magic
/// bytes. Unrecognised payloads are treated as PNG.
pub fn sniff_image_type(bytes: &[u8]) -> (&'static str, &'static str) {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => ("image/jpeg", "jpg"),
        Ok(ImageFormat::WebP) => ("image/webp", "webp"),
        _ => ("image/png", "png"),
    }
}

/// MIME type and file extension for a provider-declared content type, when it
/// names one of the formats above. Parameters and case are ignored.
pub fn declared_image_type(content_type: &str) -> Option<(&'static str, &'static str)> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match mime.as_str() {
        "image/png" => Some(("image/png", "png")),
        "image/jpeg" | "image/jpg" => Some(("image/jpeg", "jpg")),
        "image/webp" => Some(("image/webp", "webp")),
        _ => None,
    }
}
