use crate::error::ApiError;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

/// One in-memory encoded image, the canonical representation every provider
/// response is normalized into before it crosses a crate boundary.
///
/// On the wire the canonical shape is a `data:` URL embedded in JSON; this
/// type reads that shape, bare base64, and raw binary bodies transparently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl EncodedImage {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        EncodedImage {
            bytes,
            mime: mime.into(),
        }
    }

    pub fn png(bytes: Vec<u8>) -> Self {
        EncodedImage::new(bytes, "image/png")
    }

    /// Parses a `data:image/...;base64,...` URL.
    pub fn from_data_url(url: &str) -> Result<Self, ApiError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| ApiError::InvalidImage("not a data URL".to_string()))?;
        let (mime, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| ApiError::InvalidImage("data URL is not base64-encoded".to_string()))?;
        let bytes = BASE64_STANDARD
            .decode(payload.trim())
            .map_err(|e| ApiError::InvalidImage(format!("base64 decode failed: {}", e)))?;
        if bytes.is_empty() {
            return Err(ApiError::InvalidImage("empty image payload".to_string()));
        }
        let mime = if mime.is_empty() { "image/png" } else { mime };
        Ok(EncodedImage::new(bytes, mime))
    }

    /// Parses a bare base64 string (no data-URL framing).
    pub fn from_base64(payload: &str) -> Result<Self, ApiError> {
        let bytes = BASE64_STANDARD
            .decode(payload.trim())
            .map_err(|e| ApiError::InvalidImage(format!("base64 decode failed: {}", e)))?;
        if bytes.is_empty() {
            return Err(ApiError::InvalidImage("empty image payload".to_string()));
        }
        Ok(EncodedImage::png(bytes))
    }

    /// Accepts either wire shape a client may send: data URL or bare base64.
    pub fn from_payload(payload: &str) -> Result<Self, ApiError> {
        if payload.starts_with("data:") {
            EncodedImage::from_data_url(payload)
        } else {
            EncodedImage::from_base64(payload)
        }
    }

    pub fn base64(&self) -> String {
        BASE64_STANDARD.encode(&self.bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Smallest valid payload for codec purposes; decoding to pixels is the
    // marker atom's concern, not this one's.
    const BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    #[test]
    fn data_url_round_trip_preserves_bytes_and_mime() {
        let img = EncodedImage::new(BYTES.to_vec(), "image/png");
        let url = img.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));
        let back = EncodedImage::from_data_url(&url).unwrap();
        assert_eq!(back, img);
    }

    #[test]
    fn from_payload_accepts_both_wire_shapes() {
        let img = EncodedImage::new(BYTES.to_vec(), "image/png");
        assert_eq!(EncodedImage::from_payload(&img.to_data_url()).unwrap(), img);
        assert_eq!(EncodedImage::from_payload(&img.base64()).unwrap(), img);
    }

    #[test]
    fn rejects_garbage_and_empty_payloads() {
        assert!(EncodedImage::from_payload("data:image/png;base64,!!!").is_err());
        assert!(EncodedImage::from_payload("data:image/png;base64,").is_err());
        assert!(EncodedImage::from_payload("not base64 at all ???").is_err());
    }
}
