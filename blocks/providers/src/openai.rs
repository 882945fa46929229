//! OpenAI `gpt-image-1` adapter. Generation is plain JSON; edits go through
//! the multipart `/images/edits` endpoint with the current image attached as
//! a file. Responses carry inline base64 (`b64_json`) with a hosted-URL
//! fallback that needs one more fetch.

use crate::normalize::{fetch_hosted_image, truncate_body};
use mirage_shared::{ApiError, AppConfig, EncodedImage, Viewport};
use reqwest::multipart;
use serde::{Deserialize, Serialize};

const GENERATIONS_URL: &str = "https://api.openai.com/v1/images/generations";
const EDITS_URL: &str = "https://api.openai.com/v1/images/edits";
const IMAGE_MODEL: &str = "gpt-image-1";

/// gpt-image-1 only accepts a fixed size enumeration; pick the nearest by
/// orientation of the requested viewport.
pub fn size_for_viewport(viewport: Viewport) -> &'static str {
    let ratio = viewport.aspect_ratio();
    if ratio >= 1.25 {
        "1536x1024"
    } else if ratio <= 0.8 {
        "1024x1536"
    } else {
        "1024x1024"
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'static str,
    prompt: &'a str,
    n: u32,
    size: &'static str,
    quality: &'static str,
}

#[derive(Deserialize)]
pub(crate) struct ImagesResponse {
    pub(crate) data: Option<Vec<ImageDatum>>,
}

#[derive(Deserialize)]
pub(crate) struct ImageDatum {
    pub(crate) b64_json: Option<String>,
    pub(crate) url: Option<String>,
}

pub async fn generate(
    http: &reqwest::Client,
    config: &AppConfig,
    prompt: &str,
    viewport: Viewport,
) -> Result<EncodedImage, ApiError> {
    let request = GenerateRequest {
        model: IMAGE_MODEL,
        prompt,
        n: 1,
        size: size_for_viewport(viewport),
        quality: "high",
    };

    let response = http
        .post(GENERATIONS_URL)
        .bearer_auth(api_key(config)?)
        .json(&request)
        .send()
        .await
        .map_err(|e| ApiError::from_transport(e, config.provider_timeout_secs))?;
    let response = check_status(response).await?;

    let parsed: ImagesResponse = response
        .json()
        .await
        .map_err(|e| ApiError::InvalidResponseShape(format!("OpenAI: {}", e)))?;
    resolve_image(http, config, parsed).await
}

pub async fn edit(
    http: &reqwest::Client,
    config: &AppConfig,
    image: &EncodedImage,
    prompt: &str,
    viewport: Viewport,
) -> Result<EncodedImage, ApiError> {
    let part = multipart::Part::bytes(image.bytes.clone())
        .file_name("image.png")
        .mime_str(&image.mime)
        .map_err(|e| ApiError::InvalidImage(format!("bad image mime type: {}", e)))?;

    let form = multipart::Form::new()
        .text("model", IMAGE_MODEL)
        .text("prompt", prompt.to_string())
        .text("n", "1")
        .text("size", size_for_viewport(viewport))
        .text("quality", "high")
        // Loose fidelity on purpose: the edit is supposed to change the page
        .text("input_fidelity", "low")
        .text("background", "opaque")
        .part("image", part);

    let response = http
        .post(EDITS_URL)
        .bearer_auth(api_key(config)?)
        .multipart(form)
        .send()
        .await
        .map_err(|e| ApiError::from_transport(e, config.provider_timeout_secs))?;
    let response = check_status(response).await?;

    let parsed: ImagesResponse = response
        .json()
        .await
        .map_err(|e| ApiError::InvalidResponseShape(format!("OpenAI: {}", e)))?;
    resolve_image(http, config, parsed).await
}

fn api_key(config: &AppConfig) -> Result<&str, ApiError> {
    config
        .openai_api_key
        .as_deref()
        .ok_or_else(|| ApiError::ProviderUnavailable("OPENAI_API_KEY is not configured".to_string()))
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::ProviderUnavailable(format!(
        "OpenAI returned {}: {}",
        status,
        truncate_body(&body)
    )))
}

/// Inline base64 is the normal path; a URL-only datum falls back to a
/// follow-up fetch.
async fn resolve_image(
    http: &reqwest::Client,
    config: &AppConfig,
    parsed: ImagesResponse,
) -> Result<EncodedImage, ApiError> {
    if let Some(image) = extract_inline(&parsed)? {
        return Ok(image);
    }
    let url = first_url(&parsed).ok_or(ApiError::NoImageReturned)?;
    fetch_hosted_image(http, config, &url).await
}

pub(crate) fn extract_inline(parsed: &ImagesResponse) -> Result<Option<EncodedImage>, ApiError> {
    let Some(datum) = parsed.data.as_ref().and_then(|d| d.first()) else {
        return Err(ApiError::NoImageReturned);
    };
    match &datum.b64_json {
        Some(b64) => Ok(Some(EncodedImage::from_base64(b64).map_err(|e| {
            ApiError::InvalidResponseShape(format!("OpenAI b64_json: {}", e))
        })?)),
        None => Ok(None),
    }
}

fn first_url(parsed: &ImagesResponse) -> Option<String> {
    parsed
        .data
        .as_ref()
        .and_then(|d| d.first())
        .and_then(|d| d.url.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_maps_to_nearest_supported_size() {
        assert_eq!(size_for_viewport(Viewport::new(1920, 1080)), "1536x1024");
        assert_eq!(size_for_viewport(Viewport::new(1024, 1024)), "1024x1024");
        assert_eq!(size_for_viewport(Viewport::new(800, 1400)), "1024x1536");
        // Mildly wide stays square
        assert_eq!(size_for_viewport(Viewport::new(1100, 1000)), "1024x1024");
    }

    #[test]
    fn inline_base64_wins_over_url() {
        let parsed: ImagesResponse = serde_json::from_str(
            r#"{"data":[{"b64_json":"aGVsbG8=","url":"https://example.com/x.png"}]}"#,
        )
        .unwrap();
        let image = extract_inline(&parsed).unwrap().unwrap();
        assert_eq!(image.bytes, b"hello");
    }

    #[test]
    fn url_only_defers_to_the_follow_up_fetch() {
        let parsed: ImagesResponse =
            serde_json::from_str(r#"{"data":[{"url":"https://example.com/x.png"}]}"#).unwrap();
        assert!(extract_inline(&parsed).unwrap().is_none());
    }

    #[test]
    fn empty_data_is_no_image_returned() {
        let parsed: ImagesResponse = serde_json::from_str(r#"{"data":[]}"#).unwrap();
        assert!(matches!(
            extract_inline(&parsed),
            Err(ApiError::NoImageReturned)
        ));
        let parsed: ImagesResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(matches!(
            extract_inline(&parsed),
            Err(ApiError::NoImageReturned)
        ));
    }

    #[test]
    fn malformed_base64_is_an_invalid_shape_not_a_panic() {
        let parsed: ImagesResponse =
            serde_json::from_str(r#"{"data":[{"b64_json":"%%%"}]}"#).unwrap();
        assert!(matches!(
            extract_inline(&parsed),
            Err(ApiError::InvalidResponseShape(_))
        ));
    }
}
