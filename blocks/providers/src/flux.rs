//! Flux adapter via Replicate (`black-forest-labs/flux-dev`). Predictions are
//! created with `Prefer: wait` so the call blocks until the model finishes;
//! the response carries a hosted URL that needs a follow-up fetch before the
//! image is in canonical form.

use crate::normalize::{fetch_hosted_image, truncate_body};
use mirage_shared::{ApiError, AppConfig, EncodedImage, Viewport};
use serde::{Deserialize, Serialize};

const PREDICTIONS_URL: &str =
    "https://api.replicate.com/v1/models/black-forest-labs/flux-dev/predictions";

/// flux-dev takes an aspect-ratio label rather than pixel dimensions; pick
/// the supported ratio nearest the viewport's.
pub fn aspect_ratio_for_viewport(viewport: Viewport) -> &'static str {
    const SUPPORTED: &[(f64, &str)] = &[
        (1.0, "1:1"),
        (16.0 / 9.0, "16:9"),
        (21.0 / 9.0, "21:9"),
        (3.0 / 2.0, "3:2"),
        (2.0 / 3.0, "2:3"),
        (4.0 / 5.0, "4:5"),
        (5.0 / 4.0, "5:4"),
        (3.0 / 4.0, "3:4"),
        (4.0 / 3.0, "4:3"),
        (9.0 / 16.0, "9:16"),
        (9.0 / 21.0, "9:21"),
    ];

    let target = viewport.aspect_ratio();
    SUPPORTED
        .iter()
        .min_by(|a, b| {
            (a.0 - target)
                .abs()
                .partial_cmp(&(b.0 - target).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(_, label)| *label)
        .unwrap_or("1:1")
}

#[derive(Serialize)]
struct PredictionRequest {
    input: FluxInput,
}

#[derive(Serialize)]
struct FluxInput {
    prompt: String,
    /// Data URL of the source image, for image-to-image edits only.
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    aspect_ratio: &'static str,
    num_outputs: u32,
    output_format: &'static str,
    output_quality: u32,
}

#[derive(Deserialize)]
pub(crate) struct PredictionResponse {
    pub(crate) status: Option<String>,
    pub(crate) output: Option<serde_json::Value>,
    pub(crate) error: Option<serde_json::Value>,
}

pub async fn generate(
    http: &reqwest::Client,
    config: &AppConfig,
    prompt: &str,
    viewport: Viewport,
) -> Result<EncodedImage, ApiError> {
    run_prediction(http, config, prompt, None, viewport).await
}

pub async fn edit(
    http: &reqwest::Client,
    config: &AppConfig,
    image: &EncodedImage,
    prompt: &str,
    viewport: Viewport,
) -> Result<EncodedImage, ApiError> {
    run_prediction(http, config, prompt, Some(image.to_data_url()), viewport).await
}

async fn run_prediction(
    http: &reqwest::Client,
    config: &AppConfig,
    prompt: &str,
    image: Option<String>,
    viewport: Viewport,
) -> Result<EncodedImage, ApiError> {
    let token = config.replicate_api_token.as_deref().ok_or_else(|| {
        ApiError::ProviderUnavailable("REPLICATE_API_TOKEN is not configured".to_string())
    })?;

    let request = PredictionRequest {
        input: FluxInput {
            prompt: prompt.to_string(),
            image,
            aspect_ratio: aspect_ratio_for_viewport(viewport),
            num_outputs: 1,
            output_format: "png",
            output_quality: 90,
        },
    };

    let response = http
        .post(PREDICTIONS_URL)
        .bearer_auth(token)
        .header("Prefer", "wait")
        .json(&request)
        .send()
        .await
        .map_err(|e| ApiError::from_transport(e, config.provider_timeout_secs))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::ProviderUnavailable(format!(
            "Replicate returned {}: {}",
            status,
            truncate_body(&body)
        )));
    }

    let prediction: PredictionResponse = response
        .json()
        .await
        .map_err(|e| ApiError::InvalidResponseShape(format!("Replicate: {}", e)))?;

    let url = output_url(&prediction)?;
    fetch_hosted_image(http, config, &url).await
}

/// A finished prediction's `output` is a URL or an array of URLs; anything
/// else means the model failed or is still running (we do not poll --
/// duplicate generations are costly and not idempotent).
pub(crate) fn output_url(prediction: &PredictionResponse) -> Result<String, ApiError> {
    if let Some(status) = prediction.status.as_deref() {
        if matches!(status, "failed" | "canceled") {
            let detail = prediction
                .error
                .as_ref()
                .map(|e| e.to_string())
                .unwrap_or_else(|| status.to_string());
            return Err(ApiError::ProviderUnavailable(format!(
                "Replicate prediction {}: {}",
                status, detail
            )));
        }
    }

    let url = match &prediction.output {
        Some(serde_json::Value::String(url)) => Some(url.clone()),
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .find_map(|item| item.as_str().map(|s| s.to_string())),
        _ => None,
    };

    url.filter(|u| !u.is_empty()).ok_or(ApiError::NoImageReturned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(json: &str) -> PredictionResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn viewport_maps_to_nearest_supported_ratio() {
        assert_eq!(aspect_ratio_for_viewport(Viewport::new(1024, 1024)), "1:1");
        assert_eq!(aspect_ratio_for_viewport(Viewport::new(1920, 1080)), "16:9");
        assert_eq!(aspect_ratio_for_viewport(Viewport::new(1080, 1920)), "9:16");
        assert_eq!(aspect_ratio_for_viewport(Viewport::new(1280, 960)), "4:3");
        // 2560x1080 is almost exactly 21:9
        assert_eq!(aspect_ratio_for_viewport(Viewport::new(2560, 1080)), "21:9");
    }

    #[test]
    fn output_url_accepts_both_array_and_string_shapes() {
        let p = prediction(r#"{"status":"succeeded","output":["https://r.dev/a.png"]}"#);
        assert_eq!(output_url(&p).unwrap(), "https://r.dev/a.png");

        let p = prediction(r#"{"status":"succeeded","output":"https://r.dev/b.png"}"#);
        assert_eq!(output_url(&p).unwrap(), "https://r.dev/b.png");
    }

    #[test]
    fn failed_predictions_surface_the_error() {
        let p = prediction(r#"{"status":"failed","error":"NSFW content detected"}"#);
        match output_url(&p) {
            Err(ApiError::ProviderUnavailable(msg)) => assert!(msg.contains("NSFW")),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn missing_output_is_no_image_returned() {
        let p = prediction(r#"{"status":"processing"}"#);
        assert!(matches!(output_url(&p), Err(ApiError::NoImageReturned)));
        let p = prediction(r#"{"status":"succeeded","output":[]}"#);
        assert!(matches!(output_url(&p), Err(ApiError::NoImageReturned)));
    }
}
