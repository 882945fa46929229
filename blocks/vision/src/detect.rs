//! Input-field detector: asks Gemini to enumerate every type-into-able region
//! of a page screenshot as normalized bounding boxes, so the client can float
//! live editable fields over the static image.
//!
//! Detection degrades to an empty list on any failure; a page with no
//! interactive overlays is fine, an error state is not.

use crate::parse::strip_code_fences;
use mirage_atoms::sessions::model::InputFieldRegion;
use mirage_shared::{ApiError, AppConfig, EncodedImage};
use serde::{Deserialize, Serialize};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DETECT_MODEL: &str = "gemini-2.5-flash-image-preview";

const DETECT_PROMPT: &str = "Analyze this website screenshot and identify all text input fields, \
search boxes, text areas, and form inputs.\n\n\
For each input field you find, provide the exact bounding box coordinates in this JSON format:\n\
{\n  \"inputs\": [\n    {\n      \"x\": 0.25,\n      \"y\": 0.15,\n      \"width\": 0.5,\n      \
\"height\": 0.08,\n      \"label\": \"Search box\",\n      \"type\": \"search\"\n    }\n  ]\n}\n\n\
Coordinates should be normalized (0.0 to 1.0) where:\n\
- x, y = top-left corner position\n\
- width, height = dimensions\n\
- label = descriptive name for the input\n\
- type = \"search\", \"text\", \"email\", \"password\", \"textarea\", etc.\n\n\
Only include actual input fields that users can type into. Do not include buttons, labels, or \
other UI elements.\n\n\
Respond with ONLY the JSON, no other text.";

#[derive(Serialize)]
struct DetectRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: &'static str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseModalities")]
    response_modalities: Vec<&'static str>,
}

#[derive(Deserialize)]
struct DetectResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Never fails: a degraded detection is an empty list.
pub async fn detect_inputs(
    http: &reqwest::Client,
    config: &AppConfig,
    image: &EncodedImage,
) -> Vec<InputFieldRegion> {
    match detect_inner(http, config, image).await {
        Ok(inputs) => {
            tracing::info!("🔍 detected {} input field(s)", inputs.len());
            inputs
        }
        Err(e) => {
            tracing::warn!("⚠️ input detection degraded, returning no inputs: {}", e);
            Vec::new()
        }
    }
}

async fn detect_inner(
    http: &reqwest::Client,
    config: &AppConfig,
    image: &EncodedImage,
) -> Result<Vec<InputFieldRegion>, ApiError> {
    let api_key = config.gemini_api_key.as_deref().ok_or_else(|| {
        ApiError::ProviderUnavailable("GEMINI_API_KEY is not configured".to_string())
    })?;
    let url = format!("{}/{}:generateContent?key={}", BASE_URL, DETECT_MODEL, api_key);

    let request = DetectRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![
                Part::Text {
                    text: DETECT_PROMPT,
                },
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: image.mime.clone(),
                        data: image.base64(),
                    },
                },
            ],
        }],
        generation_config: GenerationConfig {
            response_modalities: vec!["TEXT"],
        },
    };

    let response = http
        .post(url)
        .json(&request)
        .send()
        .await
        .map_err(|e| ApiError::from_transport(e, config.provider_timeout_secs))?;

    if !response.status().is_success() {
        return Err(ApiError::ProviderUnavailable(format!(
            "Gemini returned {}",
            response.status()
        )));
    }

    let parsed: DetectResponse = response
        .json()
        .await
        .map_err(|e| ApiError::InvalidResponseShape(format!("Gemini detect: {}", e)))?;

    let text = collect_text(parsed);
    Ok(parse_input_regions(&text))
}

fn collect_text(response: DetectResponse) -> String {
    response
        .candidates
        .into_iter()
        .flatten()
        .filter_map(|c| c.content)
        .filter_map(|c| c.parts)
        .flatten()
        .filter_map(|p| p.text)
        .collect()
}

/// Parses the detector reply. Each region is validated and defaulted
/// independently: a missing number gets a small sane placeholder instead of
/// sinking the whole result.
pub fn parse_input_regions(text: &str) -> Vec<InputFieldRegion> {
    let cleaned = strip_code_fences(text);
    let Ok(value) = serde_json::from_str::<serde_json::Value>(cleaned) else {
        return Vec::new();
    };

    let Some(inputs) = value.get("inputs").and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    inputs
        .iter()
        .filter_map(|input| input.as_object())
        .map(|input| {
            let number = |key: &str, default: f64| {
                input
                    .get(key)
                    .and_then(|v| v.as_f64())
                    .unwrap_or(default)
                    .clamp(0.0, 1.0)
            };
            let string = |key: &str, default: &str| {
                input
                    .get(key)
                    .and_then(|v| v.as_str())
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or(default)
                    .to_string()
            };
            InputFieldRegion {
                x: number("x", 0.0),
                y: number("y", 0.0),
                width: number("width", 0.1),
                height: number("height", 0.05),
                label: string("label", "Input field"),
                field_type: string("type", "text"),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_regions_parse() {
        let regions = parse_input_regions(
            r#"{"inputs":[{"x":0.25,"y":0.15,"width":0.5,"height":0.08,"label":"Search box","type":"search"}]}"#,
        );
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].label, "Search box");
        assert_eq!(regions[0].field_type, "search");
        assert!((regions[0].width - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn fenced_replies_parse() {
        let regions = parse_input_regions(
            "```json\n{\"inputs\":[{\"x\":0.1,\"y\":0.2,\"width\":0.3,\"height\":0.05,\"label\":\"Email\",\"type\":\"email\"}]}\n```",
        );
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].field_type, "email");
    }

    #[test]
    fn partial_regions_are_defaulted_not_dropped() {
        let regions = parse_input_regions(r#"{"inputs":[{"x":0.4,"y":0.4}]}"#);
        assert_eq!(regions.len(), 1);
        assert!((regions[0].width - 0.1).abs() < f64::EPSILON);
        assert!((regions[0].height - 0.05).abs() < f64::EPSILON);
        assert_eq!(regions[0].label, "Input field");
        assert_eq!(regions[0].field_type, "text");
    }

    #[test]
    fn out_of_range_coordinates_are_clamped() {
        let regions =
            parse_input_regions(r#"{"inputs":[{"x":-0.5,"y":1.7,"width":3.0,"height":0.05}]}"#);
        assert_eq!(regions[0].x, 0.0);
        assert_eq!(regions[0].y, 1.0);
        assert_eq!(regions[0].width, 1.0);
    }

    #[test]
    fn no_inputs_and_garbage_both_yield_empty() {
        assert!(parse_input_regions(r#"{"inputs":[]}"#).is_empty());
        assert!(parse_input_regions("There are no input fields on this page.").is_empty());
        assert!(parse_input_regions(r#"{"fields":[{"x":0.1}]}"#).is_empty());
        assert!(parse_input_regions("").is_empty());
    }
}
