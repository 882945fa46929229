//! Gemini image adapter (`gemini-2.5-flash-image-preview`). One
//! `generateContent` call with the prompt (and, for edits, the current image
//! as an inline-data part); the finished image comes back as an inline-data
//! part of the first candidate. Gemini has no size parameter, so the viewport
//! only travels inside the prompt text.

use crate::normalize::truncate_body;
use mirage_shared::{ApiError, AppConfig, EncodedImage};
use serde::{Deserialize, Serialize};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";

#[derive(Serialize)]
struct GenerateContentRequest {
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
        text: String,
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
pub(crate) struct GenerateContentResponse {
    pub(crate) candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
pub(crate) struct Candidate {
    pub(crate) content: Option<CandidateContent>,
}

#[derive(Deserialize)]
pub(crate) struct CandidateContent {
    pub(crate) parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
pub(crate) struct ResponsePart {
    #[serde(rename = "inlineData")]
    pub(crate) inline_data: Option<InlineDataResponse>,
}

#[derive(Deserialize)]
pub(crate) struct InlineDataResponse {
    #[serde(rename = "mimeType")]
    pub(crate) mime_type: Option<String>,
    pub(crate) data: String,
}

pub async fn generate(
    http: &reqwest::Client,
    config: &AppConfig,
    prompt: &str,
) -> Result<EncodedImage, ApiError> {
    let request = image_request(vec![Part::Text {
        text: prompt.to_string(),
    }]);
    let response = send(http, config, &request).await?;
    extract_inline_image(response)
}

pub async fn edit(
    http: &reqwest::Client,
    config: &AppConfig,
    image: &EncodedImage,
    prompt: &str,
) -> Result<EncodedImage, ApiError> {
    let request = image_request(vec![
        Part::Text {
            text: prompt.to_string(),
        },
        Part::InlineData {
            inline_data: InlineData {
                mime_type: image.mime.clone(),
                data: image.base64(),
            },
        },
    ]);
    let response = send(http, config, &request).await?;
    extract_inline_image(response)
}

fn image_request(parts: Vec<Part>) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content { role: "user", parts }],
        generation_config: GenerationConfig {
            response_modalities: vec!["IMAGE", "TEXT"],
        },
    }
}

async fn send(
    http: &reqwest::Client,
    config: &AppConfig,
    request: &GenerateContentRequest,
) -> Result<GenerateContentResponse, ApiError> {
    let api_key = config.gemini_api_key.as_deref().ok_or_else(|| {
        ApiError::ProviderUnavailable("GEMINI_API_KEY is not configured".to_string())
    })?;
    let url = format!("{}/{}:generateContent?key={}", BASE_URL, IMAGE_MODEL, api_key);

    let response = http
        .post(url)
        .json(request)
        .send()
        .await
        .map_err(|e| ApiError::from_transport(e, config.provider_timeout_secs))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::ProviderUnavailable(format!(
            "Gemini returned {}: {}",
            status,
            truncate_body(&body)
        )));
    }

    response
        .json()
        .await
        .map_err(|e| ApiError::InvalidResponseShape(format!("Gemini: {}", e)))
}

/// Pulls the first inline-data part out of the response; text-only replies
/// (the model explaining why it made no image) count as `NoImageReturned`.
pub(crate) fn extract_inline_image(
    response: GenerateContentResponse,
) -> Result<EncodedImage, ApiError> {
    let inline = response
        .candidates
        .into_iter()
        .flatten()
        .filter_map(|c| c.content)
        .filter_map(|c| c.parts)
        .flatten()
        .find_map(|part| part.inline_data);

    let Some(inline) = inline else {
        return Err(ApiError::NoImageReturned);
    };

    let mut image = EncodedImage::from_base64(&inline.data)
        .map_err(|e| ApiError::InvalidResponseShape(format!("Gemini inline data: {}", e)))?;
    if let Some(mime) = inline.mime_type {
        image.mime = mime;
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_image_part_is_extracted_with_its_mime() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[
                {"text":"Here is your page."},
                {"inlineData":{"mimeType":"image/webp","data":"aGVsbG8="}}
            ]}}]}"#,
        )
        .unwrap();
        let image = extract_inline_image(response).unwrap();
        assert_eq!(image.bytes, b"hello");
        assert_eq!(image.mime, "image/webp");
    }

    #[test]
    fn text_only_reply_is_no_image_returned() {
        let response: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"I cannot draw that."}]}}]}"#,
        )
        .unwrap();
        assert!(matches!(
            extract_inline_image(response),
            Err(ApiError::NoImageReturned)
        ));
    }

    #[test]
    fn empty_candidates_are_no_image_returned() {
        let response: GenerateContentResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(matches!(
            extract_inline_image(response),
            Err(ApiError::NoImageReturned)
        ));
    }

    #[test]
    fn request_parts_serialize_in_gemini_wire_shape() {
        let request = image_request(vec![
            Part::Text {
                text: "draw".to_string(),
            },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: "image/png".to_string(),
                    data: "QUJD".to_string(),
                },
            },
        ]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "draw");
        assert_eq!(
            json["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "image/png"
        );
        assert_eq!(json["generationConfig"]["responseModalities"][0], "IMAGE");
    }
}
