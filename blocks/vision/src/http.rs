use crate::{classify, detect, presearch};
use lambda_http::{http::StatusCode, Body, Error, Response};
use mirage_shared::{ApiError, AppConfig, EncodedImage};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ClassifyClickRequest {
    #[serde(default)]
    image_data: Option<String>,
    #[serde(default)]
    click_position: Option<ClickPosition>,
    #[serde(default)]
    original_prompt: Option<String>,
    #[serde(default)]
    current_context: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClickPosition {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct DetectInputsRequest {
    #[serde(default)]
    image_data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PreSearchRequest {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    prompt: Option<String>,
}

// HTTP handler: POST /classify-click
pub async fn classify_click_handler(
    http: &reqwest::Client,
    config: &AppConfig,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: ClassifyClickRequest = match serde_json::from_slice(body) {
        Ok(req) => req,
        Err(e) => return validation_error(&format!("invalid JSON body: {}", e)),
    };

    let (image_data, position) = match (req.image_data.as_deref(), req.click_position) {
        (Some(image), Some(position)) => (image, position),
        _ => return validation_error("image_data and click_position are required"),
    };

    // A bad image payload cannot be classified, but the contract says this
    // endpoint degrades instead of failing.
    let classification = match EncodedImage::from_payload(image_data) {
        Ok(image) => {
            classify::classify(
                http,
                config,
                &image,
                position.x,
                position.y,
                req.original_prompt.as_deref().unwrap_or("website"),
                req.current_context.as_deref(),
            )
            .await
        }
        Err(e) => {
            tracing::warn!("⚠️ classify-click got an undecodable image, defaulting: {}", e);
            mirage_atoms::sessions::model::ClickClassification::fallback()
        }
    };

    let mut body = serde_json::json!({
        "click_type": classification.kind,
        "confidence": classification.confidence,
    });
    if let Some(nav) = classification.navigation {
        body["will_navigate"] = nav.will_navigate.into();
        if let Some(target) = nav.target {
            body["target"] = target.into();
        }
    }

    json_ok(body)
}

// HTTP handler: POST /detect-inputs
pub async fn detect_inputs_handler(
    http: &reqwest::Client,
    config: &AppConfig,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: DetectInputsRequest = match serde_json::from_slice(body) {
        Ok(req) => req,
        Err(e) => return validation_error(&format!("invalid JSON body: {}", e)),
    };

    let Some(image_data) = req.image_data.as_deref() else {
        return validation_error("image_data is required");
    };

    let inputs = match EncodedImage::from_payload(image_data) {
        Ok(image) => detect::detect_inputs(http, config, &image).await,
        Err(e) => {
            tracing::warn!("⚠️ detect-inputs got an undecodable image, returning none: {}", e);
            Vec::new()
        }
    };

    json_ok(serde_json::json!({ "inputs": inputs }))
}

// HTTP handler: POST /pre-search
pub async fn pre_search_handler(
    http: &reqwest::Client,
    config: &AppConfig,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: PreSearchRequest = match serde_json::from_slice(body) {
        Ok(req) => req,
        Err(e) => return validation_error(&format!("invalid JSON body: {}", e)),
    };

    // No subject is not an error; it just means nothing to enrich.
    let subject = req.url.or(req.prompt).unwrap_or_default();
    let context = presearch::pre_search(http, config, &subject).await;

    json_ok(serde_json::json!({ "context": context }))
}

fn json_ok(body: serde_json::Value) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(body.to_string().into())
        .map_err(Box::new)?)
}

fn validation_error(message: &str) -> Result<Response<Body>, Error> {
    let e = ApiError::InputValidation(message.to_string());
    Ok(Response::builder()
        .status(e.status_code())
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(
            serde_json::json!({ "error": e.to_string() })
                .to_string()
                .into(),
        )
        .map_err(Box::new)?)
}
