use crate::gateway;
use crate::types::{EditImageRequest, GenerateImageRequest};
use lambda_http::{http::StatusCode, Body, Error, Response};
use mirage_atoms::prompts;
use mirage_shared::{ApiError, AppConfig, EncodedImage, Viewport};

// HTTP handler: POST /generate-image
pub async fn generate_image_handler(
    http: &reqwest::Client,
    config: &AppConfig,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let result = generate_image(http, config, body).await;
    image_response(result, "generate_image_handler")
}

// HTTP handler: POST /edit-image
pub async fn edit_image_handler(
    http: &reqwest::Client,
    config: &AppConfig,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let result = edit_image(http, config, body).await;
    image_response(result, "edit_image_handler")
}

async fn generate_image(
    http: &reqwest::Client,
    config: &AppConfig,
    body: &[u8],
) -> Result<EncodedImage, ApiError> {
    let req: GenerateImageRequest = serde_json::from_slice(body)
        .map_err(|e| ApiError::InputValidation(format!("invalid JSON body: {}", e)))?;

    let prompt = req
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::InputValidation("prompt".to_string()))?;
    let provider = req.provider.unwrap_or(config.default_provider);
    let viewport = Viewport::from_request(req.viewport_width, req.viewport_height);

    let full_prompt = prompts::build_generate_prompt(prompt, viewport, req.context.as_deref());
    gateway::generate(http, config, provider, &full_prompt, viewport).await
}

async fn edit_image(
    http: &reqwest::Client,
    config: &AppConfig,
    body: &[u8],
) -> Result<EncodedImage, ApiError> {
    let req: EditImageRequest = serde_json::from_slice(body)
        .map_err(|e| ApiError::InputValidation(format!("invalid JSON body: {}", e)))?;

    let current_image = req
        .current_image
        .as_deref()
        .ok_or_else(|| ApiError::InputValidation("current_image".to_string()))?;
    let edit_prompt = req
        .edit_prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::InputValidation("edit_prompt".to_string()))?;

    let provider = req.provider.unwrap_or(config.default_provider);
    let viewport = Viewport::from_request(req.viewport_width, req.viewport_height);
    let image = EncodedImage::from_payload(current_image)?;

    let framed = prompts::templates::frame_edit_prompt(edit_prompt, viewport);
    gateway::edit(http, config, provider, &image, &framed, viewport).await
}

fn image_response(
    result: Result<EncodedImage, ApiError>,
    handler: &str,
) -> Result<Response<Body>, Error> {
    match result {
        Ok(image) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(
                serde_json::json!({ "image_url": image.to_data_url() })
                    .to_string()
                    .into(),
            )
            .map_err(Box::new)?),
        Err(e) => {
            tracing::error!("❌ {} failed: {}", handler, e);
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
    }
}
