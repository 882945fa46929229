use lambda_http::http::header::{HeaderValue, VARY};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, Response,
};
use mirage_atoms::sessions;
use mirage_shared::AppState;
use std::sync::Arc;

fn with_cors_headers(mut resp: Response<Body>) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_static("*"),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));
    resp
}

fn finalize_response(resp: Result<Response<Body>, Error>) -> Result<Response<Body>, Error> {
    resp.map(with_cors_headers)
}

/// Main Lambda handler - routes requests to the image, vision and session
/// endpoints.
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method().clone();
    let path = event.uri().path().to_string();
    let body = event.body();

    tracing::info!("🚀 mirage API invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if method == Method::OPTIONS {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp));
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let response = match (method.as_str(), segments.as_slice()) {
        // Image generation and editing (provider gateway)
        ("POST", ["generate-image"]) => {
            providers_block::http::generate_image_handler(&state.http_client, &state.config, body)
                .await
        }
        ("POST", ["edit-image"]) => {
            providers_block::http::edit_image_handler(&state.http_client, &state.config, body)
                .await
        }

        // Vision helpers
        ("POST", ["classify-click"]) => {
            vision_block::http::classify_click_handler(&state.http_client, &state.config, body)
                .await
        }
        ("POST", ["detect-inputs"]) => {
            vision_block::http::detect_inputs_handler(&state.http_client, &state.config, body)
                .await
        }
        ("POST", ["pre-search"]) => {
            vision_block::http::pre_search_handler(&state.http_client, &state.config, body).await
        }

        // Sessions (the browsing state machine)
        ("POST", ["sessions"]) => browsing_block::http::create_session_handler(&state, body).await,
        ("GET", ["sessions", session_id]) => {
            sessions::http::get_session_handler(
                &state.dynamo_client,
                &state.config.table_name,
                session_id,
            )
            .await
        }
        ("DELETE", ["sessions", session_id]) => {
            sessions::http::delete_session_handler(
                &state.dynamo_client,
                &state.config.table_name,
                session_id,
            )
            .await
        }
        ("POST", ["sessions", session_id, "clicks"]) => {
            browsing_block::http::click_handler(&state, session_id, body).await
        }

        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header("Content-Type", "application/json")
            .body(
                serde_json::json!({"error": "Not found"})
                    .to_string()
                    .into(),
            )
            .map_err(Box::new)?),
    };

    finalize_response(response)
}
