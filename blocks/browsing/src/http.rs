use crate::service;
use crate::types::{ClickRequest, CreateSessionRequest};
use lambda_http::{http::StatusCode, Body, Error, Response};
use mirage_shared::{ApiError, AppState};

// HTTP handler: POST /sessions -- initialize (Empty -> Ready)
pub async fn create_session_handler(
    state: &AppState,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: CreateSessionRequest = match serde_json::from_slice(body) {
        Ok(req) => req,
        Err(e) => {
            return error_response(&ApiError::InputValidation(format!(
                "invalid JSON body: {}",
                e
            )))
        }
    };

    match service::create_session(state, req).await {
        Ok(session) => Ok(Response::builder()
            .status(StatusCode::CREATED)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&session)?.into())
            .map_err(Box::new)?),
        Err(e) => {
            tracing::error!("❌ create_session_handler failed: {}", e);
            error_response(&e)
        }
    }
}

// HTTP handler: POST /sessions/{session_id}/clicks -- apply-click-edit
pub async fn click_handler(
    state: &AppState,
    session_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let req: ClickRequest = match serde_json::from_slice(body) {
        Ok(req) => req,
        Err(e) => {
            return error_response(&ApiError::InputValidation(format!(
                "invalid JSON body: {}",
                e
            )))
        }
    };

    match service::apply_click(state, session_id, req).await {
        Ok(outcome) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&outcome)?.into())
            .map_err(Box::new)?),
        Err(e) => {
            tracing::error!(
                "❌ click_handler failed: session_id={}, error={}",
                session_id,
                e
            );
            error_response(&e)
        }
    }
}

fn error_response(e: &ApiError) -> Result<Response<Body>, Error> {
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
