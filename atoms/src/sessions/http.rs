use super::service;
use aws_sdk_dynamodb::Client as DynamoClient;
use lambda_http::{http::StatusCode, Body, Error, Response};

// HTTP handler: GET /sessions/{session_id}
pub async fn get_session_handler(
    client: &DynamoClient,
    table_name: &str,
    session_id: &str,
) -> Result<Response<Body>, Error> {
    match service::get_session(client, table_name, session_id).await {
        Ok(session) => Ok(Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/json")
            .header("Access-Control-Allow-Origin", "*")
            .body(serde_json::to_string(&session)?.into())
            .map_err(Box::new)?),
        Err(e) => {
            tracing::error!(
                "get_session_handler failed: session_id={}, error={}",
                session_id,
                e
            );
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

// HTTP handler: DELETE /sessions/{session_id} -- explicit reset back to Empty
pub async fn delete_session_handler(
    client: &DynamoClient,
    table_name: &str,
    session_id: &str,
) -> Result<Response<Body>, Error> {
    match service::delete_session(client, table_name, session_id).await {
        Ok(()) => {
            tracing::info!("🗑️ session discarded: session_id={}", session_id);
            Ok(Response::builder()
                .status(StatusCode::NO_CONTENT)
                .header("Access-Control-Allow-Origin", "*")
                .body(Body::Empty)
                .map_err(Box::new)?)
        }
        Err(e) => {
            tracing::error!(
                "delete_session_handler failed: session_id={}, error={}",
                session_id,
                e
            );
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
