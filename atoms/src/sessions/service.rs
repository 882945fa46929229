use super::model::{Session, SessionState};
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use mirage_shared::{ApiError, Provider, Viewport};

const SK_META: &str = "META";

fn session_pk(session_id: &str) -> String {
    format!("SESSION#{}", session_id)
}

/// Upserts the full session record. Idempotent by `session_id`: replaying the
/// same accepted transition writes the same item.
pub async fn save_session(
    client: &DynamoClient,
    table_name: &str,
    session: &Session,
) -> Result<(), ApiError> {
    let pk = session_pk(&session.session_id);

    let click_history = serde_json::to_string(&session.click_history)
        .map_err(|e| ApiError::Storage(format!("failed to serialize click history: {}", e)))?;
    let input_fields = serde_json::to_string(&session.input_fields)
        .map_err(|e| ApiError::Storage(format!("failed to serialize input fields: {}", e)))?;

    client
        .put_item()
        .table_name(table_name)
        .item("PK", AttributeValue::S(pk))
        .item("SK", AttributeValue::S(SK_META.to_string()))
        .item("session_id", AttributeValue::S(session.session_id.clone()))
        .item(
            "initial_prompt",
            AttributeValue::S(session.initial_prompt.clone()),
        )
        .item(
            "current_image",
            AttributeValue::S(session.current_image.clone()),
        )
        .item("click_history", AttributeValue::S(click_history))
        .item("input_fields", AttributeValue::S(input_fields))
        .item(
            "session_state",
            AttributeValue::S(state_tag(session.state).to_string()),
        )
        .item(
            "provider",
            AttributeValue::S(session.provider.as_str().to_string()),
        )
        .item(
            "viewport_width",
            AttributeValue::N(session.viewport.width.to_string()),
        )
        .item(
            "viewport_height",
            AttributeValue::N(session.viewport.height.to_string()),
        )
        .item("created_at", AttributeValue::S(session.created_at.clone()))
        .item("updated_at", AttributeValue::S(session.updated_at.clone()))
        .send()
        .await
        .map_err(|e| ApiError::Storage(format!("DynamoDB put_item error: {}", e)))?;

    Ok(())
}

/// Loads a session, or `SessionNotFound` if it was reset or never created.
pub async fn get_session(
    client: &DynamoClient,
    table_name: &str,
    session_id: &str,
) -> Result<Session, ApiError> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(session_pk(session_id)))
        .key("SK", AttributeValue::S(SK_META.to_string()))
        .send()
        .await
        .map_err(|e| ApiError::Storage(format!("DynamoDB get_item error: {}", e)))?;

    let item = result
        .item()
        .ok_or_else(|| ApiError::SessionNotFound(session_id.to_string()))?;

    let get_s = |name: &str| {
        item.get(name)
            .and_then(|v| v.as_s().ok())
            .map(|s| s.to_string())
            .unwrap_or_default()
    };
    let get_n = |name: &str| {
        item.get(name)
            .and_then(|v| v.as_n().ok())
            .and_then(|n| n.parse::<u32>().ok())
    };

    let click_history = serde_json::from_str(&get_s("click_history")).unwrap_or_default();
    let input_fields = serde_json::from_str(&get_s("input_fields")).unwrap_or_default();
    let provider = get_s("provider")
        .parse::<Provider>()
        .unwrap_or(Provider::Gemini);
    let state = if get_s("session_state") == "pending" {
        SessionState::Pending
    } else {
        SessionState::Ready
    };

    Ok(Session {
        session_id: session_id.to_string(),
        initial_prompt: get_s("initial_prompt"),
        current_image: get_s("current_image"),
        click_history,
        input_fields,
        state,
        provider,
        viewport: Viewport::from_request(get_n("viewport_width"), get_n("viewport_height")),
        created_at: get_s("created_at"),
        updated_at: get_s("updated_at"),
    })
}

/// Atomically moves a `Ready` session to `Pending`. A click that arrives
/// while another operation is in flight fails the condition and is rejected
/// as `EditInFlight` -- it is ignored, never queued, because its coordinates
/// refer to an image that is about to be replaced.
pub async fn claim_pending(
    client: &DynamoClient,
    table_name: &str,
    session_id: &str,
) -> Result<(), ApiError> {
    client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(session_pk(session_id)))
        .key("SK", AttributeValue::S(SK_META.to_string()))
        .condition_expression("session_state = :ready")
        .update_expression("SET session_state = :pending, updated_at = :now")
        .expression_attribute_values(":ready", AttributeValue::S("ready".to_string()))
        .expression_attribute_values(":pending", AttributeValue::S("pending".to_string()))
        .expression_attribute_values(
            ":now",
            AttributeValue::S(chrono::Utc::now().to_rfc3339()),
        )
        .send()
        .await
        .map_err(|e| {
            let service_error = e.into_service_error();
            if service_error.is_conditional_check_failed_exception() {
                ApiError::EditInFlight(session_id.to_string())
            } else {
                ApiError::Storage(format!("DynamoDB update_item error: {}", service_error))
            }
        })?;

    Ok(())
}

/// Returns a `Pending` session to `Ready` without touching anything else.
/// Used on the failure path, so the session is left exactly as it was before
/// the click.
pub async fn release_pending(
    client: &DynamoClient,
    table_name: &str,
    session_id: &str,
) -> Result<(), ApiError> {
    client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(session_pk(session_id)))
        .key("SK", AttributeValue::S(SK_META.to_string()))
        .update_expression("SET session_state = :ready")
        .expression_attribute_values(":ready", AttributeValue::S("ready".to_string()))
        .send()
        .await
        .map_err(|e| ApiError::Storage(format!("DynamoDB update_item error: {}", e)))?;

    Ok(())
}

/// Destroys a session (explicit reset). Deleting an absent session is fine.
pub async fn delete_session(
    client: &DynamoClient,
    table_name: &str,
    session_id: &str,
) -> Result<(), ApiError> {
    client
        .delete_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S(session_pk(session_id)))
        .key("SK", AttributeValue::S(SK_META.to_string()))
        .send()
        .await
        .map_err(|e| ApiError::Storage(format!("DynamoDB delete_item error: {}", e)))?;

    Ok(())
}

fn state_tag(state: SessionState) -> &'static str {
    match state {
        SessionState::Ready => "ready",
        SessionState::Pending => "pending",
    }
}
