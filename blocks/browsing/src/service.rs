//! The click-to-edit interaction loop: the one place that composes the
//! marker, prompt templates, classifier, detector, provider gateway and
//! session store into the two state-machine transitions (initialize and
//! apply-click-edit).

use crate::types::{ClickOutcome, ClickRequest, CreateSessionRequest};
use mirage_atoms::marker;
use mirage_atoms::prompts::{self, EditPromptArgs};
use mirage_atoms::sessions::model::{
    ClickClassification, ClickEvent, ClickKind, Confidence, Session,
};
use mirage_atoms::sessions::service as sessions;
use mirage_shared::{ApiError, AppState, EncodedImage, Viewport};
use providers_block::gateway;
use vision_block::{classify, detect, presearch};

/// Empty -> Ready: first generation. Nothing is persisted until the provider
/// call succeeds, so a failure leaves the machine in Empty.
pub async fn create_session(
    state: &AppState,
    req: CreateSessionRequest,
) -> Result<Session, ApiError> {
    let address = req
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::InputValidation("prompt".to_string()))?;

    let provider = req.provider.unwrap_or(state.config.default_provider);
    let viewport = Viewport::from_request(req.viewport_width, req.viewport_height);
    let intent = prompts::prompt_for_address(address);

    // Best-effort enrichment; None means "render from general knowledge"
    let context = presearch::pre_search(&state.http_client, &state.config, address).await;

    let full_prompt = prompts::build_generate_prompt(&intent, viewport, context.as_deref());
    let image = gateway::generate(
        &state.http_client,
        &state.config,
        provider,
        &full_prompt,
        viewport,
    )
    .await?;

    let input_fields = detect::detect_inputs(&state.http_client, &state.config, &image).await;

    let session = Session::create(intent, image.to_data_url(), input_fields, provider, viewport);
    sessions::save_session(&state.dynamo_client, &state.config.table_name, &session).await?;

    tracing::info!(
        "✅ session created: session_id={}, provider={}, inputs={}",
        session.session_id,
        provider,
        session.input_fields.len()
    );
    Ok(session)
}

/// Ready -> Pending -> Ready: one click. The pending claim is atomic, so a
/// second click while an operation is in flight is rejected (not queued) and
/// touches nothing. On any failure the claim is released and the session
/// keeps its last good state.
pub async fn apply_click(
    state: &AppState,
    session_id: &str,
    req: ClickRequest,
) -> Result<ClickOutcome, ApiError> {
    let x = req
        .x
        .ok_or_else(|| ApiError::InputValidation("x".to_string()))?;
    let y = req
        .y
        .ok_or_else(|| ApiError::InputValidation("y".to_string()))?;
    if !(0.0..=100.0).contains(&x) || !(0.0..=100.0).contains(&y) {
        return Err(ApiError::InputValidation(
            "click coordinates must be percentages in 0-100".to_string(),
        ));
    }

    let session = sessions::get_session(&state.dynamo_client, &state.config.table_name, session_id)
        .await?;
    sessions::claim_pending(&state.dynamo_client, &state.config.table_name, session_id).await?;

    match run_click_edit(state, session, x, y, req.user_text).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            // The session itself was never mutated; just give the claim back.
            if let Err(release_err) =
                sessions::release_pending(&state.dynamo_client, &state.config.table_name, session_id)
                    .await
            {
                tracing::error!(
                    "failed to release pending claim for session {}: {}",
                    session_id,
                    release_err
                );
            }
            Err(e)
        }
    }
}

async fn run_click_edit(
    state: &AppState,
    mut session: Session,
    x: f64,
    y: f64,
    user_text: Option<String>,
) -> Result<ClickOutcome, ApiError> {
    let current = EncodedImage::from_payload(&session.current_image)?;
    let user_text = user_text.filter(|t| !t.trim().is_empty());

    // Burn typed text into the clicked input region before the marker, so the
    // submitted image shows the field as filled in.
    let base = match (&user_text, session.find_input_at(x, y)) {
        (Some(text), Some(region)) => marker::overlay_input_text(&current, region, text)?,
        _ => current,
    };

    // The annotator runs before any remote call: the exact submitted image is
    // captured up front and survives into the event even if a later step dies.
    let annotated = marker::annotate(&base, x, y)?;

    let classification = classify::classify(
        &state.http_client,
        &state.config,
        &annotated,
        x,
        y,
        &session.initial_prompt,
        None,
    )
    .await;

    // A confirmed input click with no text yet short-circuits the edit: the
    // client collects text and resubmits. The claim is released untouched.
    if classification.kind == ClickKind::Input
        && classification.confidence == Confidence::High
        && user_text.is_none()
    {
        tracing::info!(
            "⌨️ input click on session {}, awaiting text",
            session.session_id
        );
        sessions::release_pending(
            &state.dynamo_client,
            &state.config.table_name,
            &session.session_id,
        )
        .await?;
        return Ok(ClickOutcome::AwaitingText { classification });
    }

    let click_analysis = navigation_analysis(&classification);
    let edit_prompt = prompts::build_edit_prompt(EditPromptArgs {
        initial_prompt: &session.initial_prompt,
        viewport: session.viewport,
        user_text: user_text.as_deref(),
        click_analysis: click_analysis.as_deref(),
    });

    let edited = gateway::edit(
        &state.http_client,
        &state.config,
        session.provider,
        &annotated,
        &edit_prompt,
        session.viewport,
    )
    .await?;

    // Detection always runs against the freshest image, never the old one.
    let input_fields = detect::detect_inputs(&state.http_client, &state.config, &edited).await;

    let click = ClickEvent {
        x,
        y,
        timestamp: chrono::Utc::now().to_rfc3339(),
        description: format!("User clicked at position ({:.0}, {:.0})", x, y),
        image_with_dot: annotated.to_data_url(),
        classification: Some(classification),
        user_text,
    };
    session.apply_click_edit(click, edited.to_data_url(), input_fields);
    sessions::save_session(&state.dynamo_client, &state.config.table_name, &session).await?;

    tracing::info!(
        "✅ click-edit applied: session_id={}, clicks={}",
        session.session_id,
        session.click_history.len()
    );
    Ok(ClickOutcome::Edited { session })
}

/// Turns a navigation hint into auxiliary prompt grounding.
fn navigation_analysis(classification: &ClickClassification) -> Option<String> {
    let nav = classification.navigation.as_ref()?;
    if !nav.will_navigate {
        return None;
    }
    Some(match &nav.target {
        Some(target) => format!(
            "The clicked element most likely navigates to \"{}\". Show that page.",
            target
        ),
        None => "The clicked element most likely navigates to a different page.".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirage_atoms::sessions::model::NavigationHint;

    fn classification(nav: Option<NavigationHint>) -> ClickClassification {
        ClickClassification {
            kind: ClickKind::Button,
            confidence: Confidence::High,
            navigation: nav,
        }
    }

    #[test]
    fn navigation_hint_becomes_prompt_grounding() {
        let c = classification(Some(NavigationHint {
            will_navigate: true,
            target: Some("Checkout".to_string()),
        }));
        let analysis = navigation_analysis(&c).unwrap();
        assert!(analysis.contains("\"Checkout\""));
    }

    #[test]
    fn non_navigating_clicks_add_no_grounding() {
        assert!(navigation_analysis(&classification(None)).is_none());
        let c = classification(Some(NavigationHint {
            will_navigate: false,
            target: Some("Cart".to_string()),
        }));
        assert!(navigation_analysis(&c).is_none());
    }
}
