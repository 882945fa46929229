use mirage_atoms::sessions::model::{ClickClassification, Session};
use mirage_shared::Provider;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Free-text intent or URL-shaped address-bar input.
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(default)]
    pub viewport_width: Option<u32>,
    #[serde(default)]
    pub viewport_height: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ClickRequest {
    /// Percentage coordinates (0-100) on the current image.
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    /// Present when the client already collected text for an input click.
    #[serde(default)]
    pub user_text: Option<String>,
}

/// What a click produced. A confirmed input click short-circuits the edit
/// call and asks the client to collect text first.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClickOutcome {
    Edited { session: Session },
    AwaitingText { classification: ClickClassification },
}
