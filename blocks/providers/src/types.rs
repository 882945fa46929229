use mirage_shared::Provider;
use serde::Deserialize;

// ========== GENERATE ==========
#[derive(Debug, Deserialize)]
pub struct GenerateImageRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub provider: Option<Provider>,
    /// Optional pre-fetched factual context; appended to the prompt as
    /// grounding when present.
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub viewport_width: Option<u32>,
    #[serde(default)]
    pub viewport_height: Option<u32>,
}

// ========== EDIT ==========
#[derive(Debug, Deserialize)]
pub struct EditImageRequest {
    /// Data URL or bare base64.
    #[serde(default)]
    pub current_image: Option<String>,
    #[serde(default)]
    pub edit_prompt: Option<String>,
    #[serde(default)]
    pub provider: Option<Provider>,
    #[serde(default)]
    pub viewport_width: Option<u32>,
    #[serde(default)]
    pub viewport_height: Option<u32>,
}
