//! Click classifier: asks a vision model whether the marked click landed on a
//! button or a text input, and whether it probably navigates somewhere.
//!
//! Classification is an optimization, never a required step. Every failure
//! path -- transport, bad status, refusal, unparseable reply -- resolves to
//! the button/low fallback so the edit flow proceeds regardless. The bias is
//! deliberate: treating an input as a button still produces a visible edit,
//! while treating a button as an input silently swallows the click.

use crate::parse::strip_code_fences;
use mirage_atoms::sessions::model::{
    ClickClassification, ClickKind, Confidence, NavigationHint,
};
use mirage_shared::{ApiError, AppConfig, EncodedImage};
use serde::{Deserialize, Serialize};

const CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
const VISION_MODEL: &str = "gpt-4o";

const SYSTEM_PROMPT: &str = "You are a UI/UX expert who analyzes website screenshots to identify \
interactive elements. The user clicked the area marked by a red dot; decide whether it is a \
button or a text input field, and whether clicking it would navigate to a different page.\n\n\
IMPORTANT: Be VERY conservative. Default to \"button\" unless you are absolutely certain the \
clicked area is a text input field with visible input borders or placeholder text.\n\n\
Respond with ONLY a compact JSON object, no other text:\n\
{\"click_type\": \"button\" or \"input\", \"will_navigate\": true or false, \"target\": short name \
of the destination page or null}";

#[derive(Serialize)]
struct ChatRequest {
    model: &'static str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: MessageBody,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageBody {
    Text(&'static str),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
    detail: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Option<Vec<Choice>>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct RawClassification {
    click_type: Option<String>,
    will_navigate: Option<bool>,
    target: Option<String>,
}

/// Never fails: any degradation collapses to `ClickClassification::fallback()`.
pub async fn classify(
    http: &reqwest::Client,
    config: &AppConfig,
    image: &EncodedImage,
    x_percent: f64,
    y_percent: f64,
    original_prompt: &str,
    context: Option<&str>,
) -> ClickClassification {
    match classify_inner(http, config, image, x_percent, y_percent, original_prompt, context).await
    {
        Ok(classification) => classification,
        Err(e) => {
            tracing::warn!("⚠️ click classification degraded, defaulting to button: {}", e);
            ClickClassification::fallback()
        }
    }
}

async fn classify_inner(
    http: &reqwest::Client,
    config: &AppConfig,
    image: &EncodedImage,
    x_percent: f64,
    y_percent: f64,
    original_prompt: &str,
    context: Option<&str>,
) -> Result<ClickClassification, ApiError> {
    let api_key = config.openai_api_key.as_deref().ok_or_else(|| {
        ApiError::ProviderUnavailable("OPENAI_API_KEY is not configured".to_string())
    })?;

    let mut question = format!(
        "Analyze this website screenshot. The user clicked at position ({:.0}, {:.0}) marked by \
         a red dot.\n\nOriginal website concept: \"{}\"",
        x_percent, y_percent, original_prompt,
    );
    if let Some(context) = context {
        question.push_str(&format!("\n\nCurrent page context: {}", context));
    }

    let request = ChatRequest {
        model: VISION_MODEL,
        messages: vec![
            ChatMessage {
                role: "system",
                content: MessageBody::Text(SYSTEM_PROMPT),
            },
            ChatMessage {
                role: "user",
                content: MessageBody::Parts(vec![
                    ContentPart::Text { text: question },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image.to_data_url(),
                            detail: "low",
                        },
                    },
                ]),
            },
        ],
        max_tokens: 60,
        temperature: 0.0,
    };

    let response = http
        .post(CHAT_URL)
        .bearer_auth(api_key)
        .json(&request)
        .send()
        .await
        .map_err(|e| ApiError::from_transport(e, config.provider_timeout_secs))?;

    if !response.status().is_success() {
        return Err(ApiError::ProviderUnavailable(format!(
            "OpenAI returned {}",
            response.status()
        )));
    }

    let parsed: ChatResponse = response
        .json()
        .await
        .map_err(|e| ApiError::InvalidResponseShape(format!("OpenAI chat: {}", e)))?;

    let choice = parsed
        .choices
        .and_then(|mut c| {
            if c.is_empty() {
                None
            } else {
                Some(c.remove(0))
            }
        })
        .ok_or_else(|| ApiError::InvalidResponseShape("no choices in reply".to_string()))?;

    let content = choice
        .message
        .and_then(|m| m.content)
        .ok_or_else(|| ApiError::InvalidResponseShape("empty reply".to_string()))?;

    parse_classification(&content, choice.finish_reason.as_deref())
}

/// Parses the model reply under the conservative policy: `input` is only
/// reported from a clean, fully-finished reply; everything else is a button.
pub fn parse_classification(
    content: &str,
    finish_reason: Option<&str>,
) -> Result<ClickClassification, ApiError> {
    let cleaned = strip_code_fences(content);
    let raw: RawClassification = serde_json::from_str(cleaned)
        .map_err(|e| ApiError::InvalidResponseShape(format!("classification JSON: {}", e)))?;

    let finished = finish_reason == Some("stop");
    let confidence = if finished {
        Confidence::High
    } else {
        Confidence::Low
    };

    let kind = match raw.click_type.as_deref() {
        Some("input") if finished => ClickKind::Input,
        Some("input") | Some("button") => ClickKind::Button,
        _ => {
            return Err(ApiError::InvalidResponseShape(
                "click_type is neither button nor input".to_string(),
            ))
        }
    };

    let navigation = raw.will_navigate.map(|will_navigate| NavigationHint {
        will_navigate,
        target: raw.target.filter(|t| !t.trim().is_empty()),
    });

    Ok(ClickClassification {
        kind,
        confidence,
        navigation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_input_reply_is_accepted() {
        let c = parse_classification(
            r#"{"click_type":"input","will_navigate":false,"target":null}"#,
            Some("stop"),
        )
        .unwrap();
        assert_eq!(c.kind, ClickKind::Input);
        assert_eq!(c.confidence, Confidence::High);
    }

    #[test]
    fn truncated_input_reply_degrades_to_button() {
        // finish_reason "length" means the model was cut off; do not trust it
        let c = parse_classification(r#"{"click_type":"input"}"#, Some("length")).unwrap();
        assert_eq!(c.kind, ClickKind::Button);
        assert_eq!(c.confidence, Confidence::Low);
    }

    #[test]
    fn fenced_replies_parse() {
        let c = parse_classification(
            "```json\n{\"click_type\":\"button\",\"will_navigate\":true,\"target\":\"Cart\"}\n```",
            Some("stop"),
        )
        .unwrap();
        assert_eq!(c.kind, ClickKind::Button);
        let nav = c.navigation.unwrap();
        assert!(nav.will_navigate);
        assert_eq!(nav.target.as_deref(), Some("Cart"));
    }

    #[test]
    fn garbage_replies_are_errors_for_the_fallback_to_catch() {
        assert!(parse_classification("it looks like a button to me", Some("stop")).is_err());
        assert!(parse_classification(r#"{"click_type":"checkbox"}"#, Some("stop")).is_err());
        assert!(parse_classification("", Some("stop")).is_err());
    }

    #[test]
    fn fallback_is_always_button_low() {
        let fallback = ClickClassification::fallback();
        assert_eq!(fallback.kind, ClickKind::Button);
        assert_eq!(fallback.confidence, Confidence::Low);
        assert!(fallback.navigation.is_none());
    }
}
