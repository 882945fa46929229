//! Optional pre-generation enrichment: a Gemini call with the Google Search
//! tool decides whether it needs real-world facts about the requested site
//! and, if so, summarizes the visual details worth rendering. Iconic sites
//! answer with the `NONE` sentinel, which normalizes to no enrichment at all.

use mirage_shared::{ApiError, AppConfig};
use serde::{Deserialize, Serialize};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const SEARCH_MODEL: &str = "gemini-2.0-flash";

fn search_prompt(subject: &str) -> String {
    format!(
        "You are helping generate a realistic screenshot image of the website \"{}\".\n\n\
         Decide if you need to search the web for current, real information about this website, \
         company, or service to make the generated image more accurate and realistic.\n\n\
         Rules:\n\
         - If this is a very well-known, iconic website (Google, YouTube, Amazon, Netflix, \
         Wikipedia, Reddit, Twitter/X, Facebook, Instagram) you likely know enough. Respond with \
         exactly: NONE\n\
         - For everything else, search the web to find: what the site actually looks like, what \
         it does, its brand colors, layout style, key features, products, pricing, and any \
         distinctive design elements.\n\
         - Focus on VISUAL and CONTENT details that would help recreate the website as an image.\n\n\
         If no search is needed, respond with exactly: NONE\n\n\
         If you searched, provide a concise summary (2-4 sentences max) of the key visual and \
         content details that would help create an accurate website screenshot. Include: brand \
         colors, layout style, main content sections, navigation items, and any distinctive \
         visual elements.",
        subject,
    )
}

#[derive(Serialize)]
struct SearchRequest {
    contents: Vec<Content>,
    tools: Vec<Tool>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<TextPart>,
}

#[derive(Serialize)]
struct TextPart {
    text: String,
}

#[derive(Serialize)]
struct Tool {
    #[serde(rename = "googleSearch")]
    google_search: EmptyObject,
}

#[derive(Serialize)]
struct EmptyObject {}

#[derive(Deserialize)]
struct SearchResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Never fails: enrichment is best-effort, so every failure is just `None`.
pub async fn pre_search(
    http: &reqwest::Client,
    config: &AppConfig,
    subject: &str,
) -> Option<String> {
    if subject.trim().is_empty() {
        return None;
    }

    match pre_search_inner(http, config, subject).await {
        Ok(text) => {
            let context = normalize_context(&text);
            tracing::info!(
                "🔎 pre-search for {:?}: {}",
                subject,
                if context.is_some() { "context found" } else { "no enrichment needed" }
            );
            context
        }
        Err(e) => {
            tracing::warn!("⚠️ pre-search degraded, continuing without context: {}", e);
            None
        }
    }
}

async fn pre_search_inner(
    http: &reqwest::Client,
    config: &AppConfig,
    subject: &str,
) -> Result<String, ApiError> {
    let api_key = config.gemini_api_key.as_deref().ok_or_else(|| {
        ApiError::ProviderUnavailable("GEMINI_API_KEY is not configured".to_string())
    })?;
    let url = format!("{}/{}:generateContent?key={}", BASE_URL, SEARCH_MODEL, api_key);

    let request = SearchRequest {
        contents: vec![Content {
            role: "user",
            parts: vec![TextPart {
                text: search_prompt(subject),
            }],
        }],
        tools: vec![Tool {
            google_search: EmptyObject {},
        }],
    };

    let response = http
        .post(url)
        .json(&request)
        .send()
        .await
        .map_err(|e| ApiError::from_transport(e, config.provider_timeout_secs))?;

    if !response.status().is_success() {
        return Err(ApiError::ProviderUnavailable(format!(
            "Gemini returned {}",
            response.status()
        )));
    }

    let parsed: SearchResponse = response
        .json()
        .await
        .map_err(|e| ApiError::InvalidResponseShape(format!("Gemini pre-search: {}", e)))?;

    Ok(parsed
        .candidates
        .into_iter()
        .flatten()
        .filter_map(|c| c.content)
        .filter_map(|c| c.parts)
        .flatten()
        .filter_map(|p| p.text)
        .collect())
}

/// Normalizes the model reply: the `NONE` sentinel (any casing, with or
/// without trailing chatter) and blank replies mean "no enrichment", and must
/// never be passed through as literal context text.
pub fn normalize_context(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.to_uppercase().starts_with("NONE") {
        return None;
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_normalizes_to_none_in_any_casing() {
        assert_eq!(normalize_context("NONE"), None);
        assert_eq!(normalize_context("none"), None);
        assert_eq!(normalize_context("  None.\n"), None);
        assert_eq!(normalize_context("NONE - this site is iconic"), None);
        assert_eq!(normalize_context(""), None);
        assert_eq!(normalize_context("   "), None);
    }

    #[test]
    fn real_context_passes_through_trimmed() {
        let context = normalize_context("  Dark blue header, three-column layout. ");
        assert_eq!(
            context.as_deref(),
            Some("Dark blue header, three-column layout.")
        );
    }
}
