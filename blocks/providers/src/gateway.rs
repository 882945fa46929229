//! The dispatch seam: one `{generate, edit}` capability pair, three
//! interchangeable backends. Callers never see a provider-specific response
//! shape -- every adapter normalizes to `EncodedImage` before returning.

use crate::{flux, gemini, openai};
use mirage_shared::{ApiError, AppConfig, EncodedImage, Provider, Viewport};

pub async fn generate(
    http: &reqwest::Client,
    config: &AppConfig,
    provider: Provider,
    prompt: &str,
    viewport: Viewport,
) -> Result<EncodedImage, ApiError> {
    tracing::info!(
        "🎨 generate: provider={}, viewport={}x{}, prompt_len={}",
        provider,
        viewport.width,
        viewport.height,
        prompt.len()
    );

    match provider {
        Provider::Openai => openai::generate(http, config, prompt, viewport).await,
        Provider::Gemini => gemini::generate(http, config, prompt).await,
        Provider::Flux => flux::generate(http, config, prompt, viewport).await,
    }
}

pub async fn edit(
    http: &reqwest::Client,
    config: &AppConfig,
    provider: Provider,
    image: &EncodedImage,
    prompt: &str,
    viewport: Viewport,
) -> Result<EncodedImage, ApiError> {
    tracing::info!(
        "✏️ edit: provider={}, viewport={}x{}, image_bytes={}",
        provider,
        viewport.width,
        viewport.height,
        image.bytes.len()
    );

    match provider {
        Provider::Openai => openai::edit(http, config, image, prompt, viewport).await,
        Provider::Gemini => gemini::edit(http, config, image, prompt).await,
        Provider::Flux => flux::edit(http, config, image, prompt, viewport).await,
    }
}
