use mirage_shared::{ApiError, AppConfig, EncodedImage};

/// Follows a hosted-URL indirection: some backends answer with a URL to the
/// finished image instead of inline bytes, which needs one more fetch before
/// the response is in canonical form.
pub async fn fetch_hosted_image(
    http: &reqwest::Client,
    config: &AppConfig,
    url: &str,
) -> Result<EncodedImage, ApiError> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| ApiError::from_transport(e, config.provider_timeout_secs))?;

    if !response.status().is_success() {
        return Err(ApiError::ProviderUnavailable(format!(
            "image fetch returned {} for {}",
            response.status(),
            url
        )));
    }

    let mime = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .filter(|v| v.starts_with("image/"))
        .unwrap_or("image/png")
        .to_string();

    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::from_transport(e, config.provider_timeout_secs))?;
    if bytes.is_empty() {
        return Err(ApiError::NoImageReturned);
    }

    Ok(EncodedImage::new(bytes.to_vec(), mime))
}

/// Keeps provider error bodies readable in logs and error messages.
pub fn truncate_body(body: &str) -> String {
    const MAX: usize = 300;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let cut = body
            .char_indices()
            .take_while(|(i, _)| *i < MAX)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &body[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_bodies_and_bounds_long_ones() {
        assert_eq!(truncate_body("all fine"), "all fine");
        let long = "x".repeat(1000);
        let cut = truncate_body(&long);
        assert!(cut.len() < 350);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn truncate_respects_multibyte_boundaries() {
        let long = "é".repeat(400);
        let cut = truncate_body(&long);
        assert!(cut.ends_with("..."));
        // Must not split a codepoint
        assert!(cut.is_char_boundary(cut.len() - 3));
    }
}
