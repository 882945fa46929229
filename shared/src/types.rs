use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ========== PROVIDER ==========

/// One of the interchangeable hosted image backends.
///
/// The provider is an explicit field threaded through every request, never a
/// mutable global; callers that omit it fall back to `AppConfig::default_provider`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Openai,
    Gemini,
    Flux,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Openai => "openai",
            Provider::Gemini => "gemini",
            Provider::Flux => "flux",
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::Openai),
            "gemini" => Ok(Provider::Gemini),
            "flux" => Ok(Provider::Flux),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ========== VIEWPORT ==========

/// The pixel dimensions the client renders the generated page at.
///
/// Providers map this onto their own supported size/aspect enumerations; the
/// prompt templates embed the literal dimensions so the model fills the frame
/// edge to edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Builds a viewport from optional request fields, falling back to the
    /// default for whichever dimension is missing or zero.
    pub fn from_request(width: Option<u32>, height: Option<u32>) -> Self {
        let default = Viewport::default();
        Viewport {
            width: width.filter(|w| *w > 0).unwrap_or(default.width),
            height: height.filter(|h| *h > 0).unwrap_or(default.height),
        }
    }

    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height.max(1))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            width: 1024,
            height: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_round_trips_through_str() {
        for p in [Provider::Openai, Provider::Gemini, Provider::Flux] {
            assert_eq!(p.as_str().parse::<Provider>().unwrap(), p);
        }
        assert!("stable-diffusion".parse::<Provider>().is_err());
    }

    #[test]
    fn viewport_from_request_fills_missing_dimensions() {
        let v = Viewport::from_request(Some(1920), None);
        assert_eq!(v.width, 1920);
        assert_eq!(v.height, Viewport::default().height);

        // Zero is not a usable dimension
        let v = Viewport::from_request(Some(0), Some(720));
        assert_eq!(v.width, Viewport::default().width);
        assert_eq!(v.height, 720);
    }
}
