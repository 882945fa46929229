use lambda_http::http::StatusCode;

/// Error taxonomy for the whole API.
///
/// Generation/edit failures are fatal to the current operation and surfaced to
/// the caller; the session is left in its last good state. Classifier and
/// detector failures never reach this type — those flows degrade to safe
/// defaults inside the vision block.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing required field: {0}")]
    InputValidation(String),

    #[error("invalid image payload: {0}")]
    InvalidImage(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("an operation is already in flight for session {0}")]
    EditInFlight(String),

    #[error("image provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("provider returned no image")]
    NoImageReturned,

    #[error("unexpected provider response: {0}")]
    InvalidResponseShape(String),

    #[error("generation timed out after {0}s")]
    GenerationTimeout(u64),

    #[error("storage error: {0}")]
    Storage(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InputValidation(_) | ApiError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::EditInFlight(_) => StatusCode::CONFLICT,
            ApiError::ProviderUnavailable(_)
            | ApiError::NoImageReturned
            | ApiError::InvalidResponseShape(_) => StatusCode::BAD_GATEWAY,
            ApiError::GenerationTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps a transport failure from the shared HTTP client. Timeouts get
    /// their own variant so the caller can tell "slow model" from "dead
    /// provider", even though both message the same way to the user.
    pub fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ApiError::GenerationTimeout(timeout_secs)
        } else {
            ApiError::ProviderUnavailable(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_and_unavailable_share_gateway_class_statuses() {
        assert_eq!(
            ApiError::GenerationTimeout(120).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::ProviderUnavailable("down".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::EditInFlight("abc".into()).status_code(),
            StatusCode::CONFLICT
        );
    }
}
