use chrono::{DateTime, Utc};
use thiserror::Error;

/// Main error type for query encoding, tenant tokens and REST operations
#[derive(Debug, Error)]
pub enum SearchError {
    /// A scalar value cannot be written in its canonical query form
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Textual input does not match the expected scalar or query grammar
    #[error("parse error: {0}")]
    Parse(String),

    /// A token claim failed its own semantic rule
    #[error("claim verification failed for {claim}: {message}")]
    ClaimVerification { claim: String, message: String },

    /// The requested token expiry has already elapsed
    #[error("token expiry {expires_at} is not in the future")]
    ExpiredToken { expires_at: DateTime<Utc> },

    /// The signer could not produce or check a signature
    #[error("signing error: {0}")]
    Signing(String),

    /// Error body returned by the search service
    #[error("search API error ({code}): {message}")]
    Api {
        message: String,
        code: String,
        error_type: String,
        link: Option<String>,
        status: u16,
    },

    /// HTTP transport error with an undecodable body
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    /// Request building error
    #[error("failed to build request: {0}")]
    RequestBuild(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl SearchError {
    /// Create a claim verification failure
    pub fn claim(claim: impl Into<String>, message: impl Into<String>) -> Self {
        SearchError::ClaimVerification {
            claim: claim.into(),
            message: message.into(),
        }
    }

    /// Check if this error is a claim verification failure
    pub fn is_claim_failure(&self) -> bool {
        matches!(self, SearchError::ClaimVerification { .. })
    }

    /// Check if this error reports an already elapsed expiry
    pub fn is_expired_token(&self) -> bool {
        matches!(self, SearchError::ExpiredToken { .. })
    }

    /// Check if this error is a not found error (404)
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    /// Get the HTTP status code if this error came from the service
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SearchError::Api { status, .. } => Some(*status),
            SearchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for searchkit operations
pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_error_message() {
        let error = SearchError::claim("apiKeyPrefix", "invalid key sent");
        assert!(error.is_claim_failure());
        assert_eq!(
            error.to_string(),
            "claim verification failed for apiKeyPrefix: invalid key sent"
        );
    }

    #[test]
    fn test_error_not_found() {
        let error = SearchError::Api {
            message: "Index `movies` not found.".to_string(),
            code: "index_not_found".to_string(),
            error_type: "invalid_request".to_string(),
            link: None,
            status: 404,
        };

        assert!(error.is_not_found());
        assert_eq!(error.status_code(), Some(404));
    }

    #[test]
    fn test_core_errors_have_no_status() {
        assert_eq!(SearchError::Parse("bad".to_string()).status_code(), None);
        assert!(!SearchError::Signing("bad".to_string()).is_expired_token());
    }
}
