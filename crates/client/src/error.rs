//! Client error types

use plandesk_entitlements::EditError;
use plandesk_shared::PlanDeskError;
use serde_json::Value;

/// Error type for admin client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Catalogs have not been loaded yet")]
    CatalogNotLoaded,

    #[error("No plan selected")]
    NoPlanSelected,

    #[error("Plan not found: {0}")]
    PlanNotFound(String),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Shared(#[from] PlanDeskError),
}

impl ClientError {
    /// Build an API error from a non-2xx response, preferring the server's
    /// own message over the raw body
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| {
                json.get("message")
                    .or_else(|| json.pointer("/error/message"))
                    .or_else(|| json.get("error"))
                    .or_else(|| json.get("detail"))
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    "request failed".to_string()
                } else {
                    trimmed.chars().take(500).collect()
                }
            });
        ClientError::Api { status, message }
    }

    /// Returns true if this error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_timeout() || e.is_connect(),
            ClientError::Api { status, .. } => *status >= 500 || *status == 429,

            ClientError::Json(_)
            | ClientError::CatalogNotLoaded
            | ClientError::NoPlanSelected
            | ClientError::PlanNotFound(_)
            | ClientError::Edit(_)
            | ClientError::Shared(_) => false,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
