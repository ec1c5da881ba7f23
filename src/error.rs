//! Error types for the MoneyLingo orchestrator

use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestrationError>;

#[derive(Error, Debug)]
pub enum OrchestrationError {

    // =============================
    // Core Pipeline Errors
    // =============================

    /// A provider is missing credentials or settings. Adapters turn this
    /// into a degraded result instead of failing the request.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{provider} error: {message}")]
    ExternalService {
        provider: &'static str,
        message: String,
    },

    #[error("Quota exceeded for {capability}")]
    QuotaExceeded { capability: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Parse error: {0}")]
    Parse(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl OrchestrationError {
    pub fn external(provider: &'static str, message: impl Into<String>) -> Self {
        Self::ExternalService {
            provider,
            message: message.into(),
        }
    }

    /// Stable machine-readable kind, used in response error markers
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::ExternalService { .. } | Self::HttpError(_) => "external_service",
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Parse(_) | Self::SerializationError(_) => "parse",
            Self::IoError(_) => "io",
        }
    }

    /// Message that is safe to show an end user. Provider payloads and
    /// transport details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(_) => {
                "This capability is not configured on the server right now.".to_string()
            }
            Self::ExternalService { provider, .. } => format!(
                "The {} service is unavailable at the moment. Please try again shortly.",
                provider
            ),
            Self::HttpError(_) => {
                "An upstream service could not be reached. Please try again shortly.".to_string()
            }
            Self::QuotaExceeded { capability } => format!(
                "You have used all {} requests included in your plan this period.",
                capability
            ),
            Self::InvalidRequest(msg) => msg.clone(),
            Self::Parse(_) | Self::SerializationError(_) => {
                "The service returned a response we could not read.".to_string()
            }
            Self::IoError(_) => "An internal storage error occurred.".to_string(),
        }
    }
}
