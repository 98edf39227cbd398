/*!
 * Error types for the video2srt translation core.
 *
 * Provider calls fail with a `TranslationError`; the orchestrator inspects its
 * kind to decide between retrying, falling back to the next provider, or
 * giving up. Only `ManagerError` ever reaches the caller of
 * `TranslatorManager::translate_with_retry`.
 */

use thiserror::Error;

/// Errors that can occur while a single provider translates text
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// Transient transport failure (connection, timeout, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// The remote service rejected the request, answered with an error status,
    /// or returned a payload that is not a translation
    #[error("API responded with error: {}{message}", status_prefix(.status_code))]
    Api {
        /// HTTP status code, when one was received
        status_code: Option<u16>,
        /// Error message from the API
        message: String,
    },

    /// A structured block answer could not be interpreted (bad JSON, missing ids)
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Missing credentials or otherwise unusable provider configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// No provider is known under this name
    #[error("Unsupported translator: {0}")]
    UnsupportedTranslator(String),

    /// The provider does not implement an optional capability
    #[error("{provider} does not support {operation}")]
    Unsupported {
        /// Provider name
        provider: String,
        /// Capability that was requested
        operation: String,
    },

    /// A timed segment violates its invariants
    #[error("Invalid segment: {0}")]
    InvalidSegment(String),
}

fn status_prefix(status_code: &Option<u16>) -> String {
    match status_code {
        Some(code) => format!("{} - ", code),
        None => String::new(),
    }
}

impl TranslationError {
    /// Whether retrying the same provider may succeed.
    ///
    /// Network and API failures are transient; everything else is a property
    /// of the provider or its input and goes straight to fallback.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Api { .. })
    }

    /// Create an API error without a status code
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            status_code: None,
            message: message.into(),
        }
    }

    /// Create a retryable API error for a response body that is not a translation
    pub fn unusable_payload(detail: impl std::fmt::Display) -> Self {
        Self::api(format!("unusable response payload: {}", detail))
    }

    /// Create an `Unsupported` error for a provider capability
    pub fn unsupported(provider: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Unsupported {
            provider: provider.into(),
            operation: operation.into(),
        }
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() || error.is_request() {
            Self::Network(error.to_string())
        } else if let Some(status) = error.status() {
            Self::Api {
                status_code: Some(status.as_u16()),
                message: error.to_string(),
            }
        } else if error.is_decode() {
            Self::unusable_payload(error)
        } else {
            Self::Network(error.to_string())
        }
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        Self::MalformedResponse(error.to_string())
    }
}

/// Errors returned by the translator manager to its caller
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ManagerError {
    /// Every candidate was unhealthy, rate limited, or misconfigured
    #[error("No eligible translator available")]
    NoEligibleTranslator,

    /// Every eligible translator was tried and failed
    #[error("All translators failed, last error: {last_error}")]
    AllTranslatorsFailed {
        /// The error raised by the last translator attempted
        #[source]
        last_error: TranslationError,
    },
}
