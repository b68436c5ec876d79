//! Error types for the quote provider boundary.
//!
//! Every provider maps its failures onto [`FetchError`]. Callers never see a
//! raw `reqwest::Error` or a serde error past this boundary.

use thiserror::Error;

/// Errors returned by a [`QuoteProvider`](crate::provider::QuoteProvider).
///
/// Only two variants describe upstream trouble:
/// - [`Upstream`](Self::Upstream): the provider answered, but with a non-2xx
///   status or a body we could not use.
/// - [`Unreachable`](Self::Unreachable): the provider did not answer in time
///   or the connection failed.
///
/// [`InvalidRequest`](Self::InvalidRequest) is raised before any network call
/// when the caller passes unusable input (e.g. an empty symbol).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Upstream error from {provider}: {message}")]
    Upstream { provider: String, message: String },

    #[error("{provider} unreachable: {message}")]
    Unreachable { provider: String, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    pub fn upstream(provider: &str, message: impl Into<String>) -> Self {
        Self::Upstream {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    pub fn unreachable(provider: &str, message: impl Into<String>) -> Self {
        Self::Unreachable {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// Classifies a transport error raised while sending a request or reading
    /// its body.
    ///
    /// Timeouts and connection failures mean the provider never answered, so
    /// they map to `Unreachable`. Anything else (bad body, decode failure,
    /// redirect loop) is the provider's fault and maps to `Upstream`.
    pub fn from_transport(provider: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            Self::unreachable(provider, err.to_string())
        } else {
            Self::upstream(provider, err.to_string())
        }
    }

    /// Returns true if trying again later may succeed.
    ///
    /// # Examples
    ///
    /// ```
    /// use kabufolio_market_data::errors::FetchError;
    ///
    /// assert!(FetchError::unreachable("YAHOO", "timed out").is_transient());
    /// assert!(!FetchError::InvalidRequest("empty symbol".into()).is_transient());
    /// ```
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::InvalidRequest(_))
    }

    /// The provider that produced the error, if any.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::Upstream { provider, .. } | Self::Unreachable { provider, .. } => {
                Some(provider.as_str())
            }
            Self::InvalidRequest(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_is_not_transient() {
        let error = FetchError::InvalidRequest("symbol must not be empty".to_string());
        assert!(!error.is_transient());
        assert_eq!(error.provider(), None);
    }

    #[test]
    fn test_upstream_and_unreachable_are_transient() {
        assert!(FetchError::upstream("YAHOO", "HTTP 500").is_transient());
        assert!(FetchError::unreachable("YAHOO", "timed out").is_transient());
    }

    #[test]
    fn test_error_display() {
        let error = FetchError::upstream("YAHOO", "HTTP 404 Not Found");
        assert_eq!(
            format!("{}", error),
            "Upstream error from YAHOO: HTTP 404 Not Found"
        );

        let error = FetchError::unreachable("BACKEND", "connection refused");
        assert_eq!(format!("{}", error), "BACKEND unreachable: connection refused");

        let error = FetchError::InvalidRequest("empty query".to_string());
        assert_eq!(format!("{}", error), "Invalid request: empty query");
    }

    #[test]
    fn test_provider_is_reported() {
        let error = FetchError::unreachable("BACKEND", "dns failure");
        assert_eq!(error.provider(), Some("BACKEND"));
    }
}
