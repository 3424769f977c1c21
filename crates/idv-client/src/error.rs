//! Classified errors for verification API calls.
//!
//! Every error carries the endpoint label it occurred at. Callers
//! classify, they do not parse: the helpers below answer the questions
//! the orchestrator actually asks (is this the user's session expiring?
//! is the resource gone? is the service down?).

use thiserror::Error;

use crate::config::ConfigError;

/// Error from a verification API call.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("http error calling {endpoint}: {source}")]
    Http {
        /// Endpoint label, e.g. `GET /identifications/{id}`.
        endpoint: String,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("api error at {endpoint}: status {status}: {body}")]
    Api {
        /// Endpoint label.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Raw response body (may be empty).
        body: String,
    },

    /// The response body did not match the expected schema.
    #[error("malformed response from {endpoint}: {source}")]
    Deserialization {
        /// Endpoint label.
        endpoint: String,
        /// Underlying reqwest decode error.
        #[source]
        source: reqwest::Error,
    },

    /// The client could not be constructed from its configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ApiError {
    /// The session is no longer authorized (HTTP 401/403).
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status == 401 || *status == 403)
    }

    /// The requested resource does not exist (HTTP 404).
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status == 404)
    }

    /// The service itself failed (HTTP 5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Api { status, .. } if (500..600).contains(status))
    }

    /// Whether presenting a retry prompt is reasonable: transport errors
    /// and server-side failures are worth retrying, everything else is
    /// not going to improve.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http { .. }) || self.is_server_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> ApiError {
        ApiError::Api {
            endpoint: "GET /identifications/x".into(),
            status,
            body: String::new(),
        }
    }

    #[test]
    fn status_classification() {
        assert!(api(401).is_unauthorized());
        assert!(api(403).is_unauthorized());
        assert!(api(404).is_not_found());
        assert!(api(500).is_server_error());
        assert!(api(503).is_server_error());
        assert!(!api(404).is_server_error());
        assert!(!api(200).is_unauthorized());
    }

    #[test]
    fn retryability() {
        assert!(api(502).is_retryable());
        assert!(!api(401).is_retryable());
        assert!(!api(404).is_retryable());
    }

    #[test]
    fn display_carries_endpoint_and_status() {
        let rendered = api(503).to_string();
        assert!(rendered.contains("GET /identifications/x"));
        assert!(rendered.contains("503"));
    }
}
