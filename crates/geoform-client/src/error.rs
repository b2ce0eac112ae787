//! Geo service client error types.

/// Errors from geo service calls.
///
/// The gateway never recovers from any of these — transport and
/// application failures alike surface to the caller unchanged, and a
/// failed lookup is never written to the cache.
#[derive(Debug, thiserror::Error)]
pub enum GeoApiError {
    /// HTTP transport error (connection failure, timeout).
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        /// The endpoint path that was being called.
        endpoint: String,
        /// The underlying transport error.
        source: reqwest::Error,
    },
    /// The geo service returned a non-2xx status.
    #[error("geo service {endpoint} returned {status}: {body}")]
    Status {
        /// The endpoint path that was being called.
        endpoint: String,
        /// HTTP status code.
        status: u16,
        /// Response body excerpt for diagnostics.
        body: String,
    },
    /// A 2xx response whose envelope reported `success: false`.
    #[error("geo service {endpoint} reported failure ({status_code}): {message}")]
    Api {
        /// The endpoint path that was being called.
        endpoint: String,
        /// Service-level status code from the envelope.
        status_code: u16,
        /// Failure message from the envelope.
        message: String,
    },
    /// Response body could not be deserialized.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        /// The endpoint path that was being called.
        endpoint: String,
        /// The underlying decode error.
        source: reqwest::Error,
    },
    /// A successful envelope carried no usable payload (e.g. a dial-code
    /// lookup with zero results).
    #[error("geo service {endpoint} returned an empty payload")]
    EmptyPayload {
        /// The endpoint path that was being called.
        endpoint: String,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),
}
