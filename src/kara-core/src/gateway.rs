use serde_json::Value;
use thiserror::Error;

/// Failure categories of a single gateway request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The request did not complete (connection refused, timeout, ...).
    #[error("network failure: {message}")]
    Network { message: String },
    /// The server answered with a non-2xx status.
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
    /// The server answered 2xx but the body could not be decoded.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Authenticated request capability consumed by the client engine.
///
/// `url` is either a path relative to the configured server base URL
/// (`playlist/`) or an absolute URL handed out by the server as a page cursor.
/// Implementations own authentication and the anti-forgery header; the engine
/// never sees either.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    async fn get(&self, url: &str) -> GatewayResult<Value>;

    async fn post(&self, url: &str, body: Value) -> GatewayResult<Value>;

    async fn put(&self, url: &str, body: Value) -> GatewayResult<Value>;

    async fn delete(&self, url: &str) -> GatewayResult<()>;
}

/// Decode a gateway payload into a model type.
pub fn decode<T: serde::de::DeserializeOwned>(value: Value) -> GatewayResult<T> {
    serde_json::from_value(value).map_err(|e| GatewayError::InvalidResponse {
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LibraryPage;
    use serde_json::json;

    #[test]
    fn decode_reports_invalid_payloads() {
        let err = decode::<LibraryPage>(json!({"count": "many"})).expect_err("bad payload");
        assert!(matches!(err, GatewayError::InvalidResponse { .. }));
    }

    #[test]
    fn server_error_display_includes_status() {
        let err = GatewayError::Server {
            status: 503,
            message: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "server error 503: unavailable");
    }
}
