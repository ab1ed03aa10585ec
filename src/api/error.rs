//! API Error Types
//!
//! Failures talking to the superhero service over HTTP.

use thiserror::Error;

/// Errors from the superhero API
#[derive(Error, Debug)]
pub enum ApiError {
    /// Could not reach the server at all
    #[error("Superhero API unavailable: {0}")]
    Unavailable(String),

    /// The server took too long
    #[error("Request timeout")]
    Timeout,

    /// Server answered with a non-success status
    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body was not what we expected
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Any other transport failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl ApiError {
    /// Classify a reqwest failure
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::Unavailable(err.to_string())
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Request(err)
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiError::Status {
            status: 422,
            message: "humilityScore out of range".to_string(),
        };
        assert_eq!(err.to_string(), "API error 422: humilityScore out of range");
        assert_eq!(ApiError::Timeout.to_string(), "Request timeout");
    }
}
