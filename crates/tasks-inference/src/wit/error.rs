//! wit.ai-specific error handling.

use tasks_core::Error;

/// wit.ai error codes derived from HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WitErrorCode {
    /// Missing or invalid access token.
    AuthenticationError,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Malformed request (bad version, empty query).
    BadRequest,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl WitErrorCode {
    /// Determine error code from HTTP status and wit.ai error code.
    pub fn from_response(status: u16, code: Option<&str>) -> Self {
        match (status, code) {
            (401 | 403, _) | (_, Some("no-auth")) => Self::AuthenticationError,
            (429, _) | (_, Some("rate-limit")) => Self::RateLimitExceeded,
            (400, _) => Self::BadRequest,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Whether a caller with a retry policy could try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimitExceeded | Self::ServerError)
    }
}

/// Convert a wit.ai error to a tasks Error.
pub fn to_tasks_error(code: WitErrorCode, message: &str) -> Error {
    match code {
        WitErrorCode::AuthenticationError => {
            Error::Config(format!("Authentication failed: {}", message))
        }
        WitErrorCode::RateLimitExceeded => {
            Error::Inference(format!("Rate limit exceeded: {}", message))
        }
        WitErrorCode::BadRequest => Error::Inference(format!("Bad request: {}", message)),
        WitErrorCode::ServerError => Error::Inference(format!("Server error: {}", message)),
        WitErrorCode::Unknown => Error::Inference(message.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_from_401() {
        assert_eq!(
            WitErrorCode::from_response(401, None),
            WitErrorCode::AuthenticationError
        );
    }

    #[test]
    fn test_error_code_from_no_auth_code() {
        assert_eq!(
            WitErrorCode::from_response(400, Some("no-auth")),
            WitErrorCode::AuthenticationError
        );
    }

    #[test]
    fn test_error_code_from_429() {
        assert_eq!(
            WitErrorCode::from_response(429, Some("rate-limit")),
            WitErrorCode::RateLimitExceeded
        );
    }

    #[test]
    fn test_error_code_from_400() {
        assert_eq!(
            WitErrorCode::from_response(400, Some("invalid-version")),
            WitErrorCode::BadRequest
        );
    }

    #[test]
    fn test_error_code_from_502() {
        assert_eq!(
            WitErrorCode::from_response(502, None),
            WitErrorCode::ServerError
        );
    }

    #[test]
    fn test_error_code_from_unknown() {
        assert_eq!(WitErrorCode::from_response(418, None), WitErrorCode::Unknown);
    }

    #[test]
    fn test_retryable() {
        assert!(WitErrorCode::RateLimitExceeded.is_retryable());
        assert!(WitErrorCode::ServerError.is_retryable());
        assert!(!WitErrorCode::AuthenticationError.is_retryable());
        assert!(!WitErrorCode::BadRequest.is_retryable());
    }

    #[test]
    fn test_to_tasks_error_auth_is_config() {
        let err = to_tasks_error(WitErrorCode::AuthenticationError, "Bad auth");
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("Authentication failed"));
    }

    #[test]
    fn test_to_tasks_error_server() {
        let err = to_tasks_error(WitErrorCode::ServerError, "oops");
        assert_eq!(err.to_string(), "Inference error: Server error: oops");
    }
}
