//! Type Conversions for LlmError
//!
//! `From` implementations for errors raised by the HTTP stack.

use super::types::LlmError;

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "failed to connect".to_string()
        } else if err.is_decode() {
            "failed to decode response body".to_string()
        } else {
            "transport error".to_string()
        };
        LlmError::Request {
            provider: "http".to_string(),
            status,
            message,
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let llm_err: LlmError = json_err.into();
        assert!(matches!(llm_err, LlmError::Json(_)));
    }
}
