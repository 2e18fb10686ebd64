//! HTTP client error types

use cozeats_core::CoreError;
use miette::Diagnostic;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ApiError {
    /// The request never produced a response
    #[error("{fallback}")]
    #[diagnostic(
        code(cozeats_api::transport),
        help("Check your network connection and the configured API URL")
    )]
    Transport {
        fallback: &'static str,
        #[source]
        cause: reqwest::Error,
    },

    /// Non-2xx response
    #[error("{detail}")]
    #[diagnostic(code(cozeats_api::status))]
    Status { status: u16, detail: String },

    /// 2xx response whose body was not what the endpoint promises
    #[error("{fallback}")]
    #[diagnostic(
        code(cozeats_api::decode),
        help("The server response did not match the expected format")
    )]
    Decode {
        fallback: &'static str,
        #[source]
        cause: reqwest::Error,
    },

    #[error("Invalid API client configuration")]
    #[diagnostic(code(cozeats_api::client_build))]
    ClientBuild(#[source] reqwest::Error),
}

/// Error body returned by the backend, `{"detail": ...}`
///
/// `detail` is usually a string; request validation failures carry a list of
/// `{loc, msg, type}` entries instead.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// The message to show, if the body carries one
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Array(items) => items
                .iter()
                .find_map(|item| item.get("msg")?.as_str())
                .map(str::to_string),
            _ => None,
        }
    }
}

impl ApiError {
    /// Build a status error from a response body, using `fallback` when the
    /// body has no usable detail
    pub fn from_body(status: u16, body: &str, fallback: &'static str) -> Self {
        let detail = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message())
            .unwrap_or_else(|| fallback.to_string());
        Self::Status { status, detail }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Decode { cause, .. } | ApiError::Transport { cause, .. } => {
                cause.status().map(|s| s.as_u16())
            }
            ApiError::ClientBuild(_) => None,
        }
    }
}

impl From<ApiError> for CoreError {
    fn from(err: ApiError) -> Self {
        CoreError::remote(err.status(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_string_detail_is_used_verbatim() {
        let err = ApiError::from_body(
            400,
            r#"{"detail": "Invalid or expired invite code"}"#,
            "Failed to join group",
        );
        assert_eq!(err.to_string(), "Invalid or expired invite code");
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_validation_detail_uses_first_message() {
        let err = ApiError::from_body(
            422,
            r#"{"detail": [{"loc": ["body", "email"], "msg": "value is not a valid email address", "type": "value_error"}]}"#,
            "Failed to create account",
        );
        assert_eq!(err.to_string(), "value is not a valid email address");
    }

    #[test]
    fn test_missing_detail_falls_back() {
        for body in ["", "<html>Bad Gateway</html>", r#"{"error": "x"}"#, r#"{"detail": ""}"#] {
            let err = ApiError::from_body(502, body, "Failed to fetch meals");
            assert_eq!(err.to_string(), "Failed to fetch meals");
        }
    }

    #[test]
    fn test_converts_to_remote_core_error() {
        let core: CoreError = ApiError::from_body(401, r#"{"detail": "Invalid email or password"}"#, "x").into();
        match core {
            CoreError::Remote { status, detail } => {
                assert_eq!(status, Some(401));
                assert_eq!(detail, "Invalid email or password");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
