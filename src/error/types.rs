//! Core error types

use thiserror::Error;

/// Boxed error used to preserve chained causes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for every completion operation.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Caller-supplied data violates a precondition. Never reaches the network.
    #[error("invalid {field}: {message}{}", got_suffix(.value))]
    Validation {
        field: String,
        message: String,
        value: Option<String>,
    },

    /// The outbound call failed at the transport or HTTP layer.
    #[error("{provider} request failed{}: {message}", status_suffix(.status))]
    Request {
        provider: String,
        status: Option<u16>,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The call succeeded but the payload could not be interpreted.
    #[error("{provider} returned an unusable response: {message}")]
    Response {
        provider: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The selected provider does not implement the requested capability.
    #[error("{provider} does not support {capability}")]
    UnsupportedCapability { provider: String, capability: String },

    /// Failure on the streaming path, possibly after chunks were delivered.
    #[error("{provider} stream failed: {message}")]
    Stream {
        provider: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The caller's cancellation token fired while the call was in flight.
    #[error("{provider} call was canceled")]
    Canceled { provider: String },

    /// Provider or registry construction failed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

fn got_suffix(value: &Option<String>) -> String {
    value
        .as_deref()
        .map(|v| format!(" (got {v:?})"))
        .unwrap_or_default()
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .as_ref()
        .map(|s| format!(" with status {s}"))
        .unwrap_or_default()
}

impl LlmError {
    pub fn validation(
        field: impl Into<String>,
        message: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
            value,
        }
    }

    pub fn request(
        provider: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::Request {
            provider: provider.into(),
            status,
            message: message.into(),
            source: None,
        }
    }

    pub fn response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Response {
            provider: provider.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn stream(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stream {
            provider: provider.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn unsupported(provider: impl Into<String>, capability: impl Into<String>) -> Self {
        Self::UnsupportedCapability {
            provider: provider.into(),
            capability: capability.into(),
        }
    }

    pub fn canceled(provider: impl Into<String>) -> Self {
        Self::Canceled {
            provider: provider.into(),
        }
    }

    /// Attach a cause to a `Request`, `Response` or `Stream` error.
    /// Other variants are returned unchanged.
    pub fn with_source(mut self, cause: impl Into<BoxError>) -> Self {
        match &mut self {
            Self::Request { source, .. }
            | Self::Response { source, .. }
            | Self::Stream { source, .. } => *source = Some(cause.into()),
            _ => {}
        }
        self
    }

    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub const fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled { .. })
    }

    /// HTTP status reported by the provider, if any.
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether a retry could plausibly succeed.
    ///
    /// Informational only: the crate itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request { status: None, .. } => true,
            Self::Request {
                status: Some(code), ..
            } => *code == 429 || (500..600).contains(code),
            Self::Stream { .. } => true,
            _ => false,
        }
    }

    /// Provider name carried by the error, when it has one.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::Request { provider, .. }
            | Self::Response { provider, .. }
            | Self::UnsupportedCapability { provider, .. }
            | Self::Stream { provider, .. }
            | Self::Canceled { provider } => Some(provider),
            _ => None,
        }
    }
}
