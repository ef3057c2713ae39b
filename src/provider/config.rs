//! Provider configuration
//!
//! A provider is a value, not a type: every OpenAI-compatible backend is a
//! [`ProviderConfig`] differing in base URL, auth, headers and catalog.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::LlmError;

/// How the API key is presented to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`
    #[default]
    Bearer,
    /// Key sent verbatim in the named header (Azure uses `api-key`)
    Header(String),
    /// No authentication (local gateways)
    None,
}

/// How tool invocations and results are encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolEncoding {
    /// `tool_calls` on assistant turns and `role: "tool"` results
    #[default]
    Native,
    /// JSON embedded in plain assistant/user text turns
    Inline,
}

/// Endpoints a provider serves beyond chat completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderCapabilities {
    pub streaming: bool,
    pub tools: bool,
    pub vision: bool,
    pub embeddings: bool,
    pub image_generation: bool,
}

impl ProviderCapabilities {
    /// Chat and streaming only
    pub const fn chat() -> Self {
        Self {
            streaming: true,
            tools: true,
            vision: false,
            embeddings: false,
            image_generation: false,
        }
    }

    pub const fn with_vision(mut self) -> Self {
        self.vision = true;
        self
    }

    pub const fn with_embeddings(mut self) -> Self {
        self.embeddings = true;
        self
    }

    pub const fn with_image_generation(mut self) -> Self {
        self.image_generation = true;
        self
    }
}

impl Default for ProviderCapabilities {
    fn default() -> Self {
        Self::chat()
    }
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Whole-request timeout for non-streaming calls; streams are bounded
    /// by `connect_timeout` and caller cancellation only
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            user_agent: concat!("unillm/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Configuration for one OpenAI-compatible backend
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider identifier, used in errors and logs
    pub id: String,
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub auth: AuthStyle,
    pub extra_headers: HashMap<String, String>,
    /// Appended to every request URL (Azure `api-version`)
    pub query_params: Vec<(String, String)>,
    pub capabilities: ProviderCapabilities,
    pub tool_encoding: ToolEncoding,
    pub http: HttpConfig,
    /// Public model listing used to build a registry, if the provider has one
    pub catalog_url: Option<String>,
}

impl ProviderConfig {
    pub fn new(id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_url: base_url.into(),
            api_key: None,
            auth: AuthStyle::Bearer,
            extra_headers: HashMap::new(),
            query_params: Vec::new(),
            capabilities: ProviderCapabilities::default(),
            tool_encoding: ToolEncoding::default(),
            http: HttpConfig::default(),
            catalog_url: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Read the API key from `var` when it is set and non-empty.
    pub fn with_api_key_from_env(mut self, var: &str) -> Self {
        if let Ok(key) = std::env::var(var)
            && !key.trim().is_empty()
        {
            self.api_key = Some(SecretString::from(key));
        }
        self
    }

    pub fn with_auth(mut self, auth: AuthStyle) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((name.into(), value.into()));
        self
    }

    pub fn with_capabilities(mut self, capabilities: ProviderCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_tool_encoding(mut self, encoding: ToolEncoding) -> Self {
        self.tool_encoding = encoding;
        self
    }

    pub fn with_http_config(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http.timeout = timeout;
        self
    }

    pub fn with_catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = Some(url.into());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.id.trim().is_empty() {
            return Err(LlmError::Configuration("provider id cannot be empty".into()));
        }
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| {
            LlmError::Configuration(format!("{}: invalid base URL {:?}: {e}", self.id, self.base_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(LlmError::Configuration(format!(
                "{}: base URL must use http or https",
                self.id
            )));
        }
        if self.auth != AuthStyle::None
            && self
                .api_key
                .as_ref()
                .is_none_or(|k| k.expose_secret().trim().is_empty())
        {
            return Err(LlmError::Configuration(format!(
                "{}: missing API key",
                self.id
            )));
        }
        self.headers().map(|_| ())
    }

    /// Default headers: authentication plus the configured extras.
    pub fn headers(&self) -> Result<HeaderMap, LlmError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.api_key {
            match &self.auth {
                AuthStyle::Bearer => {
                    let mut value = header_value(&format!("Bearer {}", key.expose_secret()))?;
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                AuthStyle::Header(name) => {
                    let mut value = header_value(key.expose_secret())?;
                    value.set_sensitive(true);
                    headers.insert(header_name(name)?, value);
                }
                AuthStyle::None => {}
            }
        }
        for (name, value) in &self.extra_headers {
            headers.insert(header_name(name)?, header_value(value)?);
        }
        Ok(headers)
    }

    /// `base_url` joined with `path`
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn header_name(name: &str) -> Result<HeaderName, LlmError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| LlmError::Configuration(format!("Invalid header name {name:?}: {e}")))
}

fn header_value(value: &str) -> Result<HeaderValue, LlmError> {
    // Never echo the value: it may be a credential
    HeaderValue::from_str(value)
        .map_err(|e| LlmError::Configuration(format!("Invalid header value: {e}")))
}
