//! Model catalog entries

use serde::{Deserialize, Serialize};

/// A catalog price.
///
/// Catalogs encode prices either as JSON numbers or as decimal strings
/// (`"0.000003"`). Parsing is deferred to the cost calculator so that a single
/// malformed entry does not prevent the catalog from loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Price {
    Number(f64),
    Text(String),
}

impl Price {
    /// Parsed price. `None` for text that is not a finite, non-negative number.
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        (value.is_finite() && value >= 0.0).then_some(value)
    }
}

impl From<f64> for Price {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Price {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Unit of token prices in a [`ModelPricing`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingUnit {
    /// Price per one million tokens
    #[default]
    PerMillion,
    /// Price per single token (remote catalogs such as OpenRouter's)
    PerToken,
}

impl PricingUnit {
    /// Multiplier that converts a price in this unit into a per-million price.
    pub const fn per_million_factor(self) -> f64 {
        match self {
            Self::PerMillion => 1.0,
            Self::PerToken => 1_000_000.0,
        }
    }
}

/// Prices for one model. Unset dimensions are not charged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    #[serde(default)]
    pub unit: PricingUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_reasoning: Option<Price>,
    #[serde(default, alias = "input_cache_read", skip_serializing_if = "Option::is_none")]
    pub cache_read: Option<Price>,
    #[serde(default, alias = "input_cache_write", skip_serializing_if = "Option::is_none")]
    pub cache_write: Option<Price>,
    /// Flat price per generated image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Price>,
    /// Flat price per request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<Price>,
    /// Flat price per web search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_search: Option<Price>,
}

impl ModelPricing {
    /// Prompt and completion prices per million tokens.
    pub fn per_million(prompt: f64, completion: f64) -> Self {
        Self {
            prompt: Some(prompt.into()),
            completion: Some(completion.into()),
            ..Default::default()
        }
    }

    pub fn with_cache_read(mut self, price: impl Into<Price>) -> Self {
        self.cache_read = Some(price.into());
        self
    }

    pub fn with_cache_write(mut self, price: impl Into<Price>) -> Self {
        self.cache_write = Some(price.into());
        self
    }

    pub fn with_internal_reasoning(mut self, price: impl Into<Price>) -> Self {
        self.internal_reasoning = Some(price.into());
        self
    }

    pub fn with_image(mut self, price: impl Into<Price>) -> Self {
        self.image = Some(price.into());
        self
    }
}

/// Feature flags advertised by a catalog entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCapabilities {
    #[serde(default)]
    pub tools: bool,
    #[serde(default)]
    pub vision: bool,
    #[serde(default)]
    pub reasoning: bool,
    #[serde(default)]
    pub structured_output: bool,
}

/// Catalog entry for one model. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pricing: ModelPricing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_window: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u64>,
    #[serde(default)]
    pub capabilities: ModelCapabilities,
}

impl ModelInfo {
    pub fn new(id: impl Into<String>, pricing: ModelPricing) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            pricing,
            context_window: None,
            max_output_tokens: None,
            capabilities: ModelCapabilities::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
