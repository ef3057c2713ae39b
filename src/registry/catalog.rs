//! Catalog document parsing
//!
//! Accepted shapes:
//! - a JSON array of [`ModelInfo`] entries,
//! - an object with a `models` array of [`ModelInfo`] entries,
//! - an object keyed by model id whose values are entries without an `id`,
//! - an OpenRouter-style `/models` listing (`{"data": [...]}`) with per-token prices.
//!
//! Entries that fail to parse are skipped with a warning so that one malformed
//! row does not make the whole catalog unusable.

use serde::Deserialize;
use serde_json::Value;

use crate::error::LlmError;
use crate::types::{ModelCapabilities, ModelInfo, ModelPricing, Price, PricingUnit};

pub fn parse_catalog(text: &str) -> Result<Vec<ModelInfo>, LlmError> {
    let doc: Value = serde_json::from_str(text)?;
    let models = match doc {
        Value::Array(items) => items.into_iter().filter_map(native_entry).collect(),
        Value::Object(mut obj) if obj.get("data").is_some_and(Value::is_array) => {
            array_items(obj.remove("data"))
                .filter_map(remote_entry)
                .collect()
        }
        Value::Object(mut obj) if obj.get("models").is_some_and(Value::is_array) => {
            array_items(obj.remove("models"))
                .filter_map(native_entry)
                .collect()
        }
        Value::Object(table) => table
            .into_iter()
            .filter_map(|(id, mut entry)| {
                if let Value::Object(fields) = &mut entry {
                    fields.entry("id").or_insert(Value::String(id));
                }
                native_entry(entry)
            })
            .collect(),
        _ => {
            return Err(LlmError::Configuration(
                "model catalog must be a JSON array or object".to_string(),
            ));
        }
    };
    Ok(models)
}

fn array_items(value: Option<Value>) -> impl Iterator<Item = Value> {
    match value {
        Some(Value::Array(items)) => items.into_iter(),
        _ => Vec::new().into_iter(),
    }
}

fn native_entry(entry: Value) -> Option<ModelInfo> {
    let mut info = match serde_json::from_value::<ModelInfo>(entry) {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!("skipping malformed catalog entry: {}", e);
            return None;
        }
    };
    if info.name.is_empty() {
        info.name = info.id.clone();
    }
    Some(info)
}

#[derive(Debug, Deserialize)]
struct RemoteModel {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    context_length: Option<u64>,
    #[serde(default)]
    pricing: RemotePricing,
    #[serde(default)]
    top_provider: Option<RemoteTopProvider>,
    #[serde(default)]
    supported_parameters: Vec<String>,
    #[serde(default)]
    architecture: Option<RemoteArchitecture>,
}

#[derive(Debug, Default, Deserialize)]
struct RemotePricing {
    prompt: Option<Price>,
    completion: Option<Price>,
    internal_reasoning: Option<Price>,
    input_cache_read: Option<Price>,
    input_cache_write: Option<Price>,
    image: Option<Price>,
    request: Option<Price>,
    web_search: Option<Price>,
}

#[derive(Debug, Deserialize)]
struct RemoteTopProvider {
    #[serde(default)]
    max_completion_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RemoteArchitecture {
    #[serde(default)]
    input_modalities: Vec<String>,
}

fn remote_entry(entry: Value) -> Option<ModelInfo> {
    let remote = match serde_json::from_value::<RemoteModel>(entry) {
        Ok(remote) => remote,
        Err(e) => {
            tracing::warn!("skipping malformed remote catalog entry: {}", e);
            return None;
        }
    };
    let supports = |param: &str| remote.supported_parameters.iter().any(|p| p == param);
    let capabilities = ModelCapabilities {
        tools: supports("tools"),
        vision: remote
            .architecture
            .as_ref()
            .is_some_and(|a| a.input_modalities.iter().any(|m| m == "image")),
        reasoning: supports("reasoning") || supports("include_reasoning"),
        structured_output: supports("structured_outputs") || supports("response_format"),
    };
    let pricing = ModelPricing {
        unit: PricingUnit::PerToken,
        prompt: remote.pricing.prompt,
        completion: remote.pricing.completion,
        internal_reasoning: remote.pricing.internal_reasoning,
        cache_read: remote.pricing.input_cache_read,
        cache_write: remote.pricing.input_cache_write,
        image: remote.pricing.image,
        request: remote.pricing.request,
        web_search: remote.pricing.web_search,
    };
    Some(ModelInfo {
        name: remote.name.unwrap_or_else(|| remote.id.clone()),
        id: remote.id,
        pricing,
        context_window: remote.context_length,
        max_output_tokens: remote.top_provider.and_then(|p| p.max_completion_tokens),
        capabilities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_keyed_by_id() {
        let models = parse_catalog(
            r#"{
                "m1": {"pricing": {"prompt": 1.0, "completion": "2.0"}, "context_window": 8192},
                "m2": {"name": "Model Two"}
            }"#,
        )
        .unwrap();
        assert_eq!(models.len(), 2);
        let m1 = models.iter().find(|m| m.id == "m1").unwrap();
        assert_eq!(m1.name, "m1");
        assert_eq!(m1.context_window, Some(8192));
        assert_eq!(m1.pricing.completion.as_ref().and_then(Price::value), Some(2.0));
    }

    #[test]
    fn remote_listing_uses_per_token_prices() {
        let models = parse_catalog(
            r#"{"data": [{
                "id": "anthropic/claude-sonnet-4",
                "name": "Anthropic: Claude Sonnet 4",
                "context_length": 200000,
                "pricing": {"prompt": "0.000003", "completion": "0.000015", "input_cache_read": "0.0000003"},
                "top_provider": {"max_completion_tokens": 64000},
                "supported_parameters": ["tools", "reasoning"],
                "architecture": {"input_modalities": ["text", "image"]}
            }]}"#,
        )
        .unwrap();
        let m = &models[0];
        assert_eq!(m.pricing.unit, PricingUnit::PerToken);
        assert_eq!(m.max_output_tokens, Some(64000));
        assert!(m.capabilities.tools && m.capabilities.reasoning && m.capabilities.vision);
        assert!(!m.capabilities.structured_output);
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let models = parse_catalog(r#"[{"id": "ok"}, {"name": "no id"}, 42]"#).unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].id, "ok");
    }

    #[test]
    fn scalar_documents_are_rejected() {
        assert!(matches!(parse_catalog("3"), Err(LlmError::Configuration(_))));
        assert!(matches!(parse_catalog("{"), Err(LlmError::Json(_))));
    }
}
