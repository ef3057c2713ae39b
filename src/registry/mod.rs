//! Model Registry
//!
//! Maps a model identifier to its [`ModelInfo`]. The catalog is indexed by id
//! and by display name at construction and never changes afterwards. Lookups
//! that miss both indexes are retried against normalized forms of the id
//! (`vendor/model` -> `model`, `model:variant` -> `model`) and the outcome,
//! including a miss, is memoized in a write-once cache.

pub mod catalog;

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::LlmError;
use crate::types::ModelInfo;

/// Upper bound on memoized fallback resolutions.
const MAX_RESOLVED: usize = 4096;

/// Read-only model lookup used by the completion service.
pub trait ModelLookup: Send + Sync {
    /// Catalog entry for `id`, or `None` when the model is unknown.
    fn get_model_info(&self, id: &str) -> Option<Arc<ModelInfo>>;
}

/// Catalog-backed [`ModelLookup`].
#[derive(Debug, Default)]
pub struct ModelRegistry {
    by_id: HashMap<String, Arc<ModelInfo>>,
    by_name: HashMap<String, Arc<ModelInfo>>,
    resolved: RwLock<HashMap<String, Option<Arc<ModelInfo>>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from catalog entries. Later entries win on id clashes.
    pub fn from_models(models: impl IntoIterator<Item = ModelInfo>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        for model in models {
            let model = Arc::new(model);
            if !model.name.is_empty() {
                by_name.insert(model.name.clone(), model.clone());
            }
            by_id.insert(model.id.clone(), model);
        }
        Self {
            by_id,
            by_name,
            resolved: RwLock::new(HashMap::new()),
        }
    }

    /// Parse a catalog document (see [`catalog`] for accepted shapes).
    pub fn from_json_str(text: &str) -> Result<Self, LlmError> {
        let models = catalog::parse_catalog(text)?;
        tracing::info!(models = models.len(), "loaded model catalog");
        Ok(Self::from_models(models))
    }

    /// Load a catalog document from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, LlmError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            LlmError::Configuration(format!("failed to read catalog {}: {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Fetch a remote catalog once. Any failure is a construction error.
    pub async fn fetch(http: &reqwest::Client, url: &str) -> Result<Self, LlmError> {
        let response = http
            .get(url)
            .send()
            .await
            .map_err(|e| LlmError::Configuration(format!("failed to fetch catalog {url}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Configuration(format!(
                "catalog {url} returned HTTP {}",
                status.as_u16()
            )));
        }
        let text = response.text().await.map_err(|e| {
            LlmError::Configuration(format!("failed to read catalog {url}: {e}"))
        })?;
        Self::from_json_str(&text)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Model ids in the catalog, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.by_id.keys().map(String::as_str)
    }

    fn exact(&self, key: &str) -> Option<Arc<ModelInfo>> {
        self.by_id
            .get(key)
            .or_else(|| self.by_name.get(key))
            .cloned()
    }

    fn resolve_fallback(&self, id: &str) -> Option<Arc<ModelInfo>> {
        normalized_candidates(id)
            .into_iter()
            .find_map(|candidate| self.exact(&candidate))
    }
}

impl ModelLookup for ModelRegistry {
    fn get_model_info(&self, id: &str) -> Option<Arc<ModelInfo>> {
        if let Some(info) = self.exact(id) {
            return Some(info);
        }
        if let Some(hit) = self
            .resolved
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
        {
            return hit.clone();
        }

        let found = self.resolve_fallback(id);
        if found.is_none() {
            tracing::debug!(model = id, "model not found in catalog");
        }
        let mut resolved = self
            .resolved
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if resolved.len() < MAX_RESOLVED {
            resolved.entry(id.to_string()).or_insert_with(|| found.clone());
        }
        found
    }
}

impl<T: ModelLookup + ?Sized> ModelLookup for Arc<T> {
    fn get_model_info(&self, id: &str) -> Option<Arc<ModelInfo>> {
        (**self).get_model_info(id)
    }
}

/// Alternative spellings of `id`, most specific first.
fn normalized_candidates(id: &str) -> Vec<String> {
    let without_variant = id.split_once(':').map_or(id, |(base, _)| base);
    let without_vendor = |s: &str| s.split_once('/').map(|(_, rest)| rest.to_string());

    let mut candidates = Vec::with_capacity(3);
    if without_variant != id {
        candidates.push(without_variant.to_string());
    }
    if let Some(bare) = without_vendor(id) {
        candidates.push(bare);
    }
    if without_variant != id
        && let Some(bare) = without_vendor(without_variant)
    {
        candidates.push(bare);
    }
    candidates
}
