//! Compiled JSON schema cache
//!
//! Structured-output schemas are compiled once and reused. The cache is an
//! ordinary value owned by the [`CompletionService`](crate::service::CompletionService);
//! independent services never share compiled schemas.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;
use serde_json::Value;

use crate::error::LlmError;

pub const DEFAULT_SCHEMA_CACHE_CAPACITY: usize = 64;

/// Most validation messages reported per failure
const MAX_REPORTED_ERRORS: usize = 3;

/// LRU of compiled validators keyed by the schema's JSON text
pub struct SchemaCache {
    entries: Mutex<LruCache<String, Arc<jsonschema::Validator>>>,
}

impl SchemaCache {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Compiled validator for `schema`; a schema that fails to compile is a
    /// [`LlmError::Validation`] on the request's response format.
    pub fn compile(&self, schema: &Value) -> Result<Arc<jsonschema::Validator>, LlmError> {
        let key = schema.to_string();
        if let Some(hit) = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(hit.clone());
        }

        let compiled = jsonschema::validator_for(schema).map_err(|e| {
            LlmError::validation(
                "options.response_format.schema",
                format!("invalid JSON schema: {e}"),
                None,
            )
        })?;
        let compiled = Arc::new(compiled);
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(key, compiled.clone());
        Ok(compiled)
    }

    /// Check a model's text output against `schema`.
    pub fn validate_output(
        &self,
        provider: &str,
        schema: &Value,
        output: &str,
    ) -> Result<(), LlmError> {
        let validator = self.compile(schema)?;
        let instance: Value = serde_json::from_str(output).map_err(|e| {
            LlmError::response(provider, format!("structured output is not valid JSON: {e}"))
                .with_source(e)
        })?;
        if validator.is_valid(&instance) {
            return Ok(());
        }
        let messages: Vec<String> = validator
            .iter_errors(&instance)
            .take(MAX_REPORTED_ERRORS)
            .map(|err| format!("{} at {}", err, err.instance_path))
            .collect();
        Err(LlmError::response(
            provider,
            format!("structured output does not match schema: {}", messages.join("; ")),
        ))
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SchemaCache {
    fn default() -> Self {
        Self::new(DEFAULT_SCHEMA_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for SchemaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCache")
            .field("len", &self.len())
            .finish()
    }
}
