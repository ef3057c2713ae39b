//! Error Handling Module
//!
//! A single error type, [`LlmError`], is shared by every layer of the crate:
//! request validation, the provider HTTP client, response mapping and the
//! streaming adapter.
//!
//! # Example
//!
//! ```rust,ignore
//! use unillm::error::LlmError;
//!
//! let error = LlmError::validation("model", "model id must not be empty", None);
//! assert!(error.is_validation());
//! assert!(!error.is_retryable());
//! ```

mod conversions;
pub mod types;

pub use types::*;
