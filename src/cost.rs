//! Cost Calculation
//!
//! Converts a [`TokenUsage`] into a monetary amount using the model's
//! [`ModelPricing`]. Token prices are per million tokens (after applying the
//! pricing unit); request, web search and image prices are flat per unit.
//!
//! Cost is best effort: an unknown model or an unparseable prompt/completion
//! price yields `None` rather than an error or a misleading zero.

use crate::types::{ModelInfo, Price, TokenUsage};

const TOKENS_PER_UNIT: f64 = 1_000_000.0;

/// Cost of a text completion, or `None` when the model cannot be priced.
///
/// - With a cache-read price, cached input tokens are carved out of the input
///   and billed at that price; likewise for cache writes.
/// - With an internal-reasoning price, reasoning tokens are billed at that
///   price on top of the output; otherwise they carry no extra charge.
/// - Output tokens are always billed at the completion price.
pub fn cost(info: Option<&ModelInfo>, usage: &TokenUsage) -> Option<f64> {
    let info = info?;
    let pricing = &info.pricing;
    let factor = pricing.unit.per_million_factor();

    let Some(prompt_rate) = required_rate(pricing.prompt.as_ref(), factor) else {
        tracing::debug!(model = %info.id, "prompt price is not a number; cost unavailable");
        return None;
    };
    let Some(completion_rate) = required_rate(pricing.completion.as_ref(), factor) else {
        tracing::debug!(model = %info.id, "completion price is not a number; cost unavailable");
        return None;
    };

    let mut total = 0.0;
    let mut fresh_input = usage.input_tokens;

    if let Some(rate) = configured_rate(pricing.cache_read.as_ref(), factor) {
        fresh_input = fresh_input.saturating_sub(usage.cache_read_tokens);
        total += per_million(usage.cache_read_tokens) * rate;
    }
    if let Some(rate) = configured_rate(pricing.cache_write.as_ref(), factor) {
        fresh_input = fresh_input.saturating_sub(usage.cache_write_tokens);
        total += per_million(usage.cache_write_tokens) * rate;
    }
    total += per_million(fresh_input) * prompt_rate;
    total += per_million(usage.output_tokens) * completion_rate;

    if let Some(rate) = configured_rate(pricing.internal_reasoning.as_ref(), factor) {
        total += per_million(usage.reasoning_tokens) * rate;
    }

    // Flat fees are per unit, never scaled.
    if let Some(fee) = configured_rate(pricing.request.as_ref(), 1.0) {
        total += usage.requests as f64 * fee;
    }
    if let Some(fee) = configured_rate(pricing.web_search.as_ref(), 1.0) {
        total += usage.web_searches as f64 * fee;
    }

    Some(total)
}

/// Flat cost of generating `images` images, priced separately from text.
pub fn image_generation_cost(info: Option<&ModelInfo>, images: u64) -> Option<f64> {
    let info = info?;
    match info.pricing.image.as_ref() {
        None => Some(0.0),
        Some(price) => price.value().map(|per_image| per_image * images as f64),
    }
}

fn per_million(tokens: u64) -> f64 {
    tokens as f64 / TOKENS_PER_UNIT
}

/// Unset prices bill nothing; set but unparseable prices make the model unpriceable.
fn required_rate(price: Option<&Price>, factor: f64) -> Option<f64> {
    match price {
        None => Some(0.0),
        Some(p) => p.value().map(|v| v * factor),
    }
}

/// A positive rate for an optional dimension. Unparseable entries count as unset.
fn configured_rate(price: Option<&Price>, factor: f64) -> Option<f64> {
    price
        .and_then(Price::value)
        .filter(|v| *v > 0.0)
        .map(|v| v * factor)
}
