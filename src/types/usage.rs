//! Token usage accounting

use serde::{Deserialize, Serialize};

/// Additive usage counters for one or more calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Internal reasoning tokens (a subset of output on most providers)
    #[serde(default)]
    pub reasoning_tokens: u64,
    /// Input tokens served from the provider's prompt cache
    #[serde(default)]
    pub cache_read_tokens: u64,
    /// Input tokens written to the provider's prompt cache
    #[serde(default)]
    pub cache_write_tokens: u64,
    #[serde(default)]
    pub images: u64,
    #[serde(default)]
    pub web_searches: u64,
    #[serde(default)]
    pub requests: u64,
}

impl TokenUsage {
    pub const fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            reasoning_tokens: 0,
            cache_read_tokens: 0,
            cache_write_tokens: 0,
            images: 0,
            web_searches: 0,
            requests: 0,
        }
    }

    /// Usage of one image generation call that produced `count` images.
    pub const fn for_images(count: u64) -> Self {
        Self {
            images: count,
            requests: 1,
            ..Self::new(0, 0)
        }
    }

    pub const fn total_tokens(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    /// Add `other` into `self`. Associative and commutative.
    pub fn append(&mut self, other: &TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.reasoning_tokens += other.reasoning_tokens;
        self.cache_read_tokens += other.cache_read_tokens;
        self.cache_write_tokens += other.cache_write_tokens;
        self.images += other.images;
        self.web_searches += other.web_searches;
        self.requests += other.requests;
    }

    pub const fn is_empty(&self) -> bool {
        self.input_tokens == 0
            && self.output_tokens == 0
            && self.reasoning_tokens == 0
            && self.cache_read_tokens == 0
            && self.cache_write_tokens == 0
            && self.images == 0
            && self.web_searches == 0
            && self.requests == 0
    }
}

impl std::ops::AddAssign<&TokenUsage> for TokenUsage {
    fn add_assign(&mut self, rhs: &TokenUsage) {
        self.append(rhs);
    }
}

impl<'a> std::iter::Sum<&'a TokenUsage> for TokenUsage {
    fn sum<I: Iterator<Item = &'a TokenUsage>>(iter: I) -> Self {
        iter.fold(TokenUsage::default(), |mut acc, u| {
            acc.append(u);
            acc
        })
    }
}
