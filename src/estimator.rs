//! Fallback token accounting
//!
//! Some backends expose no tokenizer. For those, token counts are estimated
//! from the flattened prompt text at roughly four characters per token. The
//! estimate is good enough for context budgeting; it is not authoritative
//! for billing.

/// Characters per token assumed by the estimate
const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of a prompt, rounding up.
#[must_use]
pub fn estimate_tokens(text: &str) -> u32 {
    text.len().div_ceil(CHARS_PER_TOKEN) as u32
}
