//! Boundary validation for caller-supplied text
//!
//! Raw form or command input is checked here before it reaches the index.
//! Nothing in this module touches index state.

use crate::error::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Strict key format: one uppercase letter, a dash, three digits
    static ref STRICT_KEY: Regex = Regex::new(r"^[A-Z]-\d{3}$").expect("valid key pattern");
}

/// Parse a non-negative item count
pub fn parse_count(text: &str) -> Result<u32> {
    text.trim()
        .parse::<u32>()
        .map_err(|_| Error::InvalidQuantity(text.to_string()))
}

/// Check a key, enforcing the `A-123` format when `strict`
///
/// Returns the trimmed key.
pub fn validate_key(text: &str, strict: bool) -> Result<&str> {
    let key = text.trim();
    if key.is_empty() {
        return Err(Error::InvalidKey("key must not be empty".to_string()));
    }
    if strict && !STRICT_KEY.is_match(key) {
        return Err(Error::InvalidKey(format!(
            "'{}' does not match the A-123 format",
            key
        )));
    }
    Ok(key)
}

/// A validated product ready for the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub key: String,
    pub label: String,
    pub count: u32,
}

impl ProductDraft {
    /// Validate raw key, label and count text
    pub fn parse(key: &str, label: &str, count: &str, strict: bool) -> Result<Self> {
        let key = validate_key(key, strict)?;
        let label = label.trim();
        if label.is_empty() {
            return Err(Error::InvalidArgument("label must not be empty".to_string()));
        }
        let count = parse_count(count)?;

        Ok(Self {
            key: key.to_string(),
            label: label.to_string(),
            count,
        })
    }
}
