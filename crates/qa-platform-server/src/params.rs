// crates/qa-platform-server/src/params.rs
// ============================================================================
// Module: Query Parameter Bag
// Description: Typed access to raw URL query parameters.
// Purpose: Parse page numbers, id lists and text with uniform 400 errors.
// Dependencies: qa-platform-core, url
// ============================================================================

//! ## Overview
//! Query strings are decoded with `application/x-www-form-urlencoded` rules.
//! Id lists accept comma-separated values, repeated keys, or both
//! (`trackedTag=1,2&trackedTag=3`). An absent list is the "no filter"
//! sentinel. Any token that is not an integer is rejected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use qa_platform_core::NO_TAG_FILTER;
use qa_platform_core::ValidationError;
use url::form_urlencoded;

// ============================================================================
// SECTION: Parameter Bag
// ============================================================================

/// Decoded query parameters in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    /// Decoded key/value pairs.
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Decodes a raw query string (without the leading `?`).
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let pairs = raw
            .map(|query| form_urlencoded::parse(query.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Self {
            pairs,
        }
    }

    /// Returns every value given for `name`.
    fn values<'a, 'b>(&'a self, name: &'b str) -> impl Iterator<Item = &'a str> + use<'a, 'b> {
        self.pairs.iter().filter(move |(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    /// Returns the first value given for `name`.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values(name).next()
    }

    /// Parses an optional integer parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidParameter`] when the value is not an
    /// integer.
    pub fn optional_i64(&self, name: &str) -> Result<Option<i64>, ValidationError> {
        self.first(name)
            .map(|value| {
                value
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| ValidationError::invalid(name, "expected an integer"))
            })
            .transpose()
    }

    /// Parses a required integer parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the value is absent or not an integer.
    pub fn required_i64(&self, name: &str) -> Result<i64, ValidationError> {
        self.optional_i64(name)?.ok_or_else(|| ValidationError::MissingParameter(name.to_string()))
    }

    /// Returns a required text parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingParameter`] when absent.
    pub fn required_text(&self, name: &str) -> Result<&str, ValidationError> {
        self.first(name).ok_or_else(|| ValidationError::MissingParameter(name.to_string()))
    }

    /// Parses a tag id list, defaulting to the "no filter" sentinel.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::TagMapping`] when a token is not an integer.
    pub fn id_list(&self, name: &str) -> Result<Vec<i64>, ValidationError> {
        let mut ids = Vec::new();
        for value in self.values(name) {
            for token in value.split(',').map(str::trim).filter(|token| !token.is_empty()) {
                ids.push(token.parse::<i64>().map_err(|_| ValidationError::TagMapping)?);
            }
        }
        if ids.is_empty() {
            ids.push(NO_TAG_FILTER);
        }
        Ok(ids)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
