// crates/qa-platform-core/src/core/validation.rs
// ============================================================================
// Module: QA Platform Query Parameter Validation
// Description: Tracked/ignored tag validation and request validation errors.
// Purpose: Reject malformed listing parameters before any query runs.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Listing endpoints accept a tracked-tag list and an ignored-tag list. The
//! value `-1` is the "no filter" sentinel and is dropped. Every other value
//! must be a positive identifier, and no identifier may appear in both lists.
//! Any violation fails the request before the store is touched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::identifiers::TagId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Tag list sentinel meaning "no filter".
pub const NO_TAG_FILTER: i64 = -1;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Request validation failures (mapped to HTTP 400 at the boundary).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required parameter was absent.
    #[error("required parameter '{0}' is missing")]
    MissingParameter(String),
    /// A parameter was present but unusable.
    #[error("parameter '{name}' is invalid: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Human-readable reason.
        reason: String,
    },
    /// Tracked and ignored tag lists overlap or are malformed.
    #[error("trackedTag and ignoredTag lists are malformed or overlap")]
    TagMapping,
}

impl ValidationError {
    /// Builds an [`ValidationError::InvalidParameter`].
    #[must_use]
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable label used in error bodies.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "missing_parameter",
            Self::InvalidParameter {
                ..
            } => "invalid_parameter",
            Self::TagMapping => "tag_mapping",
        }
    }
}

// ============================================================================
// SECTION: Tag Validation
// ============================================================================

/// Returns true when both tag lists are well formed and disjoint.
///
/// The `-1` sentinel is ignored; any other value below 1 is malformed.
#[must_use]
pub fn tags_mapping_is_correct(tracked: &[i64], ignored: &[i64]) -> bool {
    let Some(tracked) = normalize_tags(tracked) else {
        return false;
    };
    let Some(ignored) = normalize_tags(ignored) else {
        return false;
    };
    tracked.is_disjoint(&ignored)
}

/// Drops sentinels and converts to tag ids; `None` when a value is malformed.
fn normalize_tags(raw: &[i64]) -> Option<BTreeSet<TagId>> {
    let mut tags = BTreeSet::new();
    for value in raw {
        if *value == NO_TAG_FILTER {
            continue;
        }
        tags.insert(TagId::from_i64(*value)?);
    }
    Some(tags)
}

/// Validated tag filter for question listings.
///
/// # Invariants
/// - `tracked` and `ignored` are disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    /// Questions must carry at least one of these (when non-empty).
    tracked: BTreeSet<TagId>,
    /// Questions carrying any of these are excluded.
    ignored: BTreeSet<TagId>,
}

impl TagFilter {
    /// Returns a filter that matches everything.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Validates raw tag lists and builds the filter.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::TagMapping`] when a list is malformed or the
    /// lists overlap.
    pub fn from_raw(tracked: &[i64], ignored: &[i64]) -> Result<Self, ValidationError> {
        let tracked = normalize_tags(tracked).ok_or(ValidationError::TagMapping)?;
        let ignored = normalize_tags(ignored).ok_or(ValidationError::TagMapping)?;
        if !tracked.is_disjoint(&ignored) {
            return Err(ValidationError::TagMapping);
        }
        Ok(Self {
            tracked,
            ignored,
        })
    }

    /// Returns the tracked tag set.
    #[must_use]
    pub const fn tracked(&self) -> &BTreeSet<TagId> {
        &self.tracked
    }

    /// Returns the ignored tag set.
    #[must_use]
    pub const fn ignored(&self) -> &BTreeSet<TagId> {
        &self.ignored
    }

    /// Returns true when an entity with `tags` passes the filter.
    #[must_use]
    pub fn matches(&self, tags: &[TagId]) -> bool {
        let tracked_ok =
            self.tracked.is_empty() || tags.iter().any(|tag| self.tracked.contains(tag));
        tracked_ok && !tags.iter().any(|tag| self.ignored.contains(tag))
    }
}
