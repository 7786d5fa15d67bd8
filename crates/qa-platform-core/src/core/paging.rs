// crates/qa-platform-core/src/core/paging.rs
// ============================================================================
// Module: QA Platform Paging
// Description: Page requests, page slices, and the uniform page envelope.
// Purpose: Centralize pagination arithmetic for every listing endpoint.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`PageRequest`] is a validated `(page number, items on page)` pair. It
//! converts to a [`PageSlice`] (`offset`, `limit`) for the store and, together
//! with the total match count, to a [`PageEnvelope`]. Pages beyond the last
//! one are not errors: they produce an envelope with no items.
//!
//! `itemsOnPage` echoes the requested page size, not the number of items
//! actually returned.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::validation::ValidationError;

// ============================================================================
// SECTION: Page Request
// ============================================================================

/// Validated pagination parameters.
///
/// # Invariants
/// - `page_number >= 1` and `items_on_page >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    page_number: u64,
    /// Requested page size.
    items_on_page: u64,
}

impl PageRequest {
    /// Validates raw pagination parameters.
    ///
    /// `page_param` and `items_param` are the wire names used in error
    /// messages.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when either value is below 1.
    pub fn new(
        page_param: &str,
        page_number: i64,
        items_param: &str,
        items_on_page: i64,
    ) -> Result<Self, ValidationError> {
        let page_number = u64::try_from(page_number)
            .ok()
            .filter(|value| *value >= 1)
            .ok_or_else(|| ValidationError::invalid(page_param, "must be a positive integer"))?;
        let items_on_page = u64::try_from(items_on_page)
            .ok()
            .filter(|value| *value >= 1)
            .ok_or_else(|| ValidationError::invalid(items_param, "must be a positive integer"))?;
        Ok(Self {
            page_number,
            items_on_page,
        })
    }

    /// Builds a request from already-positive values.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when either value is zero.
    pub fn from_positive(page_number: u64, items_on_page: u64) -> Result<Self, ValidationError> {
        if page_number == 0 {
            return Err(ValidationError::invalid("page", "must be a positive integer"));
        }
        if items_on_page == 0 {
            return Err(ValidationError::invalid("items", "must be a positive integer"));
        }
        Ok(Self {
            page_number,
            items_on_page,
        })
    }

    /// Returns the 1-based page number.
    #[must_use]
    pub const fn page_number(self) -> u64 {
        self.page_number
    }

    /// Returns the requested page size.
    #[must_use]
    pub const fn items_on_page(self) -> u64 {
        self.items_on_page
    }

    /// Returns the store slice for this page.
    #[must_use]
    pub const fn slice(self) -> PageSlice {
        PageSlice {
            offset: (self.page_number - 1).saturating_mul(self.items_on_page),
            limit: self.items_on_page,
        }
    }

    /// Wraps fetched items into an envelope.
    #[must_use]
    pub fn envelope<T>(self, total_result_count: u64, items: Vec<T>) -> PageEnvelope<T> {
        PageEnvelope {
            current_page_number: self.page_number,
            total_page_count: total_page_count(total_result_count, self.items_on_page),
            total_result_count,
            items,
            items_on_page: self.items_on_page,
        }
    }
}

/// Row window handed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice {
    /// Rows to skip.
    pub offset: u64,
    /// Maximum rows to return.
    pub limit: u64,
}

impl PageSlice {
    /// Returns the slice bounds clamped to `usize` for in-memory slicing.
    #[must_use]
    pub fn bounds(self) -> (usize, usize) {
        let offset = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        (offset, limit)
    }
}

/// Returns `ceil(total / items_on_page)`, or 0 when `items_on_page` is 0.
#[must_use]
pub const fn total_page_count(total_result_count: u64, items_on_page: u64) -> u64 {
    if items_on_page == 0 {
        return 0;
    }
    total_result_count.div_ceil(items_on_page)
}

// ============================================================================
// SECTION: Page Envelope
// ============================================================================

/// Uniform paginated response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvelope<T> {
    /// Requested page number.
    pub current_page_number: u64,
    /// `ceil(total_result_count / items_on_page)`.
    pub total_page_count: u64,
    /// Matches before slicing.
    pub total_result_count: u64,
    /// Items on this page.
    pub items: Vec<T>,
    /// Requested page size (echoed).
    pub items_on_page: u64,
}

impl<T> PageEnvelope<T> {
    /// Maps every item, keeping the page metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageEnvelope<U> {
        PageEnvelope {
            current_page_number: self.current_page_number,
            total_page_count: self.total_page_count,
            total_result_count: self.total_result_count,
            items: self.items.into_iter().map(f).collect(),
            items_on_page: self.items_on_page,
        }
    }
}
