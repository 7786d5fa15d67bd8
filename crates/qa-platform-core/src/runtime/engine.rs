// crates/qa-platform-core/src/runtime/engine.rs
// ============================================================================
// Module: QA Platform Pagination Engine
// Description: Validated count-then-slice execution of listing plans.
// Purpose: Produce page envelopes for every listing endpoint.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The pagination engine is the single path from a listing request to a
//! [`PageEnvelope`]. It validates the page size against the configured cap,
//! resolves period windows against the injected clock, counts matches before
//! slicing and then fetches one slice. A page beyond the last one yields an
//! envelope with no items.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::CommentView;
use crate::core::GlobalChatMessageSearch;
use crate::core::MessageView;
use crate::core::PageEnvelope;
use crate::core::PageRequest;
use crate::core::PageSlice;
use crate::core::Period;
use crate::core::QuestionComments;
use crate::core::QuestionListing;
use crate::core::QuestionView;
use crate::core::SharedClock;
use crate::core::TagFilter;
use crate::core::UserId;
use crate::core::ValidationError;
use crate::interfaces::SharedForumStore;
use crate::interfaces::StoreError;
use crate::runtime::service::ServiceError;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default page size when a request omits it.
pub const DEFAULT_ITEMS_ON_PAGE: u64 = 10;
/// Default cap on the requested page size.
pub const DEFAULT_MAX_ITEMS_ON_PAGE: u64 = 1_000;

/// Pagination limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
    /// Page size used when the request omits one.
    pub default_items_on_page: u64,
    /// Largest accepted page size.
    pub max_items_on_page: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_items_on_page: DEFAULT_ITEMS_ON_PAGE,
            max_items_on_page: DEFAULT_MAX_ITEMS_ON_PAGE,
        }
    }
}

impl PaginationConfig {
    /// Resolves raw page parameters into a validated request.
    ///
    /// A missing page number is rejected; a missing page size falls back to
    /// the configured default.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when a value is missing, below 1, or above
    /// the configured cap.
    pub fn page_request(
        &self,
        page_param: &str,
        page: Option<i64>,
        items_param: &str,
        items: Option<i64>,
    ) -> Result<PageRequest, ValidationError> {
        let page = page.ok_or_else(|| ValidationError::MissingParameter(page_param.to_string()))?;
        let default_items = i64::try_from(self.default_items_on_page).unwrap_or(i64::MAX);
        let request =
            PageRequest::new(page_param, page, items_param, items.unwrap_or(default_items))?;
        if request.items_on_page() > self.max_items_on_page {
            return Err(ValidationError::invalid(
                items_param,
                format!("must not exceed {}", self.max_items_on_page),
            ));
        }
        Ok(request)
    }
}

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Parameter bag for question listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPageRequest {
    /// Page number and size.
    pub page: PageRequest,
    /// Validated tag filter.
    pub tags: TagFilter,
    /// Requested creation window.
    pub period: Period,
    /// Requester used for per-user flags.
    pub requester: UserId,
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Executes listing plans against a forum store.
#[derive(Clone)]
pub struct PaginationEngine {
    /// Backing store.
    store: SharedForumStore,
    /// Time source for period windows.
    clock: SharedClock,
    /// Page size limits.
    config: PaginationConfig,
}

impl PaginationEngine {
    /// Creates a pagination engine.
    #[must_use]
    pub fn new(store: SharedForumStore, clock: SharedClock, config: PaginationConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Returns the pagination limits.
    #[must_use]
    pub const fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Returns one page of a question listing.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the page size exceeds the cap or the store
    /// fails.
    pub fn question_page(
        &self,
        listing: QuestionListing,
        request: &QuestionPageRequest,
    ) -> Result<PageEnvelope<QuestionView>, ServiceError> {
        self.check_cap(request.page)?;
        let query = listing.plan(
            request.tags.clone(),
            request.period,
            request.requester,
            self.clock.now(),
        );
        paginate(
            request.page,
            || self.store.count_questions(&query),
            |slice| self.store.fetch_questions(&query, slice),
        )
    }

    /// Returns one page of global chat messages matching `search`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the page size exceeds the cap or the store
    /// fails.
    pub fn message_search_page(
        &self,
        search: &GlobalChatMessageSearch,
        page: PageRequest,
    ) -> Result<PageEnvelope<MessageView>, ServiceError> {
        self.check_cap(page)?;
        paginate(
            page,
            || self.store.count_messages(search),
            |slice| self.store.fetch_messages(search, slice),
        )
    }

    /// Returns one page of a question's comments.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when the page size exceeds the cap or the store
    /// fails.
    pub fn comment_page(
        &self,
        query: &QuestionComments,
        page: PageRequest,
    ) -> Result<PageEnvelope<CommentView>, ServiceError> {
        self.check_cap(page)?;
        paginate(
            page,
            || self.store.count_comments(query),
            |slice| self.store.fetch_comments(query, slice),
        )
    }

    /// Rejects page sizes above the configured cap.
    fn check_cap(&self, page: PageRequest) -> Result<(), ValidationError> {
        if page.items_on_page() > self.config.max_items_on_page {
            return Err(ValidationError::invalid(
                "items",
                format!("must not exceed {}", self.config.max_items_on_page),
            ));
        }
        Ok(())
    }
}

/// Counts, then fetches the requested slice unless it lies past the end.
fn paginate<T>(
    page: PageRequest,
    count: impl FnOnce() -> Result<u64, StoreError>,
    fetch: impl FnOnce(PageSlice) -> Result<Vec<T>, StoreError>,
) -> Result<PageEnvelope<T>, ServiceError> {
    let total = count()?;
    let slice = page.slice();
    let items = if slice.offset >= total { Vec::new() } else { fetch(slice)? };
    Ok(page.envelope(total, items))
}
