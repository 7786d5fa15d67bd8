// crates/qa-platform-core/src/lib.rs
// ============================================================================
// Module: QA Platform Core Library
// Description: Public API surface for the Q&A forum core.
// Purpose: Expose core types, store interfaces, and runtime services.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! The QA platform core holds the forum domain: validated listing requests,
//! the pagination engine with its page envelope, and the guards that keep
//! votes, bookmarks, views and stars idempotent. It is storage-agnostic and
//! integrates through the store traits in [`interfaces`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::ContentStore;
pub use interfaces::ForumStore;
pub use interfaces::GuardStore;
pub use interfaces::ListingStore;
pub use interfaces::SharedForumStore;
pub use interfaces::StoreError;
pub use runtime::AskQuestion;
pub use runtime::DEFAULT_ITEMS_ON_PAGE;
pub use runtime::DEFAULT_MAX_ITEMS_ON_PAGE;
pub use runtime::FixtureReport;
pub use runtime::ForumFixture;
pub use runtime::ForumService;
pub use runtime::InMemoryForumStore;
pub use runtime::PaginationConfig;
pub use runtime::PaginationEngine;
pub use runtime::QuestionPageRequest;
pub use runtime::ServiceError;
