// crates/qa-platform-core/src/runtime/mod.rs
// ============================================================================
// Module: QA Platform Runtime
// Description: Pagination engine, forum service, fixtures, and in-memory store.
// Purpose: Execute listing plans and guarded mutations against any store.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the pagination engine and the forum service on
//! top of the store contract. Every API surface must call into the service so
//! that validation, existence checks and guards behave identically.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod engine;
pub mod fixtures;
pub mod service;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use engine::DEFAULT_ITEMS_ON_PAGE;
pub use engine::DEFAULT_MAX_ITEMS_ON_PAGE;
pub use engine::PaginationConfig;
pub use engine::PaginationEngine;
pub use engine::QuestionPageRequest;
pub use fixtures::FixtureJoin;
pub use fixtures::FixtureQuestionUser;
pub use fixtures::FixtureReport;
pub use fixtures::FixtureStar;
pub use fixtures::FixtureVote;
pub use fixtures::ForumFixture;
pub use service::AskQuestion;
pub use service::ForumService;
pub use service::ServiceError;
pub use store::InMemoryForumStore;
