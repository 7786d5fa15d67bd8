// crates/qa-platform-store-sqlite/src/lib.rs
// ============================================================================
// Module: QA Platform SQLite Store Library
// Description: Public API surface for the SQLite forum store.
// Purpose: Expose the durable store and its configuration.
// Dependencies: crate::store
// ============================================================================

//! ## Overview
//! Durable [`qa_platform_core::ForumStore`] implementation backed by `SQLite`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteForumStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
