// crates/qa-platform-core/src/core/guards.rs
// ============================================================================
// Module: QA Platform Mutation Guards
// Description: Outcomes of guarded vote, bookmark, view, star and join inserts.
// Purpose: Give each idempotency/ownership check an explicit result type.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every guarded mutation is a single conditional insert performed atomically
//! by the store. A guard never overwrites: the state per (subject, user) pair
//! moves from absent to present once, and only an explicit delete moves it
//! back. Rejections are ordinary outcomes rather than errors so callers can map
//! them to HTTP statuses without inspecting error strings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::MessageStarId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of starred messages a user may hold.
pub const MAX_STARRED_MESSAGES: u64 = 3;

// ============================================================================
// SECTION: Outcomes
// ============================================================================

/// Result of casting a question vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VoteOutcome {
    /// Vote recorded; carries the new vote sum.
    Cast {
        /// Up votes minus down votes after the insert.
        vote_sum: i64,
    },
    /// The user already voted on the question; nothing changed.
    AlreadyVoted,
}

/// Result of bookmarking a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookmarkOutcome {
    /// Bookmark created.
    Added,
    /// Bookmark already present; no duplicate row.
    AlreadyBookmarked,
}

/// Result of recording a question view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewOutcome {
    /// First view by this user.
    FirstView,
    /// The user had already viewed the question.
    AlreadyViewed,
}

/// Result of starring a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StarOutcome {
    /// Star created.
    Starred {
        /// New star identifier.
        star_id: MessageStarId,
    },
    /// The user already holds [`MAX_STARRED_MESSAGES`] stars.
    QuotaExceeded,
    /// The user already starred this message.
    AlreadyStarred,
    /// The user is not a member of the message's chat.
    NotChatMember,
}

/// Result of deleting a star.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnstarOutcome {
    /// Star removed.
    Deleted,
    /// No star with that identifier.
    NotFound,
    /// The star belongs to another user; nothing changed.
    NotOwner,
}

/// Result of joining a group chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinOutcome {
    /// Membership created.
    Joined,
    /// The user was already a member.
    AlreadyMember,
    /// No group chat with that identifier.
    ChatNotFound,
    /// No user with that identifier.
    UserNotFound,
}

impl JoinOutcome {
    /// Returns the stable label used in logs and error bodies.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Joined => "joined",
            Self::AlreadyMember => "already_member",
            Self::ChatNotFound => "chat_not_found",
            Self::UserNotFound => "user_not_found",
        }
    }
}

impl StarOutcome {
    /// Returns the stable label used in logs and error bodies.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Starred {
                ..
            } => "starred",
            Self::QuotaExceeded => "quota_exceeded",
            Self::AlreadyStarred => "already_starred",
            Self::NotChatMember => "not_chat_member",
        }
    }
}
