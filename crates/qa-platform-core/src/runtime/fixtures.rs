// crates/qa-platform-core/src/runtime/fixtures.rs
// ============================================================================
// Module: QA Platform Fixture Bundles
// Description: JSON-loadable seed data for forum stores.
// Purpose: Seed demos and tests through the same store contract as requests.
// Dependencies: crate::{core, interfaces}, serde
// ============================================================================

//! ## Overview
//! A [`ForumFixture`] lists entities in dependency order (users, tags,
//! questions, answers, comments, chats, messages) followed by guarded
//! relations (votes, views, bookmarks, stars, chat joins). Relations go
//! through the guard contract, so a duplicate relation in a bundle is counted
//! as skipped rather than inserted twice.
//!
//! Application is not atomic. Rows are written one at a time, and rows
//! written before a failing row stay in the store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::BookmarkOutcome;
use crate::core::ChatId;
use crate::core::JoinOutcome;
use crate::core::MessageId;
use crate::core::NewAnswer;
use crate::core::NewChat;
use crate::core::NewComment;
use crate::core::NewMessage;
use crate::core::NewQuestion;
use crate::core::NewTag;
use crate::core::NewUser;
use crate::core::QuestionId;
use crate::core::StarOutcome;
use crate::core::Timestamp;
use crate::core::UserId;
use crate::core::ViewOutcome;
use crate::core::VoteOutcome;
use crate::core::VoteType;
use crate::interfaces::ForumStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Fixture Types
// ============================================================================

/// Vote relation in a fixture bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureVote {
    /// Voted question.
    pub question_id: QuestionId,
    /// Voter.
    pub user_id: UserId,
    /// Vote direction.
    pub vote: VoteType,
}

/// (question, user) relation in a fixture bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureQuestionUser {
    /// Question.
    pub question_id: QuestionId,
    /// User.
    pub user_id: UserId,
}

/// Star relation in a fixture bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureStar {
    /// Starred message.
    pub message_id: MessageId,
    /// Owner.
    pub user_id: UserId,
}

/// Group chat join in a fixture bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureJoin {
    /// Group chat.
    pub chat_id: ChatId,
    /// Joining user.
    pub user_id: UserId,
}

/// Seed data bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForumFixture {
    /// Users.
    pub users: Vec<NewUser>,
    /// Standalone tags.
    pub tags: Vec<NewTag>,
    /// Questions.
    pub questions: Vec<NewQuestion>,
    /// Answers.
    pub answers: Vec<NewAnswer>,
    /// Question comments.
    pub comments: Vec<NewComment>,
    /// Chats.
    pub chats: Vec<NewChat>,
    /// Chat messages.
    pub messages: Vec<NewMessage>,
    /// Question votes.
    pub votes: Vec<FixtureVote>,
    /// Question views.
    pub views: Vec<FixtureQuestionUser>,
    /// Question bookmarks.
    pub bookmarks: Vec<FixtureQuestionUser>,
    /// Message stars.
    pub stars: Vec<FixtureStar>,
    /// Group chat joins.
    pub joins: Vec<FixtureJoin>,
}

/// Counts of applied and skipped fixture rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureReport {
    /// Entities created.
    pub created: u64,
    /// Relations inserted.
    pub relations: u64,
    /// Relations rejected by a guard.
    pub skipped: u64,
}

impl FixtureReport {
    /// Tallies one guarded relation.
    const fn tally(&mut self, inserted: bool) {
        if inserted {
            self.relations += 1;
        } else {
            self.skipped += 1;
        }
    }
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl ForumFixture {
    /// Parses a fixture bundle from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when the JSON is malformed.
    pub fn from_json(bytes: &[u8]) -> Result<Self, StoreError> {
        serde_json::from_slice(bytes).map_err(|err| StoreError::Invalid(err.to_string()))
    }

    /// Applies the bundle to `store`, stamping relations with `at`.
    ///
    /// Stops at the first failing row without rolling back earlier rows, so
    /// a failed load should target a fresh store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when an entity cannot be created.
    pub fn apply(self, store: &dyn ForumStore, at: Timestamp) -> Result<FixtureReport, StoreError> {
        let mut report = FixtureReport::default();
        for user in self.users {
            store.create_user(user)?;
            report.created += 1;
        }
        for tag in self.tags {
            store.ensure_tag(tag)?;
            report.created += 1;
        }
        for question in self.questions {
            store.create_question(question)?;
            report.created += 1;
        }
        for answer in self.answers {
            store.create_answer(answer)?;
            report.created += 1;
        }
        for comment in self.comments {
            store.create_comment(comment)?;
            report.created += 1;
        }
        for chat in self.chats {
            store.create_chat(chat)?;
            report.created += 1;
        }
        for message in self.messages {
            store.create_message(message)?;
            report.created += 1;
        }
        for vote in self.votes {
            let outcome = store.cast_question_vote(vote.question_id, vote.user_id, vote.vote, at)?;
            report.tally(matches!(outcome, VoteOutcome::Cast { .. }));
        }
        for view in self.views {
            let outcome = store.mark_question_viewed(view.question_id, view.user_id, at)?;
            report.tally(outcome == ViewOutcome::FirstView);
        }
        for bookmark in self.bookmarks {
            let outcome = store.bookmark_question(bookmark.question_id, bookmark.user_id)?;
            report.tally(outcome == BookmarkOutcome::Added);
        }
        for star in self.stars {
            let outcome = store.star_message(star.message_id, star.user_id)?;
            report.tally(matches!(outcome, StarOutcome::Starred { .. }));
        }
        for join in self.joins {
            let outcome = store.join_group_chat(join.chat_id, join.user_id)?;
            report.tally(outcome == JoinOutcome::Joined);
        }
        Ok(report)
    }
}
