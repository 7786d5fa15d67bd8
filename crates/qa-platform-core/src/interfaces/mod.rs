// crates/qa-platform-core/src/interfaces/mod.rs
// ============================================================================
// Module: QA Platform Interfaces
// Description: Backend-agnostic store contracts for content, listings and guards.
// Purpose: Define the seams implemented by in-memory and SQLite backends.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The forum store contract is split in three:
//! - [`ContentStore`] creates and looks up entities.
//! - [`ListingStore`] counts and slices the rows selected by a listing plan.
//!   The count is taken before slicing and both calls must agree on ordering.
//! - [`GuardStore`] performs the guarded conditional inserts. Each call is
//!   atomic: the existence check and the insert can never interleave with a
//!   concurrent call for the same (subject, user) pair.
//!
//! [`ForumStore`] is the union every backend implements.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::core::BookmarkOutcome;
use crate::core::Chat;
use crate::core::ChatId;
use crate::core::CommentView;
use crate::core::GlobalChatMessageSearch;
use crate::core::JoinOutcome;
use crate::core::Message;
use crate::core::MessageId;
use crate::core::MessageStarId;
use crate::core::MessageView;
use crate::core::NewAnswer;
use crate::core::NewChat;
use crate::core::NewComment;
use crate::core::NewMessage;
use crate::core::NewQuestion;
use crate::core::NewTag;
use crate::core::NewUser;
use crate::core::PageSlice;
use crate::core::Answer;
use crate::core::CommentId;
use crate::core::QuestionComments;
use crate::core::QuestionId;
use crate::core::QuestionQuery;
use crate::core::QuestionView;
use crate::core::StarOutcome;
use crate::core::Tag;
use crate::core::Timestamp;
use crate::core::UnstarOutcome;
use crate::core::User;
use crate::core::UserId;
use crate::core::ViewOutcome;
use crate::core::VoteOutcome;
use crate::core::VoteType;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Forum store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("forum store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("forum store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("forum store version mismatch: {0}")]
    VersionMismatch(String),
    /// Input references missing rows or violates a constraint.
    #[error("forum store invalid data: {0}")]
    Invalid(String),
    /// An explicit identifier or unique key is already taken.
    #[error("forum store conflict: {0}")]
    Conflict(String),
    /// Store reported an error.
    #[error("forum store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Content Store
// ============================================================================

/// Entity creation and lookup.
pub trait ContentStore {
    /// Creates a user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when an explicit id is taken.
    fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Loads a user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Creates a tag, or returns the existing tag with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when an explicit id names another tag.
    fn ensure_tag(&self, tag: NewTag) -> Result<Tag, StoreError>;

    /// Creates a question, resolving its tags by name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when the author is unknown.
    fn create_question(&self, question: NewQuestion) -> Result<QuestionId, StoreError>;

    /// Returns true when the question exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn question_exists(&self, id: QuestionId) -> Result<bool, StoreError>;

    /// Returns the total number of questions.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when counting fails.
    fn question_count(&self) -> Result<u64, StoreError>;

    /// Loads the question view with flags for `requester`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn question_view(
        &self,
        id: QuestionId,
        requester: UserId,
    ) -> Result<Option<QuestionView>, StoreError>;

    /// Creates an answer.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when the question or author is unknown.
    fn create_answer(&self, answer: NewAnswer) -> Result<Answer, StoreError>;

    /// Creates a question comment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when the question or author is unknown.
    fn create_comment(&self, comment: NewComment) -> Result<CommentId, StoreError>;

    /// Loads a comment view.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn comment_view(&self, id: CommentId) -> Result<Option<CommentView>, StoreError>;

    /// Creates a chat with its initial members.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when a second global chat is created.
    fn create_chat(&self, chat: NewChat) -> Result<Chat, StoreError>;

    /// Loads a chat.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn chat(&self, id: ChatId) -> Result<Option<Chat>, StoreError>;

    /// Posts a message.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when the chat or author is unknown.
    fn create_message(&self, message: NewMessage) -> Result<Message, StoreError>;

    /// Loads a message.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn message(&self, id: MessageId) -> Result<Option<Message>, StoreError>;

    /// Returns the number of stars held by `user`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when counting fails.
    fn star_count(&self, user: UserId) -> Result<u64, StoreError>;

    /// Returns the vote sum of a question.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when counting fails.
    fn vote_sum(&self, question: QuestionId) -> Result<i64, StoreError>;
}

// ============================================================================
// SECTION: Listing Store
// ============================================================================

/// Count-and-slice execution of listing plans.
pub trait ListingStore {
    /// Counts questions selected by `query`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn count_questions(&self, query: &QuestionQuery) -> Result<u64, StoreError>;

    /// Fetches one ordered slice of questions selected by `query`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn fetch_questions(
        &self,
        query: &QuestionQuery,
        slice: PageSlice,
    ) -> Result<Vec<QuestionView>, StoreError>;

    /// Counts comments of a question.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn count_comments(&self, query: &QuestionComments) -> Result<u64, StoreError>;

    /// Fetches one slice of a question's comments, id ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn fetch_comments(
        &self,
        query: &QuestionComments,
        slice: PageSlice,
    ) -> Result<Vec<CommentView>, StoreError>;

    /// Counts global chat messages matching `search`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn count_messages(&self, search: &GlobalChatMessageSearch) -> Result<u64, StoreError>;

    /// Fetches one slice of matching global chat messages, id ascending.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn fetch_messages(
        &self,
        search: &GlobalChatMessageSearch,
        slice: PageSlice,
    ) -> Result<Vec<MessageView>, StoreError>;
}

// ============================================================================
// SECTION: Guard Store
// ============================================================================

/// Atomic conditional inserts gating mutation endpoints.
pub trait GuardStore {
    /// Records a vote unless `user` already voted on `question`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn cast_question_vote(
        &self,
        question: QuestionId,
        user: UserId,
        vote: VoteType,
        at: Timestamp,
    ) -> Result<VoteOutcome, StoreError>;

    /// Bookmarks `question` for `user` unless already bookmarked.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn bookmark_question(
        &self,
        question: QuestionId,
        user: UserId,
    ) -> Result<BookmarkOutcome, StoreError>;

    /// Records the first view of `question` by `user`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn mark_question_viewed(
        &self,
        question: QuestionId,
        user: UserId,
        at: Timestamp,
    ) -> Result<ViewOutcome, StoreError>;

    /// Stars `message` for `user`, enforcing membership and the star quota.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when the message is unknown.
    fn star_message(&self, message: MessageId, user: UserId) -> Result<StarOutcome, StoreError>;

    /// Deletes `star` when it belongs to `user`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn unstar_message(
        &self,
        star: MessageStarId,
        user: UserId,
    ) -> Result<UnstarOutcome, StoreError>;

    /// Adds `user` to the group chat `chat` unless already a member.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn join_group_chat(&self, chat: ChatId, user: UserId) -> Result<JoinOutcome, StoreError>;
}

// ============================================================================
// SECTION: Forum Store
// ============================================================================

/// Complete forum backend.
pub trait ForumStore: ContentStore + ListingStore + GuardStore + Send + Sync {}

impl<T> ForumStore for T where T: ContentStore + ListingStore + GuardStore + Send + Sync {}

/// Shared forum backend handle.
pub type SharedForumStore = Arc<dyn ForumStore>;
