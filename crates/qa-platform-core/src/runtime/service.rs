// crates/qa-platform-core/src/runtime/service.rs
// ============================================================================
// Module: QA Platform Forum Service
// Description: Request-scoped orchestration of listings and guarded mutations.
// Purpose: Apply existence checks and guards in one place for every surface.
// Dependencies: crate::{core, interfaces, runtime}, thiserror
// ============================================================================

//! ## Overview
//! [`ForumService`] is what the HTTP surface calls. Every operation takes the
//! requester explicitly; there is no ambient "current user". Mutations follow
//! the same order: reject malformed input, check that the subject exists
//! (otherwise [`ServiceError::NotFound`]), then hand the guarded insert to the
//! store and return its outcome.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::BookmarkOutcome;
use crate::core::ChatId;
use crate::core::CommentView;
use crate::core::GlobalChatMessageSearch;
use crate::core::JoinOutcome;
use crate::core::MessageId;
use crate::core::MessageStarId;
use crate::core::MessageView;
use crate::core::NewComment;
use crate::core::NewQuestion;
use crate::core::NewTag;
use crate::core::PageEnvelope;
use crate::core::PageRequest;
use crate::core::QuestionComments;
use crate::core::QuestionId;
use crate::core::QuestionListing;
use crate::core::QuestionView;
use crate::core::SharedClock;
use crate::core::StarOutcome;
use crate::core::UnstarOutcome;
use crate::core::UserId;
use crate::core::ValidationError;
use crate::core::ViewOutcome;
use crate::core::VoteOutcome;
use crate::core::VoteType;
use crate::interfaces::SharedForumStore;
use crate::interfaces::StoreError;
use crate::runtime::engine::PaginationConfig;
use crate::runtime::engine::PaginationEngine;
use crate::runtime::engine::QuestionPageRequest;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Forum service failures.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Request input was rejected before touching the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The addressed entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind.
        entity: &'static str,
        /// Requested identifier.
        id: u64,
    },
    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Builds a [`ServiceError::NotFound`].
    #[must_use]
    pub const fn not_found(entity: &'static str, id: u64) -> Self {
        Self::NotFound {
            entity,
            id,
        }
    }
}

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Payload for asking a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskQuestion {
    /// Title line.
    pub title: String,
    /// Body text.
    pub description: String,
    /// Tags resolved by name.
    pub tags: Vec<NewTag>,
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Forum operations shared by every API surface.
#[derive(Clone)]
pub struct ForumService {
    /// Backing store.
    store: SharedForumStore,
    /// Time source for creation, vote and view timestamps.
    clock: SharedClock,
    /// Listing executor.
    engine: PaginationEngine,
}

impl ForumService {
    /// Creates a forum service.
    #[must_use]
    pub fn new(store: SharedForumStore, clock: SharedClock, config: PaginationConfig) -> Self {
        let engine = PaginationEngine::new(store.clone(), clock.clone(), config);
        Self {
            store,
            clock,
            engine,
        }
    }

    /// Returns the pagination limits.
    #[must_use]
    pub const fn pagination(&self) -> &PaginationConfig {
        self.engine.config()
    }

    /// Returns the backing store.
    #[must_use]
    pub const fn store(&self) -> &SharedForumStore {
        &self.store
    }

    // ------------------------------------------------------------------------
    // Questions
    // ------------------------------------------------------------------------

    /// Returns one page of a question listing.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] when validation or the store fails.
    pub fn list_questions(
        &self,
        listing: QuestionListing,
        request: &QuestionPageRequest,
    ) -> Result<PageEnvelope<QuestionView>, ServiceError> {
        self.engine.question_page(listing, request)
    }

    /// Returns the total number of questions.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] when counting fails.
    pub fn question_count(&self) -> Result<u64, ServiceError> {
        Ok(self.store.question_count()?)
    }

    /// Loads a question as seen by `requester`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for unknown questions.
    pub fn question(
        &self,
        question: QuestionId,
        requester: UserId,
    ) -> Result<QuestionView, ServiceError> {
        self.store
            .question_view(question, requester)?
            .ok_or_else(|| ServiceError::not_found("question", question.get()))
    }

    /// Creates a question authored by `requester`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for blank fields, a missing tag
    /// list, or an unknown requester.
    pub fn ask_question(
        &self,
        requester: UserId,
        ask: AskQuestion,
    ) -> Result<QuestionView, ServiceError> {
        if ask.title.trim().is_empty() {
            return Err(ValidationError::invalid("title", "must not be blank").into());
        }
        if ask.description.trim().is_empty() {
            return Err(ValidationError::invalid("description", "must not be blank").into());
        }
        if ask.tags.is_empty() {
            return Err(ValidationError::invalid("tags", "at least one tag is required").into());
        }
        if ask.tags.iter().any(|tag| tag.name.trim().is_empty()) {
            return Err(ValidationError::invalid("tags", "tag names must not be blank").into());
        }
        self.require_requester(requester)?;
        let id = self.store.create_question(NewQuestion {
            id: None,
            title: ask.title,
            description: ask.description,
            author_id: requester,
            created_at: self.clock.now(),
            tags: ask.tags,
        })?;
        self.question(id, requester)
    }

    /// Casts `requester`'s vote on a question.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for unknown questions.
    pub fn vote(
        &self,
        question: QuestionId,
        requester: UserId,
        vote: VoteType,
    ) -> Result<VoteOutcome, ServiceError> {
        self.require_question(question)?;
        self.require_requester(requester)?;
        Ok(self.store.cast_question_vote(question, requester, vote, self.clock.now())?)
    }

    /// Bookmarks a question for `requester`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for unknown questions.
    pub fn bookmark(
        &self,
        question: QuestionId,
        requester: UserId,
    ) -> Result<BookmarkOutcome, ServiceError> {
        self.require_question(question)?;
        self.require_requester(requester)?;
        Ok(self.store.bookmark_question(question, requester)?)
    }

    /// Records `requester`'s first view of a question.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for unknown questions.
    pub fn view(
        &self,
        question: QuestionId,
        requester: UserId,
    ) -> Result<ViewOutcome, ServiceError> {
        self.require_question(question)?;
        self.require_requester(requester)?;
        Ok(self.store.mark_question_viewed(question, requester, self.clock.now())?)
    }

    // ------------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------------

    /// Returns one page of a question's comments.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for unknown questions.
    pub fn question_comments(
        &self,
        question: QuestionId,
        page: PageRequest,
    ) -> Result<PageEnvelope<CommentView>, ServiceError> {
        self.require_question(question)?;
        self.engine.comment_page(
            &QuestionComments {
                question_id: question,
            },
            page,
        )
    }

    /// Adds a comment by `requester` to a question.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for empty text and
    /// [`ServiceError::NotFound`] for unknown questions.
    pub fn add_comment(
        &self,
        question: QuestionId,
        requester: UserId,
        text: &str,
    ) -> Result<CommentView, ServiceError> {
        if text.trim().is_empty() {
            return Err(ValidationError::invalid("comment", "must not be empty").into());
        }
        self.require_question(question)?;
        self.require_requester(requester)?;
        let id = self.store.create_comment(NewComment {
            id: None,
            question_id: question,
            author_id: requester,
            text: text.to_string(),
            created_at: self.clock.now(),
        })?;
        self.store
            .comment_view(id)?
            .ok_or_else(|| StoreError::Corrupt(format!("comment {id} vanished after insert")).into())
    }

    // ------------------------------------------------------------------------
    // Messages and Chats
    // ------------------------------------------------------------------------

    /// Returns one page of global chat messages containing `text`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] for blank text.
    pub fn search_global_messages(
        &self,
        text: &str,
        page: PageRequest,
    ) -> Result<PageEnvelope<MessageView>, ServiceError> {
        let search = GlobalChatMessageSearch::new(text)?;
        self.engine.message_search_page(&search, page)
    }

    /// Stars a message for `requester`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for unknown messages.
    pub fn star_message(
        &self,
        message: MessageId,
        requester: UserId,
    ) -> Result<StarOutcome, ServiceError> {
        if self.store.message(message)?.is_none() {
            return Err(ServiceError::not_found("message", message.get()));
        }
        self.require_requester(requester)?;
        Ok(self.store.star_message(message, requester)?)
    }

    /// Deletes one of `requester`'s stars.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotFound`] for unknown stars.
    pub fn unstar_message(
        &self,
        star: MessageStarId,
        requester: UserId,
    ) -> Result<UnstarOutcome, ServiceError> {
        match self.store.unstar_message(star, requester)? {
            UnstarOutcome::NotFound => Err(ServiceError::not_found("message star", star.get())),
            outcome => Ok(outcome),
        }
    }

    /// Adds `user` to a group chat.
    ///
    /// Unknown users and chats are outcomes, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] when the store fails.
    pub fn join_group_chat(&self, chat: ChatId, user: UserId) -> Result<JoinOutcome, ServiceError> {
        Ok(self.store.join_group_chat(chat, user)?)
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Fails with [`ServiceError::NotFound`] for unknown questions.
    fn require_question(&self, question: QuestionId) -> Result<(), ServiceError> {
        if self.store.question_exists(question)? {
            Ok(())
        } else {
            Err(ServiceError::not_found("question", question.get()))
        }
    }

    /// Fails with a validation error when the requester is not a stored user.
    fn require_requester(&self, requester: UserId) -> Result<(), ServiceError> {
        if self.store.user(requester)?.is_some() {
            Ok(())
        } else {
            Err(ValidationError::invalid("requester", format!("user {requester} is not registered"))
                .into())
        }
    }
}
