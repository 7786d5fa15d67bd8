// crates/qa-platform-core/src/core/mod.rs
// ============================================================================
// Module: QA Platform Core Types
// Description: Forum entities, identifiers, listing plans, and paging types.
// Purpose: Provide stable, serializable types shared by stores and servers.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! Core types define the forum entities and their read views, the tag filter
//! validator, the closed set of listing plans, page requests with the page
//! envelope, and the outcomes of guarded mutations. These types are the single
//! source of truth for every store backend and for the HTTP surface.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod guards;
pub mod identifiers;
pub mod listing;
pub mod model;
pub mod paging;
pub mod time;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use guards::BookmarkOutcome;
pub use guards::JoinOutcome;
pub use guards::MAX_STARRED_MESSAGES;
pub use guards::StarOutcome;
pub use guards::UnstarOutcome;
pub use guards::ViewOutcome;
pub use guards::VoteOutcome;
pub use identifiers::AnswerId;
pub use identifiers::ChatId;
pub use identifiers::CommentId;
pub use identifiers::IdParseError;
pub use identifiers::MessageId;
pub use identifiers::MessageStarId;
pub use identifiers::NumericId;
pub use identifiers::QuestionId;
pub use identifiers::TagId;
pub use identifiers::UserId;
pub use listing::GlobalChatMessageSearch;
pub use listing::MONTH_DAYS;
pub use listing::Period;
pub use listing::QuestionComments;
pub use listing::QuestionListing;
pub use listing::QuestionQuery;
pub use listing::QuestionSort;
pub use listing::WEEK_DAYS;
pub use listing::WindowRule;
pub use listing::fold_case;
pub use model::Answer;
pub use model::Chat;
pub use model::ChatKind;
pub use model::Comment;
pub use model::CommentView;
pub use model::Message;
pub use model::MessageStar;
pub use model::MessageView;
pub use model::NewAnswer;
pub use model::NewChat;
pub use model::NewComment;
pub use model::NewMessage;
pub use model::NewQuestion;
pub use model::NewTag;
pub use model::NewUser;
pub use model::Question;
pub use model::QuestionView;
pub use model::Tag;
pub use model::User;
pub use model::VoteType;
pub use paging::PageEnvelope;
pub use paging::PageRequest;
pub use paging::PageSlice;
pub use paging::total_page_count;
pub use time::Clock;
pub use time::FixedClock;
pub use time::MILLIS_PER_DAY;
pub use time::SharedClock;
pub use time::SystemClock;
pub use time::Timestamp;
pub use time::TimestampError;
pub use validation::NO_TAG_FILTER;
pub use validation::TagFilter;
pub use validation::ValidationError;
pub use validation::tags_mapping_is_correct;
