// crates/qa-platform-core/src/core/model.rs
// ============================================================================
// Module: QA Platform Domain Model
// Description: Forum entities, creation payloads, and read views.
// Purpose: Define the records exchanged between stores, services and the wire.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Entities mirror the persisted rows (users, tags, questions, answers,
//! comments, chats, messages, stars). Creation payloads (`New*`) optionally
//! carry an explicit identifier so fixtures can pin ids; stores allocate one
//! otherwise. Read views (`*View`) are the wire shapes returned by listing
//! and detail endpoints and serialize with camelCase field names.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::AnswerId;
use crate::core::identifiers::ChatId;
use crate::core::identifiers::CommentId;
use crate::core::identifiers::MessageId;
use crate::core::identifiers::MessageStarId;
use crate::core::identifiers::QuestionId;
use crate::core::identifiers::TagId;
use crate::core::identifiers::UserId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Users and Tags
// ============================================================================

/// Registered forum user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Chat nickname.
    pub nickname: String,
    /// Accumulated reputation.
    pub reputation: i64,
    /// Registration time.
    pub registered_at: Timestamp,
}

/// Payload for creating a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Optional explicit identifier.
    #[serde(default)]
    pub id: Option<UserId>,
    /// Login email.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Chat nickname.
    #[serde(default)]
    pub nickname: String,
    /// Initial reputation.
    #[serde(default)]
    pub reputation: i64,
    /// Registration time.
    pub registered_at: Timestamp,
}

/// Question tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Tag identifier.
    pub id: TagId,
    /// Unique tag name.
    pub name: String,
    /// Free-form description.
    pub description: String,
}

/// Payload for creating (or resolving by name) a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTag {
    /// Optional explicit identifier.
    #[serde(default)]
    pub id: Option<TagId>,
    /// Unique tag name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
}

// ============================================================================
// SECTION: Questions, Answers, Comments
// ============================================================================

/// Persisted question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Question identifier.
    pub id: QuestionId,
    /// Title line.
    pub title: String,
    /// Body text.
    pub description: String,
    /// Author.
    pub author_id: UserId,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last modification time.
    pub updated_at: Timestamp,
    /// Attached tags.
    pub tag_ids: Vec<TagId>,
}

/// Payload for creating a question.
///
/// # Invariants
/// - `tags` is resolved by name; unknown names are created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    /// Optional explicit identifier.
    #[serde(default)]
    pub id: Option<QuestionId>,
    /// Title line.
    pub title: String,
    /// Body text.
    pub description: String,
    /// Author.
    pub author_id: UserId,
    /// Creation time.
    pub created_at: Timestamp,
    /// Tags to attach.
    pub tags: Vec<NewTag>,
}

/// Persisted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    /// Answer identifier.
    pub id: AnswerId,
    /// Answered question.
    pub question_id: QuestionId,
    /// Author.
    pub author_id: UserId,
    /// Body text.
    pub body: String,
    /// Creation time.
    pub created_at: Timestamp,
}

/// Payload for creating an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnswer {
    /// Optional explicit identifier.
    #[serde(default)]
    pub id: Option<AnswerId>,
    /// Answered question.
    pub question_id: QuestionId,
    /// Author.
    pub author_id: UserId,
    /// Body text.
    pub body: String,
    /// Creation time.
    pub created_at: Timestamp,
}

/// Persisted question comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Comment identifier.
    pub id: CommentId,
    /// Commented question.
    pub question_id: QuestionId,
    /// Author.
    pub author_id: UserId,
    /// Comment text.
    pub text: String,
    /// Creation time.
    pub created_at: Timestamp,
}

/// Payload for creating a question comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    /// Optional explicit identifier.
    #[serde(default)]
    pub id: Option<CommentId>,
    /// Commented question.
    pub question_id: QuestionId,
    /// Author.
    pub author_id: UserId,
    /// Comment text.
    pub text: String,
    /// Creation time.
    pub created_at: Timestamp,
}

// ============================================================================
// SECTION: Chats and Messages
// ============================================================================

/// Chat kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    /// Two-party chat.
    Single,
    /// Invite/join group chat.
    Group,
    /// The site-wide chat every user belongs to.
    Global,
}

impl ChatKind {
    /// Returns the canonical storage label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Group => "group",
            Self::Global => "global",
        }
    }

    /// Parses a storage label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "single" => Some(Self::Single),
            "group" => Some(Self::Group),
            "global" => Some(Self::Global),
            _ => None,
        }
    }
}

/// Persisted chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    /// Chat identifier.
    pub id: ChatId,
    /// Chat kind.
    pub kind: ChatKind,
    /// Chat title.
    pub title: String,
}

/// Payload for creating a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChat {
    /// Optional explicit identifier.
    #[serde(default)]
    pub id: Option<ChatId>,
    /// Chat kind.
    pub kind: ChatKind,
    /// Chat title.
    #[serde(default)]
    pub title: String,
    /// Initial members (ignored for the global chat).
    #[serde(default)]
    pub members: Vec<UserId>,
}

/// Persisted chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message identifier.
    pub id: MessageId,
    /// Owning chat.
    pub chat_id: ChatId,
    /// Author.
    pub author_id: UserId,
    /// Message text.
    pub text: String,
    /// Creation time.
    pub created_at: Timestamp,
}

/// Payload for posting a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    /// Optional explicit identifier.
    #[serde(default)]
    pub id: Option<MessageId>,
    /// Owning chat.
    pub chat_id: ChatId,
    /// Author.
    pub author_id: UserId,
    /// Message text.
    pub text: String,
    /// Creation time.
    pub created_at: Timestamp,
}

/// Starred message marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStar {
    /// Star identifier.
    pub id: MessageStarId,
    /// Owning user.
    pub user_id: UserId,
    /// Starred message.
    pub message_id: MessageId,
}

// ============================================================================
// SECTION: Votes
// ============================================================================

/// Vote direction on a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteType {
    /// Up vote (+1).
    UpVote,
    /// Down vote (-1).
    DownVote,
}

impl VoteType {
    /// Returns the signed weight of the vote.
    #[must_use]
    pub const fn weight(self) -> i64 {
        match self {
            Self::UpVote => 1,
            Self::DownVote => -1,
        }
    }

    /// Returns the canonical storage label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::UpVote => "up",
            Self::DownVote => "down",
        }
    }

    /// Parses a storage label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "up" => Some(Self::UpVote),
            "down" => Some(Self::DownVote),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Read Views
// ============================================================================

/// Question listing/detail item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    /// Question identifier.
    pub id: QuestionId,
    /// Title line.
    pub title: String,
    /// Body text.
    pub description: String,
    /// Author identifier.
    pub author_id: UserId,
    /// Author display name.
    pub author_name: String,
    /// Author reputation.
    pub author_reputation: i64,
    /// Number of distinct viewers.
    pub view_count: u64,
    /// Number of answers.
    pub count_answer: u64,
    /// Up votes minus down votes.
    pub count_valuable: i64,
    /// Creation time.
    pub persist_date_time: Timestamp,
    /// Last modification time.
    pub last_update_date_time: Timestamp,
    /// Attached tags ordered by id.
    pub list_tag_dto: Vec<Tag>,
    /// Whether the requester bookmarked the question.
    pub is_user_bookmark: bool,
    /// Whether the requester viewed the question.
    pub is_user_viewed: bool,
    /// The requester's vote, if any.
    pub user_vote: Option<VoteType>,
}

impl QuestionView {
    /// Returns the composite popularity score (votes + answers + views).
    #[must_use]
    pub fn popularity_score(&self) -> i64 {
        let answers = i64::try_from(self.count_answer).unwrap_or(i64::MAX);
        let views = i64::try_from(self.view_count).unwrap_or(i64::MAX);
        self.count_valuable.saturating_add(answers).saturating_add(views)
    }
}

/// Question comment listing item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    /// Comment identifier.
    pub id: CommentId,
    /// Commented question.
    pub question_id: QuestionId,
    /// Comment text.
    pub comment: String,
    /// Author identifier.
    pub user_id: UserId,
    /// Author display name.
    pub full_name: String,
    /// Author reputation.
    pub reputation: i64,
    /// Creation time.
    pub persist_date: Timestamp,
}

/// Chat message listing item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    /// Message identifier.
    pub id: MessageId,
    /// Owning chat.
    pub chat_id: ChatId,
    /// Message text.
    pub message: String,
    /// Author identifier.
    pub user_id: UserId,
    /// Author nickname.
    pub nickname: String,
    /// Creation time.
    pub persist_date: Timestamp,
}
