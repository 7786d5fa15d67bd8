// crates/qa-platform-core/tests/common/mod.rs
// ============================================================================
// Module: Core Test Helpers
// Description: Shared forum builders for core integration tests.
// Purpose: Seed in-memory stores with deterministic users, questions and chats.
// Dependencies: qa-platform-core
// ============================================================================

//! ## Overview
//! Helpers build a [`ForumService`] over an [`InMemoryForumStore`] with a
//! pinned clock, plus small constructors for users, questions and messages.

#![allow(
    dead_code,
    clippy::expect_used,
    clippy::unwrap_used,
    reason = "Shared helpers are not used by every test binary."
)]

use std::sync::Arc;

use qa_platform_core::ChatId;
use qa_platform_core::ChatKind;
use qa_platform_core::ContentStore;
use qa_platform_core::FixedClock;
use qa_platform_core::ForumService;
use qa_platform_core::InMemoryForumStore;
use qa_platform_core::MessageId;
use qa_platform_core::NewAnswer;
use qa_platform_core::NewChat;
use qa_platform_core::NewComment;
use qa_platform_core::NewMessage;
use qa_platform_core::NewQuestion;
use qa_platform_core::NewTag;
use qa_platform_core::NewUser;
use qa_platform_core::PaginationConfig;
use qa_platform_core::QuestionId;
use qa_platform_core::TagId;
use qa_platform_core::Timestamp;
use qa_platform_core::UserId;

/// Fixed "now" used by every test (2023-11-14T22:13:20Z).
pub const NOW_MS: i64 = 1_700_000_000_000;

/// Returns the pinned current time.
pub fn now() -> Timestamp {
    Timestamp::from_unix_millis(NOW_MS)
}

/// Returns a time `days` days before [`now`].
pub fn days_ago(days: i64) -> Timestamp {
    now().minus_days(days)
}

/// Builds a user id.
pub fn uid(raw: u64) -> UserId {
    UserId::from_raw(raw).expect("nonzero user id")
}

/// Builds a question id.
pub fn qid(raw: u64) -> QuestionId {
    QuestionId::from_raw(raw).expect("nonzero question id")
}

/// Builds a tag id.
pub fn tid(raw: u64) -> TagId {
    TagId::from_raw(raw).expect("nonzero tag id")
}

/// Builds a chat id.
pub fn cid(raw: u64) -> ChatId {
    ChatId::from_raw(raw).expect("nonzero chat id")
}

/// Builds a message id.
pub fn mid(raw: u64) -> MessageId {
    MessageId::from_raw(raw).expect("nonzero message id")
}

/// In-memory forum with a controllable clock.
pub struct Forum {
    /// Backing store.
    pub store: InMemoryForumStore,
    /// Pinned clock.
    pub clock: FixedClock,
    /// Service over the store.
    pub service: ForumService,
}

/// Builds an empty forum pinned at [`now`].
pub fn forum() -> Forum {
    forum_with(PaginationConfig::default())
}

/// Builds an empty forum with explicit pagination limits.
pub fn forum_with(config: PaginationConfig) -> Forum {
    let store = InMemoryForumStore::new();
    let clock = FixedClock::new(now());
    let service = ForumService::new(Arc::new(store.clone()), Arc::new(clock.clone()), config);
    Forum {
        store,
        clock,
        service,
    }
}

/// Creates a user with a fixed id and reputation.
pub fn add_user(store: &dyn ContentStore, id: u64, reputation: i64) -> UserId {
    store
        .create_user(NewUser {
            id: Some(uid(id)),
            email: format!("user{id}@example.test"),
            full_name: format!("User {id}"),
            nickname: format!("nick{id}"),
            reputation,
            registered_at: days_ago(365),
        })
        .expect("create user")
        .id
}

/// Creates tags 1..=count named `tag-N`.
pub fn add_tags(store: &dyn ContentStore, count: u64) {
    for id in 1..=count {
        store
            .ensure_tag(NewTag {
                id: Some(tid(id)),
                name: format!("tag-{id}"),
                description: String::new(),
            })
            .expect("create tag");
    }
}

/// Creates a question tagged with existing `tag-N` names.
pub fn add_question(
    store: &dyn ContentStore,
    id: u64,
    author: UserId,
    tags: &[u64],
    created_at: Timestamp,
) -> QuestionId {
    store
        .create_question(NewQuestion {
            id: Some(qid(id)),
            title: format!("Question {id}"),
            description: format!("Body of question {id}"),
            author_id: author,
            created_at,
            tags: tags
                .iter()
                .map(|tag| NewTag {
                    id: None,
                    name: format!("tag-{tag}"),
                    description: String::new(),
                })
                .collect(),
        })
        .expect("create question")
}

/// Adds `count` answers to a question.
pub fn add_answers(store: &dyn ContentStore, question: QuestionId, author: UserId, count: usize) {
    for index in 0..count {
        store
            .create_answer(NewAnswer {
                id: None,
                question_id: question,
                author_id: author,
                body: format!("answer {index}"),
                created_at: now(),
            })
            .expect("create answer");
    }
}

/// Adds `count` comments to a question.
pub fn add_comments(store: &dyn ContentStore, question: QuestionId, author: UserId, count: usize) {
    for index in 0..count {
        store
            .create_comment(NewComment {
                id: None,
                question_id: question,
                author_id: author,
                text: format!("comment {index}"),
                created_at: now(),
            })
            .expect("create comment");
    }
}

/// Creates a chat with explicit members.
pub fn add_chat(store: &dyn ContentStore, id: u64, kind: ChatKind, members: &[UserId]) -> ChatId {
    store
        .create_chat(NewChat {
            id: Some(cid(id)),
            kind,
            title: format!("chat {id}"),
            members: members.to_vec(),
        })
        .expect("create chat")
        .id
}

/// Posts a message.
pub fn add_message(store: &dyn ContentStore, chat: ChatId, author: UserId, text: &str) -> MessageId {
    store
        .create_message(NewMessage {
            id: None,
            chat_id: chat,
            author_id: author,
            text: text.to_string(),
            created_at: now(),
        })
        .expect("create message")
        .id
}
