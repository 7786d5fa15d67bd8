// crates/qa-platform-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Forum Store Tests
// Description: Integration tests for the SQLite forum store.
// Purpose: Validate path safety, schema versioning, listing parity with the
//          in-memory store, guard idempotence and concurrency.
// Dependencies: qa-platform-core, qa-platform-store-sqlite, rusqlite, tempfile
// ============================================================================

//! ## Overview
//! - Path checks and schema version validation
//! - Listing results identical to [`InMemoryForumStore`] for every variant
//! - Star, join, vote and bookmark guards, including concurrent duplicates
//! - Persistence across reopen

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use qa_platform_core::BookmarkOutcome;
use qa_platform_core::ChatId;
use qa_platform_core::ChatKind;
use qa_platform_core::ContentStore;
use qa_platform_core::ForumStore;
use qa_platform_core::GlobalChatMessageSearch;
use qa_platform_core::GuardStore;
use qa_platform_core::InMemoryForumStore;
use qa_platform_core::JoinOutcome;
use qa_platform_core::ListingStore;
use qa_platform_core::MessageId;
use qa_platform_core::MessageStarId;
use qa_platform_core::NewChat;
use qa_platform_core::NewMessage;
use qa_platform_core::NewQuestion;
use qa_platform_core::NewTag;
use qa_platform_core::NewUser;
use qa_platform_core::PageSlice;
use qa_platform_core::Period;
use qa_platform_core::QuestionComments;
use qa_platform_core::QuestionId;
use qa_platform_core::QuestionListing;
use qa_platform_core::QuestionQuery;
use qa_platform_core::StarOutcome;
use qa_platform_core::StoreError;
use qa_platform_core::TagFilter;
use qa_platform_core::Timestamp;
use qa_platform_core::UnstarOutcome;
use qa_platform_core::UserId;
use qa_platform_core::ViewOutcome;
use qa_platform_core::VoteOutcome;
use qa_platform_core::VoteType;
use qa_platform_store_sqlite::SqliteForumStore;
use qa_platform_store_sqlite::SqliteStoreConfig;
use qa_platform_store_sqlite::SqliteStoreError;
use qa_platform_store_sqlite::SqliteStoreMode;
use qa_platform_store_sqlite::SqliteSyncMode;
use rusqlite::Connection;
use rusqlite::params;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const NOW_MS: i64 = 1_700_000_000_000;

fn now() -> Timestamp {
    Timestamp::from_unix_millis(NOW_MS)
}

fn days_ago(days: i64) -> Timestamp {
    now().minus_days(days)
}

fn uid(raw: u64) -> UserId {
    UserId::from_raw(raw).expect("nonzero user id")
}

fn qid(raw: u64) -> QuestionId {
    QuestionId::from_raw(raw).expect("nonzero question id")
}

fn cid(raw: u64) -> ChatId {
    ChatId::from_raw(raw).expect("nonzero chat id")
}

fn open_store(dir: &TempDir) -> SqliteForumStore {
    SqliteForumStore::new(SqliteStoreConfig::at(dir.path().join("forum.sqlite")))
        .expect("open sqlite store")
}

fn add_user(store: &dyn ForumStore, id: u64, reputation: i64) {
    store
        .create_user(NewUser {
            id: Some(uid(id)),
            email: format!("user{id}@example.test"),
            full_name: format!("User {id}"),
            nickname: format!("nick{id}"),
            reputation,
            registered_at: days_ago(365),
        })
        .expect("create user");
}

fn add_question(store: &dyn ForumStore, id: u64, author: u64, tags: &[&str], days: i64) {
    store
        .create_question(NewQuestion {
            id: Some(qid(id)),
            title: format!("Question {id}"),
            description: format!("Body {id}"),
            author_id: uid(author),
            created_at: days_ago(days),
            tags: tags
                .iter()
                .map(|name| NewTag {
                    id: None,
                    name: (*name).to_string(),
                    description: String::new(),
                })
                .collect(),
        })
        .expect("create question");
}

fn add_chat(store: &dyn ForumStore, id: u64, kind: ChatKind, members: &[u64]) -> ChatId {
    store
        .create_chat(NewChat {
            id: Some(cid(id)),
            kind,
            title: format!("chat {id}"),
            members: members.iter().copied().map(uid).collect(),
        })
        .expect("create chat")
        .id
}

fn add_message(store: &dyn ForumStore, chat: ChatId, author: u64, text: &str) -> MessageId {
    store
        .create_message(NewMessage {
            id: None,
            chat_id: chat,
            author_id: uid(author),
            text: text.to_string(),
            created_at: now(),
        })
        .expect("create message")
        .id
}

/// Seeds the same forum into any store.
fn seed(store: &dyn ForumStore) {
    add_user(store, 1, 10);
    add_user(store, 2, 30);
    add_user(store, 3, 50);
    for extra in 4..=6 {
        add_user(store, extra, 0);
    }
    add_question(store, 1, 1, &["rust"], 2);
    add_question(store, 2, 3, &["sql"], 10);
    add_question(store, 3, 2, &["rust", "async"], 40);
    add_question(store, 4, 1, &["async"], 0);
    add_question(store, 5, 3, &[], 100);
    add_question(store, 6, 2, &["sql", "rust"], 5);

    for (question, user, vote) in [
        (1, 4, VoteType::UpVote),
        (2, 4, VoteType::UpVote),
        (2, 5, VoteType::UpVote),
        (3, 4, VoteType::DownVote),
        (5, 4, VoteType::UpVote),
        (6, 5, VoteType::DownVote),
        (6, 6, VoteType::DownVote),
    ] {
        store.cast_question_vote(qid(question), uid(user), vote, now()).expect("vote");
    }
    for (question, user) in [(1, 4), (3, 4), (3, 5), (3, 6), (5, 4), (6, 1)] {
        store.mark_question_viewed(qid(question), uid(user), now()).expect("view");
    }
    for (question, user) in [(2, 1), (6, 1)] {
        store.bookmark_question(qid(question), uid(user)).expect("bookmark");
    }
    for question in [2, 4, 4] {
        store
            .create_answer(qa_platform_core::NewAnswer {
                id: None,
                question_id: qid(question),
                author_id: uid(6),
                body: "answer".to_string(),
                created_at: now(),
            })
            .expect("answer");
    }
    for index in 0..4 {
        store
            .create_comment(qa_platform_core::NewComment {
                id: None,
                question_id: qid(3),
                author_id: uid(index % 2 + 1),
                text: format!("comment {index}"),
                created_at: now(),
            })
            .expect("comment");
    }
    let global = add_chat(store, 1, ChatKind::Global, &[]);
    let group = add_chat(store, 2, ChatKind::Group, &[1, 2]);
    add_message(store, global, 1, "Hello World");
    add_message(store, group, 1, "hello world in a group");
    add_message(store, global, 2, "HELLO again, world");
    add_message(store, global, 3, "100% sure_thing");
    add_message(store, global, 2, "Привет мир");
    add_message(store, global, 3, "Straße GRÜN");
}

/// Summary of a listed question used for backend comparison.
type Row = (QuestionId, i64, u64, u64, Vec<String>, bool, bool, Option<VoteType>);

fn rows(store: &dyn ForumStore, query: &QuestionQuery, slice: PageSlice) -> (u64, Vec<Row>) {
    let total = store.count_questions(query).expect("count");
    let items = store
        .fetch_questions(query, slice)
        .expect("fetch")
        .into_iter()
        .map(|view| {
            (
                view.id,
                view.count_valuable,
                view.count_answer,
                view.view_count,
                view.list_tag_dto.into_iter().map(|tag| tag.name).collect(),
                view.is_user_bookmark,
                view.is_user_viewed,
                view.user_vote,
            )
        })
        .collect();
    (total, items)
}

fn filters() -> Vec<TagFilter> {
    vec![
        TagFilter::none(),
        TagFilter::from_raw(&[1], &[]).unwrap(),
        TagFilter::from_raw(&[1, 2], &[3]).unwrap(),
        TagFilter::from_raw(&[], &[2]).unwrap(),
    ]
}

// ============================================================================
// SECTION: Path and Schema
// ============================================================================

#[test]
fn sqlite_store_rejects_directory_path() {
    let dir = TempDir::new().unwrap();
    let result = SqliteForumStore::new(SqliteStoreConfig::at(dir.path()));
    assert!(matches!(result, Err(SqliteStoreError::Invalid(_))));
}

#[test]
fn sqlite_store_rejects_overlong_component() {
    let dir = TempDir::new().unwrap();
    let long = "a".repeat(300);
    let result = SqliteForumStore::new(SqliteStoreConfig::at(dir.path().join(long)));
    assert!(matches!(result, Err(SqliteStoreError::Invalid(_))));
}

#[test]
fn sqlite_store_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("forum.sqlite");
    let store = SqliteForumStore::new(SqliteStoreConfig {
        path: path.clone(),
        busy_timeout_ms: 1_000,
        journal_mode: SqliteStoreMode::Delete,
        sync_mode: SqliteSyncMode::Normal,
    })
    .unwrap();
    assert!(path.exists());
    assert_eq!(store.config().journal_mode, SqliteStoreMode::Delete);
}

#[test]
fn sqlite_store_rejects_unknown_schema_version() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("forum.sqlite");
    drop(SqliteForumStore::new(SqliteStoreConfig::at(&path)).unwrap());
    let connection = Connection::open(&path).unwrap();
    connection.execute("UPDATE store_meta SET version = ?1", params![99]).unwrap();
    drop(connection);
    let result = SqliteForumStore::new(SqliteStoreConfig::at(&path));
    assert!(matches!(result, Err(SqliteStoreError::VersionMismatch(_))));
}

#[test]
fn sqlite_store_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = open_store(&dir);
        seed(&store);
    }
    let store = open_store(&dir);
    assert_eq!(store.question_count().unwrap(), 6);
    assert_eq!(store.vote_sum(qid(2)).unwrap(), 2);
    assert_eq!(
        store.cast_question_vote(qid(2), uid(4), VoteType::DownVote, now()).unwrap(),
        VoteOutcome::AlreadyVoted
    );
    let view = store.question_view(qid(3), uid(4)).unwrap().unwrap();
    assert_eq!(view.view_count, 3);
    assert!(view.is_user_viewed);
    assert_eq!(view.user_vote, Some(VoteType::DownVote));
    assert_eq!(view.author_name, "User 2");
    assert_eq!(view.author_reputation, 30);
}

// ============================================================================
// SECTION: Entity Creation
// ============================================================================

#[test]
fn sqlite_store_rejects_duplicate_explicit_ids() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    add_user(&store, 1, 0);
    let duplicate = store.create_user(NewUser {
        id: Some(uid(1)),
        email: "other@example.test".to_string(),
        full_name: "Other".to_string(),
        nickname: "other".to_string(),
        reputation: 0,
        registered_at: now(),
    });
    assert!(matches!(duplicate, Err(StoreError::Conflict(_))));
}

#[test]
fn sqlite_store_requires_question_author() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let result = store.create_question(NewQuestion {
        id: None,
        title: "t".to_string(),
        description: "d".to_string(),
        author_id: uid(9),
        created_at: now(),
        tags: Vec::new(),
    });
    assert!(matches!(result, Err(StoreError::Invalid(_))));
}

#[test]
fn sqlite_store_resolves_tags_by_name() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    add_user(&store, 1, 0);
    add_question(&store, 1, 1, &["rust", "sql"], 0);
    add_question(&store, 2, 1, &["sql"], 0);
    let first = store.question_view(qid(1), uid(1)).unwrap().unwrap();
    let second = store.question_view(qid(2), uid(1)).unwrap().unwrap();
    let sql_first = first.list_tag_dto.iter().find(|tag| tag.name == "sql").unwrap();
    assert_eq!(second.list_tag_dto[0].id, sql_first.id);
}

#[test]
fn sqlite_store_allows_single_global_chat() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    add_user(&store, 1, 0);
    add_chat(&store, 1, ChatKind::Global, &[]);
    let second = store.create_chat(NewChat {
        id: None,
        kind: ChatKind::Global,
        title: "again".to_string(),
        members: Vec::new(),
    });
    assert!(matches!(second, Err(StoreError::Conflict(_))));
    assert_eq!(store.chat(cid(1)).unwrap().unwrap().kind, ChatKind::Global);
}

// ============================================================================
// SECTION: Listing Parity
// ============================================================================

#[test]
fn sqlite_listings_match_in_memory_store() {
    let dir = TempDir::new().unwrap();
    let sqlite = open_store(&dir);
    let memory = InMemoryForumStore::new();
    seed(&sqlite);
    seed(&memory);
    let slice = PageSlice {
        offset: 0,
        limit: 100,
    };
    for listing in QuestionListing::ALL {
        for period in [Period::All, Period::Week, Period::Month] {
            for tags in filters() {
                for requester in [uid(1), uid(4)] {
                    let query = listing.plan(tags.clone(), period, requester, now());
                    assert_eq!(
                        rows(&sqlite, &query, slice),
                        rows(&memory, &query, slice),
                        "listing {} period {period:?}",
                        listing.label()
                    );
                }
            }
        }
    }
}

#[test]
fn sqlite_comment_and_message_pages_match_in_memory_store() {
    let dir = TempDir::new().unwrap();
    let sqlite = open_store(&dir);
    let memory = InMemoryForumStore::new();
    seed(&sqlite);
    seed(&memory);
    let slice = PageSlice {
        offset: 1,
        limit: 2,
    };
    let comments = QuestionComments {
        question_id: qid(3),
    };
    assert_eq!(sqlite.count_comments(&comments).unwrap(), 4);
    assert_eq!(
        sqlite.fetch_comments(&comments, slice).unwrap(),
        memory.fetch_comments(&comments, slice).unwrap()
    );
    for needle in ["hello", "WORLD", "%", "_", "nothing", "привет", "МИР", "grün", "STRASSE"] {
        let search = GlobalChatMessageSearch::new(needle).unwrap();
        assert_eq!(
            sqlite.count_messages(&search).unwrap(),
            memory.count_messages(&search).unwrap(),
            "needle {needle}"
        );
        assert_eq!(
            sqlite.fetch_messages(&search, slice).unwrap(),
            memory.fetch_messages(&search, slice).unwrap(),
            "needle {needle}"
        );
    }
    for needle in ["привет", "МИР", "grün"] {
        let search = GlobalChatMessageSearch::new(needle).unwrap();
        assert_eq!(sqlite.count_messages(&search).unwrap(), 1, "needle {needle}");
    }
}

#[test]
fn sqlite_message_search_excludes_non_global_chats() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    seed(&store);
    let search = GlobalChatMessageSearch::new("hello").unwrap();
    let found = store
        .fetch_messages(
            &search,
            PageSlice {
                offset: 0,
                limit: 10,
            },
        )
        .unwrap();
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|message| message.chat_id == cid(1)));
    assert_eq!(found[0].nickname, "nick1");
}

proptest! {
    #[test]
    fn sqlite_pages_partition_listing(limit in 1_u64..8) {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        seed(&store);
        let query = QuestionListing::NewestFirst.plan(TagFilter::none(), Period::All, uid(1), now());
        let (total, all) = rows(&store, &query, PageSlice { offset: 0, limit: 100 });
        let mut paged = Vec::new();
        let mut offset = 0;
        while offset < total {
            let (_, page) = rows(&store, &query, PageSlice { offset, limit });
            prop_assert!(u64::try_from(page.len()).unwrap() <= limit);
            paged.extend(page);
            offset += limit;
        }
        prop_assert_eq!(paged, all);
    }
}

// ============================================================================
// SECTION: Guards
// ============================================================================

#[test]
fn sqlite_star_guard_enforces_membership_duplicates_and_quota() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    for id in 1..=3 {
        add_user(&store, id, 0);
    }
    let global = add_chat(&store, 1, ChatKind::Global, &[]);
    let group = add_chat(&store, 2, ChatKind::Group, &[1]);
    let private = add_message(&store, group, 1, "members only");
    assert_eq!(store.star_message(private, uid(2)).unwrap(), StarOutcome::NotChatMember);

    let messages: Vec<MessageId> =
        (0..4).map(|index| add_message(&store, global, 3, &format!("m{index}"))).collect();
    assert!(matches!(store.star_message(messages[0], uid(2)).unwrap(), StarOutcome::Starred { .. }));
    assert_eq!(store.star_message(messages[0], uid(2)).unwrap(), StarOutcome::AlreadyStarred);
    store.star_message(messages[1], uid(2)).unwrap();
    store.star_message(messages[2], uid(2)).unwrap();
    assert_eq!(store.star_count(uid(2)).unwrap(), 3);
    assert_eq!(store.star_message(messages[3], uid(2)).unwrap(), StarOutcome::QuotaExceeded);
    assert_eq!(store.star_count(uid(2)).unwrap(), 3);

    let unknown = MessageId::from_raw(999).unwrap();
    assert!(matches!(store.star_message(unknown, uid(2)), Err(StoreError::Invalid(_))));
}

#[test]
fn sqlite_unstar_checks_owner() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    add_user(&store, 1, 0);
    add_user(&store, 2, 0);
    let global = add_chat(&store, 1, ChatKind::Global, &[]);
    let message = add_message(&store, global, 1, "star me");
    let StarOutcome::Starred {
        star_id,
    } = store.star_message(message, uid(1)).unwrap()
    else {
        panic!("expected a new star");
    };
    assert_eq!(store.unstar_message(star_id, uid(2)).unwrap(), UnstarOutcome::NotOwner);
    assert_eq!(store.unstar_message(star_id, uid(1)).unwrap(), UnstarOutcome::Deleted);
    assert_eq!(store.unstar_message(star_id, uid(1)).unwrap(), UnstarOutcome::NotFound);
    let missing = MessageStarId::from_raw(77).unwrap();
    assert_eq!(store.unstar_message(missing, uid(1)).unwrap(), UnstarOutcome::NotFound);
}

#[test]
fn sqlite_join_reports_each_outcome() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    add_user(&store, 1, 0);
    add_user(&store, 2, 0);
    let group = add_chat(&store, 1, ChatKind::Group, &[1]);
    let single = add_chat(&store, 2, ChatKind::Single, &[1, 2]);
    assert_eq!(store.join_group_chat(group, uid(9)).unwrap(), JoinOutcome::UserNotFound);
    assert_eq!(store.join_group_chat(cid(50), uid(2)).unwrap(), JoinOutcome::ChatNotFound);
    assert_eq!(store.join_group_chat(single, uid(2)).unwrap(), JoinOutcome::ChatNotFound);
    assert_eq!(store.join_group_chat(group, uid(1)).unwrap(), JoinOutcome::AlreadyMember);
    assert_eq!(store.join_group_chat(group, uid(2)).unwrap(), JoinOutcome::Joined);
    assert_eq!(store.join_group_chat(group, uid(2)).unwrap(), JoinOutcome::AlreadyMember);
}

#[test]
fn sqlite_bookmark_and_view_are_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    add_user(&store, 1, 0);
    add_question(&store, 1, 1, &["rust"], 0);
    assert_eq!(store.bookmark_question(qid(1), uid(1)).unwrap(), BookmarkOutcome::Added);
    assert_eq!(
        store.bookmark_question(qid(1), uid(1)).unwrap(),
        BookmarkOutcome::AlreadyBookmarked
    );
    assert_eq!(store.mark_question_viewed(qid(1), uid(1), now()).unwrap(), ViewOutcome::FirstView);
    assert_eq!(
        store.mark_question_viewed(qid(1), uid(1), now()).unwrap(),
        ViewOutcome::AlreadyViewed
    );
    assert!(matches!(
        store.bookmark_question(qid(2), uid(1)),
        Err(StoreError::Invalid(_))
    ));
}

#[test]
fn sqlite_concurrent_votes_record_once() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(open_store(&dir));
    add_user(store.as_ref(), 1, 0);
    add_user(store.as_ref(), 2, 0);
    add_question(store.as_ref(), 1, 1, &[], 0);
    let handles: Vec<_> = (0..8)
        .map(|index| {
            let store = Arc::clone(&store);
            let vote = if index % 2 == 0 { VoteType::UpVote } else { VoteType::DownVote };
            thread::spawn(move || store.cast_question_vote(qid(1), uid(2), vote, now()).unwrap())
        })
        .collect();
    let outcomes: Vec<VoteOutcome> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();
    let cast = outcomes.iter().filter(|outcome| matches!(outcome, VoteOutcome::Cast { .. })).count();
    assert_eq!(cast, 1);
    assert_eq!(store.vote_sum(qid(1)).unwrap().abs(), 1);
}
