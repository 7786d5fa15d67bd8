// crates/qa-platform-server/tests/http_api.rs
// ============================================================================
// Module: Forum HTTP API Tests
// Description: End-to-end tests against a server on an ephemeral port.
// Purpose: Validate routing, status mapping, envelopes, auth and audit.
// Dependencies: qa-platform-server, qa-platform-core, reqwest, tokio
// ============================================================================

//! ## Overview
//! Each test seeds an in-memory store, starts the real router on
//! `127.0.0.1:0`, and drives it over HTTP with `reqwest`.

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
use std::sync::Mutex;

use qa_platform_config::AuditSinkKind;
use qa_platform_config::AuthTokenConfig;
use qa_platform_config::QaPlatformConfig;
use qa_platform_core::ChatId;
use qa_platform_core::ChatKind;
use qa_platform_core::ContentStore;
use qa_platform_core::FixedClock;
use qa_platform_core::InMemoryForumStore;
use qa_platform_core::MessageId;
use qa_platform_core::NewChat;
use qa_platform_core::NewComment;
use qa_platform_core::NewMessage;
use qa_platform_core::NewQuestion;
use qa_platform_core::NewTag;
use qa_platform_core::NewUser;
use qa_platform_core::QuestionId;
use qa_platform_core::Timestamp;
use qa_platform_core::UserId;
use qa_platform_server::AuditEvent;
use qa_platform_server::AuditSink;
use qa_platform_server::ForumServer;
use qa_platform_server::token_fingerprint;
use serde_json::Value;
use tokio::net::TcpListener;

// ============================================================================
// SECTION: Harness
// ============================================================================

const NOW_MS: i64 = 1_700_000_000_000;

fn now() -> Timestamp {
    Timestamp::from_unix_millis(NOW_MS)
}

fn uid(raw: u64) -> UserId {
    UserId::from_raw(raw).unwrap()
}

fn qid(raw: u64) -> QuestionId {
    QuestionId::from_raw(raw).unwrap()
}

fn token(user: u64) -> String {
    format!("token-{user}")
}

#[derive(Default)]
struct RecordingAudit {
    events: Mutex<Vec<AuditEvent>>,
}

impl AuditSink for RecordingAudit {
    fn record(&self, event: &AuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

struct TestServer {
    base: String,
    client: reqwest::Client,
    store: InMemoryForumStore,
    audit: Arc<RecordingAudit>,
}

struct Reply {
    status: u16,
    body: Value,
}

impl TestServer {
    async fn start() -> Self {
        let store = InMemoryForumStore::new();
        for user in 1..=4 {
            store
                .create_user(NewUser {
                    id: Some(uid(user)),
                    email: format!("user{user}@example.test"),
                    full_name: format!("User {user}"),
                    nickname: format!("nick{user}"),
                    reputation: i64::try_from(user).unwrap() * 10,
                    registered_at: now(),
                })
                .unwrap();
        }
        let mut config = QaPlatformConfig::default();
        config.server.audit.sink = AuditSinkKind::None;
        config.auth.tokens = (1..=4)
            .map(|user| AuthTokenConfig {
                token: token(user),
                user_id: uid(user),
            })
            .collect();
        config.validate().unwrap();
        let audit = Arc::new(RecordingAudit::default());
        let server = ForumServer::with_parts(
            config,
            Arc::new(store.clone()),
            Arc::new(FixedClock::new(now())),
            audit.clone(),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(server.serve_on(listener));
        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            store,
            audit,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Reply {
        let response = request.send().await.unwrap();
        let status = response.status().as_u16();
        let text = response.text().await.unwrap();
        let body = if text.is_empty() { Value::Null } else { serde_json::from_str(&text).unwrap() };
        Reply {
            status,
            body,
        }
    }

    async fn get(&self, user: u64, path: &str) -> Reply {
        self.send(self.client.get(format!("{}{path}", self.base)).bearer_auth(token(user))).await
    }

    async fn post(&self, user: u64, path: &str, body: &str) -> Reply {
        self.send(
            self.client
                .post(format!("{}{path}", self.base))
                .bearer_auth(token(user))
                .body(body.to_string()),
        )
        .await
    }

    async fn delete(&self, user: u64, path: &str) -> Reply {
        self.send(self.client.delete(format!("{}{path}", self.base)).bearer_auth(token(user))).await
    }

    fn add_question(&self, id: u64, author: u64, tags: &[&str]) -> QuestionId {
        self.store
            .create_question(NewQuestion {
                id: Some(qid(id)),
                title: format!("Question {id}"),
                description: "Body".to_string(),
                author_id: uid(author),
                created_at: now(),
                tags: tags
                    .iter()
                    .map(|name| NewTag {
                        id: None,
                        name: (*name).to_string(),
                        description: String::new(),
                    })
                    .collect(),
            })
            .unwrap()
    }

    fn add_chat(&self, id: u64, kind: ChatKind, members: &[u64]) -> ChatId {
        self.store
            .create_chat(NewChat {
                id: ChatId::from_raw(id),
                kind,
                title: format!("chat {id}"),
                members: members.iter().copied().map(uid).collect(),
            })
            .unwrap()
            .id
    }

    fn add_message(&self, chat: ChatId, author: u64, text: &str) -> MessageId {
        self.store
            .create_message(NewMessage {
                id: None,
                chat_id: chat,
                author_id: uid(author),
                text: text.to_string(),
                created_at: now(),
            })
            .unwrap()
            .id
    }
}

fn item_ids(body: &Value) -> Vec<u64> {
    body["items"].as_array().unwrap().iter().map(|item| item["id"].as_u64().unwrap()).collect()
}

// ============================================================================
// SECTION: Authentication and Audit
// ============================================================================

#[tokio::test]
async fn requests_without_known_token_are_rejected() {
    let server = TestServer::start().await;
    let url = format!("{}/api/user/question/count", server.base);
    let missing = server.send(server.client.get(&url)).await;
    assert_eq!(missing.status, 401);
    assert_eq!(missing.body["error"], "unauthorized");
    let unknown = server.send(server.client.get(&url).bearer_auth("nope")).await;
    assert_eq!(unknown.status, 401);
    let known = server.get(1, "/api/user/question/count").await;
    assert_eq!(known.status, 200);
    assert_eq!(known.body, 0);
}

#[tokio::test]
async fn audit_records_route_template_and_token_fingerprint() {
    let server = TestServer::start().await;
    server.add_question(1, 1, &["rust"]);
    server.get(2, "/api/user/question/1").await;
    server.get(2, "/api/user/question/99").await;
    let events = server.audit.events.lock().unwrap().clone();
    let requests: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            AuditEvent::ForumRequest(request) => Some(request.clone()),
            AuditEvent::ServerStart(_) => None,
        })
        .collect();
    assert!(events.iter().any(|event| matches!(event, AuditEvent::ServerStart(_))));
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].route, "/api/user/question/{id}");
    assert_eq!(requests[0].status, 200);
    assert_eq!(requests[0].requester, Some(2));
    assert_eq!(requests[0].token_fingerprint, Some(token_fingerprint(&token(2))));
    assert_eq!(requests[1].status, 404);
    assert_eq!(requests[1].error_kind, Some("not_found"));
}

// ============================================================================
// SECTION: Question Listings
// ============================================================================

#[tokio::test]
async fn question_listing_filters_tags_and_validates_paging() {
    let server = TestServer::start().await;
    server.add_question(1, 1, &["rust"]);
    server.add_question(2, 2, &["sql"]);
    server.add_question(3, 3, &["rust", "sql"]);

    let page = server.get(1, "/api/user/question?page=1&items=2").await;
    assert_eq!(page.status, 200);
    assert_eq!(item_ids(&page.body), vec![1, 2]);
    assert_eq!(page.body["totalResultCount"], 3);
    assert_eq!(page.body["totalPageCount"], 2);
    assert_eq!(page.body["currentPageNumber"], 1);
    assert_eq!(page.body["itemsOnPage"], 2);

    let tracked = server.get(1, "/api/user/question?page=1&trackedTag=1&ignoredTag=2").await;
    assert_eq!(item_ids(&tracked.body), vec![1]);

    let overlap = server.get(1, "/api/user/question?page=1&trackedTag=1,2&ignoredTag=2").await;
    assert_eq!(overlap.status, 400);
    assert_eq!(overlap.body["error"], "tag_mapping");

    let missing_page = server.get(1, "/api/user/question/new?items=5").await;
    assert_eq!(missing_page.status, 400);
    assert_eq!(missing_page.body["error"], "missing_parameter");

    let zero = server.get(1, "/api/user/question/viewed?page=0").await;
    assert_eq!(zero.status, 400);

    let beyond = server.get(1, "/api/user/question/vote?page=9&items=2").await;
    assert_eq!(beyond.status, 200);
    assert_eq!(item_ids(&beyond.body), Vec::<u64>::new());
    assert_eq!(beyond.body["totalPageCount"], 2);

    let bad_period = server.get(1, "/api/user/question/sortedQuestions?page=1&period=YEAR").await;
    assert_eq!(bad_period.status, 400);
    let fixed_week = server.get(1, "/api/user/question/mostPopularWeek?page=1&period=YEAR").await;
    assert_eq!(fixed_week.status, 400);
    for path in ["reputation", "viewed", "vote"] {
        let ignored = server.get(1, &format!("/api/user/question/{path}?page=1&period=YEAR")).await;
        assert_eq!(ignored.status, 200, "listing {path}");
        assert_eq!(ignored.body["totalResultCount"], 3);
    }
}

#[tokio::test]
async fn ask_question_validates_payload() {
    let server = TestServer::start().await;
    let created = server
        .post(
            2,
            "/api/user/question",
            r#"{"title":"How?","description":"Details","tags":[{"name":"rust"}]}"#,
        )
        .await;
    assert_eq!(created.status, 200);
    assert_eq!(created.body["authorId"], 2);
    assert_eq!(created.body["listTagDto"][0]["name"], "rust");

    let blank = server
        .post(2, "/api/user/question", r#"{"title":" ","description":"d","tags":[{"name":"x"}]}"#)
        .await;
    assert_eq!(blank.status, 400);
    let untagged =
        server.post(2, "/api/user/question", r#"{"title":"t","description":"d","tags":[]}"#).await;
    assert_eq!(untagged.status, 400);
    let malformed = server.post(2, "/api/user/question", "not json").await;
    assert_eq!(malformed.status, 400);
    assert_eq!(malformed.body["error"], "invalid_body");
}

// ============================================================================
// SECTION: Guards
// ============================================================================

#[tokio::test]
async fn second_vote_is_rejected_and_sum_unchanged() {
    let server = TestServer::start().await;
    server.add_question(1, 1, &[]);
    let first = server.post(2, "/api/user/question/1/upVote", "").await;
    assert_eq!(first.status, 200);
    assert_eq!(first.body, 1);
    let second = server.post(2, "/api/user/question/1/downVote", "").await;
    assert_eq!(second.status, 400);
    assert_eq!(second.body["error"], "already_voted");
    let other = server.post(3, "/api/user/question/1/downVote", "").await;
    assert_eq!(other.body, 0);
    let view = server.get(2, "/api/user/question/1").await;
    assert_eq!(view.body["countValuable"], 0);
    assert_eq!(view.body["userVote"], "UP_VOTE");
    let missing = server.post(2, "/api/user/question/42/upVote", "").await;
    assert_eq!(missing.status, 404);
}

#[tokio::test]
async fn repeated_bookmark_answers_accepted() {
    let server = TestServer::start().await;
    server.add_question(1, 1, &[]);
    assert_eq!(server.post(2, "/api/user/question/1/bookmark", "").await.status, 200);
    assert_eq!(server.post(2, "/api/user/question/1/bookmark", "").await.status, 202);
    let view = server.get(2, "/api/user/question/1").await;
    assert_eq!(view.body["isUserBookmark"], true);
}

#[tokio::test]
async fn repeated_view_is_rejected() {
    let server = TestServer::start().await;
    server.add_question(1, 1, &[]);
    assert_eq!(server.post(2, "/api/user/question/1/view", "").await.status, 200);
    let again = server.post(2, "/api/user/question/1/view", "").await;
    assert_eq!(again.status, 400);
    assert_eq!(again.body["error"], "already_viewed");
    assert_eq!(server.get(3, "/api/user/question/1").await.body["viewCount"], 1);
}

#[tokio::test]
async fn fourth_star_is_rejected_and_unstar_checks_owner() {
    let server = TestServer::start().await;
    let global = server.add_chat(1, ChatKind::Global, &[]);
    let group = server.add_chat(2, ChatKind::Group, &[1]);
    let messages: Vec<MessageId> =
        (0..4).map(|index| server.add_message(global, 1, &format!("m{index}"))).collect();
    let private = server.add_message(group, 1, "members only");

    let mut star_ids = Vec::new();
    for message in &messages[..3] {
        let reply = server.post(2, &format!("/api/user/message/{message}/star"), "").await;
        assert_eq!(reply.status, 200);
        star_ids.push(reply.body["starId"].as_u64().unwrap());
    }
    let fourth = server.post(2, &format!("/api/user/message/{}/star", messages[3]), "").await;
    assert_eq!(fourth.status, 400);
    assert_eq!(fourth.body["error"], "quota_exceeded");
    assert_eq!(server.store.star_count(uid(2)).unwrap(), 3);

    let duplicate = server.post(2, &format!("/api/user/message/{}/star", messages[0]), "").await;
    assert_eq!(duplicate.status, 400);
    let outsider = server.post(3, &format!("/api/user/message/{private}/star"), "").await;
    assert_eq!(outsider.status, 400);
    assert_eq!(outsider.body["error"], "not_chat_member");
    assert_eq!(server.post(3, "/api/user/message/999/star", "").await.status, 404);

    let foreign = server.delete(3, &format!("/api/user/message/star?id={}", star_ids[0])).await;
    assert_eq!(foreign.status, 400);
    let own = server.delete(2, &format!("/api/user/message/star?id={}", star_ids[0])).await;
    assert_eq!(own.status, 200);
    let gone = server.delete(2, &format!("/api/user/message/star?id={}", star_ids[0])).await;
    assert_eq!(gone.status, 404);
}

#[tokio::test]
async fn group_join_rejects_everything_but_a_new_member() {
    let server = TestServer::start().await;
    let group = server.add_chat(5, ChatKind::Group, &[1]);
    let path = format!("/api/user/chat/group/{group}/join");
    assert_eq!(server.post(1, &path, "2").await.status, 200);
    let again = server.post(1, &path, "2").await;
    assert_eq!(again.status, 400);
    assert_eq!(again.body["error"], "already_member");
    assert_eq!(server.post(1, &path, "77").await.body["error"], "user_not_found");
    assert_eq!(server.post(1, "/api/user/chat/group/404/join", "2").await.status, 400);
    assert_eq!(server.post(1, &path, "abc").await.status, 400);
}

// ============================================================================
// SECTION: Comments and Message Search
// ============================================================================

#[tokio::test]
async fn comment_listing_defaults_page_size() {
    let server = TestServer::start().await;
    let question = server.add_question(1, 1, &[]);
    for index in 0..22 {
        server
            .store
            .create_comment(NewComment {
                id: None,
                question_id: question,
                author_id: uid(2),
                text: format!("comment {index}"),
                created_at: now(),
            })
            .unwrap();
    }
    let page = server.get(1, "/api/user/comment/question/1?currentPage=1").await;
    assert_eq!(page.status, 200);
    assert_eq!(page.body["items"].as_array().unwrap().len(), 10);
    assert_eq!(page.body["itemsOnPage"], 10);
    assert_eq!(page.body["totalPageCount"], 3);
    assert_eq!(page.body["items"][0]["comment"], "comment 0");
    assert_eq!(server.get(1, "/api/user/comment/question/9?currentPage=1").await.status, 404);

    let added = server.post(3, "/api/user/comment/question/1", "nice question").await;
    assert_eq!(added.status, 200);
    assert_eq!(added.body["fullName"], "User 3");
    assert_eq!(server.post(3, "/api/user/comment/question/1", "   ").await.status, 400);
}

#[tokio::test]
async fn global_message_search_pages_matches() {
    let server = TestServer::start().await;
    let global = server.add_chat(1, ChatKind::Global, &[]);
    let group = server.add_chat(2, ChatKind::Group, &[1]);
    let mut matching = Vec::new();
    for index in 0..22 {
        matching.push(server.add_message(global, 1, &format!("Hello World number {index}")));
        server.add_message(global, 2, "noise");
    }
    server.add_message(group, 1, "hello world in a group");

    let second = server.get(1, "/api/user/message/global/find?text=hello&currentPage=2&items=1").await;
    assert_eq!(second.status, 200);
    assert_eq!(second.body["currentPageNumber"], 2);
    assert_eq!(second.body["totalPageCount"], 22);
    assert_eq!(second.body["totalResultCount"], 22);
    assert_eq!(item_ids(&second.body), vec![matching[1].get()]);

    let all = server.get(1, "/api/user/message/global/find?text=WORLD&currentPage=1&items=50").await;
    assert_eq!(all.body["totalPageCount"], 1);
    assert_eq!(all.body["items"].as_array().unwrap().len(), 22);
    assert_eq!(all.body["itemsOnPage"], 50);

    for query in ["text=hello&currentPage=1", "text=hello&items=1", "currentPage=1&items=1"] {
        let reply = server.get(1, &format!("/api/user/message/global/find?{query}")).await;
        assert_eq!(reply.status, 400, "query {query}");
        assert_eq!(reply.body["error"], "missing_parameter");
    }
}
