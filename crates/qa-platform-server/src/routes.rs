// crates/qa-platform-server/src/routes.rs
// ============================================================================
// Module: Forum Routes
// Description: Route table and handlers for the `/api/user` surface.
// Purpose: Parse requests, call the forum service, render outcomes.
// Dependencies: axum, qa-platform-core, serde, serde_json, tokio
// ============================================================================

//! ## Overview
//! Handlers parse path, query and body input into typed requests and run the
//! forum service on the blocking pool, since store calls are synchronous.
//! Guard outcomes map to statuses here: rejected votes, views, stars, joins
//! and unstars answer 400; a repeated bookmark answers 202.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::str::FromStr;

use axum::Extension;
use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::Path;
use axum::extract::RawQuery;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::MethodRouter;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::post;
use qa_platform_core::AskQuestion;
use qa_platform_core::BookmarkOutcome;
use qa_platform_core::ChatId;
use qa_platform_core::CommentView;
use qa_platform_core::ForumService;
use qa_platform_core::JoinOutcome;
use qa_platform_core::MessageId;
use qa_platform_core::MessageStarId;
use qa_platform_core::MessageView;
use qa_platform_core::NewTag;
use qa_platform_core::PageEnvelope;
use qa_platform_core::Period;
use qa_platform_core::QuestionId;
use qa_platform_core::QuestionListing;
use qa_platform_core::QuestionPageRequest;
use qa_platform_core::QuestionView;
use qa_platform_core::ServiceError;
use qa_platform_core::StarOutcome;
use qa_platform_core::TagFilter;
use qa_platform_core::UnstarOutcome;
use qa_platform_core::UserId;
use qa_platform_core::ValidationError;
use qa_platform_core::ViewOutcome;
use qa_platform_core::VoteOutcome;
use qa_platform_core::VoteType;
use serde::Deserialize;
use serde::Serialize;

use crate::auth::Requester;
use crate::error::ApiError;
use crate::params::QueryParams;
use crate::server::ServerState;

// ============================================================================
// SECTION: Route Table
// ============================================================================

/// Question listing paths.
const QUESTION_LISTINGS: [(&str, QuestionListing); 9] = [
    ("/api/user/question", QuestionListing::WithTags),
    ("/api/user/question/sortedQuestions", QuestionListing::ByVotesAnswersViews),
    ("/api/user/question/mostPopularWeek", QuestionListing::MostPopularWeek),
    ("/api/user/question/noAnswer", QuestionListing::NoAnswer),
    ("/api/user/question/new", QuestionListing::NewestFirst),
    ("/api/user/question/sortedQuestionsByMonth", QuestionListing::ByVotesAnswersViewsMonth),
    ("/api/user/question/reputation", QuestionListing::ByReputation),
    ("/api/user/question/viewed", QuestionListing::ByViewCount),
    ("/api/user/question/vote", QuestionListing::ByVotes),
];

/// Builds the unauthenticated route table.
pub fn forum_routes() -> Router<ServerState> {
    let mut router = Router::new();
    for (path, listing) in QUESTION_LISTINGS {
        let routes = if listing == QuestionListing::WithTags {
            listing_route(listing).post(ask_question)
        } else {
            listing_route(listing)
        };
        router = router.route(path, routes);
    }
    router
        .route("/api/user/question/count", get(question_count))
        .route("/api/user/question/{id}", get(get_question))
        .route("/api/user/question/{id}/upVote", post(up_vote))
        .route("/api/user/question/{id}/downVote", post(down_vote))
        .route("/api/user/question/{id}/bookmark", post(bookmark))
        .route("/api/user/question/{id}/view", post(view))
        .route("/api/user/comment/question/{id}", get(question_comments).post(add_comment))
        .route("/api/user/message/star", delete(unstar_message))
        .route("/api/user/message/{id}/star", post(star_message))
        .route("/api/user/message/global/find", get(search_global_messages))
        .route("/api/user/chat/group/{id}/join", post(join_group_chat))
}

/// Builds the GET handler for one question listing.
fn listing_route(listing: QuestionListing) -> MethodRouter<ServerState> {
    get(
        move |State(state): State<ServerState>,
              Extension(requester): Extension<Requester>,
              RawQuery(raw): RawQuery| async move {
            list_questions(state, requester, raw, listing).await
        },
    )
}

// ============================================================================
// SECTION: Bodies
// ============================================================================

/// Plain confirmation body.
#[derive(Debug, Serialize)]
struct MessageBody {
    /// Human-readable confirmation.
    message: &'static str,
}

/// Star confirmation body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StarBody {
    /// Human-readable confirmation.
    message: &'static str,
    /// Identifier used to delete the star.
    star_id: MessageStarId,
}

/// New question payload.
#[derive(Debug, Deserialize)]
struct AskQuestionBody {
    /// Title line.
    #[serde(default)]
    title: String,
    /// Body text.
    #[serde(default)]
    description: String,
    /// Tags resolved by name.
    #[serde(default)]
    tags: Vec<TagBody>,
}

/// Tag in a new question payload.
#[derive(Debug, Deserialize)]
struct TagBody {
    /// Tag name.
    name: String,
    /// Description used when the tag is new.
    #[serde(default)]
    description: String,
}

/// Builds a confirmation response.
const fn confirm(status: StatusCode, message: &'static str) -> (StatusCode, Json<MessageBody>) {
    (
        status,
        Json(MessageBody {
            message,
        }),
    )
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Runs a service call on the blocking pool.
async fn run<T, F>(state: &ServerState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&ForumService) -> Result<T, ServiceError> + Send + 'static,
{
    let service = state.service().clone();
    tokio::task::spawn_blocking(move || op(&service))
        .await
        .map_err(|_| ApiError::Internal)?
        .map_err(ApiError::from)
}

/// Parses an identifier path segment.
fn parse_id<I: FromStr>(raw: &str, name: &str) -> Result<I, ApiError> {
    raw.parse::<I>().map_err(|_| ValidationError::invalid(name, "expected a positive id").into())
}

/// Decodes a UTF-8 request body.
fn body_text(body: &Bytes) -> Result<&str, ApiError> {
    std::str::from_utf8(body).map_err(|_| ApiError::bad_request("invalid_body", "body must be utf-8"))
}

// ============================================================================
// SECTION: Question Handlers
// ============================================================================

/// Lists one page of questions.
async fn list_questions(
    state: ServerState,
    requester: Requester,
    raw: Option<String>,
    listing: QuestionListing,
) -> Result<Json<PageEnvelope<QuestionView>>, ApiError> {
    let params = QueryParams::parse(raw.as_deref());
    let page = state.service().pagination().page_request(
        "page",
        params.optional_i64("page")?,
        "items",
        params.optional_i64("items")?,
    )?;
    let tags = TagFilter::from_raw(&params.id_list("trackedTag")?, &params.id_list("ignoredTag")?)?;
    let period = if listing.accepts_period() {
        params.first("period").map(str::parse::<Period>).transpose()?.unwrap_or_default()
    } else {
        Period::default()
    };
    let request = QuestionPageRequest {
        page,
        tags,
        period,
        requester: requester.0,
    };
    run(&state, move |service| service.list_questions(listing, &request)).await.map(Json)
}

/// Returns the total number of questions.
async fn question_count(State(state): State<ServerState>) -> Result<Json<u64>, ApiError> {
    run(&state, ForumService::question_count).await.map(Json)
}

/// Returns one question as seen by the requester.
async fn get_question(
    State(state): State<ServerState>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<String>,
) -> Result<Json<QuestionView>, ApiError> {
    let question: QuestionId = parse_id(&id, "id")?;
    run(&state, move |service| service.question(question, requester.0)).await.map(Json)
}

/// Creates a question.
async fn ask_question(
    State(state): State<ServerState>,
    Extension(requester): Extension<Requester>,
    body: Bytes,
) -> Result<Json<QuestionView>, ApiError> {
    let payload: AskQuestionBody = serde_json::from_slice(&body)
        .map_err(|err| ApiError::bad_request("invalid_body", err.to_string()))?;
    let ask = AskQuestion {
        title: payload.title,
        description: payload.description,
        tags: payload
            .tags
            .into_iter()
            .map(|tag| NewTag {
                id: None,
                name: tag.name.trim().to_string(),
                description: tag.description,
            })
            .collect(),
    };
    run(&state, move |service| service.ask_question(requester.0, ask)).await.map(Json)
}

/// Casts an up vote.
async fn up_vote(
    State(state): State<ServerState>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<String>,
) -> Result<Json<i64>, ApiError> {
    cast_vote(state, requester, &id, VoteType::UpVote).await
}

/// Casts a down vote.
async fn down_vote(
    State(state): State<ServerState>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<String>,
) -> Result<Json<i64>, ApiError> {
    cast_vote(state, requester, &id, VoteType::DownVote).await
}

/// Casts a vote and returns the new vote sum.
async fn cast_vote(
    state: ServerState,
    requester: Requester,
    id: &str,
    vote: VoteType,
) -> Result<Json<i64>, ApiError> {
    let question: QuestionId = parse_id(id, "id")?;
    match run(&state, move |service| service.vote(question, requester.0, vote)).await? {
        VoteOutcome::Cast {
            vote_sum,
        } => Ok(Json(vote_sum)),
        VoteOutcome::AlreadyVoted => Err(ApiError::bad_request(
            "already_voted",
            format!("user {} already voted on question {question}", requester.0),
        )),
    }
}

/// Bookmarks a question (202 when already bookmarked).
async fn bookmark(
    State(state): State<ServerState>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<MessageBody>), ApiError> {
    let question: QuestionId = parse_id(&id, "id")?;
    Ok(match run(&state, move |service| service.bookmark(question, requester.0)).await? {
        BookmarkOutcome::Added => confirm(StatusCode::OK, "bookmark added"),
        BookmarkOutcome::AlreadyBookmarked => {
            confirm(StatusCode::ACCEPTED, "question already bookmarked")
        }
    })
}

/// Records the requester's first view of a question.
async fn view(
    State(state): State<ServerState>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<MessageBody>), ApiError> {
    let question: QuestionId = parse_id(&id, "id")?;
    match run(&state, move |service| service.view(question, requester.0)).await? {
        ViewOutcome::FirstView => Ok(confirm(StatusCode::OK, "view recorded")),
        ViewOutcome::AlreadyViewed => Err(ApiError::bad_request(
            "already_viewed",
            format!("user {} already viewed question {question}", requester.0),
        )),
    }
}

// ============================================================================
// SECTION: Comment Handlers
// ============================================================================

/// Lists one page of a question's comments.
async fn question_comments(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    RawQuery(raw): RawQuery,
) -> Result<Json<PageEnvelope<CommentView>>, ApiError> {
    let question: QuestionId = parse_id(&id, "id")?;
    let params = QueryParams::parse(raw.as_deref());
    let page = state.service().pagination().page_request(
        "currentPage",
        params.optional_i64("currentPage")?,
        "items",
        params.optional_i64("items")?,
    )?;
    run(&state, move |service| service.question_comments(question, page)).await.map(Json)
}

/// Adds a comment from a raw text body.
async fn add_comment(
    State(state): State<ServerState>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<CommentView>, ApiError> {
    let question: QuestionId = parse_id(&id, "id")?;
    let text = body_text(&body)?.to_string();
    run(&state, move |service| service.add_comment(question, requester.0, &text)).await.map(Json)
}

// ============================================================================
// SECTION: Message and Chat Handlers
// ============================================================================

/// Searches the global chat.
async fn search_global_messages(
    State(state): State<ServerState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<PageEnvelope<MessageView>>, ApiError> {
    let params = QueryParams::parse(raw.as_deref());
    let text = params.required_text("text")?.to_string();
    let items = params.required_i64("items")?;
    let page = state.service().pagination().page_request(
        "currentPage",
        params.optional_i64("currentPage")?,
        "items",
        Some(items),
    )?;
    run(&state, move |service| service.search_global_messages(&text, page)).await.map(Json)
}

/// Stars a message.
async fn star_message(
    State(state): State<ServerState>,
    Extension(requester): Extension<Requester>,
    Path(id): Path<String>,
) -> Result<Json<StarBody>, ApiError> {
    let message: MessageId = parse_id(&id, "id")?;
    match run(&state, move |service| service.star_message(message, requester.0)).await? {
        StarOutcome::Starred {
            star_id,
        } => Ok(Json(StarBody {
            message: "message starred",
            star_id,
        })),
        outcome @ StarOutcome::QuotaExceeded => Err(ApiError::bad_request(
            outcome.label(),
            format!("user {} already has the maximum number of starred messages", requester.0),
        )),
        outcome @ StarOutcome::AlreadyStarred => Err(ApiError::bad_request(
            outcome.label(),
            format!("message {message} is already starred"),
        )),
        outcome @ StarOutcome::NotChatMember => Err(ApiError::bad_request(
            outcome.label(),
            format!("user {} is not a member of the message's chat", requester.0),
        )),
    }
}

/// Deletes one of the requester's stars.
async fn unstar_message(
    State(state): State<ServerState>,
    Extension(requester): Extension<Requester>,
    RawQuery(raw): RawQuery,
) -> Result<Json<MessageBody>, ApiError> {
    let params = QueryParams::parse(raw.as_deref());
    let star = MessageStarId::from_i64(params.required_i64("id")?)
        .ok_or_else(|| ValidationError::invalid("id", "expected a positive id"))?;
    match run(&state, move |service| service.unstar_message(star, requester.0)).await? {
        UnstarOutcome::Deleted => Ok(Json(MessageBody {
            message: "star deleted",
        })),
        UnstarOutcome::NotOwner => Err(ApiError::bad_request(
            "not_owner",
            format!("star {star} belongs to another user"),
        )),
        UnstarOutcome::NotFound => Err(ApiError::NotFound(format!("message star {star} not found"))),
    }
}

/// Adds the user named in the body to a group chat.
async fn join_group_chat(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<MessageBody>, ApiError> {
    let chat: ChatId = parse_id(&id, "id")?;
    let user: UserId = parse_id(body_text(&body)?.trim(), "userId")?;
    match run(&state, move |service| service.join_group_chat(chat, user)).await? {
        JoinOutcome::Joined => Ok(Json(MessageBody {
            message: "joined group chat",
        })),
        outcome => Err(ApiError::bad_request(
            outcome.label(),
            format!("user {user} cannot join chat {chat}"),
        )),
    }
}
