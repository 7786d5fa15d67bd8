// crates/qa-platform-core/src/runtime/store.rs
// ============================================================================
// Module: QA Platform In-Memory Store
// Description: Mutex-guarded in-memory forum store.
// Purpose: Provide a deterministic backend for tests and local demos.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryForumStore`] keeps every table in ordered maps behind a single
//! mutex. Each guard runs entirely under that lock, so the check and the insert
//! are one atomic step. Listings materialize every candidate view, filter,
//! sort and then slice; that is fine for test-sized data sets.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::Answer;
use crate::core::AnswerId;
use crate::core::BookmarkOutcome;
use crate::core::Chat;
use crate::core::ChatId;
use crate::core::ChatKind;
use crate::core::Comment;
use crate::core::CommentId;
use crate::core::CommentView;
use crate::core::GlobalChatMessageSearch;
use crate::core::JoinOutcome;
use crate::core::MAX_STARRED_MESSAGES;
use crate::core::Message;
use crate::core::MessageId;
use crate::core::MessageStar;
use crate::core::MessageStarId;
use crate::core::MessageView;
use crate::core::NewAnswer;
use crate::core::NewChat;
use crate::core::NewComment;
use crate::core::NewMessage;
use crate::core::NewQuestion;
use crate::core::NewTag;
use crate::core::NewUser;
use crate::core::NumericId;
use crate::core::PageSlice;
use crate::core::Question;
use crate::core::QuestionComments;
use crate::core::QuestionId;
use crate::core::QuestionQuery;
use crate::core::QuestionView;
use crate::core::StarOutcome;
use crate::core::Tag;
use crate::core::TagId;
use crate::core::Timestamp;
use crate::core::UnstarOutcome;
use crate::core::User;
use crate::core::UserId;
use crate::core::ViewOutcome;
use crate::core::VoteOutcome;
use crate::core::VoteType;
use crate::interfaces::ContentStore;
use crate::interfaces::GuardStore;
use crate::interfaces::ListingStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: State
// ============================================================================

/// All forum tables.
#[derive(Debug, Default)]
struct ForumTables {
    /// Users by id.
    users: BTreeMap<UserId, User>,
    /// Tags by id.
    tags: BTreeMap<TagId, Tag>,
    /// Questions by id.
    questions: BTreeMap<QuestionId, Question>,
    /// Answers by id.
    answers: BTreeMap<AnswerId, Answer>,
    /// Comments by id.
    comments: BTreeMap<CommentId, Comment>,
    /// Chats by id.
    chats: BTreeMap<ChatId, Chat>,
    /// Explicit chat memberships.
    members: BTreeSet<(ChatId, UserId)>,
    /// Messages by id.
    messages: BTreeMap<MessageId, Message>,
    /// Stars by id.
    stars: BTreeMap<MessageStarId, MessageStar>,
    /// One vote per (question, user).
    votes: BTreeMap<(QuestionId, UserId), VoteType>,
    /// One bookmark per (question, user).
    bookmarks: BTreeSet<(QuestionId, UserId)>,
    /// One view per (question, user).
    views: BTreeMap<(QuestionId, UserId), Timestamp>,
}

impl ForumTables {
    /// Builds the read view of `question` for `requester`.
    fn question_view(&self, question: &Question, requester: UserId) -> QuestionView {
        let author = self.users.get(&question.author_id);
        let vote_sum = self
            .votes
            .range((question.id, UserId::MIN)..=(question.id, UserId::MAX))
            .map(|(_, vote)| vote.weight())
            .sum();
        let view_count = self
            .views
            .range((question.id, UserId::MIN)..=(question.id, UserId::MAX))
            .count();
        let count_answer =
            self.answers.values().filter(|answer| answer.question_id == question.id).count();
        let mut tags: Vec<Tag> =
            question.tag_ids.iter().filter_map(|id| self.tags.get(id)).cloned().collect();
        tags.sort_by_key(|tag| tag.id);
        QuestionView {
            id: question.id,
            title: question.title.clone(),
            description: question.description.clone(),
            author_id: question.author_id,
            author_name: author.map(|user| user.full_name.clone()).unwrap_or_default(),
            author_reputation: author.map_or(0, |user| user.reputation),
            view_count: as_count(view_count),
            count_answer: as_count(count_answer),
            count_valuable: vote_sum,
            persist_date_time: question.created_at,
            last_update_date_time: question.updated_at,
            list_tag_dto: tags,
            is_user_bookmark: self.bookmarks.contains(&(question.id, requester)),
            is_user_viewed: self.views.contains_key(&(question.id, requester)),
            user_vote: self.votes.get(&(question.id, requester)).copied(),
        }
    }

    /// Returns every question view admitted by `query`, in plan order.
    fn select_questions(&self, query: &QuestionQuery) -> Vec<QuestionView> {
        let mut selected: Vec<QuestionView> = self
            .questions
            .values()
            .map(|question| self.question_view(question, query.requester))
            .filter(|view| query.admits(view))
            .collect();
        selected.sort_by(|left, right| query.sort.compare(left, right));
        selected
    }

    /// Returns the comments of a question, id ascending.
    fn select_comments(&self, query: &QuestionComments) -> Vec<&Comment> {
        self.comments.values().filter(|comment| comment.question_id == query.question_id).collect()
    }

    /// Returns the single global chat, if created.
    fn global_chat(&self) -> Option<ChatId> {
        self.chats.values().find(|chat| chat.kind == ChatKind::Global).map(|chat| chat.id)
    }

    /// Returns global chat messages matching `search`, id ascending.
    fn select_messages(&self, search: &GlobalChatMessageSearch) -> Vec<&Message> {
        let Some(global) = self.global_chat() else {
            return Vec::new();
        };
        self.messages
            .values()
            .filter(|message| message.chat_id == global && search.matches(&message.text))
            .collect()
    }

    /// Builds a comment view.
    fn comment_view(&self, comment: &Comment) -> CommentView {
        let author = self.users.get(&comment.author_id);
        CommentView {
            id: comment.id,
            question_id: comment.question_id,
            comment: comment.text.clone(),
            user_id: comment.author_id,
            full_name: author.map(|user| user.full_name.clone()).unwrap_or_default(),
            reputation: author.map_or(0, |user| user.reputation),
            persist_date: comment.created_at,
        }
    }

    /// Builds a message view.
    fn message_view(&self, message: &Message) -> MessageView {
        MessageView {
            id: message.id,
            chat_id: message.chat_id,
            message: message.text.clone(),
            user_id: message.author_id,
            nickname: self
                .users
                .get(&message.author_id)
                .map(|user| user.nickname.clone())
                .unwrap_or_default(),
            persist_date: message.created_at,
        }
    }

    /// Returns true when `user` may act in `chat`.
    fn is_member(&self, chat: &Chat, user: UserId) -> bool {
        chat.kind == ChatKind::Global || self.members.contains(&(chat.id, user))
    }

    /// Fails with [`StoreError::Invalid`] when the user is unknown.
    fn require_user(&self, user: UserId) -> Result<(), StoreError> {
        if self.users.contains_key(&user) {
            Ok(())
        } else {
            Err(StoreError::Invalid(format!("unknown user {user}")))
        }
    }

    /// Fails with [`StoreError::Invalid`] when the question is unknown.
    fn require_question(&self, question: QuestionId) -> Result<(), StoreError> {
        if self.questions.contains_key(&question) {
            Ok(())
        } else {
            Err(StoreError::Invalid(format!("unknown question {question}")))
        }
    }
}

/// Converts an in-memory count to the wire type.
fn as_count(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}

/// Applies a page slice to an ordered selection.
fn slice_of<T>(items: Vec<T>, slice: PageSlice) -> Vec<T> {
    let (offset, limit) = slice.bounds();
    items.into_iter().skip(offset).take(limit).collect()
}

/// Picks the explicit id when free, otherwise the next id after the maximum.
fn allocate_id<K: NumericId, V>(
    table: &BTreeMap<K, V>,
    explicit: Option<K>,
    kind: &str,
) -> Result<K, StoreError> {
    if let Some(id) = explicit {
        if table.contains_key(&id) {
            return Err(StoreError::Conflict(format!("{kind} {} already exists", id.get())));
        }
        return Ok(id);
    }
    let next = table.keys().next_back().map_or(1, |last| last.get().saturating_add(1));
    K::from_raw(next).ok_or_else(|| StoreError::Store(format!("{kind} id space exhausted")))
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory forum store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryForumStore {
    /// Forum tables protected by a mutex.
    tables: Arc<Mutex<ForumTables>>,
}

impl InMemoryForumStore {
    /// Creates an empty in-memory forum store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the tables.
    fn lock(&self) -> Result<MutexGuard<'_, ForumTables>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Store("forum store mutex poisoned".to_string()))
    }
}

impl ContentStore for InMemoryForumStore {
    fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.lock()?;
        let id = allocate_id(&tables.users, user.id, "user")?;
        let record = User {
            id,
            email: user.email,
            full_name: user.full_name,
            nickname: user.nickname,
            reputation: user.reputation,
            registered_at: user.registered_at,
        };
        tables.users.insert(id, record.clone());
        Ok(record)
    }

    fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    fn ensure_tag(&self, tag: NewTag) -> Result<Tag, StoreError> {
        let mut tables = self.lock()?;
        ensure_tag_locked(&mut tables, tag)
    }

    fn create_question(&self, question: NewQuestion) -> Result<QuestionId, StoreError> {
        let mut tables = self.lock()?;
        tables.require_user(question.author_id)?;
        let id = allocate_id(&tables.questions, question.id, "question")?;
        let mut tag_ids = BTreeSet::new();
        for tag in question.tags {
            tag_ids.insert(ensure_tag_locked(&mut tables, tag)?.id);
        }
        tables.questions.insert(
            id,
            Question {
                id,
                title: question.title,
                description: question.description,
                author_id: question.author_id,
                created_at: question.created_at,
                updated_at: question.created_at,
                tag_ids: tag_ids.into_iter().collect(),
            },
        );
        Ok(id)
    }

    fn question_exists(&self, id: QuestionId) -> Result<bool, StoreError> {
        Ok(self.lock()?.questions.contains_key(&id))
    }

    fn question_count(&self) -> Result<u64, StoreError> {
        Ok(as_count(self.lock()?.questions.len()))
    }

    fn question_view(
        &self,
        id: QuestionId,
        requester: UserId,
    ) -> Result<Option<QuestionView>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.questions.get(&id).map(|question| tables.question_view(question, requester)))
    }

    fn create_answer(&self, answer: NewAnswer) -> Result<Answer, StoreError> {
        let mut tables = self.lock()?;
        tables.require_question(answer.question_id)?;
        tables.require_user(answer.author_id)?;
        let id = allocate_id(&tables.answers, answer.id, "answer")?;
        let record = Answer {
            id,
            question_id: answer.question_id,
            author_id: answer.author_id,
            body: answer.body,
            created_at: answer.created_at,
        };
        tables.answers.insert(id, record.clone());
        Ok(record)
    }

    fn create_comment(&self, comment: NewComment) -> Result<CommentId, StoreError> {
        let mut tables = self.lock()?;
        tables.require_question(comment.question_id)?;
        tables.require_user(comment.author_id)?;
        let id = allocate_id(&tables.comments, comment.id, "comment")?;
        tables.comments.insert(
            id,
            Comment {
                id,
                question_id: comment.question_id,
                author_id: comment.author_id,
                text: comment.text,
                created_at: comment.created_at,
            },
        );
        Ok(id)
    }

    fn comment_view(&self, id: CommentId) -> Result<Option<CommentView>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.comments.get(&id).map(|comment| tables.comment_view(comment)))
    }

    fn create_chat(&self, chat: NewChat) -> Result<Chat, StoreError> {
        let mut tables = self.lock()?;
        if chat.kind == ChatKind::Global && tables.global_chat().is_some() {
            return Err(StoreError::Conflict("global chat already exists".to_string()));
        }
        for member in &chat.members {
            tables.require_user(*member)?;
        }
        let id = allocate_id(&tables.chats, chat.id, "chat")?;
        let record = Chat {
            id,
            kind: chat.kind,
            title: chat.title,
        };
        tables.chats.insert(id, record.clone());
        if chat.kind != ChatKind::Global {
            for member in chat.members {
                tables.members.insert((id, member));
            }
        }
        Ok(record)
    }

    fn chat(&self, id: ChatId) -> Result<Option<Chat>, StoreError> {
        Ok(self.lock()?.chats.get(&id).cloned())
    }

    fn create_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        let mut tables = self.lock()?;
        if !tables.chats.contains_key(&message.chat_id) {
            return Err(StoreError::Invalid(format!("unknown chat {}", message.chat_id)));
        }
        tables.require_user(message.author_id)?;
        let id = allocate_id(&tables.messages, message.id, "message")?;
        let record = Message {
            id,
            chat_id: message.chat_id,
            author_id: message.author_id,
            text: message.text,
            created_at: message.created_at,
        };
        tables.messages.insert(id, record.clone());
        Ok(record)
    }

    fn message(&self, id: MessageId) -> Result<Option<Message>, StoreError> {
        Ok(self.lock()?.messages.get(&id).cloned())
    }

    fn star_count(&self, user: UserId) -> Result<u64, StoreError> {
        let tables = self.lock()?;
        Ok(as_count(tables.stars.values().filter(|star| star.user_id == user).count()))
    }

    fn vote_sum(&self, question: QuestionId) -> Result<i64, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .votes
            .range((question, UserId::MIN)..=(question, UserId::MAX))
            .map(|(_, vote)| vote.weight())
            .sum())
    }
}

/// Resolves a tag by name or inserts it, with the tables already locked.
fn ensure_tag_locked(tables: &mut ForumTables, tag: NewTag) -> Result<Tag, StoreError> {
    if let Some(existing) = tables.tags.values().find(|existing| existing.name == tag.name) {
        if tag.id.is_some_and(|id| id != existing.id) {
            return Err(StoreError::Conflict(format!("tag name {} already taken", tag.name)));
        }
        return Ok(existing.clone());
    }
    let id = allocate_id(&tables.tags, tag.id, "tag")?;
    let record = Tag {
        id,
        name: tag.name,
        description: tag.description,
    };
    tables.tags.insert(id, record.clone());
    Ok(record)
}

impl ListingStore for InMemoryForumStore {
    fn count_questions(&self, query: &QuestionQuery) -> Result<u64, StoreError> {
        Ok(as_count(self.lock()?.select_questions(query).len()))
    }

    fn fetch_questions(
        &self,
        query: &QuestionQuery,
        slice: PageSlice,
    ) -> Result<Vec<QuestionView>, StoreError> {
        Ok(slice_of(self.lock()?.select_questions(query), slice))
    }

    fn count_comments(&self, query: &QuestionComments) -> Result<u64, StoreError> {
        Ok(as_count(self.lock()?.select_comments(query).len()))
    }

    fn fetch_comments(
        &self,
        query: &QuestionComments,
        slice: PageSlice,
    ) -> Result<Vec<CommentView>, StoreError> {
        let tables = self.lock()?;
        let comments = slice_of(tables.select_comments(query), slice);
        Ok(comments.into_iter().map(|comment| tables.comment_view(comment)).collect())
    }

    fn count_messages(&self, search: &GlobalChatMessageSearch) -> Result<u64, StoreError> {
        Ok(as_count(self.lock()?.select_messages(search).len()))
    }

    fn fetch_messages(
        &self,
        search: &GlobalChatMessageSearch,
        slice: PageSlice,
    ) -> Result<Vec<MessageView>, StoreError> {
        let tables = self.lock()?;
        let messages = slice_of(tables.select_messages(search), slice);
        Ok(messages.into_iter().map(|message| tables.message_view(message)).collect())
    }
}

impl GuardStore for InMemoryForumStore {
    fn cast_question_vote(
        &self,
        question: QuestionId,
        user: UserId,
        vote: VoteType,
        _at: Timestamp,
    ) -> Result<VoteOutcome, StoreError> {
        let mut tables = self.lock()?;
        tables.require_question(question)?;
        if tables.votes.contains_key(&(question, user)) {
            return Ok(VoteOutcome::AlreadyVoted);
        }
        tables.votes.insert((question, user), vote);
        let vote_sum = tables
            .votes
            .range((question, UserId::MIN)..=(question, UserId::MAX))
            .map(|(_, cast)| cast.weight())
            .sum();
        Ok(VoteOutcome::Cast {
            vote_sum,
        })
    }

    fn bookmark_question(
        &self,
        question: QuestionId,
        user: UserId,
    ) -> Result<BookmarkOutcome, StoreError> {
        let mut tables = self.lock()?;
        tables.require_question(question)?;
        if tables.bookmarks.insert((question, user)) {
            Ok(BookmarkOutcome::Added)
        } else {
            Ok(BookmarkOutcome::AlreadyBookmarked)
        }
    }

    fn mark_question_viewed(
        &self,
        question: QuestionId,
        user: UserId,
        at: Timestamp,
    ) -> Result<ViewOutcome, StoreError> {
        let mut tables = self.lock()?;
        tables.require_question(question)?;
        if tables.views.contains_key(&(question, user)) {
            return Ok(ViewOutcome::AlreadyViewed);
        }
        tables.views.insert((question, user), at);
        Ok(ViewOutcome::FirstView)
    }

    fn star_message(&self, message: MessageId, user: UserId) -> Result<StarOutcome, StoreError> {
        let mut tables = self.lock()?;
        let chat_id = tables
            .messages
            .get(&message)
            .map(|record| record.chat_id)
            .ok_or_else(|| StoreError::Invalid(format!("unknown message {message}")))?;
        let is_member = tables.chats.get(&chat_id).is_some_and(|chat| tables.is_member(chat, user));
        if !is_member {
            return Ok(StarOutcome::NotChatMember);
        }
        let mut held = 0_u64;
        for star in tables.stars.values().filter(|star| star.user_id == user) {
            if star.message_id == message {
                return Ok(StarOutcome::AlreadyStarred);
            }
            held += 1;
        }
        if held >= MAX_STARRED_MESSAGES {
            return Ok(StarOutcome::QuotaExceeded);
        }
        let star_id = allocate_id(&tables.stars, None, "message star")?;
        tables.stars.insert(
            star_id,
            MessageStar {
                id: star_id,
                user_id: user,
                message_id: message,
            },
        );
        Ok(StarOutcome::Starred {
            star_id,
        })
    }

    fn unstar_message(
        &self,
        star: MessageStarId,
        user: UserId,
    ) -> Result<UnstarOutcome, StoreError> {
        let mut tables = self.lock()?;
        match tables.stars.get(&star) {
            None => Ok(UnstarOutcome::NotFound),
            Some(record) if record.user_id != user => Ok(UnstarOutcome::NotOwner),
            Some(_) => {
                tables.stars.remove(&star);
                Ok(UnstarOutcome::Deleted)
            }
        }
    }

    fn join_group_chat(&self, chat: ChatId, user: UserId) -> Result<JoinOutcome, StoreError> {
        let mut tables = self.lock()?;
        if !tables.users.contains_key(&user) {
            return Ok(JoinOutcome::UserNotFound);
        }
        if !tables.chats.get(&chat).is_some_and(|record| record.kind == ChatKind::Group) {
            return Ok(JoinOutcome::ChatNotFound);
        }
        if tables.members.insert((chat, user)) {
            Ok(JoinOutcome::Joined)
        } else {
            Ok(JoinOutcome::AlreadyMember)
        }
    }
}
