// crates/qa-platform-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Forum Store
// Description: Durable forum store backed by SQLite.
// Purpose: Persist forum content and enforce guards with store constraints.
// Dependencies: qa-platform-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This module implements the forum store contract on `SQLite`. Every
//! (subject, user) relation carries a primary key or `UNIQUE` constraint, and
//! each guard runs inside one `IMMEDIATE` transaction using
//! `INSERT ... ON CONFLICT DO NOTHING`, so concurrent requests can never
//! insert a duplicate vote, bookmark, view, star or membership.
//!
//! Listings are executed as one filtered, ordered `SELECT` over a per-question
//! statistics CTE with `LIMIT`/`OFFSET`; the count uses the same filter.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Duration;

use qa_platform_core::Answer;
use qa_platform_core::AnswerId;
use qa_platform_core::BookmarkOutcome;
use qa_platform_core::Chat;
use qa_platform_core::ChatId;
use qa_platform_core::ChatKind;
use qa_platform_core::CommentId;
use qa_platform_core::CommentView;
use qa_platform_core::ContentStore;
use qa_platform_core::GlobalChatMessageSearch;
use qa_platform_core::GuardStore;
use qa_platform_core::JoinOutcome;
use qa_platform_core::ListingStore;
use qa_platform_core::MAX_STARRED_MESSAGES;
use qa_platform_core::Message;
use qa_platform_core::MessageId;
use qa_platform_core::MessageStarId;
use qa_platform_core::MessageView;
use qa_platform_core::NewAnswer;
use qa_platform_core::NewChat;
use qa_platform_core::NewComment;
use qa_platform_core::NewMessage;
use qa_platform_core::NewQuestion;
use qa_platform_core::NewTag;
use qa_platform_core::NewUser;
use qa_platform_core::NumericId;
use qa_platform_core::PageSlice;
use qa_platform_core::QuestionComments;
use qa_platform_core::QuestionId;
use qa_platform_core::QuestionQuery;
use qa_platform_core::QuestionSort;
use qa_platform_core::QuestionView;
use qa_platform_core::StarOutcome;
use qa_platform_core::StoreError;
use qa_platform_core::Tag;
use qa_platform_core::TagId;
use qa_platform_core::Timestamp;
use qa_platform_core::UnstarOutcome;
use qa_platform_core::User;
use qa_platform_core::UserId;
use qa_platform_core::ViewOutcome;
use qa_platform_core::VoteOutcome;
use qa_platform_core::VoteType;
use qa_platform_core::fold_case;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

/// Forum schema, created once alongside the `store_meta` version row.
const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    email TEXT NOT NULL,
    full_name TEXT NOT NULL,
    nickname TEXT NOT NULL,
    reputation INTEGER NOT NULL,
    registered_at INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS questions (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    author_id INTEGER NOT NULL REFERENCES users(id),
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS question_tags (
    question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
    tag_id INTEGER NOT NULL REFERENCES tags(id),
    PRIMARY KEY (question_id, tag_id)
);
CREATE TABLE IF NOT EXISTS answers (
    id INTEGER PRIMARY KEY,
    question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
    author_id INTEGER NOT NULL REFERENCES users(id),
    body TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_answers_question ON answers (question_id);
CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY,
    question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
    author_id INTEGER NOT NULL REFERENCES users(id),
    text TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_comments_question ON comments (question_id);
CREATE TABLE IF NOT EXISTS chats (
    id INTEGER PRIMARY KEY,
    kind TEXT NOT NULL,
    title TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_chats_single_global ON chats (kind) WHERE kind = 'global';
CREATE TABLE IF NOT EXISTS chat_members (
    chat_id INTEGER NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users(id),
    PRIMARY KEY (chat_id, user_id)
);
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY,
    chat_id INTEGER NOT NULL REFERENCES chats(id) ON DELETE CASCADE,
    author_id INTEGER NOT NULL REFERENCES users(id),
    text TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_chat ON messages (chat_id);
CREATE TABLE IF NOT EXISTS message_stars (
    id INTEGER PRIMARY KEY,
    user_id INTEGER NOT NULL REFERENCES users(id),
    message_id INTEGER NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
    UNIQUE (user_id, message_id)
);
CREATE TABLE IF NOT EXISTS question_votes (
    question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users(id),
    vote TEXT NOT NULL,
    voted_at INTEGER NOT NULL,
    PRIMARY KEY (question_id, user_id)
);
CREATE TABLE IF NOT EXISTS bookmarks (
    question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users(id),
    PRIMARY KEY (question_id, user_id)
);
CREATE TABLE IF NOT EXISTS question_views (
    question_id INTEGER NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES users(id),
    viewed_at INTEGER NOT NULL,
    PRIMARY KEY (question_id, user_id)
);
";

/// Per-question statistics with requester flags.
///
/// Binds the requester three times (bookmark, view, vote flags).
const QUESTION_STATS_CTE: &str = "WITH stats AS (
    SELECT q.id AS id,
        q.title AS title,
        q.description AS description,
        q.author_id AS author_id,
        COALESCE(u.full_name, '') AS author_name,
        COALESCE(u.reputation, 0) AS author_reputation,
        (SELECT COUNT(*) FROM question_views v WHERE v.question_id = q.id) AS view_count,
        (SELECT COUNT(*) FROM answers a WHERE a.question_id = q.id) AS answer_count,
        (SELECT COALESCE(SUM(CASE qv.vote WHEN 'up' THEN 1 WHEN 'down' THEN -1 ELSE 0 END), 0)
            FROM question_votes qv WHERE qv.question_id = q.id) AS vote_sum,
        q.created_at AS created_at,
        q.updated_at AS updated_at,
        EXISTS (SELECT 1 FROM bookmarks b WHERE b.question_id = q.id AND b.user_id = ?)
            AS bookmarked,
        EXISTS (SELECT 1 FROM question_views v WHERE v.question_id = q.id AND v.user_id = ?)
            AS viewed,
        (SELECT qv.vote FROM question_votes qv WHERE qv.question_id = q.id AND qv.user_id = ?)
            AS user_vote
    FROM questions q
    LEFT JOIN users u ON u.id = q.author_id
)";

/// Columns selected from the statistics CTE, in [`QuestionRow`] order.
const QUESTION_COLUMNS: &str = "id, title, description, author_id, author_name, \
                                author_reputation, view_count, answer_count, vote_sum, \
                                created_at, updated_at, bookmarked, viewed, user_vote";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` forum store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a configuration with default pragmas for `path`.
    #[must_use]
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored rows fail integrity checks.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Input references missing rows.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// An explicit identifier or unique key is already taken.
    #[error("sqlite store conflict: {0}")]
    Conflict(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::Conflict(message) => Self::Conflict(message),
        }
    }
}

/// Maps an engine error.
#[allow(clippy::needless_pass_by_value, reason = "Used as a map_err function pointer.")]
fn db_error(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed forum store.
#[derive(Clone)]
pub struct SqliteForumStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteForumStore {
    /// Opens an `SQLite`-backed forum store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Locks the connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection.lock().map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))
    }

    /// Runs `op` in a transaction and commits when it succeeds.
    fn transact<T>(
        &self,
        behavior: TransactionBehavior,
        op: impl FnOnce(&Transaction<'_>) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let mut guard = self.lock()?;
        let tx = guard.transaction_with_behavior(behavior).map_err(db_error)?;
        let value = op(&tx)?;
        tx.commit().map_err(db_error)?;
        drop(guard);
        Ok(value)
    }

    /// Runs a read in a deferred transaction.
    fn read<T>(
        &self,
        op: impl FnOnce(&Transaction<'_>) -> Result<T, SqliteStoreError>,
    ) -> Result<T, StoreError> {
        self.transact(TransactionBehavior::Deferred, op).map_err(StoreError::from)
    }

    /// Runs a write in an immediate transaction.
    fn write<T>(
        &self,
        op: impl FnOnce(&Transaction<'_>) -> Result<T, SqliteStoreError>,
    ) -> Result<T, StoreError> {
        self.transact(TransactionBehavior::Immediate, op).map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Content Store
// ============================================================================

impl ContentStore for SqliteForumStore {
    fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        self.write(|tx| {
            if let Some(id) = user.id
                && row_exists(tx, "SELECT 1 FROM users WHERE id = ?1", id.to_i64())?
            {
                return Err(SqliteStoreError::Conflict(format!("user {id} already exists")));
            }
            tx.execute(
                "INSERT INTO users (id, email, full_name, nickname, reputation, registered_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user.id.map(UserId::to_i64),
                    user.email,
                    user.full_name,
                    user.nickname,
                    user.reputation,
                    user.registered_at.as_unix_millis()
                ],
            )
            .map_err(db_error)?;
            Ok(User {
                id: read_id(tx.last_insert_rowid(), "user")?,
                email: user.email,
                full_name: user.full_name,
                nickname: user.nickname,
                reputation: user.reputation,
                registered_at: user.registered_at,
            })
        })
    }

    fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        self.read(|tx| {
            let row = tx
                .query_row(
                    "SELECT email, full_name, nickname, reputation, registered_at FROM users \
                     WHERE id = ?1",
                    params![id.to_i64()],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, i64>(3)?,
                            row.get::<_, i64>(4)?,
                        ))
                    },
                )
                .optional()
                .map_err(db_error)?;
            Ok(row.map(|(email, full_name, nickname, reputation, registered_at)| User {
                id,
                email,
                full_name,
                nickname,
                reputation,
                registered_at: Timestamp::from_unix_millis(registered_at),
            }))
        })
    }

    fn ensure_tag(&self, tag: NewTag) -> Result<Tag, StoreError> {
        self.write(|tx| ensure_tag_tx(tx, tag))
    }

    fn create_question(&self, question: NewQuestion) -> Result<QuestionId, StoreError> {
        self.write(|tx| {
            require_row(tx, "SELECT 1 FROM users WHERE id = ?1", question.author_id.to_i64(), || {
                format!("unknown user {}", question.author_id)
            })?;
            if let Some(id) = question.id
                && row_exists(tx, "SELECT 1 FROM questions WHERE id = ?1", id.to_i64())?
            {
                return Err(SqliteStoreError::Conflict(format!("question {id} already exists")));
            }
            tx.execute(
                "INSERT INTO questions (id, title, description, author_id, created_at, \
                 updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![
                    question.id.map(QuestionId::to_i64),
                    question.title,
                    question.description,
                    question.author_id.to_i64(),
                    question.created_at.as_unix_millis()
                ],
            )
            .map_err(db_error)?;
            let id: QuestionId = read_id(tx.last_insert_rowid(), "question")?;
            for tag in question.tags {
                let tag = ensure_tag_tx(tx, tag)?;
                tx.execute(
                    "INSERT INTO question_tags (question_id, tag_id) VALUES (?1, ?2) \
                     ON CONFLICT DO NOTHING",
                    params![id.to_i64(), tag.id.to_i64()],
                )
                .map_err(db_error)?;
            }
            Ok(id)
        })
    }

    fn question_exists(&self, id: QuestionId) -> Result<bool, StoreError> {
        self.read(|tx| row_exists(tx, "SELECT 1 FROM questions WHERE id = ?1", id.to_i64()))
    }

    fn question_count(&self) -> Result<u64, StoreError> {
        self.read(|tx| {
            let count: i64 = tx
                .query_row("SELECT COUNT(*) FROM questions", params![], |row| row.get(0))
                .map_err(db_error)?;
            read_count(count)
        })
    }

    fn question_view(
        &self,
        id: QuestionId,
        requester: UserId,
    ) -> Result<Option<QuestionView>, StoreError> {
        self.read(|tx| {
            let sql = format!("{QUESTION_STATS_CTE} SELECT {QUESTION_COLUMNS} FROM stats WHERE id = ?");
            let mut values = requester_values(requester);
            values.push(Value::Integer(id.to_i64()));
            let row = tx
                .query_row(&sql, params_from_iter(values.iter()), QuestionRow::from_row)
                .optional()
                .map_err(db_error)?;
            row.map(|row| row.into_view(tx)).transpose()
        })
    }

    fn create_answer(&self, answer: NewAnswer) -> Result<Answer, StoreError> {
        self.write(|tx| {
            require_row(tx, "SELECT 1 FROM questions WHERE id = ?1", answer.question_id.to_i64(), || {
                format!("unknown question {}", answer.question_id)
            })?;
            require_row(tx, "SELECT 1 FROM users WHERE id = ?1", answer.author_id.to_i64(), || {
                format!("unknown user {}", answer.author_id)
            })?;
            if let Some(id) = answer.id
                && row_exists(tx, "SELECT 1 FROM answers WHERE id = ?1", id.to_i64())?
            {
                return Err(SqliteStoreError::Conflict(format!("answer {id} already exists")));
            }
            tx.execute(
                "INSERT INTO answers (id, question_id, author_id, body, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    answer.id.map(AnswerId::to_i64),
                    answer.question_id.to_i64(),
                    answer.author_id.to_i64(),
                    answer.body,
                    answer.created_at.as_unix_millis()
                ],
            )
            .map_err(db_error)?;
            Ok(Answer {
                id: read_id(tx.last_insert_rowid(), "answer")?,
                question_id: answer.question_id,
                author_id: answer.author_id,
                body: answer.body,
                created_at: answer.created_at,
            })
        })
    }

    fn create_comment(&self, comment: NewComment) -> Result<CommentId, StoreError> {
        self.write(|tx| {
            require_row(tx, "SELECT 1 FROM questions WHERE id = ?1", comment.question_id.to_i64(), || {
                format!("unknown question {}", comment.question_id)
            })?;
            require_row(tx, "SELECT 1 FROM users WHERE id = ?1", comment.author_id.to_i64(), || {
                format!("unknown user {}", comment.author_id)
            })?;
            if let Some(id) = comment.id
                && row_exists(tx, "SELECT 1 FROM comments WHERE id = ?1", id.to_i64())?
            {
                return Err(SqliteStoreError::Conflict(format!("comment {id} already exists")));
            }
            tx.execute(
                "INSERT INTO comments (id, question_id, author_id, text, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    comment.id.map(CommentId::to_i64),
                    comment.question_id.to_i64(),
                    comment.author_id.to_i64(),
                    comment.text,
                    comment.created_at.as_unix_millis()
                ],
            )
            .map_err(db_error)?;
            read_id(tx.last_insert_rowid(), "comment")
        })
    }

    fn comment_view(&self, id: CommentId) -> Result<Option<CommentView>, StoreError> {
        self.read(|tx| {
            let row = tx
                .query_row(
                    &format!("{COMMENT_SELECT} WHERE c.id = ?1"),
                    params![id.to_i64()],
                    CommentRow::from_row,
                )
                .optional()
                .map_err(db_error)?;
            row.map(CommentRow::into_view).transpose()
        })
    }

    fn create_chat(&self, chat: NewChat) -> Result<Chat, StoreError> {
        self.write(|tx| {
            if chat.kind == ChatKind::Global
                && tx
                    .query_row("SELECT 1 FROM chats WHERE kind = 'global'", params![], |_| Ok(()))
                    .optional()
                    .map_err(db_error)?
                    .is_some()
            {
                return Err(SqliteStoreError::Conflict("global chat already exists".to_string()));
            }
            for member in &chat.members {
                require_row(tx, "SELECT 1 FROM users WHERE id = ?1", member.to_i64(), || {
                    format!("unknown user {member}")
                })?;
            }
            if let Some(id) = chat.id
                && row_exists(tx, "SELECT 1 FROM chats WHERE id = ?1", id.to_i64())?
            {
                return Err(SqliteStoreError::Conflict(format!("chat {id} already exists")));
            }
            tx.execute(
                "INSERT INTO chats (id, kind, title) VALUES (?1, ?2, ?3)",
                params![chat.id.map(ChatId::to_i64), chat.kind.label(), chat.title],
            )
            .map_err(db_error)?;
            let id: ChatId = read_id(tx.last_insert_rowid(), "chat")?;
            if chat.kind != ChatKind::Global {
                for member in &chat.members {
                    tx.execute(
                        "INSERT INTO chat_members (chat_id, user_id) VALUES (?1, ?2) \
                         ON CONFLICT DO NOTHING",
                        params![id.to_i64(), member.to_i64()],
                    )
                    .map_err(db_error)?;
                }
            }
            Ok(Chat {
                id,
                kind: chat.kind,
                title: chat.title,
            })
        })
    }

    fn chat(&self, id: ChatId) -> Result<Option<Chat>, StoreError> {
        self.read(|tx| {
            let row = tx
                .query_row(
                    "SELECT kind, title FROM chats WHERE id = ?1",
                    params![id.to_i64()],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()
                .map_err(db_error)?;
            row.map(|(kind, title)| {
                Ok(Chat {
                    id,
                    kind: read_chat_kind(&kind)?,
                    title,
                })
            })
            .transpose()
        })
    }

    fn create_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        self.write(|tx| {
            require_row(tx, "SELECT 1 FROM chats WHERE id = ?1", message.chat_id.to_i64(), || {
                format!("unknown chat {}", message.chat_id)
            })?;
            require_row(tx, "SELECT 1 FROM users WHERE id = ?1", message.author_id.to_i64(), || {
                format!("unknown user {}", message.author_id)
            })?;
            if let Some(id) = message.id
                && row_exists(tx, "SELECT 1 FROM messages WHERE id = ?1", id.to_i64())?
            {
                return Err(SqliteStoreError::Conflict(format!("message {id} already exists")));
            }
            tx.execute(
                "INSERT INTO messages (id, chat_id, author_id, text, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    message.id.map(MessageId::to_i64),
                    message.chat_id.to_i64(),
                    message.author_id.to_i64(),
                    message.text,
                    message.created_at.as_unix_millis()
                ],
            )
            .map_err(db_error)?;
            Ok(Message {
                id: read_id(tx.last_insert_rowid(), "message")?,
                chat_id: message.chat_id,
                author_id: message.author_id,
                text: message.text,
                created_at: message.created_at,
            })
        })
    }

    fn message(&self, id: MessageId) -> Result<Option<Message>, StoreError> {
        self.read(|tx| {
            let row = tx
                .query_row(
                    "SELECT chat_id, author_id, text, created_at FROM messages WHERE id = ?1",
                    params![id.to_i64()],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, i64>(3)?,
                        ))
                    },
                )
                .optional()
                .map_err(db_error)?;
            row.map(|(chat_id, author_id, text, created_at)| {
                Ok(Message {
                    id,
                    chat_id: read_id(chat_id, "chat")?,
                    author_id: read_id(author_id, "user")?,
                    text,
                    created_at: Timestamp::from_unix_millis(created_at),
                })
            })
            .transpose()
        })
    }

    fn star_count(&self, user: UserId) -> Result<u64, StoreError> {
        self.read(|tx| count_stars(tx, user))
    }

    fn vote_sum(&self, question: QuestionId) -> Result<i64, StoreError> {
        self.read(|tx| vote_sum_tx(tx, question))
    }
}

// ============================================================================
// SECTION: Listing Store
// ============================================================================

/// Comment view projection.
const COMMENT_SELECT: &str = "SELECT c.id, c.question_id, c.text, c.author_id, \
                              COALESCE(u.full_name, ''), COALESCE(u.reputation, 0), \
                              c.created_at FROM comments c LEFT JOIN users u ON u.id = c.author_id";

/// Global chat messages matching a case-folded needle.
const MESSAGE_SEARCH_FROM: &str = "FROM messages m \
                                   JOIN chats c ON c.id = m.chat_id \
                                   LEFT JOIN users u ON u.id = m.author_id \
                                   WHERE c.kind = 'global' \
                                   AND instr(qa_fold_case(m.text), ?1) > 0";

impl ListingStore for SqliteForumStore {
    fn count_questions(&self, query: &QuestionQuery) -> Result<u64, StoreError> {
        self.read(|tx| {
            let (filter, values) = question_filter(query);
            let sql = format!("{QUESTION_STATS_CTE} SELECT COUNT(*) FROM stats{filter}");
            let count: i64 = tx
                .query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))
                .map_err(db_error)?;
            read_count(count)
        })
    }

    fn fetch_questions(
        &self,
        query: &QuestionQuery,
        slice: PageSlice,
    ) -> Result<Vec<QuestionView>, StoreError> {
        self.read(|tx| {
            let (filter, mut values) = question_filter(query);
            let sql = format!(
                "{QUESTION_STATS_CTE} SELECT {QUESTION_COLUMNS} FROM stats{filter} ORDER BY {} \
                 LIMIT ? OFFSET ?",
                order_clause(query.sort)
            );
            values.push(Value::Integer(to_sql_count(slice.limit)));
            values.push(Value::Integer(to_sql_count(slice.offset)));
            let rows = {
                let mut statement = tx.prepare(&sql).map_err(db_error)?;
                statement
                    .query_map(params_from_iter(values.iter()), QuestionRow::from_row)
                    .map_err(db_error)?
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(db_error)?
            };
            rows.into_iter().map(|row| row.into_view(tx)).collect()
        })
    }

    fn count_comments(&self, query: &QuestionComments) -> Result<u64, StoreError> {
        self.read(|tx| {
            let count: i64 = tx
                .query_row(
                    "SELECT COUNT(*) FROM comments WHERE question_id = ?1",
                    params![query.question_id.to_i64()],
                    |row| row.get(0),
                )
                .map_err(db_error)?;
            read_count(count)
        })
    }

    fn fetch_comments(
        &self,
        query: &QuestionComments,
        slice: PageSlice,
    ) -> Result<Vec<CommentView>, StoreError> {
        self.read(|tx| {
            let mut statement = tx
                .prepare(&format!(
                    "{COMMENT_SELECT} WHERE c.question_id = ?1 ORDER BY c.id ASC LIMIT ?2 OFFSET ?3"
                ))
                .map_err(db_error)?;
            let rows = statement
                .query_map(
                    params![
                        query.question_id.to_i64(),
                        to_sql_count(slice.limit),
                        to_sql_count(slice.offset)
                    ],
                    CommentRow::from_row,
                )
                .map_err(db_error)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(db_error)?;
            rows.into_iter().map(CommentRow::into_view).collect()
        })
    }

    fn count_messages(&self, search: &GlobalChatMessageSearch) -> Result<u64, StoreError> {
        self.read(|tx| {
            let count: i64 = tx
                .query_row(
                    &format!("SELECT COUNT(*) {MESSAGE_SEARCH_FROM}"),
                    params![search.needle()],
                    |row| row.get(0),
                )
                .map_err(db_error)?;
            read_count(count)
        })
    }

    fn fetch_messages(
        &self,
        search: &GlobalChatMessageSearch,
        slice: PageSlice,
    ) -> Result<Vec<MessageView>, StoreError> {
        self.read(|tx| {
            let mut statement = tx
                .prepare(&format!(
                    "SELECT m.id, m.chat_id, m.text, m.author_id, COALESCE(u.nickname, ''), \
                     m.created_at {MESSAGE_SEARCH_FROM} ORDER BY m.id ASC LIMIT ?2 OFFSET ?3"
                ))
                .map_err(db_error)?;
            let rows = statement
                .query_map(
                    params![search.needle(), to_sql_count(slice.limit), to_sql_count(slice.offset)],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, i64>(3)?,
                            row.get::<_, String>(4)?,
                            row.get::<_, i64>(5)?,
                        ))
                    },
                )
                .map_err(db_error)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(db_error)?;
            rows.into_iter()
                .map(|(id, chat_id, message, user_id, nickname, created_at)| {
                    Ok(MessageView {
                        id: read_id(id, "message")?,
                        chat_id: read_id(chat_id, "chat")?,
                        message,
                        user_id: read_id(user_id, "user")?,
                        nickname,
                        persist_date: Timestamp::from_unix_millis(created_at),
                    })
                })
                .collect()
        })
    }
}

// ============================================================================
// SECTION: Guard Store
// ============================================================================

impl GuardStore for SqliteForumStore {
    fn cast_question_vote(
        &self,
        question: QuestionId,
        user: UserId,
        vote: VoteType,
        at: Timestamp,
    ) -> Result<VoteOutcome, StoreError> {
        self.write(|tx| {
            require_row(tx, "SELECT 1 FROM questions WHERE id = ?1", question.to_i64(), || {
                format!("unknown question {question}")
            })?;
            let inserted = tx
                .execute(
                    "INSERT INTO question_votes (question_id, user_id, vote, voted_at) \
                     VALUES (?1, ?2, ?3, ?4) ON CONFLICT (question_id, user_id) DO NOTHING",
                    params![question.to_i64(), user.to_i64(), vote.label(), at.as_unix_millis()],
                )
                .map_err(db_error)?;
            if inserted == 0 {
                return Ok(VoteOutcome::AlreadyVoted);
            }
            Ok(VoteOutcome::Cast {
                vote_sum: vote_sum_tx(tx, question)?,
            })
        })
    }

    fn bookmark_question(
        &self,
        question: QuestionId,
        user: UserId,
    ) -> Result<BookmarkOutcome, StoreError> {
        self.write(|tx| {
            require_row(tx, "SELECT 1 FROM questions WHERE id = ?1", question.to_i64(), || {
                format!("unknown question {question}")
            })?;
            let inserted = tx
                .execute(
                    "INSERT INTO bookmarks (question_id, user_id) VALUES (?1, ?2) \
                     ON CONFLICT (question_id, user_id) DO NOTHING",
                    params![question.to_i64(), user.to_i64()],
                )
                .map_err(db_error)?;
            Ok(if inserted == 0 { BookmarkOutcome::AlreadyBookmarked } else { BookmarkOutcome::Added })
        })
    }

    fn mark_question_viewed(
        &self,
        question: QuestionId,
        user: UserId,
        at: Timestamp,
    ) -> Result<ViewOutcome, StoreError> {
        self.write(|tx| {
            require_row(tx, "SELECT 1 FROM questions WHERE id = ?1", question.to_i64(), || {
                format!("unknown question {question}")
            })?;
            let inserted = tx
                .execute(
                    "INSERT INTO question_views (question_id, user_id, viewed_at) \
                     VALUES (?1, ?2, ?3) ON CONFLICT (question_id, user_id) DO NOTHING",
                    params![question.to_i64(), user.to_i64(), at.as_unix_millis()],
                )
                .map_err(db_error)?;
            Ok(if inserted == 0 { ViewOutcome::AlreadyViewed } else { ViewOutcome::FirstView })
        })
    }

    fn star_message(&self, message: MessageId, user: UserId) -> Result<StarOutcome, StoreError> {
        self.write(|tx| {
            let chat = tx
                .query_row(
                    "SELECT c.id, c.kind FROM messages m JOIN chats c ON c.id = m.chat_id \
                     WHERE m.id = ?1",
                    params![message.to_i64()],
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()
                .map_err(db_error)?;
            let Some((chat_id, kind)) = chat else {
                return Err(SqliteStoreError::Invalid(format!("unknown message {message}")));
            };
            let is_member = read_chat_kind(&kind)? == ChatKind::Global
                || tx
                    .query_row(
                        "SELECT 1 FROM chat_members WHERE chat_id = ?1 AND user_id = ?2",
                        params![chat_id, user.to_i64()],
                        |_| Ok(()),
                    )
                    .optional()
                    .map_err(db_error)?
                    .is_some();
            if !is_member {
                return Ok(StarOutcome::NotChatMember);
            }
            let already = tx
                .query_row(
                    "SELECT 1 FROM message_stars WHERE user_id = ?1 AND message_id = ?2",
                    params![user.to_i64(), message.to_i64()],
                    |_| Ok(()),
                )
                .optional()
                .map_err(db_error)?
                .is_some();
            if already {
                return Ok(StarOutcome::AlreadyStarred);
            }
            if count_stars(tx, user)? >= MAX_STARRED_MESSAGES {
                return Ok(StarOutcome::QuotaExceeded);
            }
            let inserted = tx
                .execute(
                    "INSERT INTO message_stars (user_id, message_id) VALUES (?1, ?2) \
                     ON CONFLICT (user_id, message_id) DO NOTHING",
                    params![user.to_i64(), message.to_i64()],
                )
                .map_err(db_error)?;
            if inserted == 0 {
                return Ok(StarOutcome::AlreadyStarred);
            }
            Ok(StarOutcome::Starred {
                star_id: read_id(tx.last_insert_rowid(), "message star")?,
            })
        })
    }

    fn unstar_message(
        &self,
        star: MessageStarId,
        user: UserId,
    ) -> Result<UnstarOutcome, StoreError> {
        self.write(|tx| {
            let owner: Option<i64> = tx
                .query_row(
                    "SELECT user_id FROM message_stars WHERE id = ?1",
                    params![star.to_i64()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(db_error)?;
            match owner {
                None => Ok(UnstarOutcome::NotFound),
                Some(owner) if owner != user.to_i64() => Ok(UnstarOutcome::NotOwner),
                Some(_) => {
                    tx.execute("DELETE FROM message_stars WHERE id = ?1", params![star.to_i64()])
                        .map_err(db_error)?;
                    Ok(UnstarOutcome::Deleted)
                }
            }
        })
    }

    fn join_group_chat(&self, chat: ChatId, user: UserId) -> Result<JoinOutcome, StoreError> {
        self.write(|tx| {
            if !row_exists(tx, "SELECT 1 FROM users WHERE id = ?1", user.to_i64())? {
                return Ok(JoinOutcome::UserNotFound);
            }
            let kind: Option<String> = tx
                .query_row("SELECT kind FROM chats WHERE id = ?1", params![chat.to_i64()], |row| {
                    row.get(0)
                })
                .optional()
                .map_err(db_error)?;
            match kind.as_deref().map(read_chat_kind).transpose()? {
                Some(ChatKind::Group) => {}
                _ => return Ok(JoinOutcome::ChatNotFound),
            }
            let inserted = tx
                .execute(
                    "INSERT INTO chat_members (chat_id, user_id) VALUES (?1, ?2) \
                     ON CONFLICT (chat_id, user_id) DO NOTHING",
                    params![chat.to_i64(), user.to_i64()],
                )
                .map_err(db_error)?;
            Ok(if inserted == 0 { JoinOutcome::AlreadyMember } else { JoinOutcome::Joined })
        })
    }
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Raw question statistics row.
struct QuestionRow {
    /// Question id.
    id: i64,
    /// Title.
    title: String,
    /// Description.
    description: String,
    /// Author id.
    author_id: i64,
    /// Author display name.
    author_name: String,
    /// Author reputation.
    author_reputation: i64,
    /// Distinct viewers.
    view_count: i64,
    /// Answers.
    answer_count: i64,
    /// Vote sum.
    vote_sum: i64,
    /// Creation time (ms).
    created_at: i64,
    /// Update time (ms).
    updated_at: i64,
    /// Requester bookmark flag.
    bookmarked: bool,
    /// Requester view flag.
    viewed: bool,
    /// Requester vote label.
    user_vote: Option<String>,
}

impl QuestionRow {
    /// Reads a row selected with [`QUESTION_COLUMNS`].
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            author_id: row.get(3)?,
            author_name: row.get(4)?,
            author_reputation: row.get(5)?,
            view_count: row.get(6)?,
            answer_count: row.get(7)?,
            vote_sum: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
            bookmarked: row.get(11)?,
            viewed: row.get(12)?,
            user_vote: row.get(13)?,
        })
    }

    /// Converts the row into a view, loading its tags.
    fn into_view(self, connection: &Connection) -> Result<QuestionView, SqliteStoreError> {
        let id: QuestionId = read_id(self.id, "question")?;
        let user_vote = self
            .user_vote
            .map(|label| {
                VoteType::from_label(&label)
                    .ok_or_else(|| SqliteStoreError::Corrupt(format!("unknown vote label {label}")))
            })
            .transpose()?;
        Ok(QuestionView {
            id,
            title: self.title,
            description: self.description,
            author_id: read_id(self.author_id, "user")?,
            author_name: self.author_name,
            author_reputation: self.author_reputation,
            view_count: read_count(self.view_count)?,
            count_answer: read_count(self.answer_count)?,
            count_valuable: self.vote_sum,
            persist_date_time: Timestamp::from_unix_millis(self.created_at),
            last_update_date_time: Timestamp::from_unix_millis(self.updated_at),
            list_tag_dto: load_tags(connection, id)?,
            is_user_bookmark: self.bookmarked,
            is_user_viewed: self.viewed,
            user_vote,
        })
    }
}

/// Raw comment row selected with [`COMMENT_SELECT`].
struct CommentRow {
    /// Comment id.
    id: i64,
    /// Question id.
    question_id: i64,
    /// Text.
    text: String,
    /// Author id.
    author_id: i64,
    /// Author display name.
    full_name: String,
    /// Author reputation.
    reputation: i64,
    /// Creation time (ms).
    created_at: i64,
}

impl CommentRow {
    /// Reads a comment row.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            question_id: row.get(1)?,
            text: row.get(2)?,
            author_id: row.get(3)?,
            full_name: row.get(4)?,
            reputation: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    /// Converts the row into a view.
    fn into_view(self) -> Result<CommentView, SqliteStoreError> {
        Ok(CommentView {
            id: read_id(self.id, "comment")?,
            question_id: read_id(self.question_id, "question")?,
            comment: self.text,
            user_id: read_id(self.author_id, "user")?,
            full_name: self.full_name,
            reputation: self.reputation,
            persist_date: Timestamp::from_unix_millis(self.created_at),
        })
    }
}

/// Converts a stored identifier, failing closed on non-positive values.
fn read_id<K: NumericId>(raw: i64, kind: &str) -> Result<K, SqliteStoreError> {
    u64::try_from(raw)
        .ok()
        .and_then(K::from_raw)
        .ok_or_else(|| SqliteStoreError::Corrupt(format!("invalid {kind} id {raw}")))
}

/// Converts a stored count.
fn read_count(raw: i64) -> Result<u64, SqliteStoreError> {
    u64::try_from(raw).map_err(|_| SqliteStoreError::Corrupt(format!("negative count {raw}")))
}

/// Converts a slice bound to an `SQLite` integer.
fn to_sql_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Parses a stored chat kind.
fn read_chat_kind(label: &str) -> Result<ChatKind, SqliteStoreError> {
    ChatKind::from_label(label)
        .ok_or_else(|| SqliteStoreError::Corrupt(format!("unknown chat kind {label}")))
}

// ============================================================================
// SECTION: Query Helpers
// ============================================================================

/// Returns true when `sql` (one integer parameter) yields a row.
fn row_exists(connection: &Connection, sql: &str, key: i64) -> Result<bool, SqliteStoreError> {
    Ok(connection.query_row(sql, params![key], |_| Ok(())).optional().map_err(db_error)?.is_some())
}

/// Fails with [`SqliteStoreError::Invalid`] when `sql` yields no row.
fn require_row(
    connection: &Connection,
    sql: &str,
    key: i64,
    message: impl FnOnce() -> String,
) -> Result<(), SqliteStoreError> {
    if row_exists(connection, sql, key)? {
        Ok(())
    } else {
        Err(SqliteStoreError::Invalid(message()))
    }
}

/// Resolves a tag by name or inserts it inside an open transaction.
fn ensure_tag_tx(connection: &Connection, tag: NewTag) -> Result<Tag, SqliteStoreError> {
    let existing = connection
        .query_row(
            "SELECT id, description FROM tags WHERE name = ?1",
            params![tag.name],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()
        .map_err(db_error)?;
    if let Some((raw_id, description)) = existing {
        let id: TagId = read_id(raw_id, "tag")?;
        if tag.id.is_some_and(|requested| requested != id) {
            return Err(SqliteStoreError::Conflict(format!("tag name {} already taken", tag.name)));
        }
        return Ok(Tag {
            id,
            name: tag.name,
            description,
        });
    }
    if let Some(id) = tag.id
        && row_exists(connection, "SELECT 1 FROM tags WHERE id = ?1", id.to_i64())?
    {
        return Err(SqliteStoreError::Conflict(format!("tag {id} already exists")));
    }
    connection
        .execute(
            "INSERT INTO tags (id, name, description) VALUES (?1, ?2, ?3)",
            params![tag.id.map(TagId::to_i64), tag.name, tag.description],
        )
        .map_err(db_error)?;
    Ok(Tag {
        id: read_id(connection.last_insert_rowid(), "tag")?,
        name: tag.name,
        description: tag.description,
    })
}

/// Loads a question's tags ordered by id.
fn load_tags(connection: &Connection, question: QuestionId) -> Result<Vec<Tag>, SqliteStoreError> {
    let mut statement = connection
        .prepare(
            "SELECT t.id, t.name, t.description FROM question_tags qt \
             JOIN tags t ON t.id = qt.tag_id WHERE qt.question_id = ?1 ORDER BY t.id ASC",
        )
        .map_err(db_error)?;
    let rows = statement
        .query_map(params![question.to_i64()], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })
        .map_err(db_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(db_error)?;
    rows.into_iter()
        .map(|(id, name, description)| {
            Ok(Tag {
                id: read_id(id, "tag")?,
                name,
                description,
            })
        })
        .collect()
}

/// Returns the vote sum of a question.
fn vote_sum_tx(connection: &Connection, question: QuestionId) -> Result<i64, SqliteStoreError> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(CASE vote WHEN 'up' THEN 1 WHEN 'down' THEN -1 ELSE 0 END), 0) \
             FROM question_votes WHERE question_id = ?1",
            params![question.to_i64()],
            |row| row.get(0),
        )
        .map_err(db_error)
}

/// Returns the number of stars held by `user`.
fn count_stars(connection: &Connection, user: UserId) -> Result<u64, SqliteStoreError> {
    let count: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM message_stars WHERE user_id = ?1",
            params![user.to_i64()],
            |row| row.get(0),
        )
        .map_err(db_error)?;
    read_count(count)
}

/// Returns the requester bindings for [`QUESTION_STATS_CTE`].
fn requester_values(requester: UserId) -> Vec<Value> {
    vec![Value::Integer(requester.to_i64()); 3]
}

/// Builds the `WHERE` clause and bindings for a question plan.
fn question_filter(query: &QuestionQuery) -> (String, Vec<Value>) {
    let mut values = requester_values(query.requester);
    let mut conditions: Vec<String> = Vec::new();
    if let Some(start) = query.created_after {
        conditions.push("created_at >= ?".to_string());
        values.push(Value::Integer(start.as_unix_millis()));
    }
    if query.unanswered_only {
        conditions.push("answer_count = 0".to_string());
    }
    let tracked = query.tags.tracked();
    if !tracked.is_empty() {
        conditions.push(format!(
            "EXISTS (SELECT 1 FROM question_tags qt WHERE qt.question_id = stats.id AND \
             qt.tag_id IN ({}))",
            placeholders(tracked.len())
        ));
        values.extend(tracked.iter().map(|tag| Value::Integer(tag.to_i64())));
    }
    let ignored = query.tags.ignored();
    if !ignored.is_empty() {
        conditions.push(format!(
            "NOT EXISTS (SELECT 1 FROM question_tags qt WHERE qt.question_id = stats.id AND \
             qt.tag_id IN ({}))",
            placeholders(ignored.len())
        ));
        values.extend(ignored.iter().map(|tag| Value::Integer(tag.to_i64())));
    }
    let clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    (clause, values)
}

/// Returns `count` comma-separated placeholders.
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Returns the `ORDER BY` expression for a sort key (ties by id ascending).
const fn order_clause(sort: QuestionSort) -> &'static str {
    match sort {
        QuestionSort::IdAsc => "id ASC",
        QuestionSort::PopularityDesc => "(vote_sum + answer_count + view_count) DESC, id ASC",
        QuestionSort::NewestFirst => "created_at DESC, id ASC",
        QuestionSort::ReputationDesc => "author_reputation DESC, id ASC",
        QuestionSort::ViewCountDesc => "view_count DESC, id ASC",
        QuestionSort::VotesDesc => "vote_sum DESC, id ASC",
    }
}

// ============================================================================
// SECTION: Connection Setup
// ============================================================================

/// Ensures the parent directory for the database exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))?;
    }
    Ok(())
}

/// Validates the store path against length and type limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    apply_pragmas(&connection, config)?;
    register_functions(&connection)?;
    Ok(connection)
}

/// Registers the scalar functions used by listing SQL.
///
/// `qa_fold_case` applies [`fold_case`], since the built-in `lower()` only
/// folds ASCII letters.
fn register_functions(connection: &Connection) -> Result<(), SqliteStoreError> {
    connection
        .create_scalar_function(
            "qa_fold_case",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|text| fold_case(&text))),
        )
        .map_err(db_error)
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection.execute_batch("PRAGMA foreign_keys = ON;").map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    connection.busy_timeout(Duration::from_millis(config.busy_timeout_ms)).map_err(db_error)?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_error)?;
            tx.execute_batch(SCHEMA_SQL).map_err(db_error)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_error)?;
    Ok(())
}
