//! `SQLite` implementation of [`ChatRepository`].

use std::future::Future;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use tutorhub_app::ports::ChatRepository;
use tutorhub_domain::chat::{Conversation, LastMessage, Message};
use tutorhub_domain::error::{NotFoundError, TutorHubError};
use tutorhub_domain::id::{ConversationId, UserId};
use tutorhub_domain::time::to_canonical;

use crate::error::{StorageError, decode};
use crate::row;

/// Order-independent key identifying a member pair.
fn pair_key(a: UserId, b: UserId) -> String {
    let (a, b) = (a.to_string(), b.to_string());
    if a <= b {
        format!("{a}:{b}")
    } else {
        format!("{b}:{a}")
    }
}

struct ConversationRow(Conversation);

impl<'r> FromRow<'r, SqliteRow> for ConversationRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let last_message: Option<String> = row.try_get("last_message")?;
        let last_message = last_message
            .map(|raw| serde_json::from_str::<LastMessage>(&raw))
            .transpose()
            .map_err(decode)?;
        Ok(Self(Conversation {
            id: row::parsed(row, "id")?,
            members: [
                row::parsed(row, "member_a")?,
                row::parsed(row, "member_b")?,
            ],
            last_message,
            created_at: row::timestamp(row, "created_at")?,
            updated_at: row::timestamp(row, "updated_at")?,
        }))
    }
}

struct MessageRow(Message);

impl<'r> FromRow<'r, SqliteRow> for MessageRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self(Message {
            id: row::parsed(row, "id")?,
            conversation_id: row::parsed(row, "conversation_id")?,
            from: row::parsed(row, "sender_id")?,
            text: row.try_get("text")?,
            read_by: row::json(row, "read_by")?,
            created_at: row::timestamp(row, "created_at")?,
        }))
    }
}

const INSERT_CONVERSATION: &str = r"
    INSERT INTO conversations (id, member_a, member_b, pair_key, last_message, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?)
";
const SELECT_CONVERSATION_BY_ID: &str = "SELECT * FROM conversations WHERE id = ?";
const SELECT_CONVERSATION_BY_PAIR: &str = "SELECT * FROM conversations WHERE pair_key = ?";
const SELECT_CONVERSATIONS_FOR_MEMBER: &str = r"
    SELECT * FROM conversations
    WHERE member_a = ? OR member_b = ?
    ORDER BY updated_at DESC
";
const UPDATE_CONVERSATION: &str =
    "UPDATE conversations SET last_message = ?, updated_at = ? WHERE id = ?";

const INSERT_MESSAGE: &str = r"
    INSERT INTO messages (id, conversation_id, sender_id, text, read_by, created_at)
    VALUES (?, ?, ?, ?, ?, ?)
";
const SELECT_MESSAGES: &str =
    "SELECT * FROM messages WHERE conversation_id = ? ORDER BY created_at, rowid";

/// `SQLite`-backed chat repository.
#[derive(Clone)]
pub struct SqliteChatRepository {
    pool: SqlitePool,
}

impl SqliteChatRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ChatRepository for SqliteChatRepository {
    fn create_conversation(
        &self,
        conversation: Conversation,
    ) -> impl Future<Output = Result<Conversation, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let last_message = conversation
                .last_message
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(StorageError::from)?;
            let [a, b] = conversation.members;

            sqlx::query(INSERT_CONVERSATION)
                .bind(conversation.id.to_string())
                .bind(a.to_string())
                .bind(b.to_string())
                .bind(pair_key(a, b))
                .bind(last_message)
                .bind(to_canonical(conversation.created_at))
                .bind(to_canonical(conversation.updated_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(conversation)
        }
    }

    fn get_conversation(
        &self,
        id: ConversationId,
    ) -> impl Future<Output = Result<Option<Conversation>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<ConversationRow> = sqlx::query_as(SELECT_CONVERSATION_BY_ID)
                .bind(id.to_string())
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row.map(|r| r.0))
        }
    }

    fn find_between(
        &self,
        a: UserId,
        b: UserId,
    ) -> impl Future<Output = Result<Option<Conversation>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let row: Option<ConversationRow> = sqlx::query_as(SELECT_CONVERSATION_BY_PAIR)
                .bind(pair_key(a, b))
                .fetch_optional(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(row.map(|r| r.0))
        }
    }

    fn list_for_member(
        &self,
        member: UserId,
    ) -> impl Future<Output = Result<Vec<Conversation>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let member = member.to_string();
            let rows: Vec<ConversationRow> = sqlx::query_as(SELECT_CONVERSATIONS_FOR_MEMBER)
                .bind(&member)
                .bind(&member)
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|r| r.0).collect())
        }
    }

    fn update_conversation(
        &self,
        conversation: Conversation,
    ) -> impl Future<Output = Result<Conversation, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let last_message = conversation
                .last_message
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .map_err(StorageError::from)?;

            let result = sqlx::query(UPDATE_CONVERSATION)
                .bind(last_message)
                .bind(to_canonical(conversation.updated_at))
                .bind(conversation.id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            if result.rows_affected() == 0 {
                return Err(NotFoundError {
                    entity: "Conversation",
                    id: conversation.id.to_string(),
                }
                .into());
            }
            Ok(conversation)
        }
    }

    fn append_message(
        &self,
        message: Message,
    ) -> impl Future<Output = Result<Message, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let read_by = serde_json::to_string(&message.read_by).map_err(StorageError::from)?;

            sqlx::query(INSERT_MESSAGE)
                .bind(message.id.to_string())
                .bind(message.conversation_id.to_string())
                .bind(message.from.to_string())
                .bind(&message.text)
                .bind(read_by)
                .bind(to_canonical(message.created_at))
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(message)
        }
    }

    fn list_messages(
        &self,
        conversation: ConversationId,
    ) -> impl Future<Output = Result<Vec<Message>, TutorHubError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows: Vec<MessageRow> = sqlx::query_as(SELECT_MESSAGES)
                .bind(conversation.to_string())
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(rows.into_iter().map(|r| r.0).collect())
        }
    }
}
