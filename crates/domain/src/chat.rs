//! Chats: two-member conversations and their messages.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{ConversationId, MessageId, UserId};
use crate::time::{Timestamp, now};

/// Preview of the newest message, kept on the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessage {
    pub text: String,
    pub at: Timestamp,
    pub from: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub members: [UserId; 2],
    pub last_message: Option<LastMessage>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Conversation {
    /// Open a conversation between two distinct users.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SelfConversation`] when `a == b`.
    pub fn between(a: UserId, b: UserId) -> Result<Self, ValidationError> {
        if a == b {
            return Err(ValidationError::SelfConversation);
        }
        let ts = now();
        Ok(Self {
            id: ConversationId::new(),
            members: [a, b],
            last_message: None,
            created_at: ts,
            updated_at: ts,
        })
    }

    #[must_use]
    pub fn has_member(&self, user: UserId) -> bool {
        self.members.contains(&user)
    }

    /// The member that is not `me`.
    #[must_use]
    pub fn other(&self, me: UserId) -> UserId {
        if self.members[0] == me {
            self.members[1]
        } else {
            self.members[0]
        }
    }

    /// Record `message` as the newest one.
    pub fn record(&mut self, message: &Message) {
        self.last_message = Some(LastMessage {
            text: message.text.clone(),
            at: message.created_at,
            from: message.from,
        });
        self.updated_at = message.created_at;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub from: UserId,
    pub text: String,
    pub read_by: Vec<UserId>,
    pub created_at: Timestamp,
}

impl Message {
    /// Write a message; the sender has read it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyMessage`] when `text` is blank.
    pub fn new(
        conversation_id: ConversationId,
        from: UserId,
        text: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let text = text.map(str::trim).unwrap_or_default();
        if text.is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        Ok(Self {
            id: MessageId::new(),
            conversation_id,
            from,
            text: text.to_string(),
            read_by: vec![from],
            created_at: now(),
        })
    }
}

/// A message as seen by one of the members.
#[derive(Debug, Clone, Serialize)]
pub struct MessageView {
    pub id: MessageId,
    pub text: String,
    pub from: UserId,
    pub from_me: bool,
    pub created_at: Timestamp,
}

impl MessageView {
    #[must_use]
    pub fn for_reader(message: Message, reader: UserId) -> Self {
        Self {
            id: message.id,
            from_me: message.from == reader,
            text: message.text,
            from: message.from,
            created_at: message.created_at,
        }
    }
}
