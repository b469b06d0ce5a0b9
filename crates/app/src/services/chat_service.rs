//! Chat service: two-member conversations between any users.

use tutorhub_domain::chat::{Conversation, Message, MessageView};
use tutorhub_domain::error::{NotFoundError, TutorHubError};
use tutorhub_domain::id::{ConversationId, UserId, require_id};
use tutorhub_domain::identity::{Identity, UserKind};
use tutorhub_domain::summary::{ConversationView, PersonSummary};

use crate::ports::{ChatRepository, StudentRepository, TeacherRepository};

fn conversation_not_found(id: ConversationId) -> TutorHubError {
    NotFoundError {
        entity: "Conversation",
        id: id.to_string(),
    }
    .into()
}

pub struct ChatService<C, S, T> {
    chats: C,
    students: S,
    teachers: T,
}

impl<C, S, T> ChatService<C, S, T>
where
    C: ChatRepository,
    S: StudentRepository,
    T: TeacherRepository,
{
    pub fn new(chats: C, students: S, teachers: T) -> Self {
        Self {
            chats,
            students,
            teachers,
        }
    }

    /// The caller's conversations, most recently active first.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repositories.
    pub async fn list_conversations(
        &self,
        me: &Identity,
    ) -> Result<Vec<ConversationView>, TutorHubError> {
        let conversations = self.chats.list_for_member(me.user_id).await?;
        let mut views = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let other = self.person(conversation.other(me.user_id)).await?;
            views.push(ConversationView::new(conversation, other));
        }
        Ok(views)
    }

    /// Open a conversation with `user_id`, or return the existing one.
    ///
    /// The flag is `true` when a new conversation was created.
    ///
    /// # Errors
    ///
    /// - [`TutorHubError::Validation`] for a missing or malformed id and for
    ///   the caller's own id.
    /// - [`TutorHubError::NotFound`] when no student or teacher has that id.
    #[tracing::instrument(skip(self, me), fields(user_id = %me.user_id))]
    pub async fn open_conversation(
        &self,
        me: &Identity,
        user_id: Option<&str>,
    ) -> Result<(ConversationView, bool), TutorHubError> {
        let other: UserId = require_id(user_id, &["user_id"])?;
        let conversation = Conversation::between(me.user_id, other)?;
        let Some(summary) = self.person(other).await? else {
            return Err(NotFoundError {
                entity: "User",
                id: other.to_string(),
            }
            .into());
        };

        if let Some(existing) = self.chats.find_between(me.user_id, other).await? {
            return Ok((ConversationView::new(existing, Some(summary)), false));
        }
        let conversation = self.chats.create_conversation(conversation).await?;
        tracing::info!(conversation_id = %conversation.id, "conversation opened");
        Ok((ConversationView::new(conversation, Some(summary)), true))
    }

    /// Messages of a conversation the caller belongs to, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TutorHubError::NotFound`] when the conversation does not
    /// exist or the caller is not a member.
    pub async fn messages(
        &self,
        me: &Identity,
        id: ConversationId,
    ) -> Result<Vec<MessageView>, TutorHubError> {
        self.membership(me, id).await?;
        let messages = self.chats.list_messages(id).await?;
        Ok(messages
            .into_iter()
            .map(|m| MessageView::for_reader(m, me.user_id))
            .collect())
    }

    /// Post a message and refresh the conversation preview.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyMessage`](tutorhub_domain::error::ValidationError::EmptyMessage)
    /// for blank text and [`TutorHubError::NotFound`] for non-members.
    #[tracing::instrument(skip(self, me, text), fields(user_id = %me.user_id))]
    pub async fn send(
        &self,
        me: &Identity,
        id: ConversationId,
        text: Option<&str>,
    ) -> Result<MessageView, TutorHubError> {
        let mut conversation = self.membership(me, id).await?;
        let message = Message::new(id, me.user_id, text)?;
        let message = self.chats.append_message(message).await?;
        conversation.record(&message);
        self.chats.update_conversation(conversation).await?;
        Ok(MessageView::for_reader(message, me.user_id))
    }

    async fn membership(
        &self,
        me: &Identity,
        id: ConversationId,
    ) -> Result<Conversation, TutorHubError> {
        self.chats
            .get_conversation(id)
            .await?
            .filter(|c| c.has_member(me.user_id))
            .ok_or_else(|| conversation_not_found(id))
    }

    /// Resolve a member as a student first, then as a teacher.
    async fn person(&self, id: UserId) -> Result<Option<PersonSummary>, TutorHubError> {
        if let Some(student) = self.students.get_by_id(id.into()).await? {
            return Ok(Some(
                PersonSummary::student(&student)
                    .with_bio(student.profile.bio.as_ref())
                    .with_kind(UserKind::Student),
            ));
        }
        Ok(self.teachers.get_by_id(id.into()).await?.map(|teacher| {
            PersonSummary::teacher(&teacher)
                .with_bio(teacher.profile.bio.as_ref())
                .with_kind(UserKind::Teacher)
        }))
    }
}
