//! Chat repository port: conversations and their messages.

use std::future::Future;

use tutorhub_domain::chat::{Conversation, Message};
use tutorhub_domain::error::TutorHubError;
use tutorhub_domain::id::{ConversationId, UserId};

pub trait ChatRepository {
    fn create_conversation(
        &self,
        conversation: Conversation,
    ) -> impl Future<Output = Result<Conversation, TutorHubError>> + Send;

    fn get_conversation(
        &self,
        id: ConversationId,
    ) -> impl Future<Output = Result<Option<Conversation>, TutorHubError>> + Send;

    /// The conversation whose members are exactly `a` and `b`, in any order.
    fn find_between(
        &self,
        a: UserId,
        b: UserId,
    ) -> impl Future<Output = Result<Option<Conversation>, TutorHubError>> + Send;

    /// Conversations `member` belongs to, most recently updated first.
    fn list_for_member(
        &self,
        member: UserId,
    ) -> impl Future<Output = Result<Vec<Conversation>, TutorHubError>> + Send;

    fn update_conversation(
        &self,
        conversation: Conversation,
    ) -> impl Future<Output = Result<Conversation, TutorHubError>> + Send;

    fn append_message(
        &self,
        message: Message,
    ) -> impl Future<Output = Result<Message, TutorHubError>> + Send;

    /// Messages of a conversation, oldest first.
    fn list_messages(
        &self,
        conversation: ConversationId,
    ) -> impl Future<Output = Result<Vec<Message>, TutorHubError>> + Send;
}
