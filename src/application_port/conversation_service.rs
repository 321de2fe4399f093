use crate::application_port::{ErrorKind, RelationError};
use crate::domain_model::*;

pub const MAX_MESSAGE_LEN: usize = 4000;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("conversation not found")]
    ConversationNotFound,
    #[error("student not a participant of conversation")]
    NotParticipant,
    #[error("students are not permitted to message each other")]
    NotPermitted,
    #[error("invalid message: {0}")]
    InvalidContent(&'static str),
    #[error("conflict: conversation already exists")]
    AlreadyExists,
    #[error("conflict: message id already used by another message")]
    MessageIdTaken,
    #[error("store error: {0}")]
    Store(String),
}

impl ChatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChatError::ConversationNotFound => ErrorKind::NotFound,
            ChatError::NotParticipant | ChatError::NotPermitted => ErrorKind::Forbidden,
            ChatError::InvalidContent(_) => ErrorKind::InvalidOperation,
            ChatError::AlreadyExists | ChatError::MessageIdTaken => ErrorKind::Conflict,
            ChatError::Store(_) => ErrorKind::Internal,
        }
    }
}

impl From<RelationError> for ChatError {
    fn from(err: RelationError) -> Self {
        ChatError::Store(format!("permission check: {err}"))
    }
}

#[async_trait::async_trait]
pub trait ConversationService: Send + Sync {
    async fn send_message(
        &self,
        sender: StudentId,
        recipient: StudentId,
        message_id: MessageId,
        content: &str,
    ) -> Result<MessageRecord, ChatError>;
    async fn get_history(
        &self,
        student: StudentId,
        conversation_id: ConversationId,
        page_size: PageSize,
        before: Option<OffsetCursor>,
    ) -> Result<Vec<MessageRecord>, ChatError>;
    /// Conversations the student may still message in, most recent activity first.
    /// A full page is returned whenever enough permitted conversations remain.
    async fn list_conversations(
        &self,
        student: StudentId,
        page_size: PageSize,
        before: Option<ConversationCursor>,
    ) -> Result<Vec<ConversationSummary>, ChatError>;
}
