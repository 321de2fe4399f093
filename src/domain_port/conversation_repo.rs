use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;
use chrono::{DateTime, Utc};

#[async_trait::async_trait]
pub trait ConversationRepo: Send + Sync {
    /// Locks the row until the transaction ends.
    async fn get_by_pair_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        pair: StudentPair,
    ) -> Result<Option<ConversationRecord>, ChatError>;
    async fn get_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        conversation_id: ConversationId,
    ) -> Result<Option<ConversationRecord>, ChatError>;
    /// Fails with `AlreadyExists` when the pair already has a conversation.
    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        conversation: &ConversationRecord,
    ) -> Result<(), ChatError>;
    /// Bumps `last_msg_off` and `last_msg_at`, returning the new offset.
    async fn advance_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        conversation_id: ConversationId,
        at: DateTime<Utc>,
    ) -> Result<MessageOffset, ChatError>;
    /// Recent for a student, order by (activity_at DESC, conversation_id DESC),
    /// strictly after `before` when given.
    async fn list_for_student_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        student: StudentId,
        page_size: PageSize,
        before: Option<ConversationCursor>,
    ) -> Result<Vec<ConversationRecord>, ChatError>;
}
