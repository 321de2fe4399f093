use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

#[async_trait::async_trait]
pub trait MessageRepo: Send + Sync {
    async fn get_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        message_id: MessageId,
    ) -> Result<Option<MessageRecord>, ChatError>;
    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        message: &MessageRecord,
    ) -> Result<(), ChatError>;
    /// Order by message_offset DESC
    async fn list_before_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        conversation_id: ConversationId,
        page_size: PageSize,
        before: Option<OffsetCursor>,
    ) -> Result<Vec<MessageRecord>, ChatError>;
}
