use super::repo_tx_memory::downcast;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;

#[derive(Debug, Default)]
pub struct MemoryMessageRepo;

impl MemoryMessageRepo {
    pub fn new() -> Self {
        MemoryMessageRepo
    }
}

fn store_err(e: anyhow::Error) -> ChatError {
    ChatError::Store(e.to_string())
}

#[async_trait::async_trait]
impl MessageRepo for MemoryMessageRepo {
    async fn get_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        message_id: MessageId,
    ) -> Result<Option<MessageRecord>, ChatError> {
        let state = downcast(tx).map_err(store_err)?;
        Ok(state.messages.get(&message_id).cloned())
    }

    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        message: &MessageRecord,
    ) -> Result<(), ChatError> {
        let state = downcast(tx).map_err(store_err)?;
        if state.messages.contains_key(&message.message_id) {
            return Err(ChatError::MessageIdTaken);
        }
        state.messages.insert(message.message_id, message.clone());
        Ok(())
    }

    async fn list_before_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        conversation_id: ConversationId,
        page_size: PageSize,
        before: Option<OffsetCursor>,
    ) -> Result<Vec<MessageRecord>, ChatError> {
        let state = downcast(tx).map_err(store_err)?;
        let mut rows: Vec<&MessageRecord> = state
            .messages
            .values()
            .filter(|m| m.conversation_id == conversation_id)
            .filter(|m| before.is_none_or(|cur| m.message_offset < cur.offset))
            .collect();
        rows.sort_by_key(|m| std::cmp::Reverse(m.message_offset));
        Ok(rows
            .into_iter()
            .take(page_size.limit())
            .cloned()
            .collect())
    }
}
