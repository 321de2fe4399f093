use super::repo_tx_memory::downcast;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};

#[derive(Debug, Default)]
pub struct MemoryConversationRepo;

impl MemoryConversationRepo {
    pub fn new() -> Self {
        MemoryConversationRepo
    }
}

fn store_err(e: anyhow::Error) -> ChatError {
    ChatError::Store(e.to_string())
}

#[async_trait::async_trait]
impl ConversationRepo for MemoryConversationRepo {
    async fn get_by_pair_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        pair: StudentPair,
    ) -> Result<Option<ConversationRecord>, ChatError> {
        let state = downcast(tx).map_err(store_err)?;
        Ok(state
            .conversations
            .values()
            .find(|c| c.pair == pair)
            .cloned())
    }

    async fn get_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        conversation_id: ConversationId,
    ) -> Result<Option<ConversationRecord>, ChatError> {
        let state = downcast(tx).map_err(store_err)?;
        Ok(state.conversations.get(&conversation_id).cloned())
    }

    async fn insert_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        conversation: &ConversationRecord,
    ) -> Result<(), ChatError> {
        let state = downcast(tx).map_err(store_err)?;
        if state
            .conversations
            .values()
            .any(|c| c.pair == conversation.pair)
        {
            return Err(ChatError::AlreadyExists);
        }
        state
            .conversations
            .insert(conversation.conversation_id, conversation.clone());
        Ok(())
    }

    async fn advance_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        conversation_id: ConversationId,
        at: DateTime<Utc>,
    ) -> Result<MessageOffset, ChatError> {
        let state = downcast(tx).map_err(store_err)?;
        let conversation = state
            .conversations
            .get_mut(&conversation_id)
            .ok_or(ChatError::ConversationNotFound)?;
        conversation.last_msg_off = conversation.last_msg_off.next();
        conversation.last_msg_at = Some(at);
        Ok(conversation.last_msg_off)
    }

    async fn list_for_student_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        student: StudentId,
        page_size: PageSize,
        before: Option<ConversationCursor>,
    ) -> Result<Vec<ConversationRecord>, ChatError> {
        let state = downcast(tx).map_err(store_err)?;
        let mut rows: Vec<&ConversationRecord> = state
            .conversations
            .values()
            .filter(|c| c.pair.contains(student))
            .filter(|c| before.is_none_or(|cursor| ConversationCursor::of(c) < cursor))
            .collect();
        rows.sort_by_key(|c| std::cmp::Reverse(ConversationCursor::of(c)));
        Ok(rows
            .into_iter()
            .take(page_size.limit())
            .cloned()
            .collect())
    }
}
