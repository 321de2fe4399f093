use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub struct RealConversationService {
    conversation_repo: Arc<dyn ConversationRepo>,
    message_repo: Arc<dyn MessageRepo>,
    oracle: Arc<dyn PermissionOracle>,
    tx_manager: Arc<dyn TxManager>,
}

impl RealConversationService {
    pub fn new(
        conversation_repo: Arc<dyn ConversationRepo>,
        message_repo: Arc<dyn MessageRepo>,
        oracle: Arc<dyn PermissionOracle>,
        tx_manager: Arc<dyn TxManager>,
    ) -> Self {
        Self {
            conversation_repo,
            message_repo,
            oracle,
            tx_manager,
        }
    }

    /// Finds the pair's conversation or creates it; a lost creation race reads back the winner.
    async fn conversation_for_pair_in_tx(
        &self,
        tx: &mut dyn StorageTx<'_>,
        pair: StudentPair,
    ) -> Result<ConversationRecord, ChatError> {
        if let Some(conversation) = self.conversation_repo.get_by_pair_in_tx(tx, pair).await? {
            return Ok(conversation);
        }

        let conversation = ConversationRecord {
            conversation_id: ConversationId(Uuid::new_v4()),
            pair,
            last_msg_off: MessageOffset(0),
            last_msg_at: None,
            created_at: Utc::now(),
        };
        match self.conversation_repo.insert_in_tx(tx, &conversation).await {
            Ok(()) => Ok(conversation),
            Err(ChatError::AlreadyExists) => self
                .conversation_repo
                .get_by_pair_in_tx(tx, pair)
                .await?
                .ok_or_else(|| ChatError::Store("inconsistent conversation state".to_string())),
            Err(e) => Err(e),
        }
    }
}

fn validate_content(content: &str) -> Result<(), ChatError> {
    if content.trim().is_empty() {
        return Err(ChatError::InvalidContent("message must not be blank"));
    }
    if content.chars().count() > MAX_MESSAGE_LEN {
        return Err(ChatError::InvalidContent("message is too long"));
    }
    Ok(())
}

#[async_trait::async_trait]
impl ConversationService for RealConversationService {
    async fn send_message(
        &self,
        sender: StudentId,
        recipient: StudentId,
        message_id: MessageId,
        content: &str,
    ) -> Result<MessageRecord, ChatError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| ChatError::Store(e.to_string()))?;

        if !self.oracle.can_message_in_tx(&mut *tx, sender, recipient).await? {
            tracing::trace!(%sender, %recipient, "message send not permitted");
            return Err(ChatError::NotPermitted);
        }
        validate_content(content)?;

        let pair = StudentPair::new(sender, recipient);

        // resend with a known id returns the stored message
        if let Some(existing) = self.message_repo.get_in_tx(&mut *tx, message_id).await? {
            let same_pair = self
                .conversation_repo
                .get_in_tx(&mut *tx, existing.conversation_id)
                .await?
                .is_some_and(|c| c.pair == pair);
            if existing.sender != sender || !same_pair {
                return Err(ChatError::MessageIdTaken);
            }
            return Ok(existing);
        }

        let conversation = self.conversation_for_pair_in_tx(&mut *tx, pair).await?;

        let now = Utc::now();
        let offset = self
            .conversation_repo
            .advance_in_tx(&mut *tx, conversation.conversation_id, now)
            .await?;
        let record = MessageRecord {
            message_id,
            conversation_id: conversation.conversation_id,
            message_offset: offset,
            sender,
            content: content.to_string(),
            created_at: now,
        };
        self.message_repo.insert_in_tx(&mut *tx, &record).await?;

        tx.commit()
            .await
            .map_err(|e| ChatError::Store(e.to_string()))?;

        Ok(record)
    }

    async fn get_history(
        &self,
        student: StudentId,
        conversation_id: ConversationId,
        page_size: PageSize,
        before: Option<OffsetCursor>,
    ) -> Result<Vec<MessageRecord>, ChatError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| ChatError::Store(e.to_string()))?;

        let conversation = self
            .conversation_repo
            .get_in_tx(&mut *tx, conversation_id)
            .await?
            .ok_or(ChatError::ConversationNotFound)?;
        if !conversation.pair.contains(student) {
            return Err(ChatError::NotParticipant);
        }
        let other = conversation.pair.other(student);
        if !self.oracle.can_message_in_tx(&mut *tx, student, other).await? {
            return Err(ChatError::NotPermitted);
        }

        let page = self
            .message_repo
            .list_before_in_tx(&mut *tx, conversation_id, page_size, before)
            .await?;

        tx.commit()
            .await
            .map_err(|e| ChatError::Store(e.to_string()))?;

        Ok(page)
    }

    async fn list_conversations(
        &self,
        student: StudentId,
        page_size: PageSize,
        before: Option<ConversationCursor>,
    ) -> Result<Vec<ConversationSummary>, ChatError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| ChatError::Store(e.to_string()))?;

        // revoked pairs are skipped, so keep scanning until the page fills up
        let limit = page_size.limit();
        let mut visible = Vec::with_capacity(limit);
        let mut scanned = 0;
        let mut cursor = before;
        'scan: loop {
            let batch = self
                .conversation_repo
                .list_for_student_in_tx(&mut *tx, student, page_size, cursor)
                .await?;
            let exhausted = batch.len() < limit;
            scanned += batch.len();

            for conversation in batch {
                cursor = Some(ConversationCursor::of(&conversation));
                let other = conversation.pair.other(student);
                if !self.oracle.can_message_in_tx(&mut *tx, student, other).await? {
                    continue;
                }
                visible.push(ConversationSummary {
                    conversation_id: conversation.conversation_id,
                    other_student: other,
                    last_msg_off: conversation.last_msg_off,
                    last_msg_at: conversation.last_msg_at,
                    activity_at: conversation.activity_at(),
                });
                if visible.len() == limit {
                    break 'scan;
                }
            }
            if exhausted {
                break;
            }
        }
        tracing::trace!(%student, scanned, count = visible.len(), "visible conversations");

        tx.commit()
            .await
            .map_err(|e| ChatError::Store(e.to_string()))?;

        Ok(visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::testkit::TestKit;

    fn new_id() -> MessageId {
        MessageId(Uuid::new_v4())
    }

    #[tokio::test]
    async fn strangers_are_refused() {
        let kit = TestKit::new();
        let (a, b) = (kit.student("a").await, kit.student("b").await);

        let err = kit.chat.send_message(a, b, new_id(), "hi").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert!(kit.chat.list_conversations(a, PageSize::default(), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn messages_get_consecutive_offsets_in_one_conversation() {
        let kit = TestKit::new();
        let (a, b) = (kit.student("a").await, kit.student("b").await);
        kit.connect(a, b).await;

        let m1 = kit.chat.send_message(a, b, new_id(), "hello").await.unwrap();
        let m2 = kit.chat.send_message(b, a, new_id(), "hey").await.unwrap();
        let m3 = kit.chat.send_message(a, b, new_id(), "project?").await.unwrap();

        assert_eq!(m1.conversation_id, m2.conversation_id);
        assert_eq!(m2.conversation_id, m3.conversation_id);
        let offsets: Vec<u64> = [&m1, &m2, &m3].iter().map(|m| m.message_offset.0).collect();
        assert_eq!(offsets, vec![1, 2, 3]);

        let history = kit
            .chat
            .get_history(b, m1.conversation_id, PageSize::default(), None)
            .await
            .unwrap();
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["project?", "hey", "hello"]);

        let older = kit
            .chat
            .get_history(
                a,
                m1.conversation_id,
                PageSize(1),
                Some(OffsetCursor {
                    offset: m3.message_offset,
                }),
            )
            .await
            .unwrap();
        assert_eq!(older.len(), 1);
        assert_eq!(older[0].message_id, m2.message_id);
    }

    #[tokio::test]
    async fn resending_a_message_id_is_idempotent() {
        let kit = TestKit::new();
        let (a, b, c) = (kit.student("a").await, kit.student("b").await, kit.student("c").await);
        kit.connect(a, b).await;
        kit.connect(c, b).await;

        let id = new_id();
        let first = kit.chat.send_message(a, b, id, "once").await.unwrap();
        let again = kit.chat.send_message(a, b, id, "once").await.unwrap();
        assert_eq!(first.message_offset, again.message_offset);

        let history = kit
            .chat
            .get_history(a, first.conversation_id, PageSize::default(), None)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);

        let err = kit.chat.send_message(c, b, id, "stolen").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn content_is_validated() {
        let kit = TestKit::new();
        let (a, b) = (kit.student("a").await, kit.student("b").await);
        kit.connect(a, b).await;

        let err = kit.chat.send_message(a, b, new_id(), "  \n").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        let long = "x".repeat(MAX_MESSAGE_LEN + 1);
        let err = kit.chat.send_message(a, b, new_id(), &long).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOperation);

        let max = "x".repeat(MAX_MESSAGE_LEN);
        kit.chat.send_message(a, b, new_id(), &max).await.unwrap();
    }

    #[tokio::test]
    async fn history_is_hidden_from_outsiders_and_former_groupmates() {
        let kit = TestKit::new();
        let (a, b, c) = (kit.student("a").await, kit.student("b").await, kit.student("c").await);
        kit.partner(a, b).await;

        let message = kit.chat.send_message(a, b, new_id(), "hi partner").await.unwrap();
        let conversation_id = message.conversation_id;

        let err = kit
            .chat
            .get_history(c, conversation_id, PageSize::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotParticipant));

        let err = kit
            .chat
            .get_history(a, ConversationId(Uuid::new_v4()), PageSize::default(), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // b leaves: the permission comes only from the shared group
        kit.groups.remove_member(b, b).await.unwrap();
        let err = kit
            .chat
            .get_history(a, conversation_id, PageSize::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::NotPermitted));
        assert!(kit.chat.list_conversations(a, PageSize::default(), None).await.unwrap().is_empty());
        let err = kit.chat.send_message(b, a, new_id(), "still there?").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn conversations_are_listed_by_recent_activity() {
        let kit = TestKit::new();
        let (a, b, c) = (kit.student("a").await, kit.student("b").await, kit.student("c").await);
        kit.connect(a, b).await;
        kit.connect(a, c).await;

        kit.chat.send_message(a, b, new_id(), "first").await.unwrap();
        kit.chat.send_message(c, a, new_id(), "second").await.unwrap();

        let list = kit.chat.list_conversations(a, PageSize::default(), None).await.unwrap();
        let others: Vec<StudentId> = list.iter().map(|c| c.other_student).collect();
        assert_eq!(others, vec![c, b]);

        let for_b = kit.chat.list_conversations(b, PageSize::default(), None).await.unwrap();
        assert_eq!(for_b.len(), 1);
        assert_eq!(for_b[0].other_student, a);
        assert_eq!(for_b[0].last_msg_off, MessageOffset(1));
    }

    #[tokio::test]
    async fn revoked_conversations_do_not_crowd_out_permitted_ones() {
        let kit = TestKit::new();
        let [a, b, c, d] = [
            kit.student("a").await,
            kit.student("b").await,
            kit.student("c").await,
            kit.student("d").await,
        ];
        kit.connect(a, d).await;
        kit.chat.send_message(a, d, new_id(), "oldest").await.unwrap();

        kit.partner(a, b).await;
        kit.partner(a, c).await;
        kit.chat.send_message(a, b, new_id(), "newer").await.unwrap();
        kit.chat.send_message(a, c, new_id(), "newest").await.unwrap();
        kit.groups.remove_member(a, b).await.unwrap();
        kit.groups.remove_member(a, c).await.unwrap();

        // both revoked conversations sort ahead of the permitted one
        let list = kit.chat.list_conversations(a, PageSize(1), None).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].other_student, d);

        let rest = kit
            .chat
            .list_conversations(a, PageSize(1), Some(ConversationCursor::of_summary(&list[0])))
            .await
            .unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn conversation_pages_resume_from_cursor() {
        let kit = TestKit::new();
        let a = kit.student("a").await;
        let mut others = Vec::new();
        for name in ["b", "c", "d"] {
            let other = kit.student(name).await;
            kit.connect(a, other).await;
            kit.chat.send_message(other, a, new_id(), "hello").await.unwrap();
            others.push(other);
        }

        let first = kit.chat.list_conversations(a, PageSize(2), None).await.unwrap();
        assert_eq!(first.len(), 2);
        let cursor = ConversationCursor::of_summary(&first[1]);
        let second = kit.chat.list_conversations(a, PageSize(2), Some(cursor)).await.unwrap();
        assert_eq!(second.len(), 1);

        let seen: Vec<StudentId> = first.iter().chain(&second).map(|c| c.other_student).collect();
        others.reverse();
        assert_eq!(seen, others);
    }
}
