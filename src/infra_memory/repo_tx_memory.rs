use crate::domain_model::*;
use crate::domain_port::{StorageTx, TxManager};
use anyhow::anyhow;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Every table of the in-memory backend.
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub students: BTreeMap<StudentId, Student>,
    pub requests: BTreeMap<RequestId, ConnectionRequest>,
    pub groups: BTreeMap<GroupId, GroupRecord>,
    // keyed by student: one membership per student
    pub members: BTreeMap<StudentId, GroupMember>,
    pub conversations: BTreeMap<ConversationId, ConversationRecord>,
    pub messages: BTreeMap<MessageId, MessageRecord>,
}

/// Serializes transactions on a single lock. Each transaction works on a snapshot that
/// replaces the shared state on commit and is discarded otherwise.
#[derive(Clone, Default)]
pub struct MemoryTxManager {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTxManager {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TxManager for MemoryTxManager {
    async fn begin<'t>(&'t self) -> anyhow::Result<Box<dyn StorageTx<'t> + 't>> {
        let guard = self.state.clone().lock_owned().await;
        Ok(Box::new(MemoryTx::new(guard)))
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

impl MemoryTx {
    fn new(guard: OwnedMutexGuard<MemoryState>) -> Self {
        let working = guard.clone();
        MemoryTx { guard, working }
    }

    pub fn state(&mut self) -> &mut MemoryState {
        &mut self.working
    }
}

#[async_trait::async_trait]
impl<'t> StorageTx<'t> for MemoryTx {
    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        Ok(())
    }

    fn as_any_mut(&mut self) -> Option<&mut (dyn Any + Send + 'static)> {
        Some(self)
    }
}

pub(super) fn downcast<'a>(tx: &'a mut dyn StorageTx<'_>) -> anyhow::Result<&'a mut MemoryState> {
    tx.as_any_mut()
        .and_then(|any| any.downcast_mut::<MemoryTx>())
        .map(MemoryTx::state)
        .ok_or_else(|| anyhow!("transaction does not belong to the memory backend"))
}
