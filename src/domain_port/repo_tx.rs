use std::any::Any;

#[async_trait::async_trait]
pub trait TxManager: Send + Sync {
    async fn begin<'t>(&'t self) -> anyhow::Result<Box<dyn StorageTx<'t> + 't>>;
}

/// Dropping a transaction without committing rolls it back.
#[async_trait::async_trait]
pub trait StorageTx<'t>: Send {
    async fn commit(self: Box<Self>) -> anyhow::Result<()>;
    async fn rollback(self: Box<Self>) -> anyhow::Result<()>;

    /// Transactions whose type is `'static` can expose themselves for checked downcasts.
    fn as_any_mut(&mut self) -> Option<&mut (dyn Any + Send + 'static)> {
        None
    }
}
