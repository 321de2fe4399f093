use crate::application_port::ErrorKind;
use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    #[error("student not found")]
    StudentNotFound,
    #[error("request not found")]
    RequestNotFound,
    #[error("group not found")]
    GroupNotFound,
    #[error("only the recipient can resolve this request")]
    NotRecipient,
    #[error("not a member of this group")]
    NotMember,
    #[error("cannot send a request to yourself")]
    SelfRequest,
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("student is not in a matching semester")]
    NotMatchable,
    #[error("a pending {0} request already exists between these students")]
    RequestExists(RequestKind),
    #[error("request already {0}")]
    AlreadyResolved(RequestStatus),
    #[error("students can already message each other")]
    AlreadyConnected,
    #[error("students are already in the same group")]
    AlreadyGroupmates,
    #[error("student already belongs to a group")]
    AlreadyInGroup,
    #[error("group is locked")]
    GroupLocked,
    #[error("group is full")]
    GroupFull,
    #[error("cannot merge two existing groups")]
    GroupsCannotMerge,
    #[error("store error: {0}")]
    Store(String),
}

impl RelationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelationError::StudentNotFound
            | RelationError::RequestNotFound
            | RelationError::GroupNotFound => ErrorKind::NotFound,
            RelationError::NotRecipient | RelationError::NotMember => ErrorKind::Forbidden,
            RelationError::SelfRequest
            | RelationError::InvalidInput(_)
            | RelationError::NotMatchable => ErrorKind::InvalidOperation,
            RelationError::RequestExists(_)
            | RelationError::AlreadyResolved(_)
            | RelationError::AlreadyConnected
            | RelationError::AlreadyGroupmates
            | RelationError::AlreadyInGroup
            | RelationError::GroupLocked
            | RelationError::GroupFull
            | RelationError::GroupsCannotMerge => ErrorKind::Conflict,
            RelationError::Store(_) => ErrorKind::Internal,
        }
    }
}

pub const MAX_REASON_LEN: usize = 500;

#[derive(Debug, Clone)]
pub struct SendRequestInput {
    pub kind: RequestKind,
    pub from: StudentId,
    pub to: StudentId,
    pub reason: Option<String>,
}

/// The connection request ledger.
#[async_trait::async_trait]
pub trait RequestService: Send + Sync {
    async fn send(&self, input: SendRequestInput) -> Result<ConnectionRequest, RelationError>;
    /// Recipient-only. A PARTNER acceptance also forms or extends a group, atomically.
    async fn accept(
        &self,
        request_id: RequestId,
        by: StudentId,
    ) -> Result<ConnectionRequest, RelationError>;
    async fn reject(
        &self,
        request_id: RequestId,
        by: StudentId,
    ) -> Result<ConnectionRequest, RelationError>;
    async fn list_sent(
        &self,
        student: StudentId,
        page_size: PageSize,
        before: Option<RequestCursor>,
    ) -> Result<Vec<ConnectionRequest>, RelationError>;
    async fn list_received(
        &self,
        student: StudentId,
        page_size: PageSize,
        before: Option<RequestCursor>,
    ) -> Result<Vec<ConnectionRequest>, RelationError>;
}
