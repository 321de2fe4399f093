// repo

mod conversation_repo;
mod group_repo;
mod message_repo;
mod request_repo;
mod student_repo;

mod repo_tx;

pub use conversation_repo::*;
pub use group_repo::*;
pub use message_repo::*;
pub use request_repo::*;
pub use student_repo::*;

pub use repo_tx::*;
