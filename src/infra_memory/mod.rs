//! In-memory backend for development runs and tests.

mod conversation_repo_memory;
mod group_repo_memory;
mod message_repo_memory;
mod request_repo_memory;
mod student_repo_memory;

pub use conversation_repo_memory::*;
pub use group_repo_memory::*;
pub use message_repo_memory::*;
pub use request_repo_memory::*;
pub use student_repo_memory::*;

mod repo_tx_memory;

pub use repo_tx_memory::*;
