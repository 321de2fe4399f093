//! MySQL backend. Tables are defined in `schema/mysql.sql`.

mod conversation_repo_mysql;
mod group_repo_mysql;
mod message_repo_mysql;
mod request_repo_mysql;
mod student_repo_mysql;

pub use conversation_repo_mysql::*;
pub use group_repo_mysql::*;
pub use message_repo_mysql::*;
pub use request_repo_mysql::*;
pub use student_repo_mysql::*;

mod repo_tx_mysql;

pub use repo_tx_mysql::*;

mod util;
