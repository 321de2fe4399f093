mod auth_service;
mod conversation_service;
mod discovery_service;
mod error_kind;
mod group_service;
mod identity_service;
mod permission_oracle;
mod request_service;

pub use auth_service::*;
pub use conversation_service::*;
pub use discovery_service::*;
pub use error_kind::*;
pub use group_service::*;
pub use identity_service::*;
pub use permission_oracle::*;
pub use request_service::*;
