mod conversation_service_impl;
mod discovery_service_impl;
mod group_service_impl;
mod identity_service_impl;
mod permission_oracle_impl;
mod request_service_impl;
mod token_verifier_fake;
mod token_verifier_impl;

#[cfg(test)]
pub(crate) mod testkit;

pub use conversation_service_impl::*;
pub use discovery_service_impl::*;
pub use group_service_impl::*;
pub use identity_service_impl::*;
pub use permission_oracle_impl::*;
pub use request_service_impl::*;
pub use token_verifier_fake::*;
pub use token_verifier_impl::*;
