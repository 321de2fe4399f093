mod seed;
mod server;
mod services;

pub use seed::*;
pub use server::*;
pub use services::*;
