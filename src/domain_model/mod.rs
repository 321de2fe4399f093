mod group;
mod message;
mod request;
mod student;
mod unit;

pub use group::*;
pub use message::*;
pub use request::*;
pub use student::*;
pub use unit::*;
