//! Tracing setup: bootstrap filter first, then the one from settings.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
