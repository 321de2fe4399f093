use serde::Serialize;

/// Coarse classification every service error maps onto at the boundary.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Conflict,
    InvalidOperation,
    Internal,
}
