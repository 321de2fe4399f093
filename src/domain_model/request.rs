use crate::domain_model::StudentId;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct RequestId(pub uuid::Uuid);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestKind {
    /// Form or join an FYP group.
    Partner,
    /// Messaging permission only.
    Message,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestKind::Partner => "partner",
            RequestKind::Message => "message",
        };
        f.write_str(s)
    }
}

impl FromStr for RequestKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "partner" => Ok(Self::Partner),
            "message" => Ok(Self::Message),
            _ => anyhow::bail!("unknown request kind: {}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

impl FromStr for RequestStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "rejected" => Ok(Self::Rejected),
            _ => anyhow::bail!("unknown request status: {}", s),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectionRequest {
    pub request_id: RequestId,
    pub kind: RequestKind,
    pub from: StudentId,
    pub to: StudentId,
    pub status: RequestStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ConnectionRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

/// Cursor for request lists, ordered by (created_at DESC, request_id DESC).
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct RequestCursor {
    pub created_at: DateTime<Utc>,
    pub request_id: RequestId, // tiebreaker
}

impl RequestCursor {
    pub fn of(request: &ConnectionRequest) -> Self {
        RequestCursor {
            created_at: request.created_at,
            request_id: request.request_id,
        }
    }
}

impl FromStr for RequestCursor {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (date_str, id_str) = s.split_once('~').ok_or("invalid cursor format")?;

        let created_at = date_str
            .parse::<DateTime<Utc>>()
            .map_err(|e| e.to_string())?;

        let request_id = uuid::Uuid::parse_str(id_str)
            .map(RequestId)
            .map_err(|e| e.to_string())?;

        Ok(RequestCursor {
            created_at,
            request_id,
        })
    }
}

impl fmt::Display for RequestCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `Z` suffix keeps the cursor free of `+` in query strings
        let created_at = self.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        write!(f, "{}~{}", created_at, self.request_id)
    }
}
