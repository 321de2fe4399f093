use crate::domain_model::*;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct ConversationId(pub uuid::Uuid);

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct MessageId(pub uuid::Uuid);

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct MessageOffset(pub u64);

impl MessageOffset {
    pub fn next(&self) -> Self {
        MessageOffset(self.0 + 1)
    }
}

impl FromStr for MessageOffset {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let offset = s.parse::<u64>().map_err(|e| e.to_string())?;
        Ok(Self(offset))
    }
}

/// Cursor for offset-ordered lists (history)
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct OffsetCursor {
    pub offset: MessageOffset,
}

impl FromStr for OffsetCursor {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let offset = s
            .parse::<MessageOffset>()
            .map_err(|e| format!("invalid offset: {}", e))?;

        Ok(OffsetCursor { offset })
    }
}

impl fmt::Display for OffsetCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.offset.0)
    }
}

impl OffsetCursor {
    pub fn of(message: &MessageRecord) -> Self {
        OffsetCursor {
            offset: message.message_offset,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversationRecord {
    pub conversation_id: ConversationId,
    pub pair: StudentPair,
    pub last_msg_off: MessageOffset,
    pub last_msg_at: Option<DateTime<Utc>>, // NULL before first message
    pub created_at: DateTime<Utc>,
}

impl ConversationRecord {
    /// Sort key for conversation lists: last message time, creation time before that.
    pub fn activity_at(&self) -> DateTime<Utc> {
        self.last_msg_at.unwrap_or(self.created_at)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub conversation_id: ConversationId,
    pub other_student: StudentId,
    pub last_msg_off: MessageOffset,
    pub last_msg_at: Option<DateTime<Utc>>,
    pub activity_at: DateTime<Utc>,
}

/// Cursor for conversation lists, ordered by (activity_at DESC, conversation_id DESC).
#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct ConversationCursor {
    pub activity_at: DateTime<Utc>,
    pub conversation_id: ConversationId, // tiebreaker
}

impl ConversationCursor {
    pub fn of(conversation: &ConversationRecord) -> Self {
        ConversationCursor {
            activity_at: conversation.activity_at(),
            conversation_id: conversation.conversation_id,
        }
    }

    pub fn of_summary(summary: &ConversationSummary) -> Self {
        ConversationCursor {
            activity_at: summary.activity_at,
            conversation_id: summary.conversation_id,
        }
    }
}

impl FromStr for ConversationCursor {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (date_str, id_str) = s.split_once('~').ok_or("invalid cursor format")?;

        let activity_at = date_str
            .parse::<DateTime<Utc>>()
            .map_err(|e| e.to_string())?;
        let conversation_id = uuid::Uuid::parse_str(id_str)
            .map(ConversationId)
            .map_err(|e| e.to_string())?;

        Ok(ConversationCursor {
            activity_at,
            conversation_id,
        })
    }
}

impl fmt::Display for ConversationCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let activity_at = self.activity_at.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        write!(f, "{}~{}", activity_at, self.conversation_id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageRecord {
    pub message_id: MessageId,
    pub conversation_id: ConversationId,
    pub message_offset: MessageOffset,
    pub sender: StudentId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
