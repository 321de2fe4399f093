use crate::domain_model::StudentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Total team size cap, the student who founded the group included.
pub const MAX_GROUP_MEMBERS: u32 = 3;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct GroupId(pub uuid::Uuid);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Membership rules applied by the group engine.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct GroupPolicy {
    pub max_members: u32,
    /// Clear `is_locked` whenever a member leaves or is removed.
    pub unlock_on_removal: bool,
}

impl Default for GroupPolicy {
    fn default() -> Self {
        GroupPolicy {
            max_members: MAX_GROUP_MEMBERS,
            unlock_on_removal: true,
        }
    }
}

impl GroupPolicy {
    pub fn is_full(&self, member_count: u32) -> bool {
        member_count >= self.max_members
    }
}

/// Row-level view of a group, without members.
#[derive(Debug, Clone)]
pub struct GroupRecord {
    pub group_id: GroupId,
    pub project_name: Option<String>,
    pub description: Option<String>,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupMember {
    pub group_id: GroupId,
    pub student_id: StudentId,
    pub show_group_on_profile: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FypGroup {
    pub group_id: GroupId,
    pub project_name: Option<String>,
    pub description: Option<String>,
    pub is_locked: bool,
    pub created_at: DateTime<Utc>,
    pub members: Vec<GroupMember>,
}

impl FypGroup {
    pub fn from_parts(record: GroupRecord, members: Vec<GroupMember>) -> Self {
        FypGroup {
            group_id: record.group_id,
            project_name: record.project_name,
            description: record.description,
            is_locked: record.is_locked,
            created_at: record.created_at,
            members,
        }
    }

    pub fn member_count(&self) -> u32 {
        self.members.len() as u32
    }

    pub fn has_member(&self, student: StudentId) -> bool {
        self.members.iter().any(|m| m.student_id == student)
    }
}
