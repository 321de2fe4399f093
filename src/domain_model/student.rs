use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Principal issued by the auth collaborator.
#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct UserId(pub uuid::Uuid);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(UserId)
    }
}

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct StudentId(pub uuid::Uuid);

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StudentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(StudentId)
    }
}

/// Unordered pair of students, stored as (min, max).
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct StudentPair(StudentId, StudentId);

impl StudentPair {
    pub fn new(a: StudentId, b: StudentId) -> Self {
        if a < b { Self(a, b) } else { Self(b, a) }
    }

    pub fn min(&self) -> StudentId {
        self.0
    }

    pub fn max(&self) -> StudentId {
        self.1
    }

    pub fn contains(&self, id: StudentId) -> bool {
        self.0 == id || self.1 == id
    }

    pub fn other(&self, id: StudentId) -> StudentId {
        if self.0 == id { self.1 } else { self.0 }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Availability {
    Available,
    Busy,
    Away,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Availability::Available => "available",
            Availability::Busy => "busy",
            Availability::Away => "away",
        };
        f.write_str(s)
    }
}

impl FromStr for Availability {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "available" => Ok(Self::Available),
            "busy" => Ok(Self::Busy),
            "away" => Ok(Self::Away),
            _ => anyhow::bail!("unknown availability: {}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Suspended,
    DeletionRequested,
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccountStatus::Active => "active",
            AccountStatus::Suspended => "suspended",
            AccountStatus::DeletionRequested => "deletion_requested",
        };
        f.write_str(s)
    }
}

impl FromStr for AccountStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            "deletion_requested" => Ok(Self::DeletionRequested),
            _ => anyhow::bail!("unknown account status: {}", s),
        }
    }
}

/// Semesters in which a student takes part in discovery and partner matching.
pub const MATCHING_SEMESTERS: std::ops::RangeInclusive<u8> = 5..=7;

#[derive(Debug, Clone, Serialize)]
pub struct Student {
    pub student_id: StudentId,
    pub user_id: UserId,
    pub name: String,
    pub semester: u8,
    pub availability: Availability,
    pub account_status: AccountStatus,
}

impl Student {
    pub fn is_active(&self) -> bool {
        self.account_status == AccountStatus::Active
    }

    pub fn is_matchable(&self) -> bool {
        MATCHING_SEMESTERS.contains(&self.semester)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentSummary {
    pub student_id: StudentId,
    pub name: String,
    pub semester: u8,
    pub availability: Availability,
}

impl From<&Student> for StudentSummary {
    fn from(s: &Student) -> Self {
        StudentSummary {
            student_id: s.student_id,
            name: s.name.clone(),
            semester: s.semester,
            availability: s.availability,
        }
    }
}

/// Cursor for discovery pages, ordered by (name ASC, student_id ASC).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StudentCursor {
    pub name: String,
    pub student_id: StudentId, // tiebreaker
}

impl FromStr for StudentCursor {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id_str, name) = s.split_once('~').ok_or("invalid cursor format")?;

        let student_id = uuid::Uuid::parse_str(id_str)
            .map(StudentId)
            .map_err(|e| e.to_string())?;

        Ok(StudentCursor {
            name: name.to_string(),
            student_id,
        })
    }
}

impl fmt::Display for StudentCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.student_id, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_is_direction_insensitive() {
        let a = StudentId(uuid::Uuid::new_v4());
        let b = StudentId(uuid::Uuid::new_v4());

        assert_eq!(StudentPair::new(a, b), StudentPair::new(b, a));
        assert!(StudentPair::new(a, b).min() < StudentPair::new(a, b).max());
        assert_eq!(StudentPair::new(a, b).other(a), b);
    }

    #[test]
    fn cursor_keeps_names_with_separator() {
        let cursor = StudentCursor {
            name: "Ana~Maria".to_string(),
            student_id: StudentId(uuid::Uuid::nil()),
        };

        let parsed: StudentCursor = cursor.to_string().parse().unwrap();
        assert_eq!(parsed, cursor);
    }
}
