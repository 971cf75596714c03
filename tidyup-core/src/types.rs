//! Domain types for a TidyUp household.
//!
//! Serialized field names follow the JSON document exchanged with the remote
//! store (`roommates`, `startEpoch`, `doneByWeek`, `freq`), so the same bytes
//! travel between the local cache and the server unchanged.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::completion::CompletionLog;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque, immutable identity of a household member.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub String);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for MemberId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Opaque, immutable identity of a chore.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChoreId(pub String);

impl fmt::Display for ChoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ChoreId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ChoreId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of a shared household record in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HouseholdId(pub String);

impl fmt::Display for HouseholdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for HouseholdId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for HouseholdId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Short token that lets another client attach to an existing household.
///
/// Codes compare after trimming and upper-casing, see [`JoinCode::normalized`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JoinCode(pub String);

impl JoinCode {
    /// Trimmed, upper-cased form used for every comparison.
    pub fn normalized(&self) -> JoinCode {
        JoinCode(self.0.trim().to_uppercase())
    }

    /// Case- and whitespace-insensitive equality.
    pub fn matches(&self, other: &JoinCode) -> bool {
        self.normalized() == other.normalized()
    }
}

impl fmt::Display for JoinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for JoinCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JoinCode {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Key of one rotation week in the completion mapping (`"0"`, `"1"`, `"-1"`, …).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekKey(pub String);

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for WeekKey {
    fn from(week_index: i64) -> Self {
        Self(week_index.to_string())
    }
}

impl From<&str> for WeekKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How often a chore rotates. Only weekly rotation exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Weekly,
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Weekly => write!(f, "weekly"),
        }
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A member of the household. Position in [`HouseholdState::members`] is the
/// rotation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
}

/// A recurring chore. Position in [`HouseholdState::chores`] is significant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chore {
    pub id: ChoreId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, rename = "freq")]
    pub frequency: Frequency,
}

/// The synchronized aggregate: the unit of transfer between the local cache
/// and the remote store.
///
/// `start_epoch` is `None` only on the wire (a freshly provisioned remote
/// household); it is anchored before any week arithmetic happens.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HouseholdState {
    #[serde(default, rename = "roommates")]
    pub members: Vec<Member>,
    #[serde(default)]
    pub chores: Vec<Chore>,
    #[serde(
        default,
        rename = "startEpoch",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub start_epoch: Option<DateTime<Utc>>,
    #[serde(default, rename = "doneByWeek")]
    pub completion: CompletionLog,
}

/// Household identity held locally after create or join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdIdentity {
    pub id: HouseholdId,
    pub join_code: JoinCode,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
