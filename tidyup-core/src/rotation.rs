//! Rotation engine: who does which chore in a given week.
//!
//! [`assign`] is a total function of `(members, chores, week_index)`. The
//! chore at position `i` goes to the member at `(i + week_index) mod n`
//! (mathematical modulo), so every member cycles through every chore with
//! period `n` and negative week indices still land on a valid member.

use serde::Serialize;

use crate::types::{Chore, ChoreId, Member, MemberId};

/// One chore paired with the member responsible for it this week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub chore_id: ChoreId,
    pub chore_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub member_id: MemberId,
    pub member_name: String,
}

/// Pair every chore with a member for `week_index`.
///
/// Returns an empty vec when either list is empty; callers surface that as
/// "add members and chores" rather than an error.
pub fn assign(members: &[Member], chores: &[Chore], week_index: i64) -> Vec<Assignment> {
    if members.is_empty() || chores.is_empty() {
        return Vec::new();
    }

    chores
        .iter()
        .enumerate()
        .map(|(position, chore)| {
            let member = &members[member_slot(position, week_index, members.len())];
            Assignment {
                chore_id: chore.id.clone(),
                chore_name: chore.name.clone(),
                details: chore
                    .details
                    .as_ref()
                    .filter(|d| !d.trim().is_empty())
                    .cloned(),
                member_id: member.id.clone(),
                member_name: member.name.clone(),
            }
        })
        .collect()
}

/// Index into the member list for the chore at `position`.
///
/// `member_count` must be non-zero.
pub fn member_slot(position: usize, week_index: i64, member_count: usize) -> usize {
    let n = member_count as i64;
    ((position as i64).rem_euclid(n) + week_index.rem_euclid(n)).rem_euclid(n) as usize
}
