//! Household mutations and week-relative reads on [`HouseholdState`].
//!
//! Every mutator returns whether it changed anything, so callers persist and
//! push only real changes. Empty names are ignored silently.

use chrono::{DateTime, TimeZone, Utc};

use crate::epoch;
use crate::ids::IdGenerator;
use crate::rotation::{self, Assignment};
use crate::types::{Chore, ChoreId, Frequency, HouseholdState, Member, MemberId, WeekKey};

/// Reorder direction for members and chores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl HouseholdState {
    /// The empty aggregate anchored at the most recent Sunday boundary.
    pub fn empty_at<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self {
            start_epoch: Some(epoch::prev_sunday_2359(now)),
            ..Self::default()
        }
    }

    pub fn is_blank(&self) -> bool {
        self.members.is_empty() && self.chores.is_empty() && self.completion.is_empty()
    }

    /// Clamp `start_epoch` so it is set and not in the future.
    ///
    /// Returns `true` when the value was rewritten.
    pub fn ensure_start_epoch<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> bool {
        let clamped = epoch::clamp_start(self.start_epoch, now);
        if self.start_epoch == Some(clamped) {
            return false;
        }
        self.start_epoch = Some(clamped);
        true
    }

    /// Start instant used for week arithmetic; the same rule as
    /// [`Self::ensure_start_epoch`], applied without mutating.
    pub fn anchored_start<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Utc> {
        epoch::clamp_start(self.start_epoch, now)
    }

    pub fn week_index<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> i64 {
        epoch::week_index(now.with_timezone(&Utc), self.anchored_start(now))
    }

    pub fn week_key<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> WeekKey {
        WeekKey::from(self.week_index(now))
    }

    pub fn next_boundary<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateTime<Utc> {
        epoch::next_boundary(now.with_timezone(&Utc), self.anchored_start(now))
    }

    /// Pairings for an explicit week index.
    pub fn assignments_for(&self, week_index: i64) -> Vec<Assignment> {
        rotation::assign(&self.members, &self.chores, week_index)
    }

    // -----------------------------------------------------------------------
    // Members
    // -----------------------------------------------------------------------

    pub fn add_member(&mut self, name: &str, ids: &dyn IdGenerator) -> Option<MemberId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let id = MemberId::from(ids.new_id());
        self.members.push(Member {
            id: id.clone(),
            name: name.to_string(),
        });
        Some(id)
    }

    pub fn remove_member(&mut self, id: &MemberId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| &m.id != id);
        self.members.len() != before
    }

    pub fn move_member(&mut self, id: &MemberId, direction: Direction) -> bool {
        match self.members.iter().position(|m| &m.id == id) {
            Some(index) => shift(&mut self.members, index, direction),
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Chores
    // -----------------------------------------------------------------------

    pub fn add_chore(
        &mut self,
        name: &str,
        details: Option<&str>,
        ids: &dyn IdGenerator,
    ) -> Option<ChoreId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let id = ChoreId::from(ids.new_id());
        self.chores.push(Chore {
            id: id.clone(),
            name: name.to_string(),
            details: details
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            frequency: Frequency::Weekly,
        });
        Some(id)
    }

    /// Completion entries for the chore are left in place.
    pub fn remove_chore(&mut self, id: &ChoreId) -> bool {
        let before = self.chores.len();
        self.chores.retain(|c| &c.id != id);
        self.chores.len() != before
    }

    pub fn move_chore(&mut self, id: &ChoreId, direction: Direction) -> bool {
        match self.chores.iter().position(|c| &c.id == id) {
            Some(index) => shift(&mut self.chores, index, direction),
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Completion
    // -----------------------------------------------------------------------

    /// Set the done flag for `chore` in the week containing `now`.
    pub fn set_done<Tz: TimeZone>(&mut self, now: &DateTime<Tz>, chore: &ChoreId, done: bool) -> bool {
        let week = self.week_key(now);
        if self.completion.is_done(&week, chore) == done {
            return false;
        }
        self.completion.set(week, chore.clone(), done);
        true
    }

    /// Flip the done flag for `chore` this week, returning the new value.
    pub fn toggle_done<Tz: TimeZone>(&mut self, now: &DateTime<Tz>, chore: &ChoreId) -> bool {
        let week = self.week_key(now);
        self.completion.toggle(week, chore.clone())
    }

    // -----------------------------------------------------------------------
    // Re-anchoring
    // -----------------------------------------------------------------------

    /// Advance the rotation by one week immediately.
    pub fn rotate_now<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) {
        self.start_epoch = Some(self.anchored_start(now) - epoch::week());
    }

    /// Re-anchor so the next boundary falls on the coming Sunday 23:59.
    ///
    /// The anchor is stored one week back so `start_epoch` stays in the past.
    pub fn reset_start<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) -> bool {
        let anchored = epoch::next_sunday_2359(now) - epoch::week();
        if self.start_epoch == Some(anchored) {
            return false;
        }
        self.start_epoch = Some(anchored);
        true
    }

    /// Replace everything with the empty aggregate.
    pub fn clear<Tz: TimeZone>(&mut self, now: &DateTime<Tz>) {
        *self = Self::empty_at(now);
    }
}

fn shift<T>(items: &mut [T], index: usize, direction: Direction) -> bool {
    match direction {
        Direction::Up if index > 0 => {
            items.swap(index - 1, index);
            true
        }
        Direction::Down if index + 1 < items.len() => {
            items.swap(index, index + 1);
            true
        }
        _ => false,
    }
}
