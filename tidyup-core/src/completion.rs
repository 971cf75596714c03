//! Completion store: per-week done flags.
//!
//! Keyed by [`WeekKey`], so a new week starts with nothing checked without
//! any explicit reset. Old weeks are kept as history and never pruned.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{ChoreId, WeekKey};

/// `week key → chore id → done`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionLog(BTreeMap<WeekKey, BTreeMap<ChoreId, bool>>);

/// Read-only view of one week. Missing entries read as not done.
#[derive(Debug, Clone, Copy)]
pub struct WeekCompletion<'a>(Option<&'a BTreeMap<ChoreId, bool>>);

impl<'a> WeekCompletion<'a> {
    pub fn is_done(&self, chore: &ChoreId) -> bool {
        self.0
            .and_then(|week| week.get(chore))
            .copied()
            .unwrap_or(false)
    }

    /// Chores explicitly marked done in this week.
    pub fn done(&self) -> impl Iterator<Item = &'a ChoreId> {
        self.0
            .into_iter()
            .flat_map(|week| week.iter())
            .filter(|(_, done)| **done)
            .map(|(chore, _)| chore)
    }
}

impl CompletionLog {
    pub fn get(&self, week: &WeekKey) -> WeekCompletion<'_> {
        WeekCompletion(self.0.get(week))
    }

    pub fn is_done(&self, week: &WeekKey, chore: &ChoreId) -> bool {
        self.get(week).is_done(chore)
    }

    /// Record a flag, creating the week's map on first write.
    pub fn set(&mut self, week: WeekKey, chore: ChoreId, done: bool) {
        self.0.entry(week).or_default().insert(chore, done);
    }

    /// Flip a flag and return the new value.
    pub fn toggle(&mut self, week: WeekKey, chore: ChoreId) -> bool {
        let entry = self.0.entry(week).or_default().entry(chore).or_insert(false);
        *entry = !*entry;
        *entry
    }

    pub fn weeks(&self) -> impl Iterator<Item = &WeekKey> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_entries_read_as_not_done() {
        let log = CompletionLog::default();
        assert!(!log.is_done(&WeekKey::from(0), &ChoreId::from("dishes")));
        assert_eq!(log.get(&WeekKey::from(0)).done().count(), 0);
    }

    #[test]
    fn completion_is_scoped_to_its_week() {
        let mut log = CompletionLog::default();
        log.set(WeekKey::from(0), ChoreId::from("dishes"), true);
        assert!(log.is_done(&WeekKey::from(0), &ChoreId::from("dishes")));
        assert!(!log.is_done(&WeekKey::from(1), &ChoreId::from("dishes")));
    }

    #[test]
    fn reads_do_not_materialize_weeks() {
        let log = CompletionLog::default();
        let _ = log.get(&WeekKey::from(7));
        assert!(log.is_empty());
    }

    #[test]
    fn toggle_flips_and_keeps_old_weeks() {
        let mut log = CompletionLog::default();
        assert!(log.toggle(WeekKey::from(0), ChoreId::from("trash")));
        assert!(!log.toggle(WeekKey::from(0), ChoreId::from("trash")));
        log.set(WeekKey::from(1), ChoreId::from("trash"), true);
        let weeks: Vec<_> = log.weeks().cloned().collect();
        assert_eq!(weeks, vec![WeekKey::from(0), WeekKey::from(1)]);
    }

    #[test]
    fn serializes_as_nested_object() {
        let mut log = CompletionLog::default();
        log.set(WeekKey::from(3), ChoreId::from("c1"), true);
        let json = serde_json::to_string(&log).expect("serialize");
        assert_eq!(json, r#"{"3":{"c1":true}}"#);
    }
}
