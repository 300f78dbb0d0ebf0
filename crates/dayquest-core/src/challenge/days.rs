//! Day record management: get-or-create, completion flag, action payloads.

use super::{ActionData, ChallengeStore, DayRecord};
use crate::error::Result;
use crate::storage::KeyValueStore;

/// Return the record for `index`, appending a fresh one if it is missing.
///
/// Never creates a second record for an index that already exists.
pub fn ensure_day(days: &mut Vec<DayRecord>, index: u32) -> &mut DayRecord {
    match days.iter().position(|d| d.day == index) {
        Some(pos) => &mut days[pos],
        None => {
            days.push(DayRecord::new(index));
            let last = days.len() - 1;
            &mut days[last]
        }
    }
}

/// Shallow-merge `patch` over `prev`. A `null` value in `patch` deletes the
/// field; any other value replaces it wholesale.
pub fn merge_action_fields(prev: Option<&ActionData>, patch: ActionData) -> ActionData {
    let mut next = prev.cloned().unwrap_or_default();
    for (key, value) in patch {
        if value.is_null() {
            next.remove(&key);
        } else {
            next.insert(key, value);
        }
    }
    next
}

impl<S: KeyValueStore> ChallengeStore<S> {
    /// Set the completion flag of `day`.
    ///
    /// Returns `true` when the flag actually changed.
    pub fn set_day_completed(&mut self, day: u32, completed: bool) -> Result<bool> {
        self.check_day(day)?;
        let changed = self.update(|state| {
            let record = ensure_day(&mut state.days, day);
            let changed = record.completed != completed;
            record.completed = completed;
            changed
        })?;
        Ok(changed)
    }

    /// Whether `day` is completed. Absent state or day reads as `false`.
    pub fn get_day_completed(&mut self, day: u32) -> Result<bool> {
        let completed = self.read(|state| state.day(day).is_some_and(|d| d.completed))?;
        Ok(completed)
    }

    /// Snapshot of one day, if it has been recorded.
    pub fn day(&mut self, day: u32) -> Result<Option<DayRecord>> {
        let record = self.read(|state| state.day(day).cloned())?;
        Ok(record)
    }

    /// Current action payload of `day`.
    pub fn get_day_action_data(&mut self, day: u32) -> Result<Option<ActionData>> {
        let data = self.read(|state| state.day(day).and_then(|d| d.action_data.clone()))?;
        Ok(data)
    }

    /// Replace the action payload of `day` with whatever `mutate` returns.
    ///
    /// `mutate` sees the previous payload (if any) and must return the full
    /// replacement; a key it leaves out is deleted. Persisted immediately.
    pub fn upsert_day_action_data(
        &mut self,
        day: u32,
        mutate: impl FnOnce(Option<&ActionData>) -> ActionData,
    ) -> Result<ActionData> {
        self.check_day(day)?;
        let next = self.update(|state| {
            let record = ensure_day(&mut state.days, day);
            let next = mutate(record.action_data.as_ref());
            record.action_data = Some(next.clone());
            next
        })?;
        Ok(next)
    }
}
