//! Per-class quota bookkeeping for capped sampling.
//!
//! Each target class moves through `Unseen -> Accepting -> Full` and never
//! back. Keys that were never registered report [`ClassState::Full`], which is
//! how non-target classes are ignored without a separate membership check.

use indexmap::IndexMap;

use crate::data::ClassKey;

/// Position of one class in its quota lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassState {
    /// Registered, nothing accepted yet.
    Unseen,
    /// Some records accepted, below the cap.
    Accepting(usize),
    /// Cap reached, or the key is not a target class.
    Full,
}

/// Counts of accepted records per target class.
#[derive(Clone, Debug)]
pub struct QuotaTable {
    cap: usize,
    counts: IndexMap<ClassKey, usize>,
    full: usize,
}

impl QuotaTable {
    /// Register every class in `classes` at zero; duplicates collapse.
    pub fn new(classes: impl IntoIterator<Item = ClassKey>, cap: usize) -> Self {
        let counts: IndexMap<ClassKey, usize> =
            classes.into_iter().map(|class| (class, 0)).collect();
        // A zero cap leaves every class full from the start.
        let full = if cap == 0 { counts.len() } else { 0 };
        Self { cap, counts, full }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Number of distinct target classes.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Accepted count for `key`, or `None` when it is not a target class.
    pub fn count(&self, key: &ClassKey) -> Option<usize> {
        self.counts.get(key).copied()
    }

    pub fn state(&self, key: &ClassKey) -> ClassState {
        match self.counts.get(key) {
            None => ClassState::Full,
            Some(&count) if count >= self.cap => ClassState::Full,
            Some(0) => ClassState::Unseen,
            Some(&count) => ClassState::Accepting(count),
        }
    }

    /// True when `key` is a target class still below its cap.
    pub fn has_room(&self, key: &ClassKey) -> bool {
        self.state(key) != ClassState::Full
    }

    /// Count one accepted record for `key` and return the new state.
    ///
    /// A key without room is left untouched and reported as `Full`.
    pub fn record(&mut self, key: &ClassKey) -> ClassState {
        if !self.has_room(key) {
            return ClassState::Full;
        }
        let Some(count) = self.counts.get_mut(key) else {
            return ClassState::Full;
        };
        *count += 1;
        if *count == self.cap {
            self.full += 1;
        }
        self.state(key)
    }

    /// True once every target class is full (vacuously true with no classes).
    pub fn is_satisfied(&self) -> bool {
        self.full == self.counts.len()
    }

    /// Classes and their counts in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&ClassKey, usize)> {
        self.counts.iter().map(|(key, count)| (key, *count))
    }

    /// Total records accepted across every class.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(classes: &[i64], cap: usize) -> QuotaTable {
        QuotaTable::new(classes.iter().copied().map(ClassKey::from), cap)
    }

    #[test]
    fn states_advance_monotonically_to_full() {
        let mut quota = table(&[5, 1], 2);
        let five = ClassKey::from(5);
        assert_eq!(quota.state(&five), ClassState::Unseen);
        assert_eq!(quota.record(&five), ClassState::Accepting(1));
        assert_eq!(quota.record(&five), ClassState::Full);
        assert_eq!(quota.record(&five), ClassState::Full);
        assert_eq!(quota.count(&five), Some(2));
        assert!(!quota.is_satisfied());
    }

    #[test]
    fn absent_keys_behave_as_full() {
        let mut quota = table(&[5], 3);
        let three = ClassKey::from(3);
        assert_eq!(quota.state(&three), ClassState::Full);
        assert!(!quota.has_room(&three));
        assert_eq!(quota.record(&three), ClassState::Full);
        assert_eq!(quota.count(&three), None);
        assert_eq!(quota.total(), 0);
    }

    #[test]
    fn satisfied_once_every_distinct_class_fills() {
        let mut quota = table(&[5, 1, 5], 1);
        assert_eq!(quota.len(), 2);
        quota.record(&ClassKey::from(5));
        assert!(!quota.is_satisfied());
        quota.record(&ClassKey::from(1));
        assert!(quota.is_satisfied());
        let order: Vec<String> = quota.iter().map(|(key, _)| key.to_string()).collect();
        assert_eq!(order, vec!["5", "1"]);
    }

    #[test]
    fn empty_table_is_immediately_satisfied() {
        let quota = table(&[], 4);
        assert!(quota.is_empty());
        assert!(quota.is_satisfied());
    }

    #[test]
    fn zero_cap_starts_full() {
        let quota = table(&[1, 2], 0);
        assert!(quota.is_satisfied());
        assert_eq!(quota.state(&ClassKey::from(1)), ClassState::Full);
    }
}
