use std::collections::HashSet;

use crate::types::AlertKey;

/// Remembers which alert keys already fired.
///
/// Eviction is all-or-nothing: once the set holds more than `capacity` keys
/// the next `maybe_clear` empties it, and every key becomes eligible again.
#[derive(Debug)]
pub struct AlertDeduplicator {
    seen: HashSet<AlertKey>,
    capacity: usize,
}

impl AlertDeduplicator {
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: HashSet::new(),
            capacity,
        }
    }

    /// Records `key` and returns true the first time it is seen.
    pub fn should_fire(&mut self, key: &AlertKey) -> bool {
        self.seen.insert(*key)
    }

    /// Clears the whole set when it is over capacity. Returns whether it did.
    pub fn maybe_clear(&mut self) -> bool {
        if self.seen.len() > self.capacity {
            self.seen.clear();
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
