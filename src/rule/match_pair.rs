//! Match/unmatch value sets for a single clause key.

use std::collections::BTreeSet;

/// Values a clause must match (`key=...`) and must not match (`key!=...`).
///
/// The two sets are expected to be disjoint per value but nothing here
/// enforces it; callers own that invariant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchPair {
    pub matches: BTreeSet<String>,
    pub unmatches: BTreeSet<String>,
}

impl MatchPair {
    pub fn new(matches: BTreeSet<String>, unmatches: BTreeSet<String>) -> Self {
        Self { matches, unmatches }
    }

    /// True when neither set holds a value.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty() && self.unmatches.is_empty()
    }

    /// Drop every value in `values` from both sets.
    ///
    /// Returns how many values were removed in total.
    pub fn remove_all(&mut self, values: &BTreeSet<String>) -> usize {
        let before = self.matches.len() + self.unmatches.len();
        self.matches = &self.matches - values;
        self.unmatches = &self.unmatches - values;
        before - (self.matches.len() + self.unmatches.len())
    }
}
