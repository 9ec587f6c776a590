use crate::ids::Year;

/// Ascending, deduplicated list of selected years plus a current index.
///
/// Invariants:
/// - `years` is sorted and contains no duplicates.
/// - `index < years.len()` whenever the sequence is non-empty.
///
/// Mutated only by a new load (full reset) or an index change from the
/// playback driver / an explicit year pick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearSequence {
    years: Vec<Year>,
    index: usize,
}

impl YearSequence {
    /// Builds a sequence from an arbitrary selection, sorting and
    /// deduplicating. The index starts at 0.
    pub fn new(mut years: Vec<Year>) -> Self {
        years.sort_unstable();
        years.dedup();
        Self { years, index: 0 }
    }

    pub fn years(&self) -> &[Year] {
        &self.years
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The currently displayed year, if any year is selected.
    pub fn current(&self) -> Option<Year> {
        self.years.get(self.index).copied()
    }

    /// Checked index change. Out-of-range picks are rejected so the index
    /// always points at a member year.
    pub fn set_index(&mut self, index: usize) -> bool {
        if index < self.years.len() {
            self.index = index;
            true
        } else {
            false
        }
    }

    /// Advances `index = (index + 1) mod len` and returns the new current
    /// year. Returns `None` on an empty sequence.
    pub fn advance(&mut self) -> Option<Year> {
        if self.years.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.years.len();
        self.current()
    }

    /// An empty or singleton sequence cannot be animated.
    pub fn animatable(&self) -> bool {
        self.years.len() >= 2
    }
}
