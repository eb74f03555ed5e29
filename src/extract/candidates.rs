//! Ordered candidate probing.
//!
//! Field resolution ("try `title`, then `name`, then `paper_title`") and
//! selector resolution ("try `article`, then `div[class*=paper]`, ...") are the
//! same operation: walk a fixed priority list and keep the first candidate the
//! probe accepts.

/// A fixed, ordered list of candidates with a label for log messages
#[derive(Debug, Clone, Copy)]
pub struct Candidates<C: 'static> {
    label: &'static str,
    items: &'static [C],
}

impl<C> Candidates<C> {
    pub const fn new(label: &'static str, items: &'static [C]) -> Self {
        Self { label, items }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Value produced by the first candidate the probe accepts
    pub fn first<T>(&self, probe: impl FnMut(&'static C) -> Option<T>) -> Option<T> {
        self.items.iter().find_map(probe)
    }

    /// Like [`Candidates::first`], also returning the candidate that matched
    pub fn first_with<T>(
        &self,
        mut probe: impl FnMut(&'static C) -> Option<T>,
    ) -> Option<(&'static C, T)> {
        self.items
            .iter()
            .find_map(|candidate| probe(candidate).map(|value| (candidate, value)))
    }
}
