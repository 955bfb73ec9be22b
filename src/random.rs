//! Weighted random selection.

use fastrand::Rng;

/// A fixed table of items with integer weights.
#[derive(Debug, Clone)]
pub struct WeightedTable<T> {
    entries: Vec<(T, u32)>,
    total: u32,
}

impl<T: Copy> WeightedTable<T> {
    /// Build a table. Zero-weight entries are kept but never picked.
    /// Returns `None` when every weight is zero.
    pub fn new(entries: Vec<(T, u32)>) -> Option<Self> {
        let total = entries.iter().map(|(_, w)| *w).sum();
        if total == 0 {
            return None;
        }
        Some(Self { entries, total })
    }

    pub fn pick(&self, rng: &mut Rng) -> T {
        self.pick_at(rng.u32(0..self.total))
    }

    /// Item whose cumulative weight band contains `roll` (`0 <= roll < total`).
    fn pick_at(&self, mut roll: u32) -> T {
        for (item, weight) in &self.entries {
            if roll < *weight {
                return *item;
            }
            roll -= weight;
        }
        // roll >= total only if the caller broke the contract
        self.entries[0].0
    }
}
