//! Cell state (C4): per-cell candidate set, collapsed flag, and blacklist.

use fixedbitset::FixedBitSet;

/// Mutable per-cell state, keyed externally by a dense cell index.
#[derive(Debug, Clone)]
pub struct Cell {
    pub candidates: FixedBitSet,
    pub collapsed: bool,
    pub forbidden: FixedBitSet,
}

impl Cell {
    /// A fresh cell: every tile possible, not collapsed, nothing forbidden.
    pub fn new(num_tiles: usize) -> Cell {
        let mut candidates = FixedBitSet::with_capacity(num_tiles);
        candidates.set_range(.., true);
        Cell {
            candidates,
            collapsed: false,
            forbidden: FixedBitSet::with_capacity(num_tiles),
        }
    }

    pub fn candidate_count(&self) -> usize {
        self.candidates.count_ones(..)
    }

    /// Invariant 1 of §8: `candidates ∩ forbidden = ∅`.
    pub fn respects_forbidden_invariant(&self) -> bool {
        let mut overlap = self.candidates.clone();
        overlap.intersect_with(&self.forbidden);
        overlap.count_ones(..) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_cell_allows_every_tile() {
        let cell = Cell::new(5);
        assert_eq!(cell.candidate_count(), 5);
        assert!(!cell.collapsed);
        assert_eq!(cell.forbidden.count_ones(..), 0);
    }

    #[test]
    fn invariant_holds_after_forbidding_a_removed_candidate() {
        let mut cell = Cell::new(3);
        cell.candidates.set(1, false);
        cell.forbidden.insert(1);
        assert!(cell.respects_forbidden_invariant());
    }
}
