//! Snapshot / delta stack (C8): append-only frames recording only what
//! propagation changed, so rollback is O(cells touched) rather than O(N).

use fixedbitset::FixedBitSet;

/// Candidates removed from one cell during a single propagation pass, plus
/// its `collapsed` flag immediately before that removal.
#[derive(Debug, Clone)]
pub struct CellDelta {
    pub cell: usize,
    pub removed: Vec<usize>,
    pub was_collapsed: bool,
}

/// One entry on the snapshot stack: the decision that opened it, and every
/// cell delta propagation accumulated while settling that decision.
#[derive(Debug, Clone)]
pub struct DeltaFrame {
    pub decision_cell: usize,
    pub decision_tile: usize,
    /// The decision cell's candidate set immediately before the decision.
    pub prior_candidates: FixedBitSet,
    pub cell_deltas: Vec<CellDelta>,
}

impl DeltaFrame {
    fn new(decision_cell: usize, decision_tile: usize, prior_candidates: FixedBitSet) -> Self {
        DeltaFrame {
            decision_cell,
            decision_tile,
            prior_candidates,
            cell_deltas: Vec::new(),
        }
    }
}

/// The append-only stack of [`DeltaFrame`]s backing rollback.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStack {
    frames: Vec<DeltaFrame>,
}

impl SnapshotStack {
    pub fn new() -> Self {
        SnapshotStack { frames: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Open a new frame for a decision. Must be followed by `record` calls
    /// during propagation and then `commit`.
    pub fn take(&mut self, decision_cell: usize, decision_tile: usize, prior_candidates: FixedBitSet) {
        self.frames.push(DeltaFrame::new(decision_cell, decision_tile, prior_candidates));
    }

    /// Append a cell delta to the currently open (topmost) frame.
    pub fn record(&mut self, delta: CellDelta) {
        if let Some(frame) = self.frames.last_mut() {
            frame.cell_deltas.push(delta);
        }
    }

    /// No-op marker closing the open frame once propagation has succeeded;
    /// the frame was already durable the moment it was pushed, this exists
    /// to mirror the take/commit pairing named in §4.7.
    pub fn commit(&mut self) {}

    /// Pop the top frame, reinstating every removed tile id into its cell
    /// and restoring prior `collapsed` flags. Returns the decision so the
    /// backtracker can blacklist it at the decision cell.
    pub fn rollback(&mut self, cells: &mut [crate::cell::Cell]) -> Option<(usize, usize)> {
        let frame = self.frames.pop()?;
        for delta in frame.cell_deltas.into_iter().rev() {
            let cell = &mut cells[delta.cell];
            for tile in delta.removed {
                cell.candidates.insert(tile);
            }
            cell.collapsed = delta.was_collapsed;
        }
        cells[frame.decision_cell].candidates = frame.prior_candidates;
        cells[frame.decision_cell].collapsed = false;
        cells[frame.decision_cell].forbidden.insert(frame.decision_tile);
        Some((frame.decision_cell, frame.decision_tile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    #[test]
    fn rollback_restores_removed_candidates_and_blacklists_decision() {
        let mut cells = vec![Cell::new(3), Cell::new(3)];
        let mut stack = SnapshotStack::new();

        let prior = cells[0].candidates.clone();
        stack.take(0, 1, prior);
        cells[0].candidates = FixedBitSet::with_capacity(3);
        cells[0].candidates.insert(1);
        cells[0].collapsed = true;

        let was_collapsed = cells[1].collapsed;
        cells[1].candidates.set(2, false);
        stack.record(CellDelta { cell: 1, removed: vec![2], was_collapsed });
        stack.commit();

        let decision = stack.rollback(&mut cells).unwrap();
        assert_eq!(decision, (0, 1));
        assert!(cells[1].candidates.contains(2));
        assert!(!cells[0].collapsed);
        assert!(cells[0].forbidden.contains(1));
        assert_eq!(cells[0].candidates.count_ones(..), 3);
    }

    #[test]
    fn rollback_on_empty_stack_returns_none() {
        let mut cells = vec![Cell::new(2)];
        let mut stack = SnapshotStack::new();
        assert!(stack.rollback(&mut cells).is_none());
    }
}
