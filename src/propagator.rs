//! Propagator (C6): worklist-driven arc-consistency across the grid.

use std::collections::VecDeque;

use crate::cell::Cell;
use crate::error::WfcError;
use crate::oracle::AdjacencyOracle;
use crate::snapshot::{CellDelta, SnapshotStack};

/// `(direction, neighbor cell index or None, inverse direction on the neighbor)`,
/// precomputed once per cell from the topology so the hot loop never calls
/// back into it.
pub type NeighborEntry = (usize, Option<usize>, usize);

/// What a propagation pass produced, beyond the mutated `cells` slice: the
/// cells it touched (for the `propagate` event) and any cells it forced down
/// to a single candidate (for `collapse { cause: Implication }` events).
#[derive(Debug, Default)]
pub struct PropagationResult {
    pub touched: Vec<usize>,
    pub implied_collapses: Vec<(usize, usize)>,
}

/// Run arc-consistency starting from `start`, recording every change into the
/// snapshot stack's currently open frame.
///
/// Confluent: the result is independent of worklist order, but FIFO is used
/// for predictable event sequences, per §4.5.
pub fn propagate(
    cells: &mut [Cell],
    neighbor_table: &[Vec<NeighborEntry>],
    orientation_of: &[usize],
    oracle: &AdjacencyOracle,
    start: impl IntoIterator<Item = usize>,
    snapshot: &mut SnapshotStack,
) -> Result<PropagationResult, WfcError> {
    let mut queue: VecDeque<usize> = start.into_iter().collect();
    let mut result = PropagationResult::default();

    while let Some(current) = queue.pop_front() {
        if cells[current].candidate_count() == 0 {
            return Err(WfcError::Contradiction);
        }
        let current_candidates = cells[current].candidates.clone();

        for &(direction, neighbor_opt, inverse_direction) in &neighbor_table[current] {
            let Some(neighbor) = neighbor_opt else { continue };
            let _ = direction;
            if cells[neighbor].collapsed {
                // Already fixed: never shrunk further, but still checked for
                // consistency, since two seeded/collapsed neighbors can
                // conflict without either candidate set ever "shrinking".
                let singleton = cells[neighbor].candidates.clone();
                let refined = oracle.refine_self(
                    orientation_of[neighbor],
                    inverse_direction,
                    &singleton,
                    &current_candidates,
                );
                if refined.count_ones(..) == 0 {
                    return Err(WfcError::Contradiction);
                }
                continue;
            }

            let neighbor_candidates = cells[neighbor].candidates.clone();
            let refined = oracle.refine_self(
                orientation_of[neighbor],
                inverse_direction,
                &neighbor_candidates,
                &current_candidates,
            );

            if refined.count_ones(..) == neighbor_candidates.count_ones(..) {
                continue;
            }

            let mut removed_bits = neighbor_candidates.clone();
            removed_bits.difference_with(&refined);
            let removed: Vec<usize> = removed_bits.ones().collect();
            let was_collapsed = cells[neighbor].collapsed;

            cells[neighbor].candidates = refined;
            snapshot.record(CellDelta { cell: neighbor, removed, was_collapsed });

            if cells[neighbor].candidate_count() == 0 {
                return Err(WfcError::Contradiction);
            }

            result.touched.push(neighbor);

            if cells[neighbor].candidate_count() == 1 && !was_collapsed {
                cells[neighbor].collapsed = true;
                let tile = cells[neighbor].candidates.ones().next().unwrap();
                result.implied_collapses.push((neighbor, tile));
            }

            queue.push_back(neighbor);
        }
    }

    Ok(result)
}
