//! Collapser / scheduler (C7) and backtracker (C9): the main loop tying every
//! other component together, plus the state machine from §4.8.

use std::collections::HashMap;

use fixedbitset::FixedBitSet;

use crate::cell::Cell;
use crate::error::WfcError;
use crate::events::{CollapseCause, ErrorKind, Event, Observer};
use crate::oracle::AdjacencyOracle;
use crate::propagator::{propagate, NeighborEntry};
use crate::random::RandomSource;
use crate::snapshot::SnapshotStack;
use crate::tile::TileCatalog;
use crate::topology::Topology;

/// Event verbosity, §6. Governs only the engine's own `log` call-sites;
/// delivery to subscribed [`Observer`]s is unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    None,
    Info,
    Debug,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub max_retries: usize,
    pub backtrack_step: usize,
    pub log_level: LogLevel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig { max_retries: 100, backtrack_step: 1, log_level: LogLevel::None }
    }
}

/// State machine from §4.8: `Idle -> Running -> (Collapsing <-> Propagating
/// <-> Backtracking) -> Done|Failed`. `Done` and `Failed` are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Collapsing,
    Propagating,
    Backtracking,
    Done,
    Failed,
}

/// The full WFC engine, generic over the grid shape `T`.
pub struct Engine<T: Topology> {
    topology: T,
    catalog: TileCatalog,
    oracle: AdjacencyOracle,
    cells: Vec<Cell>,
    index_to_coord: Vec<T::Coord>,
    coord_to_index: HashMap<T::Coord, usize>,
    neighbor_table: Vec<Vec<NeighborEntry>>,
    orientation_of: Vec<usize>,
    rng: Box<dyn RandomSource>,
    config: EngineConfig,
    snapshots: SnapshotStack,
    state: EngineState,
    observers: Vec<Box<dyn Observer>>,
    retries: usize,
}

impl<T: Topology> Engine<T> {
    pub fn new(
        topology: T,
        catalog: TileCatalog,
        config: EngineConfig,
        rng: Box<dyn RandomSource>,
    ) -> Result<Engine<T>, WfcError> {
        if catalog.is_empty() {
            return Err(WfcError::NoTilesDefined);
        }
        let edge_count = topology.edge_count();
        for (_, tile) in catalog.iter() {
            if tile.edges.len() != edge_count {
                return Err(WfcError::ConfigError(format!(
                    "tile '{}' has {} edges, topology requires {}",
                    tile.name,
                    tile.edges.len(),
                    edge_count
                )));
            }
        }

        let oracle = AdjacencyOracle::build(&catalog, &topology)?;

        let coords = topology.coords();
        let coord_to_index: HashMap<T::Coord, usize> =
            coords.iter().enumerate().map(|(i, c)| (*c, i)).collect();
        let orientation_of: Vec<usize> = coords.iter().map(|c| topology.orientation(*c)).collect();

        let mut neighbor_table = Vec::with_capacity(coords.len());
        for (i, coord) in coords.iter().enumerate() {
            let orientation = orientation_of[i];
            let mut entries = Vec::with_capacity(edge_count);
            for d in 0..edge_count {
                let neighbor_idx = topology.neighbor(*coord, d).map(|c| coord_to_index[&c]);
                let inv = topology.inverse(orientation, d);
                entries.push((d, neighbor_idx, inv));
            }
            neighbor_table.push(entries);
        }

        let cells = (0..coords.len()).map(|_| Cell::new(catalog.len())).collect();

        Ok(Engine {
            topology,
            catalog,
            oracle,
            cells,
            index_to_coord: coords,
            coord_to_index,
            neighbor_table,
            orientation_of,
            rng,
            config,
            snapshots: SnapshotStack::new(),
            state: EngineState::Idle,
            observers: Vec::new(),
            retries: 0,
        })
    }

    pub fn subscribe(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn topology(&self) -> &T {
        &self.topology
    }

    pub fn catalog(&self) -> &TileCatalog {
        &self.catalog
    }

    pub fn oracle(&self) -> &AdjacencyOracle {
        &self.oracle
    }

    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub fn coord_of(&self, index: usize) -> T::Coord {
        self.index_to_coord[index]
    }

    pub fn index_of_coord(&self, coord: T::Coord) -> Option<usize> {
        self.coord_to_index.get(&coord).copied()
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.state, EngineState::Done)
    }

    /// `Some((coord, tile_index))` for every cell, once the engine has
    /// reached `Done`.
    pub fn result(&self) -> Option<Vec<(T::Coord, usize)>> {
        if !self.is_complete() {
            return None;
        }
        Some(
            self.cells
                .iter()
                .enumerate()
                .map(|(i, c)| (self.index_to_coord[i], c.candidates.ones().next().unwrap()))
                .collect(),
        )
    }

    fn emit(&mut self, event: Event) -> Result<(), WfcError> {
        match self.config.log_level {
            LogLevel::None => {}
            LogLevel::Info => {
                if matches!(event, Event::Complete | Event::Error { .. }) {
                    log::info!("{:?}", event);
                }
            }
            LogLevel::Debug => log::debug!("{:?}", event),
        }

        for observer in &mut self.observers {
            let outcome =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| observer.on_event(&event)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(msg)) => return Err(WfcError::CallbackFailure(msg)),
                Err(_) => return Err(WfcError::CallbackFailure("observer panicked".to_string())),
            }
        }
        Ok(())
    }

    /// Force a set of cells to specific tiles before the scheduler runs.
    /// Fresh cells only; an inconsistent seed with no prior snapshot raises
    /// `FatalSeed` and leaves the grid exactly as it was before this call.
    pub fn start(&mut self, initial_seed: Vec<(T::Coord, usize)>) -> Result<(), WfcError> {
        self.state = EngineState::Running;
        if initial_seed.is_empty() {
            return Ok(());
        }

        let mut start_indices = Vec::with_capacity(initial_seed.len());
        let mut collapses = Vec::with_capacity(initial_seed.len());
        for (coord, tile) in &initial_seed {
            let idx = *self
                .coord_to_index
                .get(coord)
                .ok_or_else(|| WfcError::ConfigError("seed coordinate out of bounds".into()))?;
            if *tile >= self.catalog.len() {
                return Err(WfcError::InvalidTileId(format!("index {}", tile)));
            }
            let prior = self.cells[idx].candidates.clone();
            self.snapshots.take(idx, *tile, prior);
            self.emit(Event::Snapshot)?;
            let mut singleton = FixedBitSet::with_capacity(self.catalog.len());
            singleton.insert(*tile);
            self.cells[idx].candidates = singleton;
            self.cells[idx].collapsed = true;
            start_indices.push(idx);
            collapses.push((idx, *tile));
        }

        self.emit(Event::Collapse { cells: collapses, cause: CollapseCause::Initial })?;

        match propagate(
            &mut self.cells,
            &self.neighbor_table,
            &self.orientation_of,
            &self.oracle,
            start_indices,
            &mut self.snapshots,
        ) {
            Ok(result) => {
                self.snapshots.commit();
                if !result.touched.is_empty() {
                    self.emit(Event::Propagate { cells: result.touched })?;
                }
                if !result.implied_collapses.is_empty() {
                    self.emit(Event::Collapse {
                        cells: result.implied_collapses,
                        cause: CollapseCause::Implication,
                    })?;
                }
                Ok(())
            }
            Err(WfcError::Contradiction) => {
                // Undo exactly the frames this call pushed: a bad seed must
                // not leave partial state behind, and must not be handed to
                // the backtracker (there is nothing earlier to try instead).
                for _ in 0..initial_seed.len() {
                    self.snapshots.rollback(&mut self.cells);
                }
                for cell in &mut self.cells {
                    cell.forbidden.clear();
                }
                self.state = EngineState::Failed;
                self.emit(Event::Error { kind: ErrorKind::FatalSeed, detail: None })?;
                Err(WfcError::FatalSeed)
            }
            Err(e) => Err(e),
        }
    }

    /// The uncollapsed cell with the smallest candidate count; ties are
    /// broken uniformly at random.
    fn find_lowest_entropy(&mut self) -> Option<usize> {
        let mut min_count = usize::MAX;
        let mut at_min = Vec::new();
        for (i, cell) in self.cells.iter().enumerate() {
            if cell.collapsed {
                continue;
            }
            let count = cell.candidate_count();
            if count == 0 {
                continue;
            }
            if count < min_count {
                min_count = count;
                at_min.clear();
                at_min.push(i);
            } else if count == min_count {
                at_min.push(i);
            }
        }
        if at_min.is_empty() {
            return None;
        }
        let pick = self.rng.gen_range(at_min.len());
        Some(at_min[pick])
    }

    /// Sample one tile from `cell`'s candidates, weighted by `tiles[t].weight`.
    fn pick_weighted_tile(&mut self, cell_index: usize) -> Result<usize, WfcError> {
        let candidates: Vec<usize> = self.cells[cell_index].candidates.ones().collect();
        if candidates.is_empty() {
            return Err(WfcError::Contradiction);
        }
        let total_weight: f64 = candidates.iter().map(|&t| self.catalog.weight_of(t)).sum();
        let mut roll = self.rng.random() * total_weight;
        for &t in &candidates {
            let w = self.catalog.weight_of(t);
            if roll < w {
                return Ok(t);
            }
            roll -= w;
        }
        Ok(*candidates.last().unwrap())
    }

    /// Advance the engine by one decision. A no-op once `Done` or `Failed`.
    pub fn step(&mut self) -> Result<(), WfcError> {
        if matches!(self.state, EngineState::Done | EngineState::Failed) {
            return Ok(());
        }

        self.state = EngineState::Collapsing;
        let Some(cell_index) = self.find_lowest_entropy() else {
            self.state = EngineState::Done;
            self.emit(Event::Complete)?;
            return Ok(());
        };

        let tile = self.pick_weighted_tile(cell_index)?;
        let prior = self.cells[cell_index].candidates.clone();
        self.snapshots.take(cell_index, tile, prior);
        self.emit(Event::Snapshot)?;
        let mut singleton = FixedBitSet::with_capacity(self.catalog.len());
        singleton.insert(tile);
        self.cells[cell_index].candidates = singleton;
        self.cells[cell_index].collapsed = true;
        self.emit(Event::Collapse { cells: vec![(cell_index, tile)], cause: CollapseCause::Entropy })?;

        self.state = EngineState::Propagating;
        match propagate(
            &mut self.cells,
            &self.neighbor_table,
            &self.orientation_of,
            &self.oracle,
            vec![cell_index],
            &mut self.snapshots,
        ) {
            Ok(result) => {
                self.snapshots.commit();
                if !result.touched.is_empty() {
                    self.emit(Event::Propagate { cells: result.touched })?;
                }
                if !result.implied_collapses.is_empty() {
                    self.emit(Event::Collapse {
                        cells: result.implied_collapses,
                        cause: CollapseCause::Implication,
                    })?;
                }
                self.state = EngineState::Running;
                Ok(())
            }
            Err(WfcError::Contradiction) => {
                self.state = EngineState::Backtracking;
                self.backtrack()
            }
            Err(e) => Err(e),
        }
    }

    /// Run `step` until the grid is complete or backtracking is exhausted.
    pub fn run(&mut self) -> Result<(), WfcError> {
        self.state = EngineState::Running;
        loop {
            self.step()?;
            if matches!(self.state, EngineState::Done) {
                return Ok(());
            }
        }
    }

    /// Pop `backtrack_step` frames, blacklist the offending tile, and
    /// re-propagate from the now-shrunk decision cell. Loops (rather than
    /// recursing) if that cell is immediately exhausted or re-propagation
    /// contradicts again.
    fn backtrack(&mut self) -> Result<(), WfcError> {
        loop {
            let mut last_decision = None;
            for _ in 0..self.config.backtrack_step {
                match self.snapshots.rollback(&mut self.cells) {
                    Some(decision) => last_decision = Some(decision),
                    None => {
                        self.state = EngineState::Failed;
                        self.emit(Event::Error { kind: ErrorKind::FatalSeed, detail: Some("backtrack stack exhausted".into()) })?;
                        return Err(WfcError::FatalSeed);
                    }
                }
            }

            self.retries += 1;
            if self.retries > self.config.max_retries {
                self.state = EngineState::Failed;
                self.emit(Event::Error { kind: ErrorKind::Unsatisfiable, detail: None })?;
                return Err(WfcError::Unsatisfiable);
            }

            let (decision_cell, decision_tile) =
                last_decision.expect("backtrack_step >= 1 guarantees at least one pop");
            self.emit(Event::Backtrack { cells: vec![(decision_cell, decision_tile)] })?;

            if self.cells[decision_cell].candidate_count() == 0 {
                continue;
            }

            let prior = self.cells[decision_cell].candidates.clone();
            self.snapshots.take(decision_cell, decision_tile, prior);
            self.emit(Event::Snapshot)?;
            match propagate(
                &mut self.cells,
                &self.neighbor_table,
                &self.orientation_of,
                &self.oracle,
                vec![decision_cell],
                &mut self.snapshots,
            ) {
                Ok(result) => {
                    self.snapshots.commit();
                    if !result.touched.is_empty() {
                        self.emit(Event::Propagate { cells: result.touched })?;
                    }
                    if !result.implied_collapses.is_empty() {
                        self.emit(Event::Collapse {
                            cells: result.implied_collapses,
                            cause: CollapseCause::Implication,
                        })?;
                    }
                    self.state = EngineState::Running;
                    return Ok(());
                }
                Err(WfcError::Contradiction) => continue,
                Err(e) => return Err(e),
            }
        }
    }
}
