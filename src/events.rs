//! Observer-pattern events (§4.6, §6): synchronous callbacks delivered before
//! the engine's next state transition. Subscribers must not mutate the engine.

/// Why a cell was collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollapseCause {
    /// Forced by `start`'s initial seed.
    Initial,
    /// Chosen by `step`'s entropy-driven scheduler.
    Entropy,
    /// Propagation alone reduced the cell to a single candidate.
    Implication,
}

/// The kind of terminal error an `Error` event carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FatalSeed,
    Unsatisfiable,
    CallbackFailure,
}

/// An event emitted by the engine. `cells` payloads are `(cell_index, tile_index)`
/// pairs; plain `Propagate` payloads are bare cell indices.
///
/// These are the engine's dense internal cell indices, not topology
/// coordinates: `Event` isn't generic over `Engine<T>::Coord`, so a subscriber
/// that wants a coordinate back must call `Engine::coord_of(index)` itself.
#[derive(Debug, Clone)]
pub enum Event {
    Collapse { cells: Vec<(usize, usize)>, cause: CollapseCause },
    Propagate { cells: Vec<usize> },
    Backtrack { cells: Vec<(usize, usize)> },
    /// A new delta frame opened on the snapshot stack (one decision about to
    /// be settled) — emitted at every `SnapshotStack::take` call site.
    Snapshot,
    Complete,
    Error { kind: ErrorKind, detail: Option<String> },
}

/// Subscriber to engine events. Implementations must not call back into the
/// engine they're observing; doing so is undefined per §4.6 and is not
/// guarded against re-entrantly (the engine has no reentrancy lock of its
/// own - observers are trusted collaborators, not sandboxed ones).
///
/// Returning `Err` (or panicking) aborts the run: the engine converts either
/// into `WfcError::CallbackFailure` and halts, per §7.
pub trait Observer {
    fn on_event(&mut self, event: &Event) -> Result<(), String>;
}

/// An [`Observer`] built from a plain closure, for quick wiring in tests and
/// small programs.
pub struct FnObserver<F: FnMut(&Event) -> Result<(), String>>(pub F);

impl<F: FnMut(&Event) -> Result<(), String>> Observer for FnObserver<F> {
    fn on_event(&mut self, event: &Event) -> Result<(), String> {
        (self.0)(event)
    }
}
