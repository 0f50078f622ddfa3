//! Wave-function-collapse tile synthesizer: a generic constraint-propagation
//! engine that fills a grid with tiles drawn from a weighted catalog, subject
//! to per-edge adjacency rules.

pub mod cell;
pub mod engine;
pub mod error;
pub mod events;
pub mod loader;
pub mod oracle;
pub mod propagator;
pub mod random;
pub mod rule;
pub mod snapshot;
pub mod tile;
pub mod topology;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use cell::Cell;
pub use engine::{Engine, EngineConfig, EngineState, LogLevel};
pub use error::WfcError;
pub use events::{CollapseCause, ErrorKind, Event, FnObserver, Observer};
pub use loader::load_tileset;
pub use oracle::{AdjacencyOracle, ExportedOracle};
pub use random::{RandomSource, StdRngSource};
pub use rule::Rule;
pub use snapshot::{CellDelta, DeltaFrame, SnapshotStack};
pub use tile::{Adjacency, Payload, Tile, TileCatalog, TileDescriptor};
pub use topology::{CubeTopology, Direction, HexTopology, SquareTopology, Topology, TriangularTopology};
