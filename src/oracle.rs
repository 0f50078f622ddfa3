//! Adjacency oracle (C5): precomputed tile-pair compatibility, stored as
//! bitsets so propagation reduces to branch-free intersection.

use std::collections::HashMap;

use fixedbitset::FixedBitSet;
use serde::{Deserialize, Serialize};

use crate::error::WfcError;
use crate::tile::TileCatalog;
use crate::topology::Topology;

/// `allowed[orientation][tile][direction]` = bitset of tile indices permitted
/// on the opposite side of `direction` from a tile of the given orientation.
#[derive(Debug, Clone)]
pub struct AdjacencyOracle {
    num_tiles: usize,
    edge_count: usize,
    orientation_count: usize,
    allowed: Vec<Vec<Vec<FixedBitSet>>>,
}

impl AdjacencyOracle {
    /// Build once over `(catalog, topology)`. `j ∈ allowed[i][d]` iff
    /// `match(tiles[i].edges[d], tiles[j].edges[inverse(d)])`.
    pub fn build<T: Topology>(catalog: &TileCatalog, topology: &T) -> Result<AdjacencyOracle, WfcError> {
        let num_tiles = catalog.len();
        let edge_count = topology.edge_count();
        let orientation_count = topology.orientation_count().max(1);

        let mut allowed = vec![vec![vec![FixedBitSet::with_capacity(num_tiles); edge_count]; num_tiles]; orientation_count];

        for orientation in 0..orientation_count {
            for (i, tile_i) in catalog.iter() {
                for d in 0..edge_count {
                    let inv = topology.inverse(orientation, d);
                    let mut bits = FixedBitSet::with_capacity(num_tiles);
                    for (j, tile_j) in catalog.iter() {
                        if tile_i.edges[d].matches(&tile_j.edges[inv]) {
                            bits.insert(j);
                        }
                    }
                    allowed[orientation][i][d] = bits;
                }
            }
        }

        Ok(AdjacencyOracle { num_tiles, edge_count, orientation_count, allowed })
    }

    pub fn num_tiles(&self) -> usize {
        self.num_tiles
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// The set of tiles permitted on the opposite side of `direction` from
    /// `tile`, for a cell of the given `orientation`.
    pub fn allowed(&self, orientation: usize, tile: usize, direction: usize) -> &FixedBitSet {
        &self.allowed[orientation][tile][direction]
    }

    /// `{ i ∈ self_candidates : allowed[orientation][i][direction] ∩ neighbor_candidates ≠ ∅ }`
    ///
    /// The candidate set a cell of the given orientation may retain in
    /// `direction`, given what its neighbor across that edge still allows.
    pub fn refine_self(
        &self,
        orientation: usize,
        direction: usize,
        self_candidates: &FixedBitSet,
        neighbor_candidates: &FixedBitSet,
    ) -> FixedBitSet {
        let mut result = FixedBitSet::with_capacity(self.num_tiles);
        for i in self_candidates.ones() {
            let mut intersection = self.allowed[orientation][i][direction].clone();
            intersection.intersect_with(neighbor_candidates);
            if intersection.count_ones(..) > 0 {
                result.insert(i);
            }
        }
        result
    }

    /// Serialize as `{tile_name: {orientation: {direction_index: [neighbor_name, ...]}}}`.
    pub fn export(&self, catalog: &TileCatalog) -> ExportedOracle {
        let mut tiles = HashMap::new();
        for (i, tile) in catalog.iter() {
            let mut by_orientation = HashMap::new();
            for orientation in 0..self.orientation_count {
                let mut by_direction = HashMap::new();
                for d in 0..self.edge_count {
                    let names: Vec<String> = self.allowed[orientation][i][d]
                        .ones()
                        .filter_map(|j| catalog.name_of(j).map(|s| s.to_string()))
                        .collect();
                    by_direction.insert(d, names);
                }
                by_orientation.insert(orientation.to_string(), by_direction);
            }
            tiles.insert(tile.name.clone(), by_orientation);
        }
        ExportedOracle { tiles }
    }

    /// Rebuild an oracle from an export, requiring an identical catalog.
    pub fn import(exported: &ExportedOracle, catalog: &TileCatalog, edge_count: usize, orientation_count: usize) -> Result<AdjacencyOracle, WfcError> {
        let num_tiles = catalog.len();
        let mut allowed = vec![vec![vec![FixedBitSet::with_capacity(num_tiles); edge_count]; num_tiles]; orientation_count.max(1)];

        for (name, by_orientation) in &exported.tiles {
            let i = catalog
                .index_of(name)
                .ok_or_else(|| WfcError::ConfigError(format!("oracle export references unknown tile '{}'", name)))?;
            for (orientation_str, by_direction) in by_orientation {
                let orientation: usize = orientation_str
                    .parse()
                    .map_err(|_| WfcError::ConfigError(format!("invalid orientation key '{}'", orientation_str)))?;
                for (direction, names) in by_direction {
                    let mut bits = FixedBitSet::with_capacity(num_tiles);
                    for name in names {
                        let j = catalog
                            .index_of(name)
                            .ok_or_else(|| WfcError::ConfigError(format!("oracle export references unknown tile '{}'", name)))?;
                        bits.insert(j);
                    }
                    allowed[orientation][i][*direction] = bits;
                }
            }
        }

        Ok(AdjacencyOracle { num_tiles, edge_count, orientation_count: orientation_count.max(1), allowed })
    }
}

/// Serializable form of an [`AdjacencyOracle`], keyed by tile name rather than
/// dense index so it survives across engine instances built from an
/// identical catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedOracle {
    pub tiles: HashMap<String, HashMap<String, HashMap<usize, Vec<String>>>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{Adjacency, TileDescriptor};
    use crate::topology::SquareTopology;

    fn checkerboard_catalog() -> TileCatalog {
        TileCatalog::build(
            vec![
                TileDescriptor::new(
                    "W",
                    vec![
                        Adjacency::from("[W>B]"),
                        Adjacency::from("[W>B]"),
                        Adjacency::from("[W>B]"),
                        Adjacency::from("[W>B]"),
                    ],
                ),
                TileDescriptor::new(
                    "B",
                    vec![
                        Adjacency::from("[B>W]"),
                        Adjacency::from("[B>W]"),
                        Adjacency::from("[B>W]"),
                        Adjacency::from("[B>W]"),
                    ],
                ),
            ],
            4,
        )
        .unwrap()
    }

    #[test]
    fn checkerboard_tiles_only_allow_each_other() {
        let catalog = checkerboard_catalog();
        let topo = SquareTopology::new(2, 2);
        let oracle = AdjacencyOracle::build(&catalog, &topo).unwrap();

        let w = catalog.index_of("W").unwrap();
        let b = catalog.index_of("B").unwrap();

        for d in 0..4 {
            let allowed_w = oracle.allowed(0, w, d);
            assert!(allowed_w.contains(b));
            assert!(!allowed_w.contains(w));
        }
    }

    #[test]
    fn build_is_deterministic() {
        let catalog = checkerboard_catalog();
        let topo = SquareTopology::new(2, 2);
        let oracle1 = AdjacencyOracle::build(&catalog, &topo).unwrap();
        let oracle2 = AdjacencyOracle::build(&catalog, &topo).unwrap();
        assert_eq!(oracle1.export(&catalog).tiles.len(), oracle2.export(&catalog).tiles.len());
        for (name, by_o) in &oracle1.export(&catalog).tiles {
            let other = &oracle2.export(&catalog).tiles[name];
            assert_eq!(by_o, other);
        }
    }

    #[test]
    fn export_import_round_trips() {
        let catalog = checkerboard_catalog();
        let topo = SquareTopology::new(2, 2);
        let oracle = AdjacencyOracle::build(&catalog, &topo).unwrap();
        let exported = oracle.export(&catalog);
        let json = serde_json::to_string(&exported).unwrap();
        let reloaded: ExportedOracle = serde_json::from_str(&json).unwrap();
        let imported = AdjacencyOracle::import(&reloaded, &catalog, 4, 1).unwrap();

        let w = catalog.index_of("W").unwrap();
        for d in 0..4 {
            assert_eq!(
                oracle.allowed(0, w, d).ones().collect::<Vec<_>>(),
                imported.allowed(0, w, d).ones().collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn refine_self_matches_brute_force() {
        let catalog = checkerboard_catalog();
        let topo = SquareTopology::new(2, 2);
        let oracle = AdjacencyOracle::build(&catalog, &topo).unwrap();

        let mut self_candidates = FixedBitSet::with_capacity(2);
        self_candidates.insert(0);
        self_candidates.insert(1);
        let mut neighbor_candidates = FixedBitSet::with_capacity(2);
        neighbor_candidates.insert(1); // only B

        let refined = oracle.refine_self(0, 0, &self_candidates, &neighbor_candidates);
        // Only W (index 0) is compatible with a neighbor fixed to B.
        assert!(refined.contains(0));
        assert!(!refined.contains(1));
    }
}
