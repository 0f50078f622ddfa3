//! Tile catalog (C2): immutable tile records plus the dense index assignment
//! every other subsystem builds on.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::WfcError;
use crate::rule::{parse, Rule};

/// Opaque, reference-counted payload attached to a tile. The engine never
/// inspects it; it is handed back to the caller verbatim (e.g. a draw callback).
pub type Payload = Arc<dyn Any + Send + Sync>;

/// One adjacency entry as supplied by a caller: either pre-parsed or a string
/// to be parsed eagerly at catalog construction (design note in SPEC_FULL.md §9).
#[derive(Debug, Clone)]
pub enum Adjacency {
    Parsed(Rule),
    Text(String),
}

impl From<Rule> for Adjacency {
    fn from(rule: Rule) -> Self {
        Adjacency::Parsed(rule)
    }
}

impl From<&str> for Adjacency {
    fn from(text: &str) -> Self {
        Adjacency::Text(text.to_string())
    }
}

impl From<String> for Adjacency {
    fn from(text: String) -> Self {
        Adjacency::Text(text)
    }
}

/// A tile descriptor as supplied by a caller, before catalog construction.
#[derive(Debug, Clone)]
pub struct TileDescriptor {
    pub name: String,
    pub weight: f64,
    pub adjacencies: Vec<Adjacency>,
    pub payload: Option<Payload>,
}

impl TileDescriptor {
    pub fn new(name: impl Into<String>, adjacencies: Vec<Adjacency>) -> Self {
        TileDescriptor {
            name: name.into(),
            weight: 1.0,
            adjacencies,
            payload: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// An immutable catalog entry. `edges[d]` is the rule guarding direction `d`
/// of the topology this catalog was built for.
#[derive(Debug, Clone)]
pub struct Tile {
    pub name: String,
    pub weight: f64,
    pub edges: Vec<Rule>,
    pub payload: Option<Payload>,
}

/// The dense, immutable tile set the rest of the engine is built over.
#[derive(Debug, Clone, Default)]
pub struct TileCatalog {
    tiles: Vec<Tile>,
    index_by_name: HashMap<String, usize>,
}

impl TileCatalog {
    /// Build a catalog for a topology with `edge_count` directions per cell.
    ///
    /// Rejects duplicate tile names and tiles whose `adjacencies` length
    /// differs from `edge_count`. String adjacency entries are parsed through
    /// [`crate::rule::parse`] and memoized by raw text so repeated identical
    /// strings across many tiles only pay the parse cost once.
    pub fn build(descriptors: Vec<TileDescriptor>, edge_count: usize) -> Result<TileCatalog, WfcError> {
        if descriptors.is_empty() {
            return Err(WfcError::NoTilesDefined);
        }

        let mut parse_cache: HashMap<String, Rule> = HashMap::new();
        let mut tiles = Vec::with_capacity(descriptors.len());
        let mut index_by_name = HashMap::with_capacity(descriptors.len());

        for desc in descriptors {
            if index_by_name.contains_key(&desc.name) {
                return Err(WfcError::ConfigError(format!(
                    "duplicate tile name '{}'",
                    desc.name
                )));
            }
            if desc.adjacencies.len() != edge_count {
                return Err(WfcError::ConfigError(format!(
                    "tile '{}' has {} edges, topology requires {}",
                    desc.name,
                    desc.adjacencies.len(),
                    edge_count
                )));
            }
            if desc.weight <= 0.0 {
                return Err(WfcError::ConfigError(format!(
                    "tile '{}' has non-positive weight {}",
                    desc.name, desc.weight
                )));
            }

            let mut edges = Vec::with_capacity(edge_count);
            for adjacency in desc.adjacencies {
                let rule = match adjacency {
                    Adjacency::Parsed(rule) => rule,
                    Adjacency::Text(text) => {
                        if let Some(cached) = parse_cache.get(&text) {
                            cached.clone()
                        } else {
                            let rule = parse(&text)?;
                            parse_cache.insert(text, rule.clone());
                            rule
                        }
                    }
                };
                edges.push(rule);
            }

            let index = tiles.len();
            index_by_name.insert(desc.name.clone(), index);
            tiles.push(Tile {
                name: desc.name,
                weight: desc.weight,
                edges,
                payload: desc.payload,
            });
        }

        Ok(TileCatalog { tiles, index_by_name })
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index_by_name.get(name).copied()
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.tiles.get(index).map(|t| t.name.as_str())
    }

    pub fn weight_of(&self, index: usize) -> f64 {
        self.tiles.get(index).map(|t| t.weight).unwrap_or(1.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Tile)> {
        self.tiles.iter().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(name: &str, edges: [&str; 4]) -> TileDescriptor {
        TileDescriptor::new(name, edges.iter().map(|e| Adjacency::from(*e)).collect())
    }

    #[test]
    fn builds_dense_indices() {
        let catalog = TileCatalog::build(
            vec![
                desc("W", ["[W>B]", "[W>B]", "[W>B]", "[W>B]"]),
                desc("B", ["[B>W]", "[B>W]", "[B>W]", "[B>W]"]),
            ],
            4,
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.index_of("W"), Some(0));
        assert_eq!(catalog.index_of("B"), Some(1));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = TileCatalog::build(
            vec![
                desc("A", ["x", "x", "x", "x"]),
                desc("A", ["y", "y", "y", "y"]),
            ],
            4,
        )
        .unwrap_err();
        assert!(matches!(err, WfcError::ConfigError(_)));
    }

    #[test]
    fn rejects_wrong_edge_count() {
        let descriptor = TileDescriptor::new("A", vec![Adjacency::from("x")]);
        let err = TileCatalog::build(vec![descriptor], 4).unwrap_err();
        assert!(matches!(err, WfcError::ConfigError(_)));
    }

    #[test]
    fn rejects_empty_catalog() {
        let err = TileCatalog::build(vec![], 4).unwrap_err();
        assert!(matches!(err, WfcError::NoTilesDefined));
    }

    #[test]
    fn default_weight_is_one() {
        let descriptor = desc("A", ["x", "x", "x", "x"]);
        let catalog = TileCatalog::build(vec![descriptor], 4).unwrap();
        assert_eq!(catalog.weight_of(0), 1.0);
    }
}
