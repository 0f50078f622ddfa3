//! Tileset loader (C12, ambient): deserializes a tile catalog from JSON.
//!
//! Schema:
//! ```json
//! { "tiles": [ { "name": "Grass", "weight": 2.0, "adjacencies": ["A", "A", "B", "B"] } ] }
//! ```
//! `weight` defaults to `1.0`; `payload`, if present, is attached verbatim and
//! never interpreted by the loader or the engine.

use std::sync::Arc;

use serde::Deserialize;

use crate::error::WfcError;
use crate::tile::{Adjacency, TileCatalog, TileDescriptor};

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct TileEntryJson {
    name: Option<String>,
    #[serde(default = "default_weight")]
    weight: f64,
    adjacencies: Option<Vec<String>>,
    #[serde(default)]
    payload: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TilesetDocument {
    tiles: Vec<TileEntryJson>,
}

/// Parse a JSON tileset document and build a catalog for a topology with
/// `edge_count` directions per cell.
pub fn load_tileset(json: &str, edge_count: usize) -> Result<TileCatalog, WfcError> {
    let doc: TilesetDocument =
        serde_json::from_str(json).map_err(|e| WfcError::JsonParseError(e.to_string()))?;

    if doc.tiles.is_empty() {
        return Err(WfcError::NoTilesDefined);
    }

    let mut descriptors = Vec::with_capacity(doc.tiles.len());
    for entry in doc.tiles {
        let name = entry
            .name
            .ok_or_else(|| WfcError::ConfigError("tile entry missing 'name'".into()))?;
        let adjacencies = entry.adjacencies.ok_or_else(|| {
            WfcError::ConfigError(format!("tile '{}' missing 'adjacencies'", name))
        })?;

        let mut descriptor = TileDescriptor::new(
            name,
            adjacencies.into_iter().map(Adjacency::Text).collect(),
        )
        .with_weight(entry.weight);

        if let Some(payload) = entry.payload {
            descriptor = descriptor.with_payload(Arc::new(payload));
        }

        descriptors.push(descriptor);
    }

    TileCatalog::build(descriptors, edge_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_a_minimal_tileset() {
        let json = r#"{
            "tiles": [
                { "name": "W", "adjacencies": ["[W>B]", "[W>B]", "[W>B]", "[W>B]"] },
                { "name": "B", "weight": 0.5, "adjacencies": ["[B>W]", "[B>W]", "[B>W]", "[B>W]"] }
            ]
        }"#;
        let catalog = load_tileset(json, 4).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.weight_of(catalog.index_of("W").unwrap()), 1.0);
        assert_eq!(catalog.weight_of(catalog.index_of("B").unwrap()), 0.5);
    }

    #[test]
    fn rejects_missing_adjacencies() {
        let json = r#"{ "tiles": [ { "name": "W" } ] }"#;
        let err = load_tileset(json, 4).unwrap_err();
        assert!(matches!(err, WfcError::ConfigError(_)));
    }

    #[test]
    fn rejects_empty_tile_list() {
        let json = r#"{ "tiles": [] }"#;
        let err = load_tileset(json, 4).unwrap_err();
        assert!(matches!(err, WfcError::NoTilesDefined));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = load_tileset("not json", 4).unwrap_err();
        assert!(matches!(err, WfcError::JsonParseError(_)));
    }
}
