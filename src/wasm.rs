//! WASM bindings (external front-end surface, gated behind the `wasm` feature).

use wasm_bindgen::prelude::*;

use crate::engine::{Engine, EngineConfig};
use crate::error::WfcError;
use crate::loader::load_tileset;
use crate::random::StdRngSource;
use crate::topology::{SquareTopology, Topology};

impl From<WfcError> for JsValue {
    fn from(error: WfcError) -> Self {
        JsValue::from_str(&error.to_string())
    }
}

#[wasm_bindgen]
pub struct WfcModel {
    engine: Option<Engine<SquareTopology>>,
    width: usize,
    height: usize,
    seed: Option<u64>,
    result: Option<Vec<String>>,
}

#[wasm_bindgen]
impl WfcModel {
    #[wasm_bindgen(constructor)]
    pub fn new(width: usize, height: usize, seed: Option<u64>) -> Result<WfcModel, JsValue> {
        if width == 0 || height == 0 || width > 500 || height > 500 {
            return Err(WfcError::InvalidDimensions { width, height }.into());
        }

        Ok(WfcModel { engine: None, width, height, seed, result: None })
    }

    /// Load a tileset (see [`crate::loader::load_tileset`] for the schema)
    /// and (re)build the engine over it. Discards any previous result.
    #[wasm_bindgen]
    pub fn load_rules(&mut self, rules_json: &str) -> Result<(), JsValue> {
        let topology = SquareTopology::new(self.width, self.height);
        let catalog = load_tileset(rules_json, topology.edge_count())?;
        let rng: Box<dyn crate::random::RandomSource> = match self.seed {
            Some(seed) => Box::new(StdRngSource::seeded(seed)),
            None => Box::new(StdRngSource::from_entropy()),
        };
        self.engine = Some(Engine::new(topology, catalog, EngineConfig::default(), rng)?);
        self.result = None;
        Ok(())
    }

    /// Run to completion. Returns `false` (rather than erroring) when the
    /// instance turns out unsatisfiable, so callers can retry with a new seed.
    #[wasm_bindgen]
    pub fn run(&mut self) -> Result<bool, JsValue> {
        match &mut self.engine {
            Some(engine) => {
                engine.start(vec![])?;
                match engine.run() {
                    Ok(()) => {
                        let names: Vec<String> = engine
                            .result()
                            .unwrap()
                            .into_iter()
                            .map(|(_, tile)| engine.catalog().name_of(tile).unwrap().to_string())
                            .collect();
                        self.result = Some(names);
                        Ok(true)
                    }
                    Err(WfcError::Unsatisfiable) => {
                        self.result = None;
                        Ok(false)
                    }
                    Err(e) => Err(e.into()),
                }
            }
            None => Err(JsValue::from_str("Engine not initialized. Call load_rules() first.")),
        }
    }

    /// The collapsed grid, row-major, as tile names. `None` until a
    /// successful `run()`.
    #[wasm_bindgen]
    pub fn get_grid(&self) -> Result<JsValue, JsValue> {
        match &self.result {
            Some(grid) => serde_wasm_bindgen::to_value(grid).map_err(|e| JsValue::from_str(&e.to_string())),
            None => Err(JsValue::from_str("No generated grid available. Run successfully first.")),
        }
    }
}
