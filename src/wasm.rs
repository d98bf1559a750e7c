use wasm_bindgen::prelude::*;

use crate::ai::{Difficulty, Engine};
use crate::board::DEFAULT_SIZE;
use crate::error::GameError;
use crate::game::GameInstance;
use crate::types::Colour;

#[wasm_bindgen]
pub fn wasm_ready() -> bool {
    true
}

fn to_js_error(err: GameError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(JsValue::from)
}

/// Browser handle on a game against the computer. The person plays Black.
#[wasm_bindgen]
pub struct WasmGame {
    inner: GameInstance,
}

#[wasm_bindgen]
impl WasmGame {
    #[wasm_bindgen(constructor)]
    pub fn new(difficulty: &str) -> Result<WasmGame, JsValue> {
        let engine = Engine::new(Difficulty::from_label(difficulty));
        let inner = GameInstance::new(DEFAULT_SIZE, Colour::Black, Box::new(engine))
            .map_err(to_js_error)?;
        Ok(Self { inner })
    }

    pub fn legal_moves(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.get_legal_moves())
    }

    pub fn place(&mut self, row: u8, col: u8) -> Result<(), JsValue> {
        self.inner.place(row, col).map_err(to_js_error)
    }

    pub fn ai_move(&mut self) -> Result<(), JsValue> {
        self.inner.do_ai_move().map_err(to_js_error)
    }

    pub fn pass(&mut self) -> Result<(), JsValue> {
        self.inner.pass().map_err(to_js_error)
    }

    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.to_game_state())
    }

    pub fn result(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.to_game_result())
    }
}
