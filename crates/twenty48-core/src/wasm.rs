//! WebAssembly bindings for the board engine.
//!
//! This module exposes the engine to a JavaScript renderer through
//! wasm-bindgen. The page owns drawing and input; it calls `play` for each
//! arrow key and redraws from `getState`.

use wasm_bindgen::prelude::*;

use crate::bot::{Bot, BotDifficulty};
use crate::direction::Direction;
use crate::game::Game;
use crate::theme;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// CSS background for a tile value
#[wasm_bindgen(js_name = tileColor)]
pub fn tile_color(value: u32) -> String {
    theme::tile_color_css(value)
}

/// WASM-exposed game wrapper
#[wasm_bindgen]
pub struct WasmGame {
    game: Game,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a new game, deterministic when a seed is given
    #[wasm_bindgen(constructor)]
    pub fn new(seed: Option<u64>) -> WasmGame {
        let game = match seed {
            Some(seed) => Game::with_seed(seed),
            None => Game::new(),
        };
        WasmGame { game }
    }

    /// Get the current snapshot as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        serde_json::to_string(&self.game.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Play a move ("left", "ArrowUp", ...), returns events JSON or error
    pub fn play(&mut self, direction: &str) -> Result<String, JsValue> {
        let direction: Direction = direction
            .parse()
            .map_err(|e| JsValue::from_str(&format!("{}", e)))?;

        match self.game.play(direction) {
            Ok(events) => {
                Ok(serde_json::to_string(&events).unwrap_or_else(|_| "[]".to_string()))
            }
            Err(e) => Err(JsValue::from_str(&format!("Move failed: {}", e))),
        }
    }

    /// Start over on the same instance
    pub fn reset(&mut self) {
        self.game.reset();
    }

    #[wasm_bindgen(js_name = isTerminal)]
    pub fn is_terminal(&self) -> bool {
        self.game.is_finished()
    }

    #[wasm_bindgen(js_name = getScore)]
    pub fn get_score(&self) -> u64 {
        self.game.score()
    }

    #[wasm_bindgen(js_name = getHighestValue)]
    pub fn get_highest_value(&self) -> u32 {
        self.game.highest_value()
    }

    /// Directions that would change the board, as a JSON array
    #[wasm_bindgen(js_name = getValidMoves)]
    pub fn get_valid_moves(&self) -> String {
        serde_json::to_string(&self.game.valid_moves()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Get a bot's suggested move
    /// difficulty: "Easy", "Medium", or "Hard"
    #[wasm_bindgen(js_name = getBotMove)]
    pub fn get_bot_move(&self, difficulty: &str) -> Option<String> {
        let diff = match difficulty {
            "Easy" => BotDifficulty::Easy,
            "Hard" => BotDifficulty::Hard,
            _ => BotDifficulty::Medium,
        };

        Bot::new(diff)
            .choose_move(&self.game)
            .map(|dir| dir.as_str().to_string())
    }
}
