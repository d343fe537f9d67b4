//! Twenty48 - a 2048 board engine
//!
//! This crate provides the core game logic for 2048, including:
//! - The line slide primitive (compact, merge once per pair, pad)
//! - A fixed 4x4 grid with row/column line extraction
//! - A two-phase game state machine with injectable randomness
//! - Move suggestions for hints and autoplay
//!
//! # Architecture
//!
//! The engine performs no I/O. Renderers read `Game::snapshot` after each
//! turn; score keepers register `Game::on_game_over` to receive the final
//! score and highest tile. It can be compiled to:
//! - Native Rust for server-side game hosting
//! - WebAssembly for a browser renderer
//!
//! # Modules
//!
//! - [`direction`]: Move directions and parsing
//! - [`grid`]: Grid storage and the `slide` primitive
//! - [`game`]: Game state machine
//! - [`bot`]: Move suggestions
//! - [`theme`]: Tile colours

pub mod bot;
pub mod direction;
pub mod game;
pub mod grid;
pub mod theme;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use bot::{Bot, BotDifficulty};
pub use direction::{Axis, Direction};
pub use game::{
    Game, GameError, GameEvent, GameOverHook, GamePhase, GameResult, GameSnapshot, SpawnedTile,
};
pub use grid::{slide, Grid, Line, GRID_SIZE, MAX_TILE};
pub use theme::tile_color;
