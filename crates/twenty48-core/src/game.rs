//! Core game state machine.
//!
//! This module contains the `Game` struct (the board engine) and its
//! two-phase state machine. A game owns its grid, score and random source;
//! callers create one instance per game and drive it through `play`.

use crate::direction::Direction;
use crate::grid::{slide, Grid, GRID_SIZE};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Probability that a spawned tile is a 4 instead of a 2
pub const SPAWN_FOUR_PROBABILITY: f64 = 0.1;

/// Tiles placed on a fresh grid
const STARTING_TILES: usize = 2;

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Moves are accepted
    Playing,
    /// No move can change the board; absorbing until reset
    Terminal,
}

/// Errors that can occur when driving a game
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Invalid direction: {0}")]
    InvalidDirection(String),

    #[error("Invalid tile value: {0}")]
    InvalidTile(u32),

    #[error("Game is over")]
    GameOver,
}

/// A tile placed by `spawn_tile`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnedTile {
    pub row: usize,
    pub col: usize,
    pub value: u32,
}

/// Final figures of a finished game, handed to the game-over hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub score: u64,
    pub highest_value: u32,
    pub moves: u32,
}

/// Events that occur as a result of a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Tiles slid and merged
    Moved {
        direction: Direction,
        score_gained: u64,
    },

    /// The move changed nothing; no tile was spawned
    NoChange { direction: Direction },

    /// A new tile appeared after a move
    TileSpawned { row: usize, col: usize, value: u32 },

    /// No further moves are possible
    GameOver { result: GameResult },
}

/// Read-only view of a game for renderers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub grid: [[u32; GRID_SIZE]; GRID_SIZE],
    pub score: u64,
    pub phase: GamePhase,
    pub highest_value: u32,
    pub moves: u32,
}

/// Callback invoked once when a game reaches the terminal phase
pub type GameOverHook = Box<dyn FnMut(&GameResult) + Send + Sync>;

/// The board engine
pub struct Game<R: Rng = StdRng> {
    grid: Grid,
    score: u64,
    phase: GamePhase,
    /// Moves that changed the board
    moves: u32,
    rng: R,
    on_game_over: Option<GameOverHook>,
}

impl Game<StdRng> {
    /// Start a game with an entropy-seeded random source
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Start a deterministic game
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for Game<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Game<R> {
    /// Start a game drawing tiles from `rng`
    pub fn with_rng(rng: R) -> Self {
        let mut game = Self {
            grid: Grid::new(),
            score: 0,
            phase: GamePhase::Playing,
            moves: 0,
            rng,
            on_game_over: None,
        };
        game.place_starting_tiles();
        game
    }

    /// Resume from an exact grid. No tiles are spawned; the phase is
    /// derived from the grid.
    pub fn from_grid(grid: Grid, score: u64, rng: R) -> Self {
        let mut game = Self {
            grid,
            score,
            phase: GamePhase::Playing,
            moves: 0,
            rng,
            on_game_over: None,
        };
        if game.is_terminal() {
            game.phase = GamePhase::Terminal;
        }
        game
    }

    /// Register the callback fired when the game ends
    pub fn on_game_over<F>(&mut self, hook: F)
    where
        F: FnMut(&GameResult) + Send + Sync + 'static,
    {
        self.on_game_over = Some(Box::new(hook));
    }

    /// Clear the board and start over, keeping the random source and hook
    pub fn reset(&mut self) {
        self.grid = Grid::new();
        self.score = 0;
        self.phase = GamePhase::Playing;
        self.moves = 0;
        self.place_starting_tiles();
    }

    fn place_starting_tiles(&mut self) {
        for _ in 0..STARTING_TILES {
            self.spawn_tile();
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Check if the game is finished
    pub fn is_finished(&self) -> bool {
        self.phase == GamePhase::Terminal
    }

    /// Largest tile on the board
    pub fn highest_value(&self) -> u32 {
        self.grid.highest_value()
    }

    /// True iff the grid is full and no adjacent tiles can merge
    pub fn is_terminal(&self) -> bool {
        self.grid.is_full() && !self.grid.has_adjacent_pair()
    }

    /// Final figures, once the game has ended
    pub fn result(&self) -> Option<GameResult> {
        self.is_finished().then(|| self.current_result())
    }

    fn current_result(&self) -> GameResult {
        GameResult {
            score: self.score,
            highest_value: self.highest_value(),
            moves: self.moves,
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            grid: self.grid.rows(),
            score: self.score,
            phase: self.phase,
            highest_value: self.highest_value(),
            moves: self.moves,
        }
    }

    /// Slide every line in `direction`, adding merged values to the score.
    ///
    /// Returns whether any line changed. This does not spawn a tile or
    /// advance the phase; `play` does both.
    pub fn apply_move(&mut self, direction: Direction) -> bool {
        let mut changed = false;
        for index in 0..GRID_SIZE {
            let line = self.grid.line(direction, index);
            let (slid, gained) = slide(line);
            if slid != line {
                changed = true;
                self.grid.set_line(direction, index, slid);
            }
            self.score += gained;
        }
        changed
    }

    /// Place a 2 (or, with probability 0.1, a 4) on a uniformly chosen
    /// empty cell. A full grid is left untouched.
    pub fn spawn_tile(&mut self) -> Option<SpawnedTile> {
        let empty = self.grid.empty_cells();
        if empty.is_empty() {
            return None;
        }

        let (row, col) = empty[self.rng.gen_range(0..empty.len())];
        let value = if self.rng.gen_bool(SPAWN_FOUR_PROBABILITY) {
            4
        } else {
            2
        };
        self.grid.set(row, col, value);

        Some(SpawnedTile { row, col, value })
    }

    /// Directions that would change the board
    pub fn valid_moves(&self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|&dir| {
                (0..GRID_SIZE).any(|i| {
                    let line = self.grid.line(dir, i);
                    slide(line).0 != line
                })
            })
            .collect()
    }

    /// Play one turn: move, spawn a tile if anything moved, and check for
    /// game over.
    pub fn play(&mut self, direction: Direction) -> Result<Vec<GameEvent>, GameError> {
        if self.phase == GamePhase::Terminal {
            return Err(GameError::GameOver);
        }

        let score_before = self.score;
        if !self.apply_move(direction) {
            return Ok(vec![GameEvent::NoChange { direction }]);
        }
        self.moves += 1;

        let mut events = vec![GameEvent::Moved {
            direction,
            score_gained: self.score - score_before,
        }];

        if let Some(tile) = self.spawn_tile() {
            events.push(GameEvent::TileSpawned {
                row: tile.row,
                col: tile.col,
                value: tile.value,
            });
        }

        if self.is_terminal() {
            self.phase = GamePhase::Terminal;
            let result = self.current_result();
            if let Some(hook) = self.on_game_over.as_mut() {
                hook(&result);
            }
            events.push(GameEvent::GameOver { result });
        }

        Ok(events)
    }
}

impl<R: Rng> fmt::Debug for Game<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("grid", &self.grid)
            .field("score", &self.score)
            .field("phase", &self.phase)
            .field("moves", &self.moves)
            .field("has_game_over_hook", &self.on_game_over.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MAX_TILE;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    /// One empty cell; `Right` fills it and leaves no moves
    fn one_move_from_terminal() -> Grid {
        Grid::from_rows([
            [2, 4, 2, 4],
            [4, 2, 4, 2],
            [16, 4, 2, 4],
            [8, 16, 32, 0],
        ])
        .unwrap()
    }

    fn checkerboard() -> Grid {
        Grid::from_rows([
            [2, 4, 2, 4],
            [4, 2, 4, 2],
            [2, 4, 2, 4],
            [4, 2, 4, 2],
        ])
        .unwrap()
    }

    #[test]
    fn test_new_game_has_two_tiles() {
        let game = Game::with_seed(1);
        assert_eq!(game.grid().empty_cells().len(), 14);
        assert_eq!(game.score(), 0);
        assert_eq!(game.phase(), GamePhase::Playing);
        for row in game.grid().rows() {
            for v in row {
                assert!(v == 0 || v == 2 || v == 4);
            }
        }
    }

    #[test]
    fn test_same_seed_same_game() {
        let mut a = Game::with_seed(42);
        let mut b = Game::with_seed(42);
        for dir in [Direction::Left, Direction::Up, Direction::Right, Direction::Down] {
            assert_eq!(a.play(dir), b.play(dir));
        }
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_apply_move_left_scores_merges() {
        let grid = Grid::from_rows([[2, 2, 2, 2], [2, 0, 2, 4], [0, 0, 0, 0], [8, 0, 0, 0]])
            .unwrap();
        let mut game = Game::from_grid(grid, 0, rng());

        assert!(game.apply_move(Direction::Left));
        assert_eq!(
            game.grid().rows(),
            [[4, 4, 0, 0], [4, 4, 0, 0], [0, 0, 0, 0], [8, 0, 0, 0]]
        );
        assert_eq!(game.score(), 12);
    }

    #[test]
    fn test_apply_move_down_on_columns() {
        let grid = Grid::from_rows([[2, 0, 0, 0], [2, 0, 0, 0], [4, 0, 0, 0], [0, 0, 0, 8]])
            .unwrap();
        let mut game = Game::from_grid(grid, 0, rng());

        assert!(game.apply_move(Direction::Down));
        assert_eq!(
            game.grid().rows(),
            [[0, 0, 0, 0], [0, 0, 0, 0], [4, 0, 0, 0], [4, 0, 0, 8]]
        );
        assert_eq!(game.score(), 4);
    }

    #[test]
    fn test_unchanged_line_does_not_hide_changed_one() {
        // Row 0 is already compacted; row 3 still moves
        let grid = Grid::from_rows([[2, 4, 8, 16], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 2]])
            .unwrap();
        let mut game = Game::from_grid(grid, 0, rng());
        assert!(game.apply_move(Direction::Left));
    }

    #[test]
    fn test_no_change_move_spawns_nothing() {
        let grid = Grid::from_rows([[2, 4, 0, 0], [8, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]])
            .unwrap();
        let mut game = Game::from_grid(grid, 0, rng());

        let events = game.play(Direction::Left).unwrap();
        assert_eq!(
            events,
            vec![GameEvent::NoChange {
                direction: Direction::Left
            }]
        );
        assert_eq!(*game.grid(), grid);
        assert_eq!(game.moves(), 0);
    }

    #[test]
    fn test_play_spawns_after_change() {
        let grid = Grid::from_rows([[0, 0, 0, 2], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]])
            .unwrap();
        let mut game = Game::from_grid(grid, 0, rng());

        let events = game.play(Direction::Left).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            GameEvent::Moved {
                direction: Direction::Left,
                score_gained: 0
            }
        );
        match events[1] {
            GameEvent::TileSpawned { row, col, value } => {
                assert_ne!((row, col), (0, 0));
                assert!(value == 2 || value == 4);
                assert_eq!(game.grid().get(row, col), Some(value));
            }
            ref other => panic!("expected a spawn, got {other:?}"),
        }
        assert_eq!(game.moves(), 1);
        assert_eq!(game.grid().empty_cells().len(), 14);
    }

    #[test]
    fn test_spawn_on_full_grid_is_noop() {
        let mut game = Game::from_grid(checkerboard(), 0, rng());
        assert_eq!(game.spawn_tile(), None);
        assert_eq!(*game.grid(), checkerboard());
    }

    #[test]
    fn test_spawn_value_distribution() {
        let mut rng = StdRng::seed_from_u64(2024);
        let mut fours = 0;
        let trials = 10_000;
        for _ in 0..trials {
            let mut game = Game::from_grid(Grid::new(), 0, &mut rng);
            if game.spawn_tile().map(|t| t.value) == Some(4) {
                fours += 1;
            }
        }
        let ratio = fours as f64 / trials as f64;
        assert!((0.07..0.13).contains(&ratio), "four ratio {ratio}");
    }

    #[test]
    fn test_spawn_only_into_empty_cells() {
        let grid = Grid::from_rows([
            [2, 4, 2, 4],
            [4, 2, 4, 2],
            [2, 4, 0, 4],
            [4, 2, 4, 2],
        ])
        .unwrap();
        for seed in 0..20 {
            let mut game = Game::from_grid(grid, 0, StdRng::seed_from_u64(seed));
            let tile = game.spawn_tile().unwrap();
            assert_eq!((tile.row, tile.col), (2, 2));
        }
    }

    #[test]
    fn test_terminal_detection() {
        assert!(Game::from_grid(checkerboard(), 0, rng()).is_terminal());

        let game = Game::from_grid(one_move_from_terminal(), 0, rng());
        assert!(!game.is_terminal());

        let mut merge_left = checkerboard();
        merge_left.set(0, 0, 4);
        assert!(!Game::from_grid(merge_left, 0, rng()).is_terminal());
    }

    #[test]
    fn test_from_terminal_grid_rejects_play() {
        let mut game = Game::from_grid(checkerboard(), 100, rng());
        assert_eq!(game.phase(), GamePhase::Terminal);
        assert!(game.valid_moves().is_empty());
        assert_eq!(game.play(Direction::Up), Err(GameError::GameOver));
        assert_eq!(
            game.result(),
            Some(GameResult {
                score: 100,
                highest_value: 4,
                moves: 0
            })
        );
    }

    #[test]
    fn test_largest_tiles_merge_without_overflow() {
        let half = MAX_TILE / 2;
        let grid = Grid::from_rows([[half; GRID_SIZE]; GRID_SIZE]).unwrap();
        let mut game = Game::from_grid(grid, u64::from(u32::MAX), rng());

        assert!(game.apply_move(Direction::Left));
        assert_eq!(game.grid().get(0, 0), Some(MAX_TILE));
        assert_eq!(game.grid().get(3, 1), Some(MAX_TILE));
        assert_eq!(
            game.score(),
            u64::from(u32::MAX) + 8 * u64::from(MAX_TILE)
        );
        assert_eq!(game.highest_value(), MAX_TILE);

        // Top tiles cannot merge any further
        let top = Grid::from_rows([[MAX_TILE; GRID_SIZE]; GRID_SIZE]).unwrap();
        let mut game = Game::from_grid(top, 0, rng());
        assert!(game.is_terminal());
        assert!(game.valid_moves().is_empty());
        assert!(!game.apply_move(Direction::Up));
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn test_valid_moves() {
        let game = Game::from_grid(one_move_from_terminal(), 0, rng());
        assert_eq!(game.valid_moves(), vec![Direction::Right, Direction::Down]);
    }

    #[test]
    fn test_game_over_hook_fires_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut game = Game::from_grid(one_move_from_terminal(), 500, rng());
        let sink = Arc::clone(&seen);
        game.on_game_over(move |result| sink.lock().unwrap().push(*result));

        let events = game.play(Direction::Right).unwrap();
        let expected = GameResult {
            score: 500,
            highest_value: 32,
            moves: 1,
        };

        assert_eq!(game.phase(), GamePhase::Terminal);
        assert_eq!(events.last(), Some(&GameEvent::GameOver { result: expected }));
        assert_eq!(*seen.lock().unwrap(), vec![expected]);

        // Terminal is absorbing
        assert_eq!(game.play(Direction::Left), Err(GameError::GameOver));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_reset_keeps_hook() {
        let count = Arc::new(Mutex::new(0));
        let mut game = Game::from_grid(one_move_from_terminal(), 0, rng());
        let sink = Arc::clone(&count);
        game.on_game_over(move |_| *sink.lock().unwrap() += 1);

        game.play(Direction::Right).unwrap();
        game.reset();
        assert_eq!(game.phase(), GamePhase::Playing);
        assert_eq!(game.score(), 0);
        assert_eq!(game.moves(), 0);
        assert_eq!(game.grid().empty_cells().len(), 14);
        assert!(game.on_game_over.is_some());
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_score_never_decreases() {
        let mut game = Game::with_seed(99);
        let mut last = game.score();
        for step in 0..2_000 {
            if game.is_finished() {
                break;
            }
            let dir = Direction::ALL[step % 4];
            game.play(dir).unwrap();
            assert!(game.score() >= last);
            last = game.score();
        }
    }

    #[test]
    fn test_snapshot_serializes() {
        let game = Game::with_seed(3);
        let json = serde_json::to_string(&game.snapshot()).unwrap();
        let back: GameSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, game.snapshot());
        assert!(json.contains("\"phase\":\"Playing\""));
    }
}
