//! Per-connection game sessions.

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;
use twenty48_core::{Bot, BotDifficulty, Direction, Game, GameError, GameEvent, GameSnapshot};
use uuid::Uuid;

use crate::leaderboard::{Leaderboard, LeaderboardEntry};
use crate::protocol::ServerMessage;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Game(#[from] GameError),

    #[error("Game is still in progress")]
    NotFinished,

    #[error("Score already submitted")]
    AlreadySubmitted,
}

/// One player's game, owned by their connection.
pub struct Session {
    pub id: Uuid,
    game: Game,
    sender: mpsc::UnboundedSender<ServerMessage>,
    submitted: bool,
}

impl Session {
    pub fn new(id: Uuid, sender: mpsc::UnboundedSender<ServerMessage>, seed: Option<u64>) -> Self {
        let game = new_game(id, &sender, seed);
        Self {
            id,
            game,
            sender,
            submitted: false,
        }
    }

    /// Discard the current game and start a fresh one
    pub fn restart(&mut self, seed: Option<u64>) {
        self.game = new_game(self.id, &self.sender, seed);
        self.submitted = false;
    }

    /// Queue a message for this session's connection. A closed
    /// connection drops it.
    pub fn send(&self, msg: ServerMessage) {
        let _ = self.sender.send(msg);
    }

    pub fn play(&mut self, direction: &str) -> Result<Vec<GameEvent>, SessionError> {
        let direction: Direction = direction.parse()?;
        Ok(self.game.play(direction)?)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.game.snapshot()
    }

    pub fn state_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or(serde_json::Value::Null)
    }

    pub fn is_finished(&self) -> bool {
        self.game.is_finished()
    }

    pub fn hint(&self, difficulty: BotDifficulty) -> Option<Direction> {
        Bot::new(difficulty).choose_move(&self.game)
    }

    /// Record the finished game; allowed once per game
    pub fn submit(
        &mut self,
        leaderboard: &Leaderboard,
        name: Option<&str>,
    ) -> Result<LeaderboardEntry, SessionError> {
        let result = self.game.result().ok_or(SessionError::NotFinished)?;
        if self.submitted {
            return Err(SessionError::AlreadySubmitted);
        }

        let entry = leaderboard.record(name, &result);
        self.submitted = true;
        Ok(entry)
    }
}

/// Build a game whose game-over hook notifies the connection
fn new_game(id: Uuid, sender: &mpsc::UnboundedSender<ServerMessage>, seed: Option<u64>) -> Game {
    let mut game = match seed {
        Some(seed) => Game::with_seed(seed),
        None => Game::new(),
    };

    let sender = sender.clone();
    game.on_game_over(move |result| {
        info!(
            session = %id,
            score = result.score,
            highest_tile = result.highest_value,
            moves = result.moves,
            "Game over"
        );
        let _ = sender.send(ServerMessage::GameOver {
            score: result.score,
            highest_tile: result.highest_value,
        });
    });

    game
}
