//! In-memory leaderboard of finished games.

use dashmap::DashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use twenty48_core::GameResult;
use uuid::Uuid;

/// Prefix for players who submit without a name
const ANONYMOUS_PREFIX: &str = "Anonymous";

/// A recorded game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: Uuid,
    pub name: String,
    pub score: u64,
    pub highest_tile: u32,
    pub moves: u32,
    pub timestamp_ms: u64,
}

/// Entries keyed by ID, shared across connections.
#[derive(Default)]
pub struct Leaderboard {
    entries: DashMap<Uuid, LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Record a finished game. Blank names become `Anonymous` plus four digits.
    pub fn record(&self, name: Option<&str>, result: &GameResult) -> LeaderboardEntry {
        self.record_with_rng(name, result, &mut rand::thread_rng())
    }

    pub fn record_with_rng<R: Rng>(
        &self,
        name: Option<&str>,
        result: &GameResult,
        rng: &mut R,
    ) -> LeaderboardEntry {
        let name = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => format!("{}{}", ANONYMOUS_PREFIX, rng.gen_range(1000..=9999)),
        };

        let entry = LeaderboardEntry {
            id: Uuid::new_v4(),
            name,
            score: result.score,
            highest_tile: result.highest_value,
            moves: result.moves,
            timestamp_ms: now_ms(),
        };
        self.entries.insert(entry.id, entry.clone());
        entry
    }

    /// Best `limit` entries: highest tile first, then score, then the
    /// earliest submission. Entry IDs break any remaining tie.
    pub fn top(&self, limit: usize) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> =
            self.entries.iter().map(|e| e.value().clone()).collect();

        entries.sort_by(|a, b| {
            b.highest_tile
                .cmp(&a.highest_tile)
                .then(b.score.cmp(&a.score))
                .then(a.timestamp_ms.cmp(&b.timestamp_ms))
                .then(a.id.cmp(&b.id))
        });
        entries.truncate(limit);
        entries
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
