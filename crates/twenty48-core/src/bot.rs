//! Move suggestions for hints and autoplay.
//!
//! This module provides different difficulty levels:
//! - Easy: Random valid moves
//! - Medium: Greedy on immediate score, preferring emptier boards
//! - Hard: Expected heuristic value over every possible tile spawn

use crate::direction::Direction;
use crate::game::{Game, SPAWN_FOUR_PROBABILITY};
use crate::grid::{slide, Grid, GRID_SIZE, MAX_TILE};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

const EMPTY_WEIGHT: f64 = 270.0;
const MERGE_WEIGHT: f64 = 700.0;
const MONOTONICITY_WEIGHT: f64 = 47.0;

/// Bot difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotDifficulty {
    Easy,
    Medium,
    Hard,
}

/// A bot that picks moves for a game
pub struct Bot {
    pub difficulty: BotDifficulty,
    rng: StdRng,
}

impl Bot {
    pub fn new(difficulty: BotDifficulty) -> Self {
        Self {
            difficulty,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(difficulty: BotDifficulty, seed: u64) -> Self {
        Self {
            difficulty,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Choose a move that changes the board, or `None` if there is none
    pub fn choose_move<R: Rng>(&mut self, game: &Game<R>) -> Option<Direction> {
        let grid = game.grid();
        let candidates: Vec<(Direction, Grid, u64)> = Direction::ALL
            .into_iter()
            .filter_map(|dir| simulate(grid, dir).map(|(next, gained)| (dir, next, gained)))
            .collect();

        if candidates.is_empty() {
            return None;
        }

        match self.difficulty {
            BotDifficulty::Easy => candidates.choose(&mut self.rng).map(|(dir, _, _)| *dir),
            BotDifficulty::Medium => best_by(&candidates, |next, gained| {
                gained as f64 * 1_000.0 + next.empty_cells().len() as f64
            }),
            BotDifficulty::Hard => {
                best_by(&candidates, |next, gained| gained as f64 + expected_value(next))
            }
        }
    }
}

/// First candidate with the strictly highest score
fn best_by<F>(candidates: &[(Direction, Grid, u64)], score: F) -> Option<Direction>
where
    F: Fn(&Grid, u64) -> f64,
{
    let mut best: Option<(Direction, f64)> = None;
    for (dir, next, gained) in candidates {
        let value = score(next, *gained);
        if best.map_or(true, |(_, b)| value > b) {
            best = Some((*dir, value));
        }
    }
    best.map(|(dir, _)| dir)
}

/// Grid and score gain after moving, or `None` if nothing moves
fn simulate(grid: &Grid, direction: Direction) -> Option<(Grid, u64)> {
    let mut next = *grid;
    let mut gained = 0u64;
    let mut changed = false;
    for index in 0..GRID_SIZE {
        let line = grid.line(direction, index);
        let (slid, score) = slide(line);
        if slid != line {
            changed = true;
            next.set_line(direction, index, slid);
        }
        gained += score;
    }
    changed.then_some((next, gained))
}

/// Average heuristic over every cell a tile could spawn in
fn expected_value(grid: &Grid) -> f64 {
    let empty = grid.empty_cells();
    if empty.is_empty() {
        return evaluate(grid);
    }

    let total: f64 = empty
        .iter()
        .map(|&(row, col)| {
            let mut two = *grid;
            two.set(row, col, 2);
            let mut four = *grid;
            four.set(row, col, 4);
            (1.0 - SPAWN_FOUR_PROBABILITY) * evaluate(&two)
                + SPAWN_FOUR_PROBABILITY * evaluate(&four)
        })
        .sum();

    total / empty.len() as f64
}

fn evaluate(grid: &Grid) -> f64 {
    let empty = grid.empty_cells().len() as f64;
    let mut merges = 0.0;
    let mut non_monotonic = 0.0;

    for dir in [Direction::Left, Direction::Up] {
        for index in 0..GRID_SIZE {
            let line = grid.line(dir, index);
            merges += line
                .windows(2)
                .filter(|pair| pair[0] != 0 && pair[0] < MAX_TILE && pair[0] == pair[1])
                .count() as f64;
            non_monotonic += monotonicity_penalty(&line);
        }
    }

    empty * EMPTY_WEIGHT + merges * MERGE_WEIGHT - non_monotonic * MONOTONICITY_WEIGHT
}

/// Smaller of the rising and falling penalties, on log2 tile ranks
fn monotonicity_penalty(line: &[u32]) -> f64 {
    let rank = |v: u32| if v == 0 { 0.0 } else { (v as f64).log2() };
    let mut rising = 0.0;
    let mut falling = 0.0;
    for pair in line.windows(2) {
        let (a, b) = (rank(pair[0]), rank(pair[1]));
        if a > b {
            rising += a.powi(4) - b.powi(4);
        } else {
            falling += b.powi(4) - a.powi(4);
        }
    }
    rising.min(falling)
}
