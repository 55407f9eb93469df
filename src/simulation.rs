//! Monte Carlo play of a solved widget.
//!
//! Each game rolls all dice, follows the first listed optimal keep at every
//! decision round, rerolls the rest, and scores the final roll from the
//! terminal table. The mean over many games converges to
//! [`Widget::expected_value`].

use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::state_computation::Widget;

/// Results of a batch simulation.
#[derive(Clone, Debug)]
pub struct SimulationResult {
    pub num_games: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub elapsed: Duration,
}

/// Roll `count` fresh dice, unsorted.
#[inline]
fn roll_dice(count: usize, num_faces: usize, rng: &mut SmallRng) -> Vec<u8> {
    (0..count)
        .map(|_| rng.random_range(1..=num_faces) as u8)
        .collect()
}

/// Play one game with the optimal strategy; returns the terminal value reached.
pub fn simulate_game(widget: &Widget, rng: &mut SmallRng) -> f64 {
    let index = widget.index();
    let num_dice = index.num_dice();
    let num_faces = index.num_faces();

    let mut dice = roll_dice(num_dice, num_faces, rng);
    dice.sort_unstable();

    for moves in widget.move_tables() {
        let rank = index.rank(&dice);
        let keep_id = moves[rank][0] as usize;
        let mut next = index.keep_roll(keep_id).into_vec();
        let rerolled = num_dice - next.len();
        next.extend(roll_dice(rerolled, num_faces, rng));
        next.sort_unstable();
        dice = next;
    }

    widget.terminal_values()[index.rank(&dice)]
}

/// Simulate `num_games` games in parallel. Game `i` uses seed `seed + i`, so
/// results do not depend on the thread count.
pub fn simulate_games(widget: &Widget, num_games: usize, seed: u64) -> SimulationResult {
    let start = Instant::now();

    let values: Vec<f64> = (0..num_games)
        .into_par_iter()
        .map(|i| {
            let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(i as u64));
            simulate_game(widget, &mut rng)
        })
        .collect();

    let elapsed = start.elapsed();

    let n = num_games.max(1) as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|&v| (v - mean).powi(2)).sum::<f64>() / n;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    SimulationResult {
        num_games,
        mean,
        std_dev: variance.sqrt(),
        min: if num_games == 0 { 0.0 } else { min },
        max: if num_games == 0 { 0.0 } else { max },
        elapsed,
    }
}
