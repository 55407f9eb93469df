use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::time::Instant;

use log::{debug, info};

use crate::dice_mechanics::compute_probability_of_roll;
use crate::error::{WidgetError, WidgetResult};
use crate::phase0_tables::{precompute_lookup_tables, RollIndex};
use crate::types::{Roll, WidgetConfig};
use crate::validation::parse_roll_values;
use crate::widget_solver::compute_strategy_one_roll;

/// A solved widget: value and move tables for every roll of the turn.
///
/// Round indices follow the roll number: round 0 is the first decision and
/// round `num_rolls - 1` is the terminal evaluation (values only, no moves).
pub struct Widget {
    config: WidgetConfig,
    index: RollIndex,
    /// roll_values[round][rank]: optimal value holding full roll `rank` at `round`.
    roll_values: Vec<Vec<f64>>,
    /// optimal_moves[round][rank]: keep ids achieving roll_values[round][rank].
    optimal_moves: Vec<Vec<Vec<u32>>>,
}

impl Widget {
    /// Validate the terminal valuation and solve every round.
    pub fn new<I, R, V>(roll_values: I, config: WidgetConfig) -> WidgetResult<Self>
    where
        I: IntoIterator<Item = (R, V)>,
        R: AsRef<[u8]>,
        V: Borrow<f64>,
    {
        let index = precompute_lookup_tables(&config)?;
        let terminal = parse_roll_values(&index, roll_values)?;
        Ok(Self::solve(config, index, terminal))
    }

    /// Solve from a terminal table already indexed by full-roll rank.
    ///
    /// `terminal` must hold exactly one value per canonical full roll.
    pub fn from_terminal_values(config: WidgetConfig, terminal: Vec<f64>) -> WidgetResult<Self> {
        let index = precompute_lookup_tables(&config)?;
        let expected = index.layer_len(config.num_dice);
        if terminal.len() != expected {
            return Err(WidgetError::InvalidConfig(format!(
                "terminal table has {} entries, expected {}",
                terminal.len(),
                expected
            )));
        }
        Ok(Self::solve(config, index, terminal))
    }

    fn solve(config: WidgetConfig, index: RollIndex, terminal: Vec<f64>) -> Self {
        let (roll_values, optimal_moves) = compute_all_round_values(&index, terminal, &config);
        Widget {
            config,
            index,
            roll_values,
            optimal_moves,
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn index(&self) -> &RollIndex {
        &self.index
    }

    pub fn num_rolls(&self) -> usize {
        self.config.num_rolls
    }

    /// Validated terminal table, indexed by full-roll rank.
    pub fn terminal_values(&self) -> &[f64] {
        &self.roll_values[self.config.num_rolls - 1]
    }

    /// Move tables of every decision round, round 0 first.
    pub fn move_tables(&self) -> &[Vec<Vec<u32>>] {
        &self.optimal_moves
    }

    /// Round value table, indexed by full-roll rank.
    pub fn round_values(&self, round: usize) -> WidgetResult<&[f64]> {
        self.roll_values
            .get(round)
            .map(Vec::as_slice)
            .ok_or_else(|| self.invalid_round(round))
    }

    /// Optimal move table (keep ids), indexed by full-roll rank. Not available
    /// for the terminal round.
    pub fn round_moves(&self, round: usize) -> WidgetResult<&[Vec<u32>]> {
        self.optimal_moves
            .get(round)
            .map(Vec::as_slice)
            .ok_or_else(|| self.invalid_round(round))
    }

    /// Optimal value of holding `dice` (any order) at `round`.
    pub fn roll_value(&self, round: usize, dice: &[u8]) -> WidgetResult<f64> {
        let values = self.round_values(round)?;
        Ok(values[self.index.lookup_full(dice)?])
    }

    /// Keeps achieving the optimal value for `dice` (any order) at `round`.
    pub fn optimal_moves(&self, round: usize, dice: &[u8]) -> WidgetResult<Vec<Roll>> {
        let moves = self.round_moves(round)?;
        let rank = self.index.lookup_full(dice)?;
        Ok(moves[rank]
            .iter()
            .map(|&id| self.index.keep_roll(id as usize))
            .collect())
    }

    /// Round value table keyed by canonical roll.
    pub fn round_value_map(&self, round: usize) -> WidgetResult<BTreeMap<Roll, f64>> {
        let values = self.round_values(round)?;
        Ok(self.full_rolls().zip(values.iter().copied()).collect())
    }

    /// Optimal move table keyed by canonical roll.
    pub fn round_move_map(&self, round: usize) -> WidgetResult<BTreeMap<Roll, Vec<Roll>>> {
        let moves = self.round_moves(round)?;
        Ok(self
            .full_rolls()
            .zip(moves.iter())
            .map(|(roll, ids)| {
                let keeps = ids
                    .iter()
                    .map(|&id| self.index.keep_roll(id as usize))
                    .collect();
                (roll, keeps)
            })
            .collect())
    }

    /// Expected value before the first roll: sum_r P(r) * E(round 0, r).
    pub fn expected_value(&self) -> f64 {
        let num_dice = self.config.num_dice;
        let num_faces = self.config.num_faces;
        self.index
            .rolls(num_dice)
            .zip(&self.roll_values[0])
            .map(|(dice, value)| compute_probability_of_roll(dice, num_faces) * value)
            .sum()
    }

    fn full_rolls(&self) -> impl Iterator<Item = Roll> + '_ {
        self.index
            .rolls(self.config.num_dice)
            .map(Roll::from)
    }

    fn invalid_round(&self, round: usize) -> WidgetError {
        WidgetError::InvalidRound {
            round,
            num_rolls: self.config.num_rolls,
        }
    }
}

/// Backward induction over the rolls of one turn.
///
/// Starts from the terminal table (round `num_rolls - 1`) and solves each
/// earlier round from the one after it. Returns the value tables for every
/// round and the move tables for every decision round, both indexed by round.
pub fn compute_all_round_values(
    index: &RollIndex,
    terminal: Vec<f64>,
    config: &WidgetConfig,
) -> (Vec<Vec<f64>>, Vec<Vec<Vec<u32>>>) {
    let total_start = Instant::now();
    info!(
        "Solving widget: {} dice, {} faces, {} rolls ({} full rolls, {} keeps, {})",
        config.num_dice,
        config.num_faces,
        config.num_rolls,
        index.layer_len(config.num_dice),
        index.lattice_len(),
        if config.use_dynamic_programming {
            "lattice DP"
        } else {
            "brute force"
        }
    );

    let num_rolls = config.num_rolls;
    let mut roll_values: Vec<Vec<f64>> = vec![Vec::new(); num_rolls];
    let mut optimal_moves: Vec<Vec<Vec<u32>>> = vec![Vec::new(); num_rolls - 1];
    roll_values[num_rolls - 1] = terminal;

    for round in (0..num_rolls - 1).rev() {
        let round_start = Instant::now();
        let solution = compute_strategy_one_roll(index, &roll_values[round + 1], config);
        roll_values[round] = solution.roll_values;
        optimal_moves[round] = solution.optimal_moves;
        debug!(
            "Round {} solved in {:.3} ms",
            round,
            round_start.elapsed().as_secs_f64() * 1000.0
        );
    }

    info!(
        "Widget solved in {:.3} ms",
        total_start.elapsed().as_secs_f64() * 1000.0
    );
    (roll_values, optimal_moves)
}
