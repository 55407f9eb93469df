//! One reroll round of the widget: conditional values and strategy resolution.
//!
//! For a round with a known "next round" value table over full rolls:
//!   1. [`compute_values_given_kept`]: E(keep K) for every keep-multiset K,
//!      expanding the rerolled dice one at a time down the lattice
//!   2. [`compute_from_cond_dp`] or [`compute_from_cond`]: for every full roll r,
//!      max over sub-multisets K of r of E(keep K), plus the maximizing keeps
//!
//! Tables are dense: conditional values are indexed by keep id, round values
//! and moves by full-roll rank (see [`crate::phase0_tables`]).

use rayon::prelude::*;

use crate::phase0_tables::RollIndex;
use crate::types::{merge_sorted, WidgetConfig};

/// Result of resolving one round: per full roll, the optimal value and the
/// keep ids achieving it (ascending, deduplicated).
#[derive(Clone, Debug, PartialEq)]
pub struct RoundSolution {
    pub roll_values: Vec<f64>,
    pub optimal_moves: Vec<Vec<u32>>,
}

/// E(keep K) for every keep K, indexed by keep id.
///
/// Full rolls take their value straight from `next_roll_values`. A smaller keep
/// averages over one more die:
///   E(K) = (1/f) * sum_{face=1..f} E(sorted(K ⊕ face))
/// Rerolling m dice at once equals rerolling them one at a time: the draws are
/// i.i.d. and the final value only depends on the resulting multiset, so the
/// one-die recursion gives the exact joint expectation.
pub fn compute_values_given_kept(index: &RollIndex, next_roll_values: &[f64]) -> Vec<f64> {
    let num_dice = index.num_dice();
    let faces = index.num_faces() as f64;
    debug_assert_eq!(next_roll_values.len(), index.layer_len(num_dice));

    let mut layers: Vec<Vec<f64>> = vec![Vec::new(); num_dice + 1];
    layers[num_dice] = next_roll_values.to_vec();

    for size in (0..num_dice).rev() {
        let above = &layers[size + 1];
        let layer: Vec<f64> = (0..index.layer_len(size))
            .into_par_iter()
            .map(|rank| {
                index
                    .successors(size, rank)
                    .iter()
                    .map(|&succ| above[succ as usize])
                    .sum::<f64>()
                    / faces
            })
            .collect();
        layers[size] = layer;
    }

    layers.concat()
}

/// Select the resolver named by the configuration.
pub fn compute_from_conditional_values(
    index: &RollIndex,
    values_given_kept: &[f64],
    config: &WidgetConfig,
) -> RoundSolution {
    if config.use_dynamic_programming {
        compute_from_cond_dp(index, values_given_kept, config.keep_all_optimal)
    } else {
        compute_from_cond(index, values_given_kept, config.keep_all_optimal)
    }
}

/// Solve one round from the next round's value table.
pub fn compute_strategy_one_roll(
    index: &RollIndex,
    next_roll_values: &[f64],
    config: &WidgetConfig,
) -> RoundSolution {
    let values_given_kept = compute_values_given_kept(index, next_roll_values);
    compute_from_conditional_values(index, &values_given_kept, config)
}

/// Lattice DP resolver.
///
/// Layers are processed by increasing size. A roll starts from "keep exactly
/// this" and relaxes against each immediate predecessor's finished maximum;
/// every smaller sub-multiset is covered transitively through some predecessor.
/// Predecessors are visited in ascending rank, the order in which a push-style
/// sweep over the previous layer would reach this roll, so tie-breaking does not
/// depend on the rayon schedule.
pub fn compute_from_cond_dp(
    index: &RollIndex,
    values_given_kept: &[f64],
    keep_all_optimal: bool,
) -> RoundSolution {
    let mut prev_values = vec![values_given_kept[0]];
    let mut prev_moves: Vec<Vec<u32>> = vec![vec![0]];

    for size in 1..=index.num_dice() {
        let offset = index.keep_id(size, 0);
        let prev_values_ref = &prev_values;
        let prev_moves_ref = &prev_moves;
        let (values, moves): (Vec<f64>, Vec<Vec<u32>>) = (0..index.layer_len(size))
            .into_par_iter()
            .map(|rank| {
                let mut best_val = values_given_kept[offset + rank];
                let mut best_moves = vec![(offset + rank) as u32];
                for &prev in index.predecessors(size, rank) {
                    let value = prev_values_ref[prev as usize];
                    if value > best_val {
                        best_val = value;
                        best_moves = prev_moves_ref[prev as usize].clone();
                    } else if keep_all_optimal && value == best_val {
                        best_moves = union_sorted(&best_moves, &prev_moves_ref[prev as usize]);
                    }
                }
                (best_val, best_moves)
            })
            .unzip();
        prev_values = values;
        prev_moves = moves;
    }

    RoundSolution {
        roll_values: prev_values,
        optimal_moves: prev_moves,
    }
}

/// Brute-force resolver: every (keep, extension) pair.
///
/// For each keep size from num_dice-1 down to 0, each keep K and each
/// extension X of the remaining dice, K is a candidate for sorted(K ⊕ X).
/// Combinatorial in the number of pairs; kept as a cross-check of the DP.
pub fn compute_from_cond(
    index: &RollIndex,
    values_given_kept: &[f64],
    keep_all_optimal: bool,
) -> RoundSolution {
    let num_dice = index.num_dice();
    let full_offset = index.keep_id(num_dice, 0);
    let num_rolls = index.layer_len(num_dice);

    let mut roll_values = values_given_kept[full_offset..full_offset + num_rolls].to_vec();
    let mut optimal_moves: Vec<Vec<u32>> = (0..num_rolls)
        .map(|rank| vec![(full_offset + rank) as u32])
        .collect();

    for num_kept in (0..num_dice).rev() {
        for kept_rank in 0..index.layer_len(num_kept) {
            let kept = index.roll(num_kept, kept_rank);
            let kept_id = index.keep_id(num_kept, kept_rank) as u32;
            let value = values_given_kept[kept_id as usize];
            for other in index.rolls(num_dice - num_kept) {
                let rank = index.rank(&merge_sorted(kept, other));
                if value > roll_values[rank] {
                    roll_values[rank] = value;
                    optimal_moves[rank] = vec![kept_id];
                } else if keep_all_optimal && value == roll_values[rank] {
                    optimal_moves[rank].push(kept_id);
                }
            }
        }
    }

    for moves in &mut optimal_moves {
        moves.sort_unstable();
        moves.dedup();
    }

    RoundSolution {
        roll_values,
        optimal_moves,
    }
}

/// Union of two ascending id lists.
fn union_sorted(a: &[u32], b: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] < b[j] {
            out.push(a[i]);
            i += 1;
        } else if b[j] < a[i] {
            out.push(b[j]);
            j += 1;
        } else {
            out.push(a[i]);
            i += 1;
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::dice_mechanics::is_sub_roll;
    use crate::phase0_tables::precompute_lookup_tables;

    fn make_index(num_dice: usize, num_faces: usize) -> RollIndex {
        let config = WidgetConfig {
            num_dice,
            num_faces,
            ..Default::default()
        };
        precompute_lookup_tables(&config).unwrap()
    }

    fn random_table(len: usize, seed: u64, integer: bool) -> Vec<f64> {
        let mut rng = SmallRng::seed_from_u64(seed);
        (0..len)
            .map(|_| {
                if integer {
                    rng.random_range(0..4) as f64
                } else {
                    rng.random_range(0.0..50.0)
                }
            })
            .collect()
    }

    #[test]
    fn test_values_given_kept_single_die() {
        let index = make_index(1, 2);
        let cond = compute_values_given_kept(&index, &[0.0, 10.0]);
        assert_eq!(cond, vec![5.0, 0.0, 10.0]);
    }

    #[test]
    fn test_values_given_kept_matches_multinomial() {
        // E(keep nothing) must equal sum_r P(r) * value(r).
        let index = make_index(3, 4);
        let next = random_table(index.layer_len(3), 7, false);
        let cond = compute_values_given_kept(&index, &next);
        let direct: f64 = (0..index.layer_len(3))
            .map(|rank| {
                let p = crate::dice_mechanics::compute_probability_of_roll(index.roll(3, rank), 4);
                p * next[rank]
            })
            .sum();
        assert!((cond[0] - direct).abs() < 1e-9);
        assert_eq!(cond.len(), index.lattice_len());
    }

    #[test]
    fn test_values_given_kept_zero_dice() {
        let index = make_index(0, 6);
        let cond = compute_values_given_kept(&index, &[3.5]);
        assert_eq!(cond, vec![3.5]);
        let solution = compute_from_cond_dp(&index, &cond, true);
        assert_eq!(solution.roll_values, vec![3.5]);
        assert_eq!(solution.optimal_moves, vec![vec![0]]);
    }

    #[test]
    fn test_single_die_scenario() {
        let index = make_index(1, 2);
        let cond = compute_values_given_kept(&index, &[0.0, 10.0]);
        for solution in [
            compute_from_cond_dp(&index, &cond, false),
            compute_from_cond(&index, &cond, false),
        ] {
            assert_eq!(solution.roll_values, vec![5.0, 10.0]);
            // (1) -> reroll (keep id 0), (2) -> keep (keep id 2)
            assert_eq!(solution.optimal_moves, vec![vec![0], vec![2]]);
        }
    }

    #[test]
    fn test_dp_matches_brute_force_values() {
        for (n, f, seed) in [(5, 6, 1), (3, 4, 2), (4, 3, 3), (2, 8, 4), (1, 1, 5)] {
            let index = make_index(n, f);
            let cond = random_table(index.lattice_len(), seed, false);
            let dp = compute_from_cond_dp(&index, &cond, false);
            let bf = compute_from_cond(&index, &cond, false);
            assert_eq!(dp.roll_values, bf.roll_values, "n={n} f={f}");
        }
    }

    #[test]
    fn test_dp_matches_brute_force_all_ties() {
        for (n, f, seed) in [(5, 6, 11), (4, 4, 12), (3, 2, 13)] {
            let index = make_index(n, f);
            let cond = random_table(index.lattice_len(), seed, true);
            let dp = compute_from_cond_dp(&index, &cond, true);
            let bf = compute_from_cond(&index, &cond, true);
            assert_eq!(dp, bf, "n={n} f={f}");
        }
    }

    #[test]
    fn test_moves_are_maximizing_sub_rolls() {
        let index = make_index(4, 4);
        let cond = random_table(index.lattice_len(), 21, true);
        let all = compute_from_cond_dp(&index, &cond, true);
        let one = compute_from_cond_dp(&index, &cond, false);

        for rank in 0..index.layer_len(4) {
            let roll = index.roll(4, rank);
            let best = all.roll_values[rank];
            // The maximum really is the max over every sub-multiset.
            let brute_max = (0..index.lattice_len())
                .filter(|&id| is_sub_roll(&index.keep_roll(id), roll))
                .map(|id| cond[id])
                .fold(f64::NEG_INFINITY, f64::max);
            assert_eq!(best, brute_max);

            for &id in &all.optimal_moves[rank] {
                assert!(is_sub_roll(&index.keep_roll(id as usize), roll));
                assert_eq!(cond[id as usize], best);
            }
            let expected_count = (0..index.lattice_len())
                .filter(|&id| is_sub_roll(&index.keep_roll(id), roll) && cond[id] == best)
                .count();
            assert_eq!(all.optimal_moves[rank].len(), expected_count);

            assert_eq!(one.optimal_moves[rank].len(), 1);
            assert!(all.optimal_moves[rank].contains(&one.optimal_moves[rank][0]));
        }
    }

    #[test]
    fn test_round_value_at_least_keep_all() {
        let index = make_index(5, 6);
        let cond = random_table(index.lattice_len(), 31, false);
        let solution = compute_from_cond_dp(&index, &cond, false);
        for rank in 0..index.layer_len(5) {
            assert!(solution.roll_values[rank] >= cond[index.keep_id(5, rank)]);
        }
    }

    #[test]
    fn test_dispatch_by_config() {
        let index = make_index(3, 3);
        let next = random_table(index.layer_len(3), 41, false);
        let dp_config = WidgetConfig {
            num_dice: 3,
            num_faces: 3,
            ..Default::default()
        };
        let bf_config = WidgetConfig {
            use_dynamic_programming: false,
            ..dp_config
        };
        let dp = compute_strategy_one_roll(&index, &next, &dp_config);
        let bf = compute_strategy_one_roll(&index, &next, &bf_config);
        assert_eq!(dp.roll_values, bf.roll_values);
    }

    #[test]
    fn test_union_sorted() {
        assert_eq!(union_sorted(&[1, 3, 5], &[2, 3, 6]), vec![1, 2, 3, 5, 6]);
        assert_eq!(union_sorted(&[], &[4]), vec![4]);
        assert_eq!(union_sorted(&[4], &[4]), vec![4]);
    }
}
