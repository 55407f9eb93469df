//! Query helpers on a solved widget: advice for a concrete roll and the value
//! of a user-chosen keep.

use serde::Serialize;

use crate::dice_mechanics::is_sub_roll;
use crate::error::{WidgetError, WidgetResult};
use crate::state_computation::Widget;
use crate::types::Roll;
use crate::widget_solver::compute_values_given_kept;

/// One distinct keep for a roll and its expected value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KeepOption {
    pub kept: Roll,
    pub expected_value: f64,
}

/// Strategy advice for one roll at one decision round.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RollAdvice {
    pub round: usize,
    pub rerolls_remaining: usize,
    pub dice: Roll,
    /// Optimal value of holding `dice` at `round`.
    pub value: f64,
    /// Keeps achieving `value`, as listed in the move table.
    pub best_keeps: Vec<Roll>,
    /// Every distinct keep, best first (ties in keep-id order).
    pub keep_options: Vec<KeepOption>,
}

/// Conditional values (by keep id) for a decision round.
pub fn compute_values_given_kept_for_round(widget: &Widget, round: usize) -> WidgetResult<Vec<f64>> {
    // round_moves fails for the terminal round and beyond.
    widget.round_moves(round)?;
    let next = widget.round_values(round + 1)?;
    Ok(compute_values_given_kept(widget.index(), next))
}

/// Expected value of keeping `kept` out of `dice` at `round` and rerolling
/// the rest, then playing optimally.
pub fn evaluate_chosen_keep(
    widget: &Widget,
    round: usize,
    dice: &[u8],
    kept: &[u8],
) -> WidgetResult<f64> {
    let index = widget.index();
    let roll = index.check_dice(dice, Some(index.num_dice()))?;
    let kept_roll = index.check_dice(kept, None)?;
    if !is_sub_roll(&kept_roll, &roll) {
        return Err(WidgetError::InvalidRoll {
            dice: kept.to_vec(),
            reason: format!("not contained in roll {}", roll),
        });
    }
    let values_given_kept = compute_values_given_kept_for_round(widget, round)?;
    Ok(values_given_kept[index.keep_id(kept_roll.len(), index.rank(&kept_roll))])
}

/// Value, optimal keeps, and every keep's expected value for `dice` at `round`.
pub fn compute_roll_advice(widget: &Widget, round: usize, dice: &[u8]) -> WidgetResult<RollAdvice> {
    let index = widget.index();
    let roll = index.check_dice(dice, Some(index.num_dice()))?;
    let values_given_kept = compute_values_given_kept_for_round(widget, round)?;

    let mut options: Vec<(usize, f64)> = Vec::new();
    for size in 0..=roll.len() {
        for (rank, kept) in index.rolls(size).enumerate() {
            if is_sub_roll(kept, &roll) {
                let id = index.keep_id(size, rank);
                options.push((id, values_given_kept[id]));
            }
        }
    }
    options.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    Ok(RollAdvice {
        round,
        rerolls_remaining: widget.num_rolls() - 1 - round,
        value: widget.roll_value(round, &roll)?,
        best_keeps: widget.optimal_moves(round, &roll)?,
        dice: roll,
        keep_options: options
            .into_iter()
            .map(|(id, expected_value)| KeepOption {
                kept: index.keep_roll(id),
                expected_value,
            })
            .collect(),
    })
}

/// Render advice the way API consumers receive it.
pub fn roll_advice_to_json(advice: &RollAdvice) -> serde_json::Value {
    let keep_options: Vec<serde_json::Value> = advice
        .keep_options
        .iter()
        .map(|opt| {
            serde_json::json!({
                "kept": opt.kept,
                "expected_value": opt.expected_value,
            })
        })
        .collect();

    serde_json::json!({
        "round": advice.round,
        "rerolls_remaining": advice.rerolls_remaining,
        "dice": advice.dice,
        "value": advice.value,
        "best_keeps": advice.best_keeps,
        "keep_options": keep_options,
    })
}
