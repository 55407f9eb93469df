use std::iter::FusedIterator;

use crate::types::Roll;

/// Lazy enumeration of every canonical roll of `num_dice` dice, in ascending
/// lexicographic order.
///
/// Odometer successor: find the rightmost die below `num_faces`, increment it,
/// and reset every die to its right to the new value so the roll stays sorted.
#[derive(Clone, Debug)]
pub struct PossibleRolls {
    next_roll: Option<Vec<u8>>,
    num_faces: u8,
}

/// Every sorted roll of `num_dice` dice with faces 1..=num_faces.
///
/// Yields exactly C(num_faces + num_dice - 1, num_dice) rolls. `num_dice == 0`
/// yields the empty roll once. Restart by calling again.
pub fn iter_possible_rolls(num_dice: usize, num_faces: usize) -> PossibleRolls {
    debug_assert!(num_faces <= u8::MAX as usize);
    let next_roll = if num_faces == 0 && num_dice > 0 {
        None
    } else {
        Some(vec![1u8; num_dice])
    };
    PossibleRolls {
        next_roll,
        num_faces: num_faces as u8,
    }
}

impl Iterator for PossibleRolls {
    type Item = Roll;

    fn next(&mut self) -> Option<Roll> {
        let current = self.next_roll.take()?;
        let faces = self.num_faces;
        if let Some(idx) = current.iter().rposition(|&d| d != faces) {
            let mut successor = current.clone();
            let bumped = successor[idx] + 1;
            for d in &mut successor[idx..] {
                *d = bumped;
            }
            self.next_roll = Some(successor);
        }
        Some(Roll::from_sorted(current))
    }
}

impl FusedIterator for PossibleRolls {}

/// True iff `sub` is contained in `roll` as a multiset (per-face counts).
pub fn is_sub_roll(sub: &[u8], roll: &[u8]) -> bool {
    if sub.len() > roll.len() {
        return false;
    }
    let mut sub = sub.to_vec();
    let mut roll = roll.to_vec();
    sub.sort_unstable();
    roll.sort_unstable();

    let mut j = 0;
    for &d in &sub {
        while j < roll.len() && roll[j] < d {
            j += 1;
        }
        if j == roll.len() || roll[j] != d {
            return false;
        }
        j += 1;
    }
    true
}

/// Count occurrences of each face. `face_count[0]` is unused.
pub fn count_faces(dice: &[u8], num_faces: usize) -> Vec<u32> {
    let mut face_count = vec![0u32; num_faces + 1];
    for &d in dice {
        face_count[d as usize] += 1;
    }
    face_count
}

/// `num_faces` multichoose `num_dice`: number of sorted rolls, C(f + n - 1, n).
/// Returns `None` if the count does not fit in a `u64`.
pub fn num_multisets(num_faces: usize, num_dice: usize) -> Option<u64> {
    if num_faces == 0 {
        return Some(u64::from(num_dice == 0));
    }
    let mut result: u128 = 1;
    for i in 1..=num_dice as u128 {
        // C(f-1+i, i) = C(f-2+i, i-1) * (f-1+i) / i, exact at every step.
        result = result.checked_mul(num_faces as u128 - 1 + i)? / i;
        if result > u64::MAX as u128 {
            return None;
        }
    }
    Some(result as u64)
}

/// P(empty -> r): probability of rolling this exact canonical roll from
/// `roll.len()` fresh dice.
///
/// Formula: n! / (c_1! * ... * c_f!) / f^n, accumulated one die at a time.
pub fn compute_probability_of_roll(dice: &[u8], num_faces: usize) -> f64 {
    let face_count = count_faces(dice, num_faces);
    let faces = num_faces as f64;
    let mut remaining = dice.len();
    let mut probability = 1.0;
    for &c in &face_count[1..] {
        for k in 1..=c {
            probability *= remaining as f64 / (k as f64 * faces);
            remaining -= 1;
        }
    }
    probability
}
