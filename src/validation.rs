//! Terminal roll-value validation.
//!
//! Callers (a scoring engine, a test fixture) hand over one value per final
//! roll, in any dice order. Keys are canonicalized here; the result is a dense
//! table indexed by full-roll rank that every later stage can trust to be total.

use std::borrow::Borrow;

use crate::dice_mechanics::iter_possible_rolls;
use crate::error::{WidgetError, WidgetResult};
use crate::phase0_tables::RollIndex;

/// Canonicalize and check a terminal valuation.
///
/// Fails with `InconsistentValue` if two keys sort to the same roll with
/// different values (exact comparison, so a repeated NaN also conflicts),
/// with `InvalidRoll` for keys of the wrong length or with out-of-range faces,
/// and with `MissingRoll` for the first canonical roll (in enumeration order)
/// that was never supplied.
pub fn parse_roll_values<I, R, V>(index: &RollIndex, roll_values: I) -> WidgetResult<Vec<f64>>
where
    I: IntoIterator<Item = (R, V)>,
    R: AsRef<[u8]>,
    V: Borrow<f64>,
{
    let num_dice = index.num_dice();
    let mut parsed: Vec<Option<f64>> = vec![None; index.layer_len(num_dice)];

    for (dice, value) in roll_values {
        let value = *value.borrow();
        let roll = index.check_dice(dice.as_ref(), Some(num_dice))?;
        let slot = &mut parsed[index.rank(&roll)];
        match *slot {
            Some(existing) if existing != value => {
                return Err(WidgetError::InconsistentValue {
                    roll,
                    first: existing,
                    second: value,
                });
            }
            _ => *slot = Some(value),
        }
    }

    parsed
        .into_iter()
        .zip(iter_possible_rolls(num_dice, index.num_faces()))
        .map(|(value, roll)| value.ok_or(WidgetError::MissingRoll { roll }))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::phase0_tables::precompute_lookup_tables;
    use crate::types::{Roll, WidgetConfig};

    fn make_index(num_dice: usize, num_faces: usize) -> RollIndex {
        let config = WidgetConfig {
            num_dice,
            num_faces,
            ..Default::default()
        };
        precompute_lookup_tables(&config).unwrap()
    }

    fn sum_values(num_dice: usize, num_faces: usize) -> Vec<(Vec<u8>, f64)> {
        iter_possible_rolls(num_dice, num_faces)
            .map(|r| {
                let total: u32 = r.iter().map(|&d| d as u32).sum();
                // Store keys reversed to exercise canonicalization.
                let mut dice = r.into_vec();
                dice.reverse();
                (dice, total as f64)
            })
            .collect()
    }

    #[test]
    fn test_parse_total_table() {
        let index = make_index(3, 4);
        let values = parse_roll_values(&index, sum_values(3, 4)).unwrap();
        assert_eq!(values.len(), 20);
        assert_eq!(values[index.rank(&[1, 1, 1])], 3.0);
        assert_eq!(values[index.rank(&[2, 3, 4])], 9.0);
        assert_eq!(values[index.rank(&[4, 4, 4])], 12.0);
    }

    #[test]
    fn test_parse_from_hash_map_ref() {
        let index = make_index(2, 3);
        let map: HashMap<Vec<u8>, f64> = sum_values(2, 3).into_iter().collect();
        let values = parse_roll_values(&index, &map).unwrap();
        assert_eq!(values, vec![2.0, 3.0, 4.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_consistent_duplicate_allowed() {
        let index = make_index(2, 2);
        let input = vec![
            (vec![1, 1], 1.0),
            (vec![1, 2], 5.0),
            (vec![2, 1], 5.0),
            (vec![2, 2], 7.0),
        ];
        let values = parse_roll_values(&index, input).unwrap();
        assert_eq!(values, vec![1.0, 5.0, 7.0]);
    }

    #[test]
    fn test_inconsistent_duplicate() {
        let index = make_index(2, 2);
        let input = vec![
            (vec![1, 1], 1.0),
            (vec![1, 2], 5.0),
            (vec![2, 1], 6.0),
            (vec![2, 2], 7.0),
        ];
        let err = parse_roll_values(&index, input).unwrap_err();
        assert_eq!(
            err,
            WidgetError::InconsistentValue {
                roll: Roll::new(vec![1, 2]),
                first: 5.0,
                second: 6.0,
            }
        );
        assert_eq!(
            err.to_string(),
            "inconsistent values for roll (1, 2): 5 and 6"
        );
    }

    #[test]
    fn test_missing_roll() {
        let index = make_index(2, 2);
        let input = vec![(vec![1, 1], 1.0), (vec![2, 2], 7.0)];
        let err = parse_roll_values(&index, input).unwrap_err();
        assert_eq!(
            err,
            WidgetError::MissingRoll {
                roll: Roll::new(vec![1, 2])
            }
        );
    }

    #[test]
    fn test_invalid_keys() {
        let index = make_index(2, 2);
        let short = vec![(vec![1u8], 1.0)];
        assert!(matches!(
            parse_roll_values(&index, short),
            Err(WidgetError::InvalidRoll { .. })
        ));
        let out_of_range = vec![(vec![1u8, 3], 1.0)];
        assert!(matches!(
            parse_roll_values(&index, out_of_range),
            Err(WidgetError::InvalidRoll { .. })
        ));
    }

    #[test]
    fn test_zero_dice() {
        let index = make_index(0, 6);
        let values = parse_roll_values(&index, vec![(Vec::<u8>::new(), 4.5)]).unwrap();
        assert_eq!(values, vec![4.5]);
        let empty: Vec<(Vec<u8>, f64)> = Vec::new();
        assert!(matches!(
            parse_roll_values(&index, empty),
            Err(WidgetError::MissingRoll { .. })
        ));
    }
}
