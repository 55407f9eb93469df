use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::dice_mechanics::num_multisets;
use crate::error::{WidgetError, WidgetResult};

/// A canonical roll: die faces sorted ascending, compared as a multiset.
///
/// Every constructor sorts, so two `Roll`s are equal iff they hold the same
/// multiset of faces. A roll of length 0 means "nothing kept".
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<u8>", into = "Vec<u8>")]
pub struct Roll(Vec<u8>);

impl Roll {
    pub fn new(mut dice: Vec<u8>) -> Self {
        dice.sort_unstable();
        Roll(dice)
    }

    /// The empty roll `()`.
    pub fn empty() -> Self {
        Roll(Vec::new())
    }

    /// Wrap dice that are already in ascending order.
    pub(crate) fn from_sorted(dice: Vec<u8>) -> Self {
        debug_assert!(dice.windows(2).all(|w| w[0] <= w[1]));
        Roll(dice)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    /// `self ⊕ face`: append one die and keep the result sorted.
    pub fn with_die(&self, face: u8) -> Roll {
        let pos = self.0.partition_point(|&d| d <= face);
        let mut dice = Vec::with_capacity(self.0.len() + 1);
        dice.extend_from_slice(&self.0[..pos]);
        dice.push(face);
        dice.extend_from_slice(&self.0[pos..]);
        Roll(dice)
    }

    /// Multiset union of two rolls (sorted merge).
    pub fn merge(&self, other: &Roll) -> Roll {
        Roll(merge_sorted(&self.0, &other.0))
    }
}

/// Merge two ascending slices into one ascending vector.
pub(crate) fn merge_sorted(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] <= b[j] {
            out.push(a[i]);
            i += 1;
        } else {
            out.push(b[j]);
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

impl Deref for Roll {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Roll {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Roll {
    fn from(dice: Vec<u8>) -> Self {
        Roll::new(dice)
    }
}

impl From<&[u8]> for Roll {
    fn from(dice: &[u8]) -> Self {
        Roll::new(dice.to_vec())
    }
}

impl From<Roll> for Vec<u8> {
    fn from(roll: Roll) -> Self {
        roll.0
    }
}

impl fmt::Display for Roll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, ")")
    }
}

/// Immutable widget configuration, fixed for the lifetime of a solve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Dice in a full hand.
    pub num_dice: usize,
    /// Faces per die, numbered 1..=num_faces.
    pub num_faces: usize,
    /// Rolls per turn, including the final non-reroll evaluation.
    pub num_rolls: usize,
    /// Report every tied optimal keep instead of one representative.
    pub keep_all_optimal: bool,
    /// Resolve strategies with the lattice DP rather than brute force.
    pub use_dynamic_programming: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            num_dice: DEFAULT_NUM_DICE,
            num_faces: DEFAULT_NUM_FACES,
            num_rolls: DEFAULT_NUM_ROLLS,
            keep_all_optimal: false,
            use_dynamic_programming: true,
        }
    }
}

impl WidgetConfig {
    /// Check the preconditions every solver stage relies on.
    pub fn validate(&self) -> WidgetResult<()> {
        if self.num_faces == 0 {
            return Err(WidgetError::InvalidConfig(
                "num_faces must be at least 1".to_string(),
            ));
        }
        if self.num_faces > MAX_NUM_FACES {
            return Err(WidgetError::InvalidConfig(format!(
                "num_faces={} exceeds the maximum of {}",
                self.num_faces, MAX_NUM_FACES
            )));
        }
        if self.num_rolls == 0 {
            return Err(WidgetError::InvalidConfig(
                "num_rolls must be at least 1".to_string(),
            ));
        }
        match self.lattice_size() {
            Some(size) if size <= MAX_LATTICE_SIZE => Ok(()),
            _ => Err(WidgetError::InvalidConfig(format!(
                "{} dice with {} faces exceed the table limit of {} canonical rolls",
                self.num_dice, self.num_faces, MAX_LATTICE_SIZE
            ))),
        }
    }

    /// Total canonical rolls of every size 0..=num_dice, or `None` on overflow.
    pub fn lattice_size(&self) -> Option<usize> {
        let mut total = 0usize;
        for size in 0..=self.num_dice {
            let layer = num_multisets(self.num_faces, size)?;
            total = total.checked_add(usize::try_from(layer).ok()?)?;
        }
        Some(total)
    }
}
