//! Widget defaults and table-size limits.
//!
//! The defaults describe the classic Yatzy widget: 5 six-sided dice, one
//! initial roll plus two rerolls (three rolls total).

/// Default number of dice in the hand.
pub const DEFAULT_NUM_DICE: usize = 5;

/// Default number of faces per die.
pub const DEFAULT_NUM_FACES: usize = 6;

/// Default number of rolls, counting the final non-reroll evaluation.
pub const DEFAULT_NUM_ROLLS: usize = 3;

/// Faces are stored as `u8`, so a die has at most 255 faces.
pub const MAX_NUM_FACES: usize = u8::MAX as usize;

/// Upper bound on canonical rolls of all sizes 0..=num_dice (the keep lattice).
/// For the default widget this is 1+6+21+56+126+252 = 462.
pub const MAX_LATTICE_SIZE: usize = 1 << 24;

/// Number of canonical 5-dice rolls over six faces: C(10,5) = 252.
pub const NUM_DICE_SETS_DEFAULT: usize = 252;

/// Number of keep-multisets of 0-5 dice over six faces.
pub const NUM_KEEP_MULTISETS_DEFAULT: usize = 462;
