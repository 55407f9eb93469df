use thiserror::Error;

use crate::types::Roll;

/// Failures surfaced while validating input or answering queries.
///
/// The solver stages themselves never fail: once a terminal table has been
/// validated every downstream table is total by construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WidgetError {
    #[error("inconsistent values for roll {roll}: {first} and {second}")]
    InconsistentValue { roll: Roll, first: f64, second: f64 },

    #[error("roll missing in input roll values: {roll}")]
    MissingRoll { roll: Roll },

    #[error("invalid roll {dice:?}: {reason}")]
    InvalidRoll { dice: Vec<u8>, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("round {round} is not available in a widget with {num_rolls} rolls")]
    InvalidRound { round: usize, num_rolls: usize },
}

pub type WidgetResult<T> = Result<T, WidgetError>;
