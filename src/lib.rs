//! # Widget — optimal keep/reroll strategy for Yatzy-style dice
//!
//! A turn of a Yatzy-style game is a small sub-game (the *widget*): roll all
//! dice, choose a subset to keep, reroll the rest, repeat, and finally score the
//! dice. Given a value for every possible final roll, this crate computes the
//! optimal expected value and the optimal keep for every roll at every round
//! using **backward induction**.
//!
//! ## Pipeline
//!
//! | Step | Module | Description |
//! |------|--------|-------------|
//! | 0 | [`phase0_tables`] | Rank every canonical roll of 0..=n dice; build lattice edges |
//! | 1 | [`validation`] | Canonicalize the terminal valuation and check it is total |
//! | 2 | [`widget_solver`] | Per round: conditional keep values, then strategy resolution |
//! | 3 | [`state_computation`] | Drive step 2 from the terminal round back to the first roll |
//!
//! Strategy resolution comes in two interchangeable variants that agree exactly
//! on values: a lattice DP (linear in the number of keep-multisets) and a
//! brute-force (keep, extension) search used as a cross-check.
//!
//! ## Representation
//!
//! Rolls are multisets, canonicalized by sorting ([`types::Roll`]). Tables are
//! dense vectors indexed by a combinatorial rank of the sorted roll rather than
//! maps keyed by rolls; for 5 six-sided dice there are 252 full rolls and 462
//! keep-multisets of 0-5 dice.

#![allow(clippy::needless_range_loop)]

pub mod api_computations;
pub mod constants;
pub mod dice_mechanics;
pub mod env_config;
pub mod error;
pub mod phase0_tables;
pub mod simulation;
pub mod state_computation;
pub mod types;
pub mod validation;
pub mod widget_solver;
