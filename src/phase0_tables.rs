//! Phase 0: precompute the keep lattice for a widget configuration.
//!
//! Every canonical roll of every size 0..=num_dice gets a dense rank within its
//! size layer and a global keep id across layers. The tables built here let
//! the solver touch rolls by index only:
//!
//! 1. **Layers**: the canonical rolls of each size, in enumeration (lexicographic) order
//! 2. **Ranks**: combinatorial number system over multisets, `rank(roll)` in O(n*f)
//! 3. **Successors**: `sorted(roll ⊕ face)` for each roll and face (lattice edges)
//! 4. **Predecessors**: CSR list of the rolls one die smaller, ascending by rank
//!
//! For the default widget (5 dice, 6 faces) the lattice has 462 nodes.

use std::time::Instant;

use log::debug;

use crate::dice_mechanics::iter_possible_rolls;
use crate::error::{WidgetError, WidgetResult};
use crate::types::{Roll, WidgetConfig};

/// Canonical rolls of one size with their lattice edges.
pub struct RollLayer {
    /// Number of canonical rolls in this layer.
    len: usize,
    /// Flattened rolls, `size` faces each, in rank order.
    dice: Vec<u8>,
    /// successors[rank * num_faces + face - 1] = rank of sorted(roll ⊕ face) one layer up.
    /// Empty for the top layer.
    successors: Vec<u32>,
    /// Row boundaries: pred_start[rank]..pred_start[rank+1] indexes pred_ranks.
    pred_start: Vec<u32>,
    /// Ranks (one layer down) of the rolls obtained by removing one die.
    pred_ranks: Vec<u32>,
}

/// Dense indexing of the keep lattice for one (num_dice, num_faces) pair.
pub struct RollIndex {
    num_dice: usize,
    num_faces: usize,
    layers: Vec<RollLayer>,
    /// layer_offset[s] = keep id of the first roll of size s; last entry = lattice size.
    layer_offset: Vec<usize>,
    /// multisets[k][m] = number of sorted m-dice rolls over k faces.
    multisets: Vec<Vec<usize>>,
}

/// Validate `config` and build its keep lattice.
pub fn precompute_lookup_tables(config: &WidgetConfig) -> WidgetResult<RollIndex> {
    config.validate()?;
    let start = Instant::now();
    let index = RollIndex::build(config.num_dice, config.num_faces);
    debug!(
        "Keep lattice: {} dice x {} faces, {} nodes ({} full rolls) in {:.3} ms",
        config.num_dice,
        config.num_faces,
        index.lattice_len(),
        index.layer_len(config.num_dice),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(index)
}

impl RollIndex {
    /// Build without validation; callers go through [`precompute_lookup_tables`].
    fn build(num_dice: usize, num_faces: usize) -> Self {
        let multisets = build_multiset_table(num_dice, num_faces);

        let mut layers: Vec<RollLayer> = (0..=num_dice)
            .map(|size| {
                let mut dice = Vec::new();
                let mut len = 0;
                for roll in iter_possible_rolls(size, num_faces) {
                    dice.extend_from_slice(&roll);
                    len += 1;
                }
                RollLayer {
                    len,
                    dice,
                    successors: Vec::new(),
                    pred_start: vec![0; len + 1],
                    pred_ranks: Vec::new(),
                }
            })
            .collect();

        let mut index = RollIndex {
            num_dice,
            num_faces,
            layers: Vec::new(),
            layer_offset: Vec::new(),
            multisets,
        };

        // Successors: rank every roll ⊕ face in the layer above.
        for size in 0..num_dice {
            let layer = &layers[size];
            let mut successors = Vec::with_capacity(layer.len * num_faces);
            for rank in 0..layer.len {
                let roll = Roll::from_sorted(layer.dice[rank * size..(rank + 1) * size].to_vec());
                for face in 1..=num_faces as u8 {
                    successors.push(index.rank(&roll.with_die(face)) as u32);
                }
            }
            layers[size].successors = successors;
        }

        // Predecessors: invert the successor edges. Each predecessor reaches a given
        // roll through exactly one face, and visiting predecessors in rank order keeps
        // every row ascending.
        for size in 1..=num_dice {
            let (lower, upper) = layers.split_at_mut(size);
            let prev = &lower[size - 1];
            let layer = &mut upper[0];

            let mut counts = vec![0u32; layer.len];
            for &succ in &prev.successors {
                counts[succ as usize] += 1;
            }
            let mut start = 0u32;
            for rank in 0..layer.len {
                layer.pred_start[rank] = start;
                start += counts[rank];
            }
            layer.pred_start[layer.len] = start;

            let mut fill = layer.pred_start.clone();
            layer.pred_ranks = vec![0; start as usize];
            for prev_rank in 0..prev.len {
                for &succ in &prev.successors[prev_rank * num_faces..(prev_rank + 1) * num_faces] {
                    let slot = &mut fill[succ as usize];
                    layer.pred_ranks[*slot as usize] = prev_rank as u32;
                    *slot += 1;
                }
            }
        }

        let mut layer_offset = Vec::with_capacity(num_dice + 2);
        let mut offset = 0;
        for layer in &layers {
            layer_offset.push(offset);
            offset += layer.len;
        }
        layer_offset.push(offset);

        index.layers = layers;
        index.layer_offset = layer_offset;
        index
    }

    pub fn num_dice(&self) -> usize {
        self.num_dice
    }

    pub fn num_faces(&self) -> usize {
        self.num_faces
    }

    /// Number of canonical rolls with `size` dice.
    #[inline]
    pub fn layer_len(&self, size: usize) -> usize {
        self.layers[size].len
    }

    /// Number of canonical rolls of every size (lattice nodes).
    #[inline]
    pub fn lattice_len(&self) -> usize {
        self.layer_offset[self.num_dice + 1]
    }

    /// Faces of the roll with the given size and rank.
    #[inline]
    pub fn roll(&self, size: usize, rank: usize) -> &[u8] {
        &self.layers[size].dice[rank * size..(rank + 1) * size]
    }

    /// Rolls of one size, in rank order.
    pub fn rolls(&self, size: usize) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.layer_len(size)).map(move |rank| self.roll(size, rank))
    }

    /// Lexicographic rank of a sorted roll among rolls of its size.
    ///
    /// The roll must be canonical with faces in 1..=num_faces.
    pub fn rank(&self, dice: &[u8]) -> usize {
        let n = dice.len();
        let f = self.num_faces;
        let mut rank = 0;
        let mut lo = 1;
        for (i, &a) in dice.iter().enumerate() {
            let tail = n - i - 1;
            for v in lo..a as usize {
                rank += self.multisets[f - v + 1][tail];
            }
            lo = a as usize;
        }
        rank
    }

    /// Rank of sorted(roll ⊕ face) in layer `size + 1`.
    #[inline]
    pub fn successor(&self, size: usize, rank: usize, face: u8) -> usize {
        self.layers[size].successors[rank * self.num_faces + face as usize - 1] as usize
    }

    /// Successor ranks for every face, in face order.
    #[inline]
    pub fn successors(&self, size: usize, rank: usize) -> &[u32] {
        let f = self.num_faces;
        &self.layers[size].successors[rank * f..(rank + 1) * f]
    }

    /// Ranks (in layer `size - 1`) of the rolls one die smaller, ascending.
    #[inline]
    pub fn predecessors(&self, size: usize, rank: usize) -> &[u32] {
        let layer = &self.layers[size];
        let start = layer.pred_start[rank] as usize;
        let end = layer.pred_start[rank + 1] as usize;
        &layer.pred_ranks[start..end]
    }

    /// Global keep id of a roll of the given size and rank.
    #[inline]
    pub fn keep_id(&self, size: usize, rank: usize) -> usize {
        self.layer_offset[size] + rank
    }

    /// Inverse of [`RollIndex::keep_id`].
    pub fn keep_size_rank(&self, keep_id: usize) -> (usize, usize) {
        let size = self.layer_offset.partition_point(|&off| off <= keep_id) - 1;
        (size, keep_id - self.layer_offset[size])
    }

    /// Canonical roll for a keep id.
    pub fn keep_roll(&self, keep_id: usize) -> Roll {
        let (size, rank) = self.keep_size_rank(keep_id);
        Roll::from_sorted(self.roll(size, rank).to_vec())
    }

    /// Canonicalize user dice and check they form a roll of at most `num_dice`
    /// dice (exactly `expected_len` when given) with faces in range.
    pub fn check_dice(&self, dice: &[u8], expected_len: Option<usize>) -> WidgetResult<Roll> {
        let invalid = |reason: String| WidgetError::InvalidRoll {
            dice: dice.to_vec(),
            reason,
        };
        match expected_len {
            Some(len) if dice.len() != len => {
                return Err(invalid(format!("expected {} dice, got {}", len, dice.len())));
            }
            None if dice.len() > self.num_dice => {
                return Err(invalid(format!(
                    "at most {} dice allowed, got {}",
                    self.num_dice,
                    dice.len()
                )));
            }
            _ => {}
        }
        if let Some(&bad) = dice
            .iter()
            .find(|&&d| d == 0 || d as usize > self.num_faces)
        {
            return Err(invalid(format!(
                "face {} outside 1..={}",
                bad, self.num_faces
            )));
        }
        Ok(Roll::from(dice))
    }

    /// Keep id of arbitrary (unsorted) dice, after validation.
    pub fn lookup_keep(&self, dice: &[u8]) -> WidgetResult<usize> {
        let roll = self.check_dice(dice, None)?;
        Ok(self.keep_id(roll.len(), self.rank(&roll)))
    }

    /// Rank of an arbitrary (unsorted) full roll, after validation.
    pub fn lookup_full(&self, dice: &[u8]) -> WidgetResult<usize> {
        let roll = self.check_dice(dice, Some(self.num_dice))?;
        Ok(self.rank(&roll))
    }
}

/// multisets[k][m] = C(k + m - 1, m), by the recurrence
/// M(k, m) = M(k - 1, m) + M(k, m - 1).
fn build_multiset_table(num_dice: usize, num_faces: usize) -> Vec<Vec<usize>> {
    let mut table = vec![vec![0usize; num_dice + 1]; num_faces + 1];
    table[0][0] = 1;
    for k in 1..=num_faces {
        table[k][0] = 1;
        for m in 1..=num_dice {
            table[k][m] = table[k - 1][m] + table[k][m - 1];
        }
    }
    table
}
