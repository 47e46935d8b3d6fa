//! Solve results and the per-piece view handed to callers.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::archetypes::Archetype;
use crate::boosts::Boost;
use crate::constants::{ARMOR_CAP, TOTAL_CAP};
use crate::pipeline::STAGE_FLOOR;
use crate::stats::StatVector;
use crate::tuning::{
    BalancedPicks, TuningRow, TuningRows, apply_balanced_with_trace, count_balanced, general_delta,
};

/// One chosen armor piece and the boost slotted into it, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub archetype: Archetype,
    #[serde(default)]
    pub boost: Option<Boost>,
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.boost {
            Some(boost) => write!(f, "{} + {boost}", self.archetype),
            None => write!(f, "{}", self.archetype),
        }
    }
}

/// Pair pieces with boosts in order: the i-th boost goes on the i-th piece.
#[must_use]
pub fn distribute_boosts(pieces: &[Archetype], boosts: &[Boost]) -> Vec<Piece> {
    pieces
        .iter()
        .enumerate()
        .map(|(i, &archetype)| Piece {
            archetype,
            boost: boosts.get(i).copied(),
        })
        .collect()
}

/// Armor totals of `pieces`, ignoring their boosts.
#[must_use]
pub fn sum_armor(pieces: &[Piece]) -> StatVector {
    pieces.iter().fold(StatVector::zero(), |acc, piece| {
        acc.clamp_add(&piece.archetype.vector, ARMOR_CAP)
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveResult {
    pub chosen_pieces: Vec<Piece>,
    pub totals_final: StatVector,
    pub totals_raw: StatVector,
    pub feasible: bool,
}

impl SolveResult {
    /// Returned when the search produced no complete loadout.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            chosen_pieces: Vec::new(),
            totals_final: StatVector::zero(),
            totals_raw: StatVector::zero(),
            feasible: false,
        }
    }
}

/// What a solve hands back to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveResponse {
    pub feasible: bool,
    pub chosen_pieces: Vec<Piece>,
    pub totals_final: StatVector,
    pub totals_raw: StatVector,
    /// Rows the pipeline used for the chosen pieces; the derived rows in auto mode.
    pub effective_tuning_rows: TuningRows,
    /// Beam width of the pass that produced this answer.
    pub beam_width: usize,
    /// Fingerprint of the request that produced this answer.
    pub fingerprint: u64,
}

impl SolveResponse {
    #[must_use]
    pub fn exotic(&self) -> Option<&Piece> {
        self.chosen_pieces.iter().find(|p| p.archetype.is_exotic())
    }

    pub fn boosts(&self) -> impl Iterator<Item = &Boost> + '_ {
        self.chosen_pieces.iter().filter_map(|p| p.boost.as_ref())
    }

    #[must_use]
    pub fn active_tuning_rows(&self) -> Vec<TuningRow> {
        self.effective_tuning_rows
            .iter()
            .copied()
            .filter(|row| !row.is_noop())
            .collect()
    }

    /// Replay the pipeline up to the balanced stage and report which stats
    /// each balanced row raised.
    #[must_use]
    pub fn balanced_trace(&self, fragments: &StatVector) -> Vec<BalancedPicks> {
        let rows = &self.effective_tuning_rows;
        let armor = sum_armor(&self.chosen_pieces);
        let tuned = armor.clamp_add_signed(&general_delta(rows), STAGE_FLOOR, TOTAL_CAP);
        let with_fragments = tuned.clamp_add_signed(fragments, STAGE_FLOOR, TOTAL_CAP);
        apply_balanced_with_trace(&with_fragments, count_balanced(rows)).1
    }
}
