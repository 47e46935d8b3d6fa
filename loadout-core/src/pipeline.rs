//! The fixed stat pipeline: armor → general tuning → fragments → balanced
//! tuning → boosts.
//!
//! Every stage returns a new vector; nothing here mutates its inputs.
use crate::boosts::{Allocation, SlotBudget, allocate};
use crate::constants::TOTAL_CAP;
use crate::stats::StatVector;
use crate::tuning::{TuningRow, apply_balanced, count_balanced, general_delta};

/// Lowest value an intermediate stage may hold.
pub const STAGE_FLOOR: i32 = -TOTAL_CAP;

/// Totals after tuning rows and fragments, before boosts.
#[must_use]
pub fn adjusted_totals(
    armor: &StatVector,
    rows: &[TuningRow],
    fragments: &StatVector,
) -> StatVector {
    let with_general = armor.clamp_add_signed(&general_delta(rows), STAGE_FLOOR, TOTAL_CAP);
    let with_fragments = with_general.clamp_add_signed(fragments, STAGE_FLOOR, TOTAL_CAP);
    apply_balanced(&with_fragments, count_balanced(rows))
}

/// Run the whole pipeline, ending in greedy boost allocation.
#[must_use]
pub fn evaluate(
    armor: &StatVector,
    targets: &StatVector,
    rows: &[TuningRow],
    fragments: &StatVector,
    budget: SlotBudget,
) -> Allocation {
    allocate(&adjusted_totals(armor, rows, fragments), targets, budget)
}
