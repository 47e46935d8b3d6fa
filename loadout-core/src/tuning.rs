//! Tuning rows: general (+5/-5) and balanced (+1 to the three lowest stats).
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::constants::{BALANCED_PICKS, BALANCED_STEP, TOTAL_CAP, TUNING_SLOTS, TUNING_STEP};
use crate::stats::{Stat, StatVector};

/// Rows as carried through the solver; never more than [`TUNING_SLOTS`].
pub type TuningRows = SmallVec<[TuningRow; TUNING_SLOTS]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TuningMode {
    #[default]
    General,
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TuningRow {
    #[serde(default)]
    pub mode: TuningMode,
    #[serde(default)]
    pub plus: Option<Stat>,
    #[serde(default)]
    pub minus: Option<Stat>,
}

impl TuningRow {
    /// A general row that changes nothing.
    pub const NONE: Self = Self {
        mode: TuningMode::General,
        plus: None,
        minus: None,
    };

    #[must_use]
    pub const fn general(plus: Option<Stat>, minus: Option<Stat>) -> Self {
        Self {
            mode: TuningMode::General,
            plus,
            minus,
        }
    }

    #[must_use]
    pub const fn balanced() -> Self {
        Self {
            mode: TuningMode::Balanced,
            plus: None,
            minus: None,
        }
    }

    #[must_use]
    pub const fn is_balanced(&self) -> bool {
        matches!(self.mode, TuningMode::Balanced)
    }

    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self.mode, TuningMode::General) && self.plus.is_none() && self.minus.is_none()
    }
}

impl fmt::Display for TuningRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_balanced() {
            return f.write_str("Balanced × 1");
        }
        match (self.plus, self.minus) {
            (Some(plus), Some(minus)) => write!(f, "+{TUNING_STEP} {plus} / −{TUNING_STEP} {minus}"),
            (Some(plus), None) => write!(f, "+{TUNING_STEP} {plus}"),
            (None, Some(minus)) => write!(f, "−{TUNING_STEP} {minus}"),
            (None, None) => f.write_str("None"),
        }
    }
}

/// Pad `rows` with no-op rows up to [`TUNING_SLOTS`].
#[must_use]
pub fn padded(rows: &[TuningRow]) -> TuningRows {
    let mut out: TuningRows = rows.iter().copied().take(TUNING_SLOTS).collect();
    while out.len() < TUNING_SLOTS {
        out.push(TuningRow::NONE);
    }
    out
}

/// Net stat change from every general row. Balanced rows contribute nothing here.
#[must_use]
pub fn general_delta(rows: &[TuningRow]) -> StatVector {
    let mut delta = StatVector::zero();
    for row in rows.iter().filter(|row| !row.is_balanced()) {
        if let Some(plus) = row.plus {
            delta[plus] += TUNING_STEP;
        }
        if let Some(minus) = row.minus {
            delta[minus] -= TUNING_STEP;
        }
    }
    delta
}

#[must_use]
pub fn count_balanced(rows: &[TuningRow]) -> usize {
    rows.iter().filter(|row| row.is_balanced()).count()
}

/// Apply `count` balanced rows in sequence; each sees the result of the previous.
#[must_use]
pub fn apply_balanced(totals: &StatVector, count: usize) -> StatVector {
    let mut out = *totals;
    for _ in 0..count {
        balanced_step(&mut out);
    }
    out
}

/// Stats raised by a single balanced row.
pub type BalancedPicks = [Stat; BALANCED_PICKS];

/// [`apply_balanced`] that also records which stats each row raised.
#[must_use]
pub fn apply_balanced_with_trace(
    totals: &StatVector,
    count: usize,
) -> (StatVector, Vec<BalancedPicks>) {
    let mut out = *totals;
    let trace = (0..count).map(|_| balanced_step(&mut out)).collect();
    (out, trace)
}

fn balanced_step(totals: &mut StatVector) -> BalancedPicks {
    // Stable sort keeps enumeration order among equal values.
    let mut order = Stat::ALL;
    order.sort_by_key(|&stat| totals[stat]);
    let mut picks = [Stat::Health; BALANCED_PICKS];
    for (slot, &stat) in picks.iter_mut().zip(order.iter()) {
        totals[stat] = (totals[stat] + BALANCED_STEP).min(TOTAL_CAP);
        *slot = stat;
    }
    picks
}
