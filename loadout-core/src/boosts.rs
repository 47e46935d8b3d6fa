//! Greedy boost allocation.
//!
//! Boosts are per-piece stat increments: a major boost adds 10, a minor one
//! adds 5. The allocator spends majors first, then minors, always on the stat
//! with the largest remaining shortfall.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{BOOST_SLOTS, MAJOR_BOOST, MINOR_BOOST, NUM_PIECES, TOTAL_CAP};
use crate::stats::{Stat, StatVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoostSize {
    Major,
    Minor,
}

impl BoostSize {
    #[must_use]
    pub const fn amount(self) -> i32 {
        match self {
            Self::Major => MAJOR_BOOST,
            Self::Minor => MINOR_BOOST,
        }
    }
}

/// A boost placed on one stat. `amount` can be below the nominal size when
/// the stat was close to the total cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Boost {
    pub stat: Stat,
    pub size: BoostSize,
    pub amount: i32,
}

impl Boost {
    #[must_use]
    pub fn label(&self) -> String {
        match self.size {
            BoostSize::Major => self.stat.label().to_string(),
            BoostSize::Minor => format!("Minor {}", self.stat.label()),
        }
    }
}

impl fmt::Display for Boost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (+{})", self.label(), self.amount)
    }
}

/// How many boosts of each size may be spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotBudget {
    pub minor: usize,
    pub major: usize,
    /// Hard ceiling on boosts of any size.
    pub total: usize,
}

impl SlotBudget {
    /// Split the piece slots: `minor` minor boosts, the rest major.
    #[must_use]
    pub fn from_minor(minor: usize) -> Self {
        let minor = minor.min(NUM_PIECES);
        Self {
            minor,
            major: NUM_PIECES - minor,
            total: BOOST_SLOTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Totals after boosts, each stat floored at 0.
    pub totals_final: StatVector,
    /// Totals after boosts without the floor; may be negative.
    pub totals_raw: StatVector,
    pub boosts: Vec<Boost>,
}

/// Spend `budget` on the stats furthest below `targets`.
///
/// Negative totals count as 0 when measuring a shortfall; the arithmetic
/// itself stays signed. Allocation stops at the first boost that would have
/// no effect.
#[must_use]
pub fn allocate(start: &StatVector, targets: &StatVector, budget: SlotBudget) -> Allocation {
    let mut totals = *start;
    let mut boosts = Vec::with_capacity(budget.total);

    for (size, count) in [
        (BoostSize::Major, budget.major),
        (BoostSize::Minor, budget.minor),
    ] {
        for _ in 0..count {
            if boosts.len() >= budget.total {
                break;
            }
            match apply_one(&mut totals, targets, size) {
                Some(boost) => boosts.push(boost),
                None => break,
            }
        }
    }

    Allocation {
        totals_final: totals.floored(),
        totals_raw: totals,
        boosts,
    }
}

fn apply_one(totals: &mut StatVector, targets: &StatVector, size: BoostSize) -> Option<Boost> {
    let mut pick = None;
    let mut best = 0;
    for stat in Stat::ALL {
        let deficit = (targets[stat] - totals[stat].max(0)).max(0);
        if deficit > best {
            best = deficit;
            pick = Some(stat);
        }
    }
    let stat = pick?;
    let amount = size.amount().min(TOTAL_CAP - totals[stat]);
    if amount <= 0 {
        return None;
    }
    totals[stat] += amount;
    Some(Boost { stat, size, amount })
}
