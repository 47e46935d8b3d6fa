//! Automatic derivation of general tuning rows.
//!
//! Rows are added one at a time. Each round tries every (+plus, −minus) pair,
//! simulates the full pipeline with that row appended, and keeps the pair that
//! lowers the squared shortfall the most. Derivation stops as soon as no pair
//! improves on the rows chosen so far.
use std::collections::VecDeque;

use crate::boosts::SlotBudget;
use crate::config::TuningPlan;
use crate::constants::{DEFAULT_TUNING_CACHE_CAPACITY, TOTAL_CAP};
use crate::pipeline::{STAGE_FLOOR, evaluate};
use crate::stats::{Stat, StatVector};
use crate::tuning::{TuningRow, TuningRows, padded};

/// Inputs that fully determine a derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TuneRequest {
    pub armor: StatVector,
    pub targets: StatVector,
    pub fragments: StatVector,
    pub budget: SlotBudget,
    /// Stat that must never receive a plus and is the only allowed donor.
    pub least_favored: Option<Stat>,
}

impl TuneRequest {
    fn simulate(&self, rows: &[TuningRow]) -> StatVector {
        evaluate(
            &self.armor,
            &self.targets,
            rows,
            &self.fragments,
            self.budget,
        )
        .totals_raw
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    plus: Stat,
    minus: Stat,
    score: i64,
    surplus: i32,
    totals: StatVector,
}

impl Candidate {
    /// Lower score wins; ties go to the donor with more surplus, then to the
    /// donor used by the previous row.
    fn beats(&self, other: &Self, prev_minus: Option<Stat>) -> bool {
        if self.score != other.score {
            return self.score < other.score;
        }
        if self.surplus != other.surplus {
            return self.surplus > other.surplus;
        }
        prev_minus == Some(self.minus)
    }
}

/// Derive up to `slots` general rows for `request`, padded with no-op rows.
#[must_use]
pub fn derive_rows(request: &TuneRequest, slots: usize) -> TuningRows {
    let targets = &request.targets;
    let mut rows = TuningRows::new();
    let mut current = request.simulate(&rows);
    let mut best_score = current.deficit_score(targets);

    for _ in 0..slots {
        let prev_minus = rows.last().and_then(|row| row.minus);
        let plus_candidates: Vec<Stat> = Stat::ALL
            .into_iter()
            .filter(|&stat| targets[stat] > current[stat])
            .filter(|&stat| Some(stat) != request.least_favored)
            .collect();
        if plus_candidates.is_empty() {
            break;
        }

        let mut best: Option<Candidate> = None;
        for &plus in &plus_candidates {
            let donors: Vec<Stat> = match request.least_favored {
                Some(donor) => vec![donor],
                None => Stat::ALL.into_iter().filter(|&s| s != plus).collect(),
            };
            for minus in donors {
                rows.push(TuningRow::general(Some(plus), Some(minus)));
                let totals = request.simulate(&rows);
                rows.pop();

                let score = totals.deficit_score(targets);
                if score >= best_score {
                    continue;
                }
                let candidate = Candidate {
                    plus,
                    minus,
                    score,
                    surplus: (current[minus] - targets[minus]).max(0),
                    totals,
                };
                if best.is_none_or(|b| candidate.beats(&b, prev_minus)) {
                    best = Some(candidate);
                }
            }
        }

        let Some(choice) = best else {
            break;
        };
        rows.push(TuningRow::general(Some(choice.plus), Some(choice.minus)));
        current = choice.totals;
        best_score = choice.score;
    }

    while rows.len() < slots {
        rows.push(TuningRow::NONE);
    }
    rows
}

/// Donor-agnostic projection used while ranking partial loadouts: a free +5
/// on each of the `slots` stats with the largest shortfall after fragments.
#[must_use]
pub fn optimistic_plus_rows(
    armor: &StatVector,
    targets: &StatVector,
    fragments: &StatVector,
    slots: usize,
) -> TuningRows {
    let after_fragments = armor.clamp_add_signed(fragments, STAGE_FLOOR, TOTAL_CAP);
    let mut order = Stat::ALL;
    // Stable: equal shortfalls keep enumeration order.
    order.sort_by_key(|&stat| std::cmp::Reverse(after_fragments.deficit(stat, targets)));
    let rows: TuningRows = order
        .into_iter()
        .take(slots)
        .map(|plus| TuningRow::general(Some(plus), None))
        .collect();
    padded(&rows)
}

/// Derivation cache owned by the solver. Keeps the most recently used
/// `capacity` results; capacity 0 disables caching.
#[derive(Debug, Clone)]
pub struct AutoTuner {
    capacity: usize,
    entries: VecDeque<(TuneRequest, TuningRows)>,
    hits: u64,
    misses: u64,
}

impl Default for AutoTuner {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_TUNING_CACHE_CAPACITY)
    }
}

impl AutoTuner {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Derived rows for `request`, reusing a cached result when the inputs match.
    pub fn rows_for(&mut self, request: &TuneRequest, slots: usize) -> TuningRows {
        if let Some(pos) = self
            .entries
            .iter()
            .position(|(key, rows)| key == request && rows.len() == slots)
        {
            self.hits += 1;
            log::trace!("auto-tune cache hit ({} entries)", self.entries.len());
            if let Some(entry) = self.entries.remove(pos) {
                let rows = entry.1.clone();
                self.entries.push_front(entry);
                return rows;
            }
        }

        self.misses += 1;
        let rows = derive_rows(request, slots);
        if self.capacity > 0 {
            self.entries.push_front((*request, rows.clone()));
            self.entries.truncate(self.capacity);
        }
        rows
    }

    /// Rows the pipeline should use under `plan` for a loadout with `request.armor`.
    pub fn effective_rows(
        &mut self,
        plan: &TuningPlan,
        request: &TuneRequest,
        slots: usize,
    ) -> TuningRows {
        match plan {
            TuningPlan::Manual { rows } => padded(rows),
            TuningPlan::Auto { .. } => self.rows_for(request, slots),
        }
    }

    #[must_use]
    pub const fn hits(&self) -> u64 {
        self.hits
    }

    #[must_use]
    pub const fn misses(&self) -> u64 {
        self.misses
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TUNING_SLOTS;

    fn request(armor: StatVector, targets: StatVector, least: Option<Stat>) -> TuneRequest {
        TuneRequest {
            armor,
            targets,
            fragments: StatVector::zero(),
            budget: SlotBudget::from_minor(0),
            least_favored: least,
        }
    }

    #[test]
    fn no_rows_when_targets_already_met() {
        let req = request(StatVector::splat(100), StatVector::splat(80), None);
        let rows = derive_rows(&req, TUNING_SLOTS);
        assert_eq!(rows.len(), TUNING_SLOTS);
        assert!(rows.iter().all(TuningRow::is_noop));
    }

    #[test]
    fn shifts_points_from_surplus_to_shortfall() {
        let armor = StatVector::from_pairs(&[(Stat::Weapons, 100), (Stat::Health, 150)]);
        let targets = StatVector::from_pairs(&[(Stat::Weapons, 170), (Stat::Health, 100)]);
        let rows = derive_rows(&request(armor, targets, None), TUNING_SLOTS);
        // Five majors bring weapons to 150; four rows close the remaining 20.
        for row in &rows {
            assert_eq!(row.plus, Some(Stat::Weapons));
            assert_eq!(row.minus, Some(Stat::Health));
        }
    }

    fn donors(armor: StatVector, targets: StatVector) -> Vec<Option<Stat>> {
        derive_rows(&request(armor, targets, None), TUNING_SLOTS)
            .iter()
            .map(|row| row.minus)
            .collect()
    }

    #[test]
    fn equal_surplus_keeps_the_previous_donor() {
        let armor = StatVector::from_pairs(&[
            (Stat::Weapons, 100),
            (Stat::Health, 150),
            (Stat::Class, 150),
        ]);
        let targets = StatVector::from_pairs(&[
            (Stat::Weapons, 170),
            (Stat::Health, 100),
            (Stat::Class, 100),
        ]);
        // Health goes first in stat order; class then leads on surplus, keeps
        // the row on the tie at 45, and health wins back the last row.
        assert_eq!(
            donors(armor, targets),
            vec![
                Some(Stat::Health),
                Some(Stat::Class),
                Some(Stat::Class),
                Some(Stat::Health)
            ]
        );
    }

    #[test]
    fn larger_surplus_donates_first() {
        let armor = StatVector::from_pairs(&[
            (Stat::Weapons, 100),
            (Stat::Health, 150),
            (Stat::Class, 140),
        ]);
        let targets = StatVector::from_pairs(&[
            (Stat::Weapons, 170),
            (Stat::Health, 100),
            (Stat::Class, 100),
        ]);
        assert_eq!(
            donors(armor, targets),
            vec![
                Some(Stat::Health),
                Some(Stat::Health),
                Some(Stat::Health),
                Some(Stat::Class)
            ]
        );
    }

    #[test]
    fn least_favored_is_only_ever_the_donor() {
        let armor = StatVector::from_pairs(&[(Stat::Class, 60), (Stat::Super, 60)]);
        let targets = StatVector::from_pairs(&[
            (Stat::Class, 150),
            (Stat::Super, 150),
            (Stat::Melee, 0),
        ]);
        let rows = derive_rows(&request(armor, targets, Some(Stat::Class)), TUNING_SLOTS);
        let active: Vec<_> = rows.iter().filter(|r| !r.is_noop()).collect();
        assert!(!active.is_empty());
        for row in active {
            assert_ne!(row.plus, Some(Stat::Class));
            assert_eq!(row.minus, Some(Stat::Class));
        }
    }

    #[test]
    fn optimistic_rows_target_largest_shortfalls() {
        let armor = StatVector::from_pairs(&[(Stat::Health, 100)]);
        let targets = StatVector::from_pairs(&[
            (Stat::Health, 100),
            (Stat::Weapons, 50),
            (Stat::Grenade, 40),
        ]);
        let rows = optimistic_plus_rows(&armor, &targets, &StatVector::zero(), TUNING_SLOTS);
        let plus: Vec<_> = rows.iter().map(|r| r.plus).collect();
        assert_eq!(
            plus,
            vec![
                Some(Stat::Weapons),
                Some(Stat::Grenade),
                Some(Stat::Health),
                Some(Stat::Melee)
            ]
        );
        assert!(rows.iter().all(|r| r.minus.is_none()));
    }

    #[test]
    fn cache_reuses_matching_requests() {
        let mut tuner = AutoTuner::with_capacity(2);
        let req = request(
            StatVector::from_pairs(&[(Stat::Health, 150)]),
            StatVector::from_pairs(&[(Stat::Weapons, 60)]),
            None,
        );
        let first = tuner.rows_for(&req, TUNING_SLOTS);
        let second = tuner.rows_for(&req, TUNING_SLOTS);
        assert_eq!(first, second);
        assert_eq!(tuner.hits(), 1);
        assert_eq!(tuner.misses(), 1);

        for weapons in [70, 80, 90] {
            let mut other = req;
            other.targets[Stat::Weapons] = weapons;
            let _ = tuner.rows_for(&other, TUNING_SLOTS);
        }
        assert_eq!(tuner.len(), 2);
    }

    #[test]
    fn manual_plan_passes_rows_through() {
        let mut tuner = AutoTuner::default();
        let plan = TuningPlan::Manual {
            rows: [TuningRow::balanced()].into_iter().collect(),
        };
        let req = request(StatVector::zero(), StatVector::splat(50), None);
        let rows = tuner.effective_rows(&plan, &req, TUNING_SLOTS);
        assert!(rows[0].is_balanced());
        assert_eq!(tuner.misses(), 0);
    }
}
