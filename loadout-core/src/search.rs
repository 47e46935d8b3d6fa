//! Beam search over piece assignments.
//!
//! The search fills the five slots one at a time. Partial loadouts are ranked
//! by an optimistic residual that assumes every empty slot rolls its best
//! case; only the `width` most promising survive each step. Complete
//! loadouts are then scored with the exact pipeline.
use smallvec::SmallVec;

use crate::archetypes::{Archetype, catalog};
use crate::auto_tune::{AutoTuner, TuneRequest, optimistic_plus_rows};
use crate::boosts::{Allocation, SlotBudget};
use crate::config::{SearchConfig, SolverConfiguration, TuningPlan};
use crate::constants::{ARMOR_CAP, NUM_PIECES, OPTIMISTIC_SLOT_BONUS, TIE_BREAK_WEIGHT, TUNING_SLOTS};
use crate::pipeline::evaluate;
use crate::result::{SolveResult, distribute_boosts};
use crate::stats::{Stat, StatVector};
use crate::tuning::{TuningRows, padded};

/// Pieces picked so far; stays inline for a full loadout.
pub type PieceHandles = SmallVec<[Archetype; NUM_PIECES]>;

/// A partial loadout. Children are built from copies; a parent is never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamNode {
    pub armor: StatVector,
    pub pieces: PieceHandles,
    pub exotics_used: usize,
    pub step: usize,
    pub score: f64,
}

impl BeamNode {
    #[must_use]
    pub fn root() -> Self {
        Self {
            armor: StatVector::zero(),
            pieces: PieceHandles::new(),
            exotics_used: 0,
            step: 0,
            score: 0.0,
        }
    }

    /// Slots still empty once this node's next piece is placed.
    #[must_use]
    pub const fn slots_after_next(&self) -> usize {
        NUM_PIECES.saturating_sub(self.step + 1)
    }

    /// The last open slot is reserved for the exotic if none has been placed.
    #[must_use]
    pub const fn must_place_exotic(&self) -> bool {
        self.exotics_used == 0 && self.slots_after_next() == 0
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.step == NUM_PIECES && self.exotics_used == 1
    }

    fn child(&self, archetype: Archetype) -> Self {
        let mut pieces = self.pieces.clone();
        pieces.push(archetype);
        Self {
            armor: self.armor.clamp_add(&archetype.vector, ARMOR_CAP),
            pieces,
            exotics_used: self.exotics_used + usize::from(archetype.is_exotic()),
            step: self.step + 1,
            score: 0.0,
        }
    }
}

/// Result of one beam pass at a fixed width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub result: SolveResult,
    /// Tuning rows used to evaluate the chosen loadout.
    pub tuning_rows: TuningRows,
    pub width: usize,
}

fn tune_request(config: &SolverConfiguration, armor: StatVector, budget: SlotBudget) -> TuneRequest {
    TuneRequest {
        armor,
        targets: config.targets,
        fragments: config.fragments,
        budget,
        least_favored: config.tuning.least_favored(),
    }
}

/// Best-case residual for a partial loadout with `pieces_left` slots open.
///
/// Sum of the shortfalls left after running the pipeline on the projected
/// armor, plus a tiny term from the squared shortfall of the armor placed so
/// far. Lower is better.
pub fn optimistic_residual(
    config: &SolverConfiguration,
    armor: &StatVector,
    pieces_left: usize,
    tuner: &mut AutoTuner,
) -> f64 {
    let budget = config.budget();
    let bonus = OPTIMISTIC_SLOT_BONUS.saturating_mul(i32::try_from(pieces_left).unwrap_or(i32::MAX));
    let mut projected = *armor;
    for stat in Stat::ALL {
        projected[stat] = armor[stat].saturating_add(bonus).min(ARMOR_CAP);
    }

    let rows = match &config.tuning {
        TuningPlan::Manual { rows } => padded(rows),
        TuningPlan::Auto {
            least_favored: None,
        } => optimistic_plus_rows(&projected, &config.targets, &config.fragments, TUNING_SLOTS),
        TuningPlan::Auto { .. } => {
            tuner.rows_for(&tune_request(config, projected, budget), TUNING_SLOTS)
        }
    };
    let plan = evaluate(&projected, &config.targets, &rows, &config.fragments, budget);

    let missing = f64::from(plan.totals_final.missing(&config.targets));
    // Squared shortfalls stay well inside f64's exact integer range.
    #[allow(clippy::cast_precision_loss)]
    let raw = armor.deficit_score(&config.targets) as f64;
    missing + raw * TIE_BREAK_WEIGHT
}

fn expand(
    node: &BeamNode,
    legendary: &[Archetype],
    exotic: &[Archetype],
    out: &mut Vec<BeamNode>,
) {
    if !node.must_place_exotic() {
        out.extend(legendary.iter().map(|&archetype| node.child(archetype)));
    }
    if node.exotics_used == 0 {
        out.extend(exotic.iter().map(|&archetype| node.child(archetype)));
    }
}

/// One beam pass keeping at most `width` nodes per step.
pub fn run_beam(config: &SolverConfiguration, width: usize, tuner: &mut AutoTuner) -> SearchOutcome {
    let custom = config.custom_exotic.archetype();
    let exotic: &[Archetype] = match &custom {
        Some(archetype) => std::slice::from_ref(archetype),
        None => &catalog().exotic,
    };
    let legendary = catalog().legendary.as_slice();
    let budget = config.budget();

    let mut beam = vec![BeamNode::root()];
    for step in 0..NUM_PIECES {
        let mut children = Vec::with_capacity(beam.len() * (legendary.len() + exotic.len()));
        for node in &beam {
            expand(node, legendary, exotic, &mut children);
        }
        for child in &mut children {
            child.score = optimistic_residual(
                config,
                &child.armor,
                NUM_PIECES - child.step,
                tuner,
            );
        }
        children.sort_by(|a, b| a.score.total_cmp(&b.score));
        children.truncate(width);
        log::debug!(
            "beam width {width} step {}: {} live nodes, best score {:.6}",
            step + 1,
            children.len(),
            children.first().map_or(f64::INFINITY, |n| n.score)
        );
        beam = children;
        if beam.is_empty() {
            break;
        }
    }

    let mut best: Option<(i64, &BeamNode, TuningRows, Allocation)> = None;
    for node in beam.iter().filter(|node| node.is_complete()) {
        let rows = tuner.effective_rows(
            &config.tuning,
            &tune_request(config, node.armor, budget),
            TUNING_SLOTS,
        );
        let plan = evaluate(&node.armor, &config.targets, &rows, &config.fragments, budget);
        let score = plan.totals_final.deficit_score(&config.targets);
        if best.as_ref().is_none_or(|(best_score, ..)| score < *best_score) {
            best = Some((score, node, rows, plan));
        }
    }

    match best {
        Some((_, node, rows, plan)) => SearchOutcome {
            result: SolveResult {
                chosen_pieces: distribute_boosts(&node.pieces, &plan.boosts),
                feasible: plan.totals_final.meets(&config.targets),
                totals_final: plan.totals_final,
                totals_raw: plan.totals_raw,
            },
            tuning_rows: rows,
            width,
        },
        None => SearchOutcome {
            result: SolveResult::empty(),
            tuning_rows: tuner.effective_rows(
                &config.tuning,
                &tune_request(config, StatVector::zero(), budget),
                TUNING_SLOTS,
            ),
            width,
        },
    }
}

/// Run beam passes at each configured width until one is feasible. The last
/// pass is returned whatever its outcome.
pub fn recommend(
    config: &SolverConfiguration,
    search: &SearchConfig,
    tuner: &mut AutoTuner,
) -> SearchOutcome {
    let mut last = None;
    for (attempt, &width) in search.beam_widths.iter().enumerate() {
        if attempt > 0 {
            log::info!("no feasible loadout yet, widening beam to {width}");
        }
        let outcome = run_beam(config, width, tuner);
        if outcome.result.feasible {
            return outcome;
        }
        last = Some(outcome);
    }
    last.unwrap_or_else(|| SearchOutcome {
        result: SolveResult::empty(),
        tuning_rows: padded(&[]),
        width: 0,
    })
}
