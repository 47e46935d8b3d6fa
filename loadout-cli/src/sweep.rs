//! Seeded random sweeps that check solver invariants on generated requests.
use anyhow::Result;
use colored::Colorize;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

use loadout_core::constants::{
    FRAGMENT_RANGE, FRAGMENT_STEP, NUM_PIECES, TARGET_MAX, TUNING_SLOTS,
};
use loadout_core::{
    BoostSize, SearchConfig, SolveResponse, Solver, SolverConfiguration, Stat, StatVector,
    TuningPlan, TuningRow, TuningRows,
};

/// Highest random target; keeps a useful share of requests feasible.
const SWEEP_TARGET_MAX: i32 = 160;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepRecord {
    pub seed: u64,
    pub iteration: usize,
    pub fingerprint: String,
    pub feasible: bool,
    pub beam_width: usize,
    pub missing: i32,
    pub violations: Vec<String>,
    /// Raising one target turned an infeasible request feasible.
    pub monotonicity_warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepSummary {
    pub seed: u64,
    pub iterations: usize,
    pub feasible: usize,
    pub violations: usize,
    pub monotonicity_warnings: usize,
    pub records: Vec<SweepRecord>,
}

impl SweepSummary {
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.violations == 0
    }
}

pub fn random_request(rng: &mut impl Rng) -> SolverConfiguration {
    let mut targets = StatVector::zero();
    let mut fragments = StatVector::zero();
    let steps = FRAGMENT_RANGE / FRAGMENT_STEP;
    for stat in Stat::ALL {
        targets[stat] = rng.gen_range(0..=SWEEP_TARGET_MAX / 10) * 10;
        fragments[stat] = rng.gen_range(-steps..=steps) * FRAGMENT_STEP;
    }
    let tuning = match rng.gen_range(0..10) {
        0..=4 => TuningPlan::Auto {
            least_favored: None,
        },
        5 => TuningPlan::Auto {
            least_favored: Some(Stat::ALL[rng.gen_range(0..Stat::COUNT)]),
        },
        _ => TuningPlan::Manual {
            rows: random_rows(rng),
        },
    };
    SolverConfiguration {
        targets,
        fragments,
        tuning,
        minor_slots: rng.gen_range(0..=NUM_PIECES),
        ..SolverConfiguration::default()
    }
}

fn random_rows(rng: &mut impl Rng) -> TuningRows {
    (0..rng.gen_range(0..=TUNING_SLOTS))
        .map(|_| {
            if rng.gen_bool(0.3) {
                TuningRow::balanced()
            } else {
                let plus = Stat::ALL[rng.gen_range(0..Stat::COUNT)];
                let minus = Stat::ALL[rng.gen_range(0..Stat::COUNT)];
                TuningRow::general(Some(plus), Some(minus))
            }
        })
        .collect()
}

/// Invariants every response must satisfy, as human-readable violations.
pub fn check_invariants(config: &SolverConfiguration, response: &SolveResponse) -> Vec<String> {
    let mut violations = Vec::new();
    if response.totals_final != response.totals_raw.floored() {
        violations.push(format!(
            "final totals {} are not the floored raw totals {}",
            response.totals_final, response.totals_raw
        ));
    }
    if response.feasible != response.totals_final.meets(&config.targets) {
        violations.push("feasible flag disagrees with totals".to_string());
    }
    if response.chosen_pieces.len() != NUM_PIECES {
        violations.push(format!("{} pieces chosen", response.chosen_pieces.len()));
    }
    let exotics = response
        .chosen_pieces
        .iter()
        .filter(|p| p.archetype.is_exotic())
        .count();
    if exotics != 1 {
        violations.push(format!("{exotics} exotics chosen"));
    }
    let minors = response
        .boosts()
        .filter(|b| b.size == BoostSize::Minor)
        .count();
    if minors > config.minor_slots {
        violations.push(format!(
            "{minors} minor boosts with {} minor slots",
            config.minor_slots
        ));
    }
    if response.boosts().count() > NUM_PIECES {
        violations.push("more boosts than pieces".to_string());
    }
    if response.effective_tuning_rows.len() != TUNING_SLOTS {
        violations.push(format!(
            "{} tuning rows reported",
            response.effective_tuning_rows.len()
        ));
    }
    if let Some(least) = config.tuning.least_favored() {
        for row in response.active_tuning_rows() {
            if row.plus == Some(least) || row.minus != Some(least) {
                violations.push(format!("row {row} breaks least-favored {least}"));
            }
        }
    }
    violations
}

pub fn run_sweep(
    seeds: &[u64],
    iterations: usize,
    search: &SearchConfig,
    verbose: bool,
) -> Result<Vec<SweepSummary>> {
    let mut solver = Solver::new(search.clone())?;
    let mut summaries = Vec::with_capacity(seeds.len());

    for &seed in seeds {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut records = Vec::with_capacity(iterations);
        for iteration in 0..iterations {
            let config = random_request(&mut rng);
            let response = solver.solve(&config)?;
            let violations = check_invariants(&config, &response);
            let monotonicity_warning = if response.feasible {
                None
            } else {
                probe_monotonicity(&mut solver, &config, &mut rng)?
            };

            if verbose {
                let status = if violations.is_empty() { "✅" } else { "❌" };
                println!(
                    "  {status} seed {seed} #{iteration}: {} width {}",
                    if response.feasible {
                        "feasible".green()
                    } else {
                        "infeasible".yellow()
                    },
                    response.beam_width
                );
            }

            records.push(SweepRecord {
                seed,
                iteration,
                fingerprint: format!("{:016x}", response.fingerprint),
                feasible: response.feasible,
                beam_width: response.beam_width,
                missing: response.totals_final.missing(&config.targets),
                violations,
                monotonicity_warning,
            });
        }

        summaries.push(SweepSummary {
            seed,
            iterations,
            feasible: records.iter().filter(|r| r.feasible).count(),
            violations: records.iter().map(|r| r.violations.len()).sum(),
            monotonicity_warnings: records
                .iter()
                .filter(|r| r.monotonicity_warning.is_some())
                .count(),
            records,
        });
    }

    Ok(summaries)
}

/// Raise one target of an infeasible request and report if it became feasible.
/// The beam is a heuristic, so this is a warning rather than a violation.
fn probe_monotonicity(
    solver: &mut Solver,
    config: &SolverConfiguration,
    rng: &mut impl Rng,
) -> Result<Option<String>> {
    let stat = Stat::ALL[rng.gen_range(0..Stat::COUNT)];
    if config.targets[stat] >= TARGET_MAX {
        return Ok(None);
    }
    let mut raised = config.clone();
    raised.targets[stat] = (config.targets[stat] + 10).min(TARGET_MAX);
    let response = solver.solve(&raised)?;
    Ok(response.feasible.then(|| {
        format!(
            "raising {stat} to {} made request {:016x} feasible",
            raised.targets[stat],
            config.fingerprint()
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_requests_are_valid_and_reproducible() {
        let mut a = ChaCha20Rng::seed_from_u64(7);
        let mut b = ChaCha20Rng::seed_from_u64(7);
        for _ in 0..50 {
            let first = random_request(&mut a);
            first.validate().unwrap();
            assert_eq!(first, random_request(&mut b));
        }
    }

    #[test]
    fn invariants_flag_a_tampered_response() {
        let config = SolverConfiguration::with_targets(StatVector::splat(20));
        let mut solver = Solver::new(SearchConfig::with_beam_widths(&[10])).unwrap();
        let mut response = solver.solve(&config).unwrap();
        assert!(check_invariants(&config, &response).is_empty());

        response.feasible = !response.feasible;
        response.effective_tuning_rows.pop();
        let violations = check_invariants(&config, &response);
        assert_eq!(violations.len(), 2, "{violations:?}");
    }

    #[test]
    fn small_sweep_has_no_violations() {
        let search = SearchConfig::with_beam_widths(&[12, 24]);
        let summaries = run_sweep(&[1, 2], 3, &search, false).unwrap();
        assert_eq!(summaries.len(), 2);
        for summary in summaries {
            assert_eq!(summary.records.len(), 3);
            assert!(summary.passed(), "{:?}", summary.records);
        }
    }
}
