use anyhow::{Result, anyhow, ensure};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use loadout_core::constants::{NUM_PIECES, TUNING_SLOTS};
use loadout_core::{
    Archetype, ArmorSet, CustomOverride, Origin, SearchConfig, SolveResponse, Solver,
    SolverConfiguration, Stat, StatVector, TuningPlan, TuningRow, TuningRows,
};

/// Everything an expectation gets to look at.
pub struct ScenarioRun<'a> {
    pub config: &'a SolverConfiguration,
    pub response: &'a SolveResponse,
    pub search: &'a SearchConfig,
}

pub type Expectation = fn(&ScenarioRun<'_>) -> Result<()>;

pub struct Scenario {
    key: &'static str,
    name: &'static str,
    description: &'static str,
    config: fn() -> SolverConfiguration,
    expectations: Vec<Expectation>,
}

impl Scenario {
    fn new(
        key: &'static str,
        name: &'static str,
        description: &'static str,
        config: fn() -> SolverConfiguration,
    ) -> Self {
        Self {
            key,
            name,
            description,
            config,
            expectations: vec![well_formed],
        }
    }

    fn with_expectation(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }

    pub const fn key(&self) -> &'static str {
        self.key
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn description(&self) -> &'static str {
        self.description
    }

    pub fn config(&self) -> SolverConfiguration {
        (self.config)()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub key: String,
    pub scenario_name: String,
    pub passed: bool,
    pub feasible: bool,
    pub beam_width: usize,
    pub fingerprint: String,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

pub fn catalog_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new(
            "all-zero",
            "All-Zero Targets",
            "Zero targets accept any one-exotic loadout",
            || no_tuning(StatVector::zero()),
        )
        .with_expectation(expect_feasible),
        Scenario::new(
            "weapons-max",
            "Single Extreme Target",
            "Weapons 200 stacks Gunner pieces and five weapons boosts",
            || no_tuning(StatVector::from_pairs(&[(Stat::Weapons, 200)])),
        )
        .with_expectation(expect_feasible)
        .with_expectation(weapons_stack_expectation),
        Scenario::new(
            "weapons-minor",
            "Minor Slots Cap Reach",
            "Weapons 200 with only minor boosts tops out at 175",
            || SolverConfiguration {
                minor_slots: NUM_PIECES,
                ..no_tuning(StatVector::from_pairs(&[(Stat::Weapons, 200)]))
            },
        )
        .with_expectation(expect_infeasible)
        .with_expectation(minor_cap_expectation),
        Scenario::new(
            "least-favored-donor",
            "Least-Favored Donor",
            "Auto tuning never raises the least-favored stat and only takes from it",
            || SolverConfiguration {
                targets: StatVector::from_pairs(&[(Stat::Class, 150), (Stat::Super, 150)]),
                tuning: TuningPlan::Auto {
                    least_favored: Some(Stat::Class),
                },
                ..SolverConfiguration::default()
            },
        )
        .with_expectation(least_favored_expectation),
        Scenario::new(
            "custom-exotic",
            "Custom Exotic Override",
            "An enabled override is the only exotic the search may place",
            || SolverConfiguration {
                custom_exotic: CustomOverride::enabled(custom_vector()),
                ..no_tuning(StatVector::from_pairs(&[
                    (Stat::Grenade, 120),
                    (Stat::Super, 100),
                ]))
            },
        )
        .with_expectation(custom_exotic_expectation),
        Scenario::new(
            "fragments-close-gap",
            "Fragments Close the Gap",
            "Fragments and auto tuning reach targets boosts alone cannot",
            || SolverConfiguration {
                fragments: StatVector::from_pairs(&[(Stat::Weapons, 30), (Stat::Grenade, 30)]),
                tuning: TuningPlan::default(),
                ..no_tuning(StatVector::from_pairs(&[
                    (Stat::Weapons, 200),
                    (Stat::Grenade, 160),
                ]))
            },
        )
        .with_expectation(expect_feasible),
        Scenario::new(
            "balanced-trace",
            "Balanced Tuning Trace",
            "Balanced rows replay to the same picks every time",
            || SolverConfiguration {
                tuning: TuningPlan::Manual {
                    rows: [TuningRow::balanced(), TuningRow::balanced()]
                        .into_iter()
                        .collect(),
                },
                ..SolverConfiguration::with_targets(StatVector::splat(40))
            },
        )
        .with_expectation(expect_feasible)
        .with_expectation(balanced_trace_expectation),
        Scenario::new(
            "impossible",
            "Unreachable Targets",
            "Maximum targets return the closest loadout from the widest beam",
            || no_tuning(StatVector::splat(200)),
        )
        .with_expectation(expect_infeasible)
        .with_expectation(widest_beam_expectation),
    ]
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    catalog_scenarios()
        .iter()
        .map(|s| (s.key(), s.description()))
        .collect()
}

/// Scenarios named by `keys`; `all` expands to the full catalog.
pub fn select_scenarios(keys: &[String]) -> (Vec<Scenario>, Vec<String>) {
    if keys.iter().any(|k| k.eq_ignore_ascii_case("all")) {
        return (catalog_scenarios(), Vec::new());
    }
    let mut selected = Vec::new();
    let mut unknown = Vec::new();
    for key in keys {
        match catalog_scenarios()
            .into_iter()
            .find(|s| s.key().eq_ignore_ascii_case(key))
        {
            Some(scenario) => selected.push(scenario),
            None => unknown.push(key.clone()),
        }
    }
    (selected, unknown)
}

pub fn run_scenarios(
    scenarios: &[Scenario],
    search: &SearchConfig,
    verbose: bool,
) -> Result<Vec<ScenarioResult>> {
    let mut results = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        // Fresh solver per scenario.
        let mut solver = Solver::new(search.clone())?;
        let config = scenario.config();
        let start = Instant::now();
        let response = solver.solve(&config)?;
        let duration = start.elapsed();

        let run = ScenarioRun {
            config: &config,
            response: &response,
            search,
        };
        let failures: Vec<String> = scenario
            .expectations
            .iter()
            .filter_map(|expectation| expectation(&run).err())
            .map(|err| err.to_string())
            .collect();

        if verbose {
            let status = if failures.is_empty() { "✅" } else { "❌" };
            println!(
                "  {status} {} ({duration:?}, width {})",
                scenario.name().bright_white(),
                response.beam_width
            );
        }

        results.push(ScenarioResult {
            key: scenario.key().to_string(),
            scenario_name: scenario.name().to_string(),
            passed: failures.is_empty(),
            feasible: response.feasible,
            beam_width: response.beam_width,
            fingerprint: format!("{:016x}", response.fingerprint),
            failures,
            duration,
        });
    }
    Ok(results)
}

fn no_tuning(targets: StatVector) -> SolverConfiguration {
    SolverConfiguration {
        targets,
        tuning: TuningPlan::Manual {
            rows: TuningRows::new(),
        },
        ..SolverConfiguration::default()
    }
}

fn custom_vector() -> StatVector {
    StatVector::from_pairs(&[
        (Stat::Health, 10),
        (Stat::Grenade, 30),
        (Stat::Super, 30),
        (Stat::Weapons, 5),
    ])
}

fn well_formed(run: &ScenarioRun<'_>) -> Result<()> {
    let response = run.response;
    ensure!(
        response.chosen_pieces.len() == NUM_PIECES,
        "expected {NUM_PIECES} pieces, got {}",
        response.chosen_pieces.len()
    );
    let exotics = response
        .chosen_pieces
        .iter()
        .filter(|p| p.archetype.is_exotic())
        .count();
    ensure!(exotics == 1, "expected one exotic, got {exotics}");
    ensure!(
        response.totals_final == response.totals_raw.floored(),
        "final totals {} are not the floored raw totals {}",
        response.totals_final,
        response.totals_raw
    );
    ensure!(
        response.feasible == response.totals_final.meets(&run.config.targets),
        "feasible flag disagrees with totals"
    );
    ensure!(
        response.effective_tuning_rows.len() == TUNING_SLOTS,
        "expected {TUNING_SLOTS} tuning rows"
    );
    ensure!(
        response.boosts().count() <= NUM_PIECES,
        "more boosts than pieces"
    );
    Ok(())
}

fn expect_feasible(run: &ScenarioRun<'_>) -> Result<()> {
    ensure!(
        run.response.feasible,
        "expected a feasible loadout, got {} (missing {})",
        run.response.totals_final,
        run.response.totals_final.missing(&run.config.targets)
    );
    Ok(())
}

fn expect_infeasible(run: &ScenarioRun<'_>) -> Result<()> {
    ensure!(
        !run.response.feasible,
        "targets should be out of reach, got {}",
        run.response.totals_final
    );
    Ok(())
}

fn weapons_stack_expectation(run: &ScenarioRun<'_>) -> Result<()> {
    let response = run.response;
    ensure!(
        response.totals_final[Stat::Weapons] == 200,
        "weapons reached {}",
        response.totals_final[Stat::Weapons]
    );
    for piece in &response.chosen_pieces {
        ensure!(
            piece.archetype.set_name() == ArmorSet::Gunner.name(),
            "non-Gunner piece chosen: {}",
            piece.archetype
        );
        let boost = piece
            .boost
            .ok_or_else(|| anyhow!("{} carries no boost", piece.archetype))?;
        ensure!(boost.stat == Stat::Weapons, "boost went to {}", boost.stat);
    }
    Ok(())
}

fn minor_cap_expectation(run: &ScenarioRun<'_>) -> Result<()> {
    let weapons = run.response.totals_final[Stat::Weapons];
    ensure!(weapons == 175, "expected weapons 175, got {weapons}");
    Ok(())
}

fn least_favored_expectation(run: &ScenarioRun<'_>) -> Result<()> {
    let least = run
        .config
        .tuning
        .least_favored()
        .ok_or_else(|| anyhow!("scenario has no least-favored stat"))?;
    for row in run.response.active_tuning_rows() {
        ensure!(row.plus != Some(least), "row {row} raises {least}");
        ensure!(row.minus == Some(least), "row {row} takes from a stat other than {least}");
    }
    Ok(())
}

fn custom_exotic_expectation(run: &ScenarioRun<'_>) -> Result<()> {
    let exotic = run
        .response
        .exotic()
        .ok_or_else(|| anyhow!("loadout has no exotic"))?;
    ensure!(
        exotic.archetype.origin == Origin::Custom,
        "catalog exotic {} chosen despite override",
        exotic.archetype
    );
    ensure!(
        exotic.archetype == Archetype::custom_exotic(custom_vector()),
        "exotic vector {} differs from the override",
        exotic.archetype.vector
    );
    Ok(())
}

fn balanced_trace_expectation(run: &ScenarioRun<'_>) -> Result<()> {
    let first = run.response.balanced_trace(&run.config.fragments);
    let second = run.response.balanced_trace(&run.config.fragments);
    ensure!(first.len() == 2, "expected two balanced rows, traced {}", first.len());
    ensure!(first == second, "balanced trace changed between replays");
    Ok(())
}

fn widest_beam_expectation(run: &ScenarioRun<'_>) -> Result<()> {
    let widest = run.search.beam_widths.last().copied().unwrap_or_default();
    ensure!(
        run.response.beam_width == widest,
        "infeasible answer came from width {} instead of {widest}",
        run.response.beam_width
    );
    Ok(())
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}
