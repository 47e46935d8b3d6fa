//! Loadout Solver Core
//!
//! Platform-agnostic recommender for five-piece armor loadouts. Given
//! per-stat targets, fragments and tuning choices, it searches the archetype
//! catalog for the combination of one exotic and four legendaries that comes
//! closest to the targets once tuning, fragments and boosts are applied.
//! This crate performs no I/O and installs no logger.

pub mod archetypes;
pub mod auto_tune;
pub mod boosts;
pub mod config;
pub mod constants;
pub mod pipeline;
pub mod result;
pub mod search;
pub mod stats;
pub mod tuning;

use thiserror::Error;

// Re-export commonly used types
pub use archetypes::{Archetype, ArmorSet, Catalog, Origin, Tier, catalog};
pub use auto_tune::{AutoTuner, TuneRequest, derive_rows, optimistic_plus_rows};
pub use boosts::{Allocation, Boost, BoostSize, SlotBudget, allocate};
pub use config::{
    ConfigError, CustomOverride, SearchConfig, SearchConfigError, SolverConfiguration, TuningPlan,
};
pub use pipeline::{adjusted_totals, evaluate};
pub use result::{Piece, SolveResponse, SolveResult, distribute_boosts, sum_armor};
pub use search::{BeamNode, SearchOutcome, optimistic_residual, recommend, run_beam};
pub use stats::{Stat, StatVector, UnknownStat};
pub use tuning::{BalancedPicks, TuningMode, TuningRow, TuningRows};

/// Errors surfaced by [`Solver`]. The search itself cannot fail; only
/// validation can.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolveError {
    #[error("invalid solve request: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid search settings: {0}")]
    Search(#[from] SearchConfigError),
}

/// Solver engine. Owns the search settings and the auto-tuning cache, so
/// repeated solves with similar inputs reuse derived tuning rows.
#[derive(Debug, Clone)]
pub struct Solver {
    search: SearchConfig,
    tuner: AutoTuner,
}

impl Default for Solver {
    fn default() -> Self {
        let search = SearchConfig::default();
        let tuner = AutoTuner::with_capacity(search.tuning_cache_capacity);
        Self { search, tuner }
    }
}

impl Solver {
    /// # Errors
    ///
    /// Returns [`SolveError::Search`] if the width schedule is invalid.
    pub fn new(search: SearchConfig) -> Result<Self, SolveError> {
        search.validate()?;
        let tuner = AutoTuner::with_capacity(search.tuning_cache_capacity);
        Ok(Self { search, tuner })
    }

    #[must_use]
    pub const fn search_config(&self) -> &SearchConfig {
        &self.search
    }

    #[must_use]
    pub const fn tuner(&self) -> &AutoTuner {
        &self.tuner
    }

    /// Validate `config` and recommend a loadout for it.
    ///
    /// An unreachable target set is not an error: the response carries the
    /// closest loadout found with `feasible` set to false.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::Config`] if `config` is out of range.
    pub fn solve(&mut self, config: &SolverConfiguration) -> Result<SolveResponse, SolveError> {
        config.validate()?;
        let fingerprint = config.fingerprint();
        log::debug!("solving request {fingerprint:016x}: targets {}", config.targets);

        let outcome = recommend(config, &self.search, &mut self.tuner);
        if !outcome.result.feasible {
            log::info!(
                "request {fingerprint:016x} infeasible at width {}; missing {}",
                outcome.width,
                outcome.result.totals_final.missing(&config.targets)
            );
        }

        let SearchOutcome {
            result,
            tuning_rows,
            width,
        } = outcome;
        Ok(SolveResponse {
            feasible: result.feasible,
            chosen_pieces: result.chosen_pieces,
            totals_final: result.totals_final,
            totals_raw: result.totals_raw,
            effective_tuning_rows: tuning_rows,
            beam_width: width,
            fingerprint,
        })
    }
}

/// Solve `config` with default search settings and a fresh cache.
///
/// # Errors
///
/// Returns [`SolveError::Config`] if `config` is out of range.
pub fn solve(config: &SolverConfiguration) -> Result<SolveResponse, SolveError> {
    Solver::default().solve(config)
}
