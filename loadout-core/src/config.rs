//! Solve requests and search settings.
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use thiserror::Error;
use twox_hash::XxHash64;

use crate::archetypes::Archetype;
use crate::boosts::SlotBudget;
use crate::constants::{
    DEFAULT_BEAM_WIDTHS, DEFAULT_TUNING_CACHE_CAPACITY, FRAGMENT_RANGE, FRAGMENT_STEP, NUM_PIECES,
    PER_PIECE_MAX, TARGET_MAX, TUNING_SLOTS,
};
use crate::stats::{Stat, StatVector};
use crate::tuning::TuningRows;

const FINGERPRINT_SEED: u64 = 0x4C4F_4144_4F55_5400;

/// How tuning rows are chosen for a solve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TuningPlan {
    /// Use these rows as given (padded to four with no-op rows).
    Manual {
        #[serde(default)]
        rows: TuningRows,
    },
    /// Derive general rows per candidate loadout.
    Auto {
        #[serde(default)]
        least_favored: Option<Stat>,
    },
}

impl Default for TuningPlan {
    fn default() -> Self {
        Self::Auto {
            least_favored: None,
        }
    }
}

impl TuningPlan {
    #[must_use]
    pub const fn is_auto(&self) -> bool {
        matches!(self, Self::Auto { .. })
    }

    #[must_use]
    pub const fn least_favored(&self) -> Option<Stat> {
        match self {
            Self::Auto { least_favored } => *least_favored,
            Self::Manual { .. } => None,
        }
    }
}

/// A user-entered exotic that replaces every catalog exotic when enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CustomOverride {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub vector: StatVector,
}

impl CustomOverride {
    #[must_use]
    pub const fn enabled(vector: StatVector) -> Self {
        Self {
            enabled: true,
            vector,
        }
    }

    /// The exotic archetype to use, if the override is active.
    #[must_use]
    pub const fn archetype(&self) -> Option<Archetype> {
        if self.enabled {
            Some(Archetype::custom_exotic(self.vector))
        } else {
            None
        }
    }
}

/// Immutable snapshot of everything a solve depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SolverConfiguration {
    #[serde(default)]
    pub targets: StatVector,
    #[serde(default)]
    pub fragments: StatVector,
    #[serde(default)]
    pub tuning: TuningPlan,
    /// Boost slots restricted to minor boosts; the rest take majors.
    #[serde(default)]
    pub minor_slots: usize,
    #[serde(default)]
    pub custom_exotic: CustomOverride,
}

impl SolverConfiguration {
    #[must_use]
    pub fn with_targets(targets: StatVector) -> Self {
        Self {
            targets,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn major_slots(&self) -> usize {
        NUM_PIECES.saturating_sub(self.minor_slots)
    }

    #[must_use]
    pub fn budget(&self) -> SlotBudget {
        SlotBudget::from_minor(self.minor_slots)
    }

    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a configuration.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// 64-bit identity of this configuration, for deduplicating identical
    /// requests. Equal configurations always share a fingerprint; values are
    /// not meant to be persisted across builds.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(FINGERPRINT_SEED);
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Check every field against its documented range.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (stat, value) in self.targets.iter() {
            if !(0..=TARGET_MAX).contains(&value) {
                return Err(ConfigError::TargetOutOfRange { stat, value });
            }
        }
        for (stat, value) in self.fragments.iter() {
            if !(-FRAGMENT_RANGE..=FRAGMENT_RANGE).contains(&value) {
                return Err(ConfigError::FragmentOutOfRange { stat, value });
            }
            if value % FRAGMENT_STEP != 0 {
                return Err(ConfigError::FragmentStep { stat, value });
            }
        }
        if self.minor_slots > NUM_PIECES {
            return Err(ConfigError::MinorSlotsOutOfRange(self.minor_slots));
        }
        if let TuningPlan::Manual { rows } = &self.tuning {
            if rows.len() > TUNING_SLOTS {
                return Err(ConfigError::TooManyTuningRows(rows.len()));
            }
            if let Some(index) = rows
                .iter()
                .position(|row| row.is_balanced() && (row.plus.is_some() || row.minus.is_some()))
            {
                return Err(ConfigError::BalancedRowWithStats { index });
            }
        }
        if self.custom_exotic.enabled {
            for (stat, value) in self.custom_exotic.vector.iter() {
                if !(0..=PER_PIECE_MAX).contains(&value) {
                    return Err(ConfigError::CustomExoticOutOfRange { stat, value });
                }
            }
        }
        Ok(())
    }
}

/// Errors raised when a solve request falls outside its documented ranges.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("target for {stat} must be between 0 and {TARGET_MAX} (got {value})")]
    TargetOutOfRange { stat: Stat, value: i32 },
    #[error("fragment for {stat} must be between -{FRAGMENT_RANGE} and {FRAGMENT_RANGE} (got {value})")]
    FragmentOutOfRange { stat: Stat, value: i32 },
    #[error("fragment for {stat} must be a multiple of {FRAGMENT_STEP} (got {value})")]
    FragmentStep { stat: Stat, value: i32 },
    #[error("minor slots must be between 0 and {NUM_PIECES} (got {0})")]
    MinorSlotsOutOfRange(usize),
    #[error("at most {TUNING_SLOTS} tuning rows are allowed (got {0})")]
    TooManyTuningRows(usize),
    #[error("balanced tuning row {index} must not name a plus or minus stat")]
    BalancedRowWithStats { index: usize },
    #[error("custom exotic {stat} must be between 0 and {PER_PIECE_MAX} (got {value})")]
    CustomExoticOutOfRange { stat: Stat, value: i32 },
}

/// Search quality settings, independent of any single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Widths tried in order; the first width that yields a feasible loadout wins.
    #[serde(default = "SearchConfig::default_beam_widths")]
    pub beam_widths: Vec<usize>,
    #[serde(default = "SearchConfig::default_tuning_cache_capacity")]
    pub tuning_cache_capacity: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            beam_widths: Self::default_beam_widths(),
            tuning_cache_capacity: Self::default_tuning_cache_capacity(),
        }
    }
}

impl SearchConfig {
    fn default_beam_widths() -> Vec<usize> {
        DEFAULT_BEAM_WIDTHS.to_vec()
    }

    const fn default_tuning_cache_capacity() -> usize {
        DEFAULT_TUNING_CACHE_CAPACITY
    }

    #[must_use]
    pub fn with_beam_widths(widths: &[usize]) -> Self {
        Self {
            beam_widths: widths.to_vec(),
            ..Self::default()
        }
    }

    /// Parse search settings from JSON; omitted fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// # Errors
    ///
    /// Returns an error if the width schedule is empty, contains a zero, or
    /// does not strictly increase.
    pub fn validate(&self) -> Result<(), SearchConfigError> {
        if self.beam_widths.is_empty() {
            return Err(SearchConfigError::NoBeamWidths);
        }
        if self.beam_widths.contains(&0) {
            return Err(SearchConfigError::ZeroWidth);
        }
        if let Some(pair) = self.beam_widths.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(SearchConfigError::NotAscending {
                previous: pair[0],
                next: pair[1],
            });
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchConfigError {
    #[error("at least one beam width is required")]
    NoBeamWidths,
    #[error("beam widths must be positive")]
    ZeroWidth,
    #[error("beam widths must increase (got {previous} then {next})")]
    NotAscending { previous: usize, next: usize },
}
