//! Centralized balance and search constants for the loadout solver.
//!
//! These values define the deterministic math for stat totals. Requests can
//! only choose targets and inputs within the ranges declared here.

// Stat limits --------------------------------------------------------------
/// Upper bound for a requested target on any stat.
pub const TARGET_MAX: i32 = 200;
/// Per-stat cap on the sum of armor piece contributions.
pub const ARMOR_CAP: i32 = 150;
/// Most a single piece can contribute to one stat; bounds custom exotics.
pub const PER_PIECE_MAX: i32 = 45;
/// Per-stat cap on the final total (armor + tuning + fragments + boosts).
pub const TOTAL_CAP: i32 = 200;
/// Fragments adjust a stat by at most this much in either direction.
pub const FRAGMENT_RANGE: i32 = 30;
/// Fragments move in increments of this size.
pub const FRAGMENT_STEP: i32 = 10;

// Loadout shape ------------------------------------------------------------
/// Pieces in a loadout: one exotic plus four legendaries.
pub const NUM_PIECES: usize = 5;
/// Boost slots, one per piece.
pub const BOOST_SLOTS: usize = NUM_PIECES;
/// Tuning rows available on a loadout.
pub const TUNING_SLOTS: usize = 4;

// Adjustment sizes ---------------------------------------------------------
/// Magnitude of a general tuning row's plus and minus.
pub const TUNING_STEP: i32 = 5;
/// Balanced tuning raises this many of the lowest stats.
pub const BALANCED_PICKS: usize = 3;
/// Per-stat increment of a balanced tuning row.
pub const BALANCED_STEP: i32 = 1;
pub const MAJOR_BOOST: i32 = 10;
pub const MINOR_BOOST: i32 = 5;

// Archetype point tables ---------------------------------------------------
pub const LEGENDARY_PRIMARY: i32 = 30;
pub const LEGENDARY_SECONDARY: i32 = 25;
pub const LEGENDARY_TERTIARY: i32 = 20;
pub const LEGENDARY_OTHER: i32 = 5;
pub const EXOTIC_PRIMARY: i32 = 30;
pub const EXOTIC_SECONDARY: i32 = 20;
pub const EXOTIC_TERTIARY: i32 = 12;
pub const EXOTIC_OTHER: i32 = 5;

// Search -------------------------------------------------------------------
/// Best-case contribution assumed for each empty slot when scoring partial paths.
pub const OPTIMISTIC_SLOT_BONUS: i32 = 30;
/// Weight of the squared raw-armor deficit used to stabilise beam ordering.
pub const TIE_BREAK_WEIGHT: f64 = 1e-6;
/// Beam widths tried in order until a feasible loadout is found.
pub const DEFAULT_BEAM_WIDTHS: [usize; 3] = [800, 2_000, 4_000];
/// Entries retained by the auto-tuning cache.
pub const DEFAULT_TUNING_CACHE_CAPACITY: usize = 64;
/// Display name of the user-supplied exotic.
pub const CUSTOM_EXOTIC_NAME: &str = "Custom Exotic";
