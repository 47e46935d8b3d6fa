//! Stat identifiers and the fixed-width vector used for every total.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;
use thiserror::Error;

/// One of the six tracked armor stats, in canonical enumeration order.
///
/// The order matters: every tie between stats (balanced tuning, boost
/// targeting, auto-tuning candidates) resolves to the earlier variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Health,
    Melee,
    Grenade,
    Super,
    Class,
    Weapons,
}

impl Stat {
    pub const COUNT: usize = 6;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Health,
        Self::Melee,
        Self::Grenade,
        Self::Super,
        Self::Class,
        Self::Weapons,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Melee => "melee",
            Self::Grenade => "grenade",
            Self::Super => "super",
            Self::Class => "class",
            Self::Weapons => "weapons",
        }
    }

    /// Capitalized name used in boost and report labels.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Health => "Health",
            Self::Melee => "Melee",
            Self::Grenade => "Grenade",
            Self::Super => "Super",
            Self::Class => "Class",
            Self::Weapons => "Weapons",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown stat '{0}' (expected one of health, melee, grenade, super, class, weapons)")]
pub struct UnknownStat(pub String);

impl FromStr for Stat {
    type Err = UnknownStat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|stat| stat.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownStat(needle.to_string()))
    }
}

impl From<Stat> for String {
    fn from(value: Stat) -> Self {
        value.as_str().to_string()
    }
}

/// Integer value for each of the six stats.
///
/// Serialized as an object with one key per stat; keys missing on input read as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "StatMap", into = "StatMap")]
pub struct StatVector([i32; Stat::COUNT]);

impl StatVector {
    #[must_use]
    pub const fn zero() -> Self {
        Self([0; Stat::COUNT])
    }

    #[must_use]
    pub const fn splat(value: i32) -> Self {
        Self([value; Stat::COUNT])
    }

    #[must_use]
    pub fn from_pairs(pairs: &[(Stat, i32)]) -> Self {
        let mut out = Self::zero();
        for &(stat, value) in pairs {
            out[stat] = value;
        }
        out
    }

    #[must_use]
    pub const fn get(&self, stat: Stat) -> i32 {
        self.0[stat.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, i32)> + '_ {
        Stat::ALL.into_iter().map(|stat| (stat, self[stat]))
    }

    /// Element-wise sum capped from above. Used for armor accumulation where
    /// both operands are non-negative.
    #[must_use]
    pub fn clamp_add(&self, other: &Self, cap: i32) -> Self {
        let mut out = *self;
        for stat in Stat::ALL {
            out[stat] = (self[stat] + other[stat]).min(cap);
        }
        out
    }

    /// Element-wise sum clamped into `floor..=cap`.
    #[must_use]
    pub fn clamp_add_signed(&self, other: &Self, floor: i32, cap: i32) -> Self {
        let mut out = *self;
        for stat in Stat::ALL {
            out[stat] = (self[stat] + other[stat]).clamp(floor, cap);
        }
        out
    }

    /// Every stat raised to at least 0.
    #[must_use]
    pub fn floored(&self) -> Self {
        let mut out = *self;
        for value in &mut out.0 {
            *value = (*value).max(0);
        }
        out
    }

    /// Positive shortfall of `stat` against `targets`.
    #[must_use]
    pub fn deficit(&self, stat: Stat, targets: &Self) -> i32 {
        (targets[stat] - self[stat]).max(0)
    }

    /// Sum of squared positive shortfalls against `targets`.
    #[must_use]
    pub fn deficit_score(&self, targets: &Self) -> i64 {
        Stat::ALL
            .into_iter()
            .map(|stat| {
                let d = i64::from(self.deficit(stat, targets));
                d * d
            })
            .sum()
    }

    /// Sum of positive shortfalls against `targets`.
    #[must_use]
    pub fn missing(&self, targets: &Self) -> i32 {
        Stat::ALL
            .into_iter()
            .map(|stat| self.deficit(stat, targets))
            .sum()
    }

    #[must_use]
    pub fn meets(&self, targets: &Self) -> bool {
        Stat::ALL.into_iter().all(|stat| self[stat] >= targets[stat])
    }

    #[must_use]
    pub fn total(&self) -> i32 {
        self.0.iter().sum()
    }
}

impl Index<Stat> for StatVector {
    type Output = i32;

    fn index(&self, stat: Stat) -> &Self::Output {
        &self.0[stat.index()]
    }
}

impl IndexMut<Stat> for StatVector {
    fn index_mut(&mut self, stat: Stat) -> &mut Self::Output {
        &mut self.0[stat.index()]
    }
}

impl fmt::Display for StatVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (stat, value) in self.iter() {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "{stat}={value}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct StatMap {
    #[serde(default)]
    health: i32,
    #[serde(default)]
    melee: i32,
    #[serde(default)]
    grenade: i32,
    #[serde(default, rename = "super")]
    super_: i32,
    #[serde(default)]
    class: i32,
    #[serde(default)]
    weapons: i32,
}

impl From<StatMap> for StatVector {
    fn from(map: StatMap) -> Self {
        Self([
            map.health,
            map.melee,
            map.grenade,
            map.super_,
            map.class,
            map.weapons,
        ])
    }
}

impl From<StatVector> for StatMap {
    fn from(vector: StatVector) -> Self {
        Self {
            health: vector[Stat::Health],
            melee: vector[Stat::Melee],
            grenade: vector[Stat::Grenade],
            super_: vector[Stat::Super],
            class: vector[Stat::Class],
            weapons: vector[Stat::Weapons],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stats_case_insensitively() {
        assert_eq!("Weapons".parse::<Stat>(), Ok(Stat::Weapons));
        assert_eq!(" super ".parse::<Stat>(), Ok(Stat::Super));
        assert!("mobility".parse::<Stat>().is_err());
    }

    #[test]
    fn missing_keys_deserialize_as_zero() {
        let vector: StatVector = serde_json::from_str(r#"{"weapons": 40, "super": 5}"#).unwrap();
        assert_eq!(vector[Stat::Weapons], 40);
        assert_eq!(vector[Stat::Super], 5);
        assert_eq!(vector[Stat::Health], 0);

        let json = serde_json::to_value(vector).unwrap();
        assert_eq!(json["class"], 0);
        assert_eq!(json["super"], 5);
    }

    #[test]
    fn signed_clamp_respects_floor_and_cap() {
        let base = StatVector::from_pairs(&[(Stat::Health, 195), (Stat::Melee, -190)]);
        let delta = StatVector::from_pairs(&[(Stat::Health, 10), (Stat::Melee, -30)]);
        let out = base.clamp_add_signed(&delta, -200, 200);
        assert_eq!(out[Stat::Health], 200);
        assert_eq!(out[Stat::Melee], -200);

        let floored = base.clamp_add_signed(&delta, 0, 200);
        assert_eq!(floored[Stat::Melee], 0);
    }

    #[test]
    fn deficits_only_count_shortfalls() {
        let totals = StatVector::from_pairs(&[(Stat::Health, 50), (Stat::Class, 100)]);
        let targets = StatVector::from_pairs(&[(Stat::Health, 60), (Stat::Class, 80)]);
        assert_eq!(totals.missing(&targets), 10);
        assert_eq!(totals.deficit_score(&targets), 100);
        assert!(!totals.meets(&targets));
        assert!(totals.meets(&StatVector::zero()));
    }

    #[test]
    fn floored_clears_negatives_only() {
        let v = StatVector::from_pairs(&[(Stat::Grenade, -15), (Stat::Weapons, 20)]);
        let floored = v.floored();
        assert_eq!(floored[Stat::Grenade], 0);
        assert_eq!(floored[Stat::Weapons], 20);
    }
}
