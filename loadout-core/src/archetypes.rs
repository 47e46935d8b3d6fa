//! Armor archetype catalog.
//!
//! An archetype is the stat spread a piece rolls for a given set, tertiary
//! stat and tier. The catalog is computed once and shared read-only.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::constants::{
    CUSTOM_EXOTIC_NAME, EXOTIC_OTHER, EXOTIC_PRIMARY, EXOTIC_SECONDARY, EXOTIC_TERTIARY,
    LEGENDARY_OTHER, LEGENDARY_PRIMARY, LEGENDARY_SECONDARY, LEGENDARY_TERTIARY,
};
use crate::stats::{Stat, StatVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Legendary,
    Exotic,
}

impl Tier {
    #[must_use]
    pub const fn points(self) -> PointTable {
        match self {
            Self::Legendary => PointTable {
                primary: LEGENDARY_PRIMARY,
                secondary: LEGENDARY_SECONDARY,
                tertiary: LEGENDARY_TERTIARY,
                other: LEGENDARY_OTHER,
            },
            Self::Exotic => PointTable {
                primary: EXOTIC_PRIMARY,
                secondary: EXOTIC_SECONDARY,
                tertiary: EXOTIC_TERTIARY,
                other: EXOTIC_OTHER,
            },
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legendary => f.write_str("Legendary"),
            Self::Exotic => f.write_str("Exotic"),
        }
    }
}

/// Points a piece of a given tier places in each stat role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointTable {
    pub primary: i32,
    pub secondary: i32,
    pub tertiary: i32,
    pub other: i32,
}

impl PointTable {
    /// Sum of a full spread: three named roles plus three "other" stats.
    #[must_use]
    pub const fn spread_total(&self) -> i32 {
        self.primary + self.secondary + self.tertiary + 3 * self.other
    }
}

/// Armor set; fixes the primary and secondary stat of every piece in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArmorSet {
    Bulwark,
    Brawler,
    Grenadier,
    Paragon,
    Specialist,
    Gunner,
}

impl ArmorSet {
    pub const ALL: [Self; 6] = [
        Self::Bulwark,
        Self::Brawler,
        Self::Grenadier,
        Self::Paragon,
        Self::Specialist,
        Self::Gunner,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bulwark => "Bulwark",
            Self::Brawler => "Brawler",
            Self::Grenadier => "Grenadier",
            Self::Paragon => "Paragon",
            Self::Specialist => "Specialist",
            Self::Gunner => "Gunner",
        }
    }

    #[must_use]
    pub const fn primary(self) -> Stat {
        match self {
            Self::Bulwark => Stat::Health,
            Self::Brawler => Stat::Melee,
            Self::Grenadier => Stat::Grenade,
            Self::Paragon => Stat::Super,
            Self::Specialist => Stat::Class,
            Self::Gunner => Stat::Weapons,
        }
    }

    #[must_use]
    pub const fn secondary(self) -> Stat {
        match self {
            Self::Bulwark => Stat::Class,
            Self::Brawler => Stat::Health,
            Self::Grenadier => Stat::Super,
            Self::Paragon => Stat::Melee,
            Self::Specialist => Stat::Weapons,
            Self::Gunner => Stat::Grenade,
        }
    }

    /// Stats a piece of this set may roll as its tertiary.
    pub fn tertiary_options(self) -> impl Iterator<Item = Stat> {
        Stat::ALL
            .into_iter()
            .filter(move |&stat| stat != self.primary() && stat != self.secondary())
    }
}

/// Where an archetype's spread comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Origin {
    Catalog { set: ArmorSet, tertiary: Stat },
    /// A user-entered exotic replacing the catalog exotics.
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Archetype {
    pub tier: Tier,
    pub origin: Origin,
    pub vector: StatVector,
}

impl Archetype {
    #[must_use]
    pub fn new(tier: Tier, set: ArmorSet, tertiary: Stat) -> Self {
        let points = tier.points();
        let mut vector = StatVector::splat(points.other);
        vector[set.primary()] = points.primary;
        vector[set.secondary()] = points.secondary;
        vector[tertiary] = points.tertiary;
        Self {
            tier,
            origin: Origin::Catalog { set, tertiary },
            vector,
        }
    }

    #[must_use]
    pub const fn custom_exotic(vector: StatVector) -> Self {
        Self {
            tier: Tier::Exotic,
            origin: Origin::Custom,
            vector,
        }
    }

    #[must_use]
    pub const fn set_name(&self) -> &'static str {
        match self.origin {
            Origin::Catalog { set, .. } => set.name(),
            Origin::Custom => CUSTOM_EXOTIC_NAME,
        }
    }

    #[must_use]
    pub const fn tertiary(&self) -> Option<Stat> {
        match self.origin {
            Origin::Catalog { tertiary, .. } => Some(tertiary),
            Origin::Custom => None,
        }
    }

    #[must_use]
    pub const fn is_exotic(&self) -> bool {
        matches!(self.tier, Tier::Exotic)
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tertiary() {
            Some(tertiary) => write!(f, "{} {} ({tertiary})", self.tier, self.set_name()),
            None => write!(f, "{} {}", self.tier, self.set_name()),
        }
    }
}

/// Every archetype, split by tier. Entries are ordered set-major, then by
/// tertiary in stat enumeration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub legendary: Vec<Archetype>,
    pub exotic: Vec<Archetype>,
}

impl Catalog {
    #[must_use]
    pub fn build() -> Self {
        let mut legendary = Vec::new();
        let mut exotic = Vec::new();
        for set in ArmorSet::ALL {
            for tertiary in set.tertiary_options() {
                legendary.push(Archetype::new(Tier::Legendary, set, tertiary));
                exotic.push(Archetype::new(Tier::Exotic, set, tertiary));
            }
        }
        Self { legendary, exotic }
    }

    #[must_use]
    pub fn tier(&self, tier: Tier) -> &[Archetype] {
        match tier {
            Tier::Legendary => &self.legendary,
            Tier::Exotic => &self.exotic,
        }
    }
}

#[must_use]
pub fn catalog() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(Catalog::build)
}
