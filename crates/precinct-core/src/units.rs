//! Unit and rank catalog
//!
//! The department's sub-units (IAD, SWAT/SERT, USMS, ...) and the rank
//! ladder inside each of them. The catalog is fixed data: tier comparisons
//! are plain index comparisons over an ordered ladder, never a type
//! hierarchy.

use serde::{Deserialize, Serialize};

/// Authority tier inside a unit, in strictly increasing order.
///
/// `Member` is implicit (simply belonging to the unit) and has no rank id;
/// the three tiers above it each map to at most one rank per unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Plain membership, no additional rank
    Member,
    /// Deputy head of the unit
    Deputy,
    /// Head of the unit
    Commander,
    /// Unit curator (top authority; never granted through roster actions)
    Caretaker,
}

impl Tier {
    /// Numeric authority level of this tier (1..=4)
    #[must_use]
    pub fn level(self) -> u8 {
        match self {
            Self::Member => 1,
            Self::Deputy => 2,
            Self::Commander => 3,
            Self::Caretaker => 4,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Member => write!(f, "member"),
            Self::Deputy => write!(f, "deputy"),
            Self::Commander => write!(f, "commander"),
            Self::Caretaker => write!(f, "caretaker"),
        }
    }
}

/// A rank scoped to exactly one unit and one tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rank {
    /// Rank identifier (unique across the whole catalog)
    pub id: &'static str,
    /// Id of the unit this rank belongs to
    pub unit: &'static str,
    /// Authority tier of the rank
    pub tier: Tier,
    /// Display title
    pub title: &'static str,
}

/// A department sub-unit and its rank ladder
#[derive(Debug, Clone, Copy)]
pub struct Unit {
    /// Unit identifier
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Ranks above plain membership, ordered by ascending tier
    pub ladder: &'static [Rank],
}

impl Unit {
    /// Rank of the given tier, if this unit defines one
    #[must_use]
    pub fn rank_for_tier(&self, tier: Tier) -> Option<&'static Rank> {
        self.ladder.iter().find(|r| r.tier == tier)
    }

    /// Whether the given rank id belongs to this unit's ladder
    #[must_use]
    pub fn has_rank(&self, rank_id: &str) -> bool {
        self.ladder.iter().any(|r| r.id == rank_id)
    }
}

const IAD_LADDER: &[Rank] = &[
    Rank { id: "iad-deputy-head", unit: "iad", tier: Tier::Deputy, title: "IAD Deputy Head" },
    Rank { id: "iad-head", unit: "iad", tier: Tier::Commander, title: "IAD Head" },
    Rank { id: "iad-curator", unit: "iad", tier: Tier::Caretaker, title: "IAD Curator" },
];

const SWAT_LADDER: &[Rank] = &[
    Rank {
        id: "swat-deputy-commander",
        unit: "swat-sert",
        tier: Tier::Deputy,
        title: "SWAT Deputy Commander",
    },
    Rank { id: "swat-commander", unit: "swat-sert", tier: Tier::Commander, title: "SWAT Commander" },
    Rank { id: "swat-curator", unit: "swat-sert", tier: Tier::Caretaker, title: "SWAT Curator" },
];

const USMS_LADDER: &[Rank] = &[
    Rank { id: "usms-deputy-chief", unit: "usms", tier: Tier::Deputy, title: "USMS Deputy Chief" },
    Rank { id: "usms-chief", unit: "usms", tier: Tier::Commander, title: "USMS Chief" },
    Rank { id: "usms-curator", unit: "usms", tier: Tier::Caretaker, title: "USMS Curator" },
];

const DTU_LADDER: &[Rank] = &[
    Rank { id: "dtu-deputy-head", unit: "dtu", tier: Tier::Deputy, title: "DTU Deputy Head" },
    Rank { id: "dtu-head", unit: "dtu", tier: Tier::Commander, title: "DTU Head" },
    Rank { id: "dtu-curator", unit: "dtu", tier: Tier::Caretaker, title: "DTU Curator" },
];

const GU_LADDER: &[Rank] = &[
    Rank { id: "gu-deputy-head", unit: "gu", tier: Tier::Deputy, title: "Gang Unit Deputy Head" },
    Rank { id: "gu-head", unit: "gu", tier: Tier::Commander, title: "Gang Unit Head" },
    Rank { id: "gu-curator", unit: "gu", tier: Tier::Caretaker, title: "Gang Unit Curator" },
];

// FTD runs without a deputy tier.
const FTD_LADDER: &[Rank] = &[
    Rank { id: "ftd-head", unit: "ftd", tier: Tier::Commander, title: "FTD Head" },
    Rank { id: "ftd-curator", unit: "ftd", tier: Tier::Caretaker, title: "FTD Curator" },
];

const UNITS: &[Unit] = &[
    Unit { id: "iad", name: "Internal Affairs Division", ladder: IAD_LADDER },
    Unit { id: "swat-sert", name: "SWAT / SERT", ladder: SWAT_LADDER },
    Unit { id: "usms", name: "U.S. Marshals Service", ladder: USMS_LADDER },
    Unit { id: "dtu", name: "Drug Task Unit", ladder: DTU_LADDER },
    Unit { id: "gu", name: "Gang Unit", ladder: GU_LADDER },
    Unit { id: "ftd", name: "Field Training Division", ladder: FTD_LADDER },
];

/// Static catalog of all units and ranks
///
/// Cheap to copy; all lookups resolve into `'static` data.
#[derive(Debug, Clone, Copy, Default)]
pub struct Registry;

impl Registry {
    /// Create the builtin registry
    #[must_use]
    pub fn builtin() -> Self {
        Self
    }

    /// All units in catalog order
    #[must_use]
    pub fn units(&self) -> &'static [Unit] {
        UNITS
    }

    /// Look up a unit by id
    #[must_use]
    pub fn unit(&self, unit_id: &str) -> Option<&'static Unit> {
        UNITS.iter().find(|u| u.id == unit_id)
    }

    /// Look up a rank by id, anywhere in the catalog
    #[must_use]
    pub fn rank(&self, rank_id: &str) -> Option<&'static Rank> {
        UNITS.iter().flat_map(|u| u.ladder.iter()).find(|r| r.id == rank_id)
    }

    /// Unit owning the given rank id
    #[must_use]
    pub fn owner_of(&self, rank_id: &str) -> Option<&'static Unit> {
        self.rank(rank_id).and_then(|r| self.unit(r.unit))
    }
}
