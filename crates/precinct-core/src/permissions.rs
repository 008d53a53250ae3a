//! Permission evaluator
//!
//! Pure decision logic for unit management: how much authority an officer
//! has inside a unit, which ranks they may administer, and whether a
//! requested roster action is allowed. Nothing here mutates state or does
//! I/O; levels are always derived from the membership/rank sets, never
//! stored.

use serde::{Deserialize, Serialize};

use crate::units::{Rank, Registry, Tier, Unit};

/// Derived authority level of an officer within one unit (0..=4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    /// No relation to the unit
    None,
    /// Member without additional rank
    Member,
    /// Holds the unit's deputy rank
    Deputy,
    /// Holds the unit's commander rank
    Commander,
    /// Holds the unit's caretaker rank
    Caretaker,
}

impl PermissionLevel {
    /// Numeric value 0..=4
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Member => 1,
            Self::Deputy => 2,
            Self::Commander => 3,
            Self::Caretaker => 4,
        }
    }

    fn from_tier(tier: Tier) -> Self {
        match tier {
            Tier::Member => Self::Member,
            Tier::Deputy => Self::Deputy,
            Tier::Commander => Self::Commander,
            Tier::Caretaker => Self::Caretaker,
        }
    }
}

impl std::fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Why a roster action was denied
///
/// Reasons are stable and user-facing; callers surface them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DenyReason {
    /// Actor's level in the unit is below the action's floor
    #[error("insufficient level: requires level {} or higher", required.as_u8())]
    InsufficientLevel {
        /// Minimum level the action requires
        required: PermissionLevel,
    },

    /// Target holds a level equal to or above the actor's
    #[error("target outranks or equals you")]
    TargetNotSubordinate,

    /// The rank exists but belongs to a different unit
    #[error("rank does not belong to this unit")]
    RankNotInUnit,

    /// Caretaker ranks are never granted or revoked through roster actions
    #[error("caretaker rank is not assignable here")]
    CaretakerReserved,

    /// The rank's tier is not below the actor's own tier in the unit
    #[error("rank is outside your manageable tiers")]
    RankNotManageable,
}

impl DenyReason {
    /// Stable machine-readable code for this denial
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientLevel { .. } => "insufficient_level",
            Self::TargetNotSubordinate => "target_not_subordinate",
            Self::RankNotInUnit => "rank_not_in_unit",
            Self::CaretakerReserved => "caretaker_reserved",
            Self::RankNotManageable => "rank_not_manageable",
        }
    }
}

/// A requested change to a target officer's standing in one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterAction {
    /// Add the target to the unit
    AddMember,
    /// Remove the target from the unit (cascades their unit ranks)
    RemoveMember,
    /// Grant the rank to the target (implies membership)
    AssignRank(&'static Rank),
    /// Revoke the rank from the target (membership stays)
    RemoveRank(&'static Rank),
}

impl RosterAction {
    /// Short action name for logs
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddMember => "add-member",
            Self::RemoveMember => "remove-member",
            Self::AssignRank(_) => "assign-rank",
            Self::RemoveRank(_) => "remove-rank",
        }
    }
}

/// Compute an officer's permission level within `unit_id`
///
/// Returns `None` (0) when the unit is unknown or the officer has no
/// relation to it. Holding a higher-tier rank wins regardless of lower
/// ranks also held.
#[must_use]
pub fn permission_level(
    registry: &Registry,
    unit_id: &str,
    memberships: &[String],
    ranks: &[String],
) -> PermissionLevel {
    let Some(unit) = registry.unit(unit_id) else {
        return PermissionLevel::None;
    };

    let best_rank = unit
        .ladder
        .iter()
        .filter(|r| ranks.iter().any(|held| held == r.id))
        .map(|r| r.tier)
        .max();

    match best_rank {
        Some(tier) => PermissionLevel::from_tier(tier),
        None if memberships.iter().any(|m| m == unit.id) => PermissionLevel::Member,
        None => PermissionLevel::None,
    }
}

/// Ranks of `unit` strictly below the actor's own highest tier there
///
/// Plain members (no rank in the unit) manage nothing. This is the strict
/// hierarchical delegation rule: an actor only administers tiers beneath
/// their own.
#[must_use]
pub fn manageable_ranks(unit: &'static Unit, actor_ranks: &[String]) -> Vec<&'static Rank> {
    let own_tier = unit
        .ladder
        .iter()
        .filter(|r| actor_ranks.iter().any(|held| held == r.id))
        .map(|r| r.tier)
        .max();

    match own_tier {
        Some(tier) => unit.ladder.iter().filter(|r| r.tier < tier).collect(),
        None => Vec::new(),
    }
}

/// The acting officer's standing for one evaluation
#[derive(Debug, Clone)]
pub struct ActorContext {
    /// Actor's level in the unit under management
    pub level: PermissionLevel,
    /// Ranks the actor may administer in that unit
    pub manageable: Vec<&'static Rank>,
}

impl ActorContext {
    /// Build the context for an ordinary officer from their record sets
    #[must_use]
    pub fn for_officer(
        registry: &Registry,
        unit: &'static Unit,
        memberships: &[String],
        ranks: &[String],
    ) -> Self {
        Self {
            level: permission_level(registry, unit.id, memberships, ranks),
            manageable: manageable_ranks(unit, ranks),
        }
    }

    /// Context for an organization-wide high-command caller
    ///
    /// Bypasses the per-unit membership check: full level and the whole
    /// ladder as manageable set. The capability itself lives in the auth
    /// store and is never grantable through roster actions.
    #[must_use]
    pub fn high_command(unit: &'static Unit) -> Self {
        Self {
            level: PermissionLevel::Caretaker,
            manageable: unit.ladder.iter().collect(),
        }
    }

    fn can_manage(&self, rank: &Rank) -> bool {
        self.manageable.iter().any(|r| r.id == rank.id)
    }
}

/// Decide whether `actor` may perform `action` on a target at `target_level`
///
/// Rules are evaluated in a fixed order so every denial carries the most
/// specific reason. Success here says nothing about whether the mutation
/// will change anything; "already in the requested state" is the mutator's
/// no-op case, never a denial.
pub fn authorize(
    unit: &'static Unit,
    action: &RosterAction,
    actor: &ActorContext,
    target_level: PermissionLevel,
) -> Result<(), DenyReason> {
    match action {
        RosterAction::AddMember => {
            require_level(actor, PermissionLevel::Deputy)?;
            Ok(())
        }
        RosterAction::RemoveMember => {
            require_level(actor, PermissionLevel::Commander)?;
            require_subordinate(actor, target_level)?;
            Ok(())
        }
        RosterAction::AssignRank(rank) => {
            if rank.unit != unit.id {
                return Err(DenyReason::RankNotInUnit);
            }
            if rank.tier == Tier::Caretaker {
                return Err(DenyReason::CaretakerReserved);
            }
            if !actor.can_manage(rank) {
                return Err(DenyReason::RankNotManageable);
            }
            match rank.tier {
                Tier::Deputy => require_level(actor, PermissionLevel::Commander)?,
                Tier::Commander => require_level(actor, PermissionLevel::Caretaker)?,
                // Unreachable through the builtin catalog; ladders hold no
                // member-tier ranks and caretaker bailed above.
                Tier::Member | Tier::Caretaker => return Err(DenyReason::RankNotManageable),
            }
            Ok(())
        }
        RosterAction::RemoveRank(rank) => {
            if rank.unit != unit.id {
                return Err(DenyReason::RankNotInUnit);
            }
            match rank.tier {
                Tier::Caretaker => Err(DenyReason::CaretakerReserved),
                Tier::Commander => {
                    require_level(actor, PermissionLevel::Caretaker)?;
                    require_subordinate(actor, target_level)?;
                    Ok(())
                }
                Tier::Deputy => {
                    require_level(actor, PermissionLevel::Commander)?;
                    Ok(())
                }
                Tier::Member => Err(DenyReason::RankNotInUnit),
            }
        }
    }
}

fn require_level(actor: &ActorContext, required: PermissionLevel) -> Result<(), DenyReason> {
    if actor.level >= required {
        Ok(())
    } else {
        Err(DenyReason::InsufficientLevel { required })
    }
}

fn require_subordinate(
    actor: &ActorContext,
    target_level: PermissionLevel,
) -> Result<(), DenyReason> {
    if target_level < actor.level {
        Ok(())
    } else {
        Err(DenyReason::TargetNotSubordinate)
    }
}
