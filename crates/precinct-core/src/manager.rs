//! Roster management orchestration
//!
//! One request = one pass through: validate shape, resolve the unit, build
//! the caller's permission context, load the target, authorize, mutate,
//! persist-if-changed. Every stage fails fast with a distinct error; no
//! partial mutation is ever written. Reads and the single conditional write
//! are the only suspension points.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::auth::{AuthContext, Capability};
use crate::error::{Error, Result};
use crate::permissions::{authorize, ActorContext, PermissionLevel, RosterAction};
use crate::roster::store::{OfficerStore, RosterPatch};
use crate::units::{Registry, Unit};

/// Kind of roster change being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    /// Add the target to the unit
    AddMember,
    /// Remove the target from the unit
    RemoveMember,
    /// Grant a rank (requires `rank`)
    AssignRank,
    /// Revoke a rank (requires `rank`)
    RemoveRank,
}

/// Management request body
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ManageRequest {
    /// Officer the action applies to
    pub target_officer_id: String,
    /// Requested action
    pub action: ActionKind,
    /// Rank id, required for the rank actions
    #[serde(default)]
    pub rank: Option<String>,
}

/// Result of a management request
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ManageOutcome {
    /// Target officer id
    pub officer_id: String,
    /// Resulting membership set
    pub memberships: Vec<String>,
    /// Resulting rank set
    pub ranks: Vec<String>,
    /// Resulting legacy primary-rank projection
    pub primary_rank: Option<String>,
    /// Whether anything was written (false = requested state already held)
    pub changed: bool,
}

/// One officer's standing within a unit, for roster listings
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RosterEntry {
    /// Officer id
    pub officer_id: String,
    /// Derived permission level in the unit (0..=4)
    pub level: u8,
    /// Ranks held within the unit
    pub ranks: Vec<String>,
}

/// Full view of one officer across all units
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OfficerView {
    /// Officer id
    pub officer_id: String,
    /// Units the officer belongs to
    pub memberships: Vec<String>,
    /// All ranks held
    pub ranks: Vec<String>,
    /// Legacy primary-rank projection
    pub primary_rank: Option<String>,
    /// Derived level per membership unit
    pub levels: Vec<UnitLevel>,
}

/// Derived level within one unit
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UnitLevel {
    /// Unit id
    pub unit: String,
    /// Permission level 0..=4
    pub level: u8,
}

/// Catalog entry for the read surface
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UnitInfo {
    /// Unit id
    pub id: String,
    /// Display name
    pub name: String,
    /// Rank ladder above plain membership, ascending
    pub ladder: Vec<RankInfo>,
}

/// One rank in a unit's ladder
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RankInfo {
    /// Rank id
    pub id: String,
    /// Tier name
    pub tier: String,
    /// Display title
    pub title: String,
}

/// Orchestrates roster management against the registry and the store
pub struct RosterManager {
    registry: Registry,
    store: Arc<dyn OfficerStore>,
}

impl RosterManager {
    /// Create a manager over the builtin registry
    pub fn new(store: Arc<dyn OfficerStore>) -> Self {
        Self { registry: Registry::builtin(), store }
    }

    /// The unit/rank registry this manager evaluates against
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handle one management request for `unit_id` on behalf of `caller`
    pub async fn manage(
        &self,
        caller: &AuthContext,
        unit_id: &str,
        request: &ManageRequest,
    ) -> Result<ManageOutcome> {
        // Shape checks come before any authorization.
        if request.target_officer_id.trim().is_empty() {
            return Err(Error::InvalidRequest("target_officer_id is empty".to_string()));
        }
        let action = self.build_action(request)?;

        let unit = self
            .registry
            .unit(unit_id)
            .ok_or_else(|| Error::NotFound(format!("unit '{unit_id}'")))?;

        let actor = self.caller_context(caller, unit).await?;
        if actor.level < PermissionLevel::Deputy {
            warn!(
                caller = %caller.officer_id,
                unit = unit.id,
                level = actor.level.as_u8(),
                "management request below the unit's permission floor"
            );
            return Err(Error::Forbidden(crate::permissions::DenyReason::InsufficientLevel {
                required: PermissionLevel::Deputy,
            }));
        }

        let target = self
            .store
            .get(&request.target_officer_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("officer '{}'", request.target_officer_id)))?;
        let target_level = target.level_in(&self.registry, unit.id);

        if let Err(reason) = authorize(unit, &action, &actor, target_level) {
            warn!(
                caller = %caller.officer_id,
                target = %target.officer_id,
                unit = unit.id,
                action = action.name(),
                reason = reason.code(),
                "management action denied"
            );
            return Err(Error::Forbidden(reason));
        }

        let read_version = target.version;
        let mut updated = target;
        let changed = updated.apply(&self.registry, unit.id, &action);

        if changed {
            let patch = RosterPatch::from_record(&updated, read_version);
            self.store.patch(&updated.officer_id, &patch).await?;
            info!(
                caller = %caller.officer_id,
                target = %updated.officer_id,
                unit = unit.id,
                action = action.name(),
                "roster updated"
            );
        } else {
            debug!(
                target = %updated.officer_id,
                unit = unit.id,
                action = action.name(),
                "requested state already holds"
            );
        }

        Ok(ManageOutcome {
            officer_id: updated.officer_id,
            memberships: updated.memberships,
            ranks: updated.ranks,
            primary_rank: updated.primary_rank,
            changed,
        })
    }

    /// Unit catalog for the read surface
    #[must_use]
    pub fn catalog(&self) -> Vec<UnitInfo> {
        self.registry
            .units()
            .iter()
            .map(|unit| UnitInfo {
                id: unit.id.to_string(),
                name: unit.name.to_string(),
                ladder: unit
                    .ladder
                    .iter()
                    .map(|rank| RankInfo {
                        id: rank.id.to_string(),
                        tier: rank.tier.to_string(),
                        title: rank.title.to_string(),
                    })
                    .collect(),
            })
            .collect()
    }

    /// All members of a unit with their derived levels
    pub async fn unit_roster(&self, unit_id: &str) -> Result<Vec<RosterEntry>> {
        let unit = self
            .registry
            .unit(unit_id)
            .ok_or_else(|| Error::NotFound(format!("unit '{unit_id}'")))?;

        let mut entries: Vec<RosterEntry> = self
            .store
            .members_of(unit.id)
            .await?
            .into_iter()
            .map(|record| RosterEntry {
                level: record.level_in(&self.registry, unit.id).as_u8(),
                ranks: record.ranks_in(&self.registry, unit.id),
                officer_id: record.officer_id,
            })
            .collect();

        // Highest authority first, stable by id within a level.
        entries.sort_by(|a, b| b.level.cmp(&a.level).then(a.officer_id.cmp(&b.officer_id)));
        Ok(entries)
    }

    /// One officer's memberships, ranks and per-unit levels
    pub async fn officer(&self, officer_id: &str) -> Result<OfficerView> {
        let record = self
            .store
            .get(officer_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("officer '{officer_id}'")))?;

        let levels = record
            .memberships
            .iter()
            .map(|unit| UnitLevel {
                unit: unit.clone(),
                level: record.level_in(&self.registry, unit).as_u8(),
            })
            .collect();

        Ok(OfficerView {
            officer_id: record.officer_id,
            memberships: record.memberships,
            ranks: record.ranks,
            primary_rank: record.primary_rank,
            levels,
        })
    }

    /// Validate the request shape and turn it into a roster action
    ///
    /// A supplied rank id is resolved against the registry for every action
    /// kind, so an unrecognized rank is rejected even where none is needed.
    fn build_action(&self, request: &ManageRequest) -> Result<RosterAction> {
        let rank = request
            .rank
            .as_deref()
            .map(|rank_id| {
                self.registry
                    .rank(rank_id)
                    .ok_or_else(|| Error::InvalidRequest(format!("unrecognized rank '{rank_id}'")))
            })
            .transpose()?;

        match (request.action, rank) {
            (ActionKind::AddMember, _) => Ok(RosterAction::AddMember),
            (ActionKind::RemoveMember, _) => Ok(RosterAction::RemoveMember),
            (ActionKind::AssignRank, Some(rank)) => Ok(RosterAction::AssignRank(rank)),
            (ActionKind::RemoveRank, Some(rank)) => Ok(RosterAction::RemoveRank(rank)),
            (ActionKind::AssignRank | ActionKind::RemoveRank, None) => {
                Err(Error::InvalidRequest("rank is required for rank actions".to_string()))
            }
        }
    }

    /// Build the caller's permission context for `unit`
    ///
    /// High command is checked before any per-unit evaluation and never
    /// flows through the officer's own record; a caller without the
    /// capability and without a record simply evaluates to level 0.
    async fn caller_context(&self, caller: &AuthContext, unit: &'static Unit) -> Result<ActorContext> {
        if caller.has_capability(Capability::HighCommand) {
            debug!(caller = %caller.officer_id, unit = unit.id, "high-command bypass");
            return Ok(ActorContext::high_command(unit));
        }

        let record = self.store.get(&caller.officer_id).await?;
        Ok(match record {
            Some(record) => ActorContext::for_officer(
                &self.registry,
                unit,
                &record.memberships,
                &record.ranks,
            ),
            None => ActorContext::for_officer(&self.registry, unit, &[], &[]),
        })
    }

    /// Underlying officer store (provisioning and health checks)
    #[must_use]
    pub fn store(&self) -> &Arc<dyn OfficerStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests;
