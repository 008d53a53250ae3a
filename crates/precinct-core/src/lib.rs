//! Precinct Core - roster and rank-permission engine
//!
//! This crate provides the decision logic and storage boundary for the
//! Precinct roster service:
//! - Units: the fixed catalog of sub-units and their rank ladders
//! - Permissions: derived permission levels and action authorization
//! - Roster: officer records, the mutator, and the store backends
//! - Manager: per-request orchestration over the pieces above
//! - Auth: credential resolution to an officer identity

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod error;
pub mod manager;
pub mod permissions;
pub mod roster;
pub mod units;

pub use auth::{ApiKeyInfo, AuthContext, AuthError, AuthStore, Capability};
pub use error::{Error, Result};
pub use manager::{
    ActionKind, ManageOutcome, ManageRequest, OfficerView, RankInfo, RosterEntry, RosterManager,
    UnitInfo, UnitLevel,
};
pub use permissions::{
    authorize, manageable_ranks, permission_level, ActorContext, DenyReason, PermissionLevel,
    RosterAction,
};
pub use roster::store::{MemoryOfficerStore, OfficerStore, RosterPatch, SqliteOfficerStore};
pub use roster::OfficerRecord;
pub use units::{Rank, Registry, Tier, Unit};
