//! Officer records and the roster mutator
//!
//! An [`OfficerRecord`] holds one person's unit memberships and additional
//! ranks. All mutation goes through [`OfficerRecord::apply`], which runs
//! only after the evaluator has allowed the action and enforces the two
//! structural invariants: no duplicates, and no rank held without
//! membership in its owning unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::permissions::{permission_level, PermissionLevel, RosterAction};
use crate::units::Registry;

pub mod store;

/// One officer's roster state
///
/// `ranks` keeps insertion order so the legacy `primary_rank` projection
/// stays "first rank ever held that is still held". `version` is the
/// optimistic-concurrency token checked by the store on every patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfficerRecord {
    /// Identity id from the external identity provider
    pub officer_id: String,
    /// Units the officer belongs to (no duplicates)
    pub memberships: Vec<String>,
    /// Additional ranks held (no duplicates, insertion-ordered)
    pub ranks: Vec<String>,
    /// Legacy compatibility projection: first held rank, if any
    pub primary_rank: Option<String>,
    /// Optimistic-concurrency token, bumped by the store on every write
    pub version: i64,
    /// Last modification marker
    pub updated_at: DateTime<Utc>,
}

impl OfficerRecord {
    /// Fresh record with no memberships or ranks
    #[must_use]
    pub fn new(officer_id: impl Into<String>) -> Self {
        Self {
            officer_id: officer_id.into(),
            memberships: Vec::new(),
            ranks: Vec::new(),
            primary_rank: None,
            version: 0,
            updated_at: Utc::now(),
        }
    }

    /// Derived permission level of this officer within `unit_id`
    #[must_use]
    pub fn level_in(&self, registry: &Registry, unit_id: &str) -> PermissionLevel {
        permission_level(registry, unit_id, &self.memberships, &self.ranks)
    }

    /// Ranks this officer holds that belong to `unit_id`
    #[must_use]
    pub fn ranks_in(&self, registry: &Registry, unit_id: &str) -> Vec<String> {
        self.ranks
            .iter()
            .filter(|r| registry.rank(r).is_some_and(|rank| rank.unit == unit_id))
            .cloned()
            .collect()
    }

    /// Apply an already-authorized action, returning whether anything changed
    ///
    /// Idempotent: re-applying the same action leaves the record untouched
    /// and reports `false`, which callers use to skip persistence.
    pub fn apply(&mut self, registry: &Registry, unit_id: &str, action: &RosterAction) -> bool {
        let changed = match action {
            RosterAction::AddMember => self.insert_membership(unit_id),
            RosterAction::RemoveMember => {
                let was_member = self.remove_membership(unit_id);
                // Cascade: a non-member cannot keep the unit's ranks.
                let before = self.ranks.len();
                self.ranks
                    .retain(|r| !registry.rank(r).is_some_and(|rank| rank.unit == unit_id));
                was_member || self.ranks.len() != before
            }
            RosterAction::AssignRank(rank) => {
                // Membership in the owning unit is implied by the rank.
                let joined = self.insert_membership(rank.unit);
                let granted = if self.ranks.iter().any(|r| r == rank.id) {
                    false
                } else {
                    self.ranks.push(rank.id.to_string());
                    true
                };
                joined || granted
            }
            RosterAction::RemoveRank(rank) => {
                let before = self.ranks.len();
                self.ranks.retain(|r| r != rank.id);
                self.ranks.len() != before
            }
        };

        if changed {
            self.primary_rank = self.ranks.first().cloned();
            self.updated_at = Utc::now();
        }
        changed
    }

    fn insert_membership(&mut self, unit_id: &str) -> bool {
        if self.memberships.iter().any(|m| m == unit_id) {
            false
        } else {
            self.memberships.push(unit_id.to_string());
            true
        }
    }

    fn remove_membership(&mut self, unit_id: &str) -> bool {
        let before = self.memberships.len();
        self.memberships.retain(|m| m != unit_id);
        self.memberships.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::RosterAction;

    fn registry() -> Registry {
        Registry::builtin()
    }

    fn record_with(memberships: &[&str], ranks: &[&str]) -> OfficerRecord {
        let mut record = OfficerRecord::new("officer-1");
        record.memberships = memberships.iter().map(|s| (*s).to_string()).collect();
        record.ranks = ranks.iter().map(|s| (*s).to_string()).collect();
        record.primary_rank = record.ranks.first().cloned();
        record
    }

    #[test]
    fn test_add_member() {
        // Scenario A: empty record gains membership, no ranks.
        let mut record = OfficerRecord::new("x");
        let changed = record.apply(&registry(), "iad", &RosterAction::AddMember);
        assert!(changed);
        assert_eq!(record.memberships, vec!["iad"]);
        assert!(record.ranks.is_empty());
        assert!(record.primary_rank.is_none());
    }

    #[test]
    fn test_add_member_idempotent() {
        let mut record = OfficerRecord::new("x");
        assert!(record.apply(&registry(), "iad", &RosterAction::AddMember));
        assert!(!record.apply(&registry(), "iad", &RosterAction::AddMember));
        assert_eq!(record.memberships, vec!["iad"]);
    }

    #[test]
    fn test_remove_member_cascades_unit_ranks() {
        let registry = registry();
        let mut record =
            record_with(&["iad", "gu"], &["iad-deputy-head", "gu-head", "iad-head"]);

        let changed = record.apply(&registry, "iad", &RosterAction::RemoveMember);
        assert!(changed);
        assert_eq!(record.memberships, vec!["gu"]);
        assert_eq!(record.ranks, vec!["gu-head"]);
        assert_eq!(record.primary_rank.as_deref(), Some("gu-head"));
    }

    #[test]
    fn test_remove_member_of_non_member_is_noop() {
        let mut record = record_with(&["gu"], &["gu-head"]);
        let changed = record.apply(&registry(), "iad", &RosterAction::RemoveMember);
        assert!(!changed);
    }

    #[test]
    fn test_assign_rank_auto_membership() {
        let registry = registry();
        let deputy = registry.rank("iad-deputy-head").unwrap();

        let mut record = OfficerRecord::new("x");
        let changed = record.apply(&registry, "iad", &RosterAction::AssignRank(deputy));
        assert!(changed);
        assert_eq!(record.memberships, vec!["iad"]);
        assert_eq!(record.ranks, vec!["iad-deputy-head"]);
        assert_eq!(record.primary_rank.as_deref(), Some("iad-deputy-head"));
    }

    #[test]
    fn test_assign_rank_idempotent() {
        let registry = registry();
        let deputy = registry.rank("iad-deputy-head").unwrap();

        let mut record = OfficerRecord::new("x");
        assert!(record.apply(&registry, "iad", &RosterAction::AssignRank(deputy)));
        assert!(!record.apply(&registry, "iad", &RosterAction::AssignRank(deputy)));
        assert_eq!(record.ranks.len(), 1);
    }

    #[test]
    fn test_remove_rank_keeps_membership() {
        let registry = registry();
        let deputy = registry.rank("iad-deputy-head").unwrap();
        let mut record = record_with(&["iad"], &["iad-deputy-head"]);

        let changed = record.apply(&registry, "iad", &RosterAction::RemoveRank(deputy));
        assert!(changed);
        assert_eq!(record.memberships, vec!["iad"]);
        assert!(record.ranks.is_empty());
        assert!(record.primary_rank.is_none());

        // Removing again is a no-op.
        assert!(!record.apply(&registry, "iad", &RosterAction::RemoveRank(deputy)));
    }

    #[test]
    fn test_primary_rank_tracks_insertion_order() {
        let registry = registry();
        let deputy = registry.rank("iad-deputy-head").unwrap();
        let gu_head = registry.rank("gu-head").unwrap();

        let mut record = OfficerRecord::new("x");
        record.apply(&registry, "iad", &RosterAction::AssignRank(deputy));
        record.apply(&registry, "gu", &RosterAction::AssignRank(gu_head));
        assert_eq!(record.primary_rank.as_deref(), Some("iad-deputy-head"));

        record.apply(&registry, "iad", &RosterAction::RemoveRank(deputy));
        assert_eq!(record.primary_rank.as_deref(), Some("gu-head"));
    }

    #[test]
    fn test_ranks_in_unit() {
        let record = record_with(&["iad", "gu"], &["iad-deputy-head", "gu-head"]);
        assert_eq!(record.ranks_in(&registry(), "iad"), vec!["iad-deputy-head"]);
        assert_eq!(record.ranks_in(&registry(), "gu"), vec!["gu-head"]);
        assert!(record.ranks_in(&registry(), "usms").is_empty());
    }
}
