use std::sync::Arc;

use super::*;
use crate::roster::store::MemoryOfficerStore;
use crate::roster::OfficerRecord;

fn manager() -> RosterManager {
    RosterManager::new(Arc::new(MemoryOfficerStore::new()))
}

async fn seed(manager: &RosterManager, id: &str, memberships: &[&str], ranks: &[&str]) {
    let mut record = OfficerRecord::new(id);
    record.memberships = memberships.iter().map(|s| (*s).to_string()).collect();
    record.ranks = ranks.iter().map(|s| (*s).to_string()).collect();
    record.primary_rank = record.ranks.first().cloned();
    manager.store().put(&record).await.unwrap();
}

fn request(target: &str, action: ActionKind, rank: Option<&str>) -> ManageRequest {
    ManageRequest {
        target_officer_id: target.to_string(),
        action,
        rank: rank.map(str::to_string),
    }
}

#[tokio::test]
async fn test_scenario_a_commander_adds_member() {
    let manager = manager();
    seed(&manager, "actor", &["iad"], &["iad-head"]).await;
    seed(&manager, "x", &[], &[]).await;

    let outcome = manager
        .manage(
            &AuthContext::officer("actor"),
            "iad",
            &request("x", ActionKind::AddMember, None),
        )
        .await
        .unwrap();

    assert!(outcome.changed);
    assert_eq!(outcome.memberships, vec!["iad"]);
    assert!(outcome.ranks.is_empty());

    let stored = manager.store().get("x").await.unwrap().unwrap();
    assert_eq!(stored.memberships, vec!["iad"]);
    assert_eq!(stored.version, 1);
}

#[tokio::test]
async fn test_scenario_b_commander_removes_deputy() {
    let manager = manager();
    seed(&manager, "actor", &["iad"], &["iad-head"]).await;
    seed(&manager, "x", &["iad"], &["iad-deputy-head"]).await;

    let outcome = manager
        .manage(
            &AuthContext::officer("actor"),
            "iad",
            &request("x", ActionKind::RemoveMember, None),
        )
        .await
        .unwrap();

    assert!(outcome.changed);
    assert!(outcome.memberships.is_empty());
    assert!(outcome.ranks.is_empty());
    assert!(outcome.primary_rank.is_none());
}

#[tokio::test]
async fn test_remove_member_peer_denied() {
    let manager = manager();
    seed(&manager, "actor", &["iad"], &["iad-head"]).await;
    seed(&manager, "x", &["iad"], &["iad-head"]).await;

    let err = manager
        .manage(
            &AuthContext::officer("actor"),
            "iad",
            &request("x", ActionKind::RemoveMember, None),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), "target_not_subordinate");

    // Nothing was written.
    let stored = manager.store().get("x").await.unwrap().unwrap();
    assert_eq!(stored.version, 0);
    assert_eq!(stored.memberships, vec!["iad"]);
}

#[tokio::test]
async fn test_scenario_c_caretaker_rank_never_removable() {
    let manager = manager();
    seed(&manager, "actor", &["iad"], &["iad-curator"]).await;
    seed(&manager, "x", &["iad"], &["iad-curator"]).await;

    let err = manager
        .manage(
            &AuthContext::officer("actor"),
            "iad",
            &request("x", ActionKind::RemoveRank, Some("iad-curator")),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "caretaker_reserved");

    // High command is no exception.
    let err = manager
        .manage(
            &AuthContext::high_command("chief"),
            "iad",
            &request("x", ActionKind::RemoveRank, Some("iad-curator")),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "caretaker_reserved");
}

#[tokio::test]
async fn test_scenario_d_deputy_cannot_assign_commander() {
    let manager = manager();
    seed(&manager, "actor", &["iad"], &["iad-deputy-head"]).await;
    seed(&manager, "x", &["iad"], &[]).await;

    let err = manager
        .manage(
            &AuthContext::officer("actor"),
            "iad",
            &request("x", ActionKind::AssignRank, Some("iad-head")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
}

#[tokio::test]
async fn test_malformed_request_rejected_before_authorization() {
    let manager = manager();
    // Caller has no record at all; a well-formed request would be 403,
    // but shape problems must come back as 400 first.
    let err = manager
        .manage(
            &AuthContext::officer("nobody"),
            "iad",
            &request("x", ActionKind::AssignRank, None),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));

    let err = manager
        .manage(
            &AuthContext::officer("nobody"),
            "iad",
            &request("x", ActionKind::AssignRank, Some("chief-of-police")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));

    let err = manager
        .manage(
            &AuthContext::officer("nobody"),
            "iad",
            &request("  ", ActionKind::AddMember, None),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
}

#[tokio::test]
async fn test_extraneous_rank_is_validated_for_every_action() {
    // A rank id is checked against the registry even when the action
    // does not need one.
    let manager = manager();
    seed(&manager, "actor", &["iad"], &["iad-head"]).await;
    seed(&manager, "x", &[], &[]).await;

    let err = manager
        .manage(
            &AuthContext::officer("actor"),
            "iad",
            &request("x", ActionKind::AddMember, Some("chief-of-police")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));

    // A recognized extraneous rank is ignored for membership actions.
    let outcome = manager
        .manage(
            &AuthContext::officer("actor"),
            "iad",
            &request("x", ActionKind::AddMember, Some("iad-deputy-head")),
        )
        .await
        .unwrap();
    assert!(outcome.changed);
    assert!(outcome.ranks.is_empty());
}

#[tokio::test]
async fn test_unknown_unit_is_not_found() {
    let manager = manager();
    let err = manager
        .manage(
            &AuthContext::officer("actor"),
            "vice",
            &request("x", ActionKind::AddMember, None),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_missing_target_is_not_found() {
    let manager = manager();
    seed(&manager, "actor", &["iad"], &["iad-head"]).await;

    let err = manager
        .manage(
            &AuthContext::officer("actor"),
            "iad",
            &request("ghost", ActionKind::AddMember, None),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_permission_floor_for_plain_member_and_stranger() {
    let manager = manager();
    seed(&manager, "member", &["iad"], &[]).await;
    seed(&manager, "x", &[], &[]).await;

    for caller in ["member", "stranger-without-record"] {
        let err = manager
            .manage(
                &AuthContext::officer(caller),
                "iad",
                &request("x", ActionKind::AddMember, None),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "insufficient_level", "caller {caller}");
    }
}

#[tokio::test]
async fn test_high_command_bypasses_membership_floor() {
    let manager = manager();
    seed(&manager, "x", &[], &[]).await;

    // The chief is not a member of any unit, yet manages all of them.
    let caller = AuthContext::high_command("chief");

    let outcome = manager
        .manage(&caller, "iad", &request("x", ActionKind::AddMember, None))
        .await
        .unwrap();
    assert!(outcome.changed);

    let outcome = manager
        .manage(&caller, "iad", &request("x", ActionKind::AssignRank, Some("iad-head")))
        .await
        .unwrap();
    assert_eq!(outcome.ranks, vec!["iad-head"]);
}

#[tokio::test]
async fn test_idempotent_request_reports_no_change() {
    let manager = manager();
    seed(&manager, "actor", &["iad"], &["iad-head"]).await;
    seed(&manager, "x", &[], &[]).await;

    let req = request("x", ActionKind::AddMember, None);
    let caller = AuthContext::officer("actor");

    let first = manager.manage(&caller, "iad", &req).await.unwrap();
    assert!(first.changed);

    let second = manager.manage(&caller, "iad", &req).await.unwrap();
    assert!(!second.changed);
    assert_eq!(second.memberships, first.memberships);

    // The no-change path never re-persists.
    let stored = manager.store().get("x").await.unwrap().unwrap();
    assert_eq!(stored.version, 1);
}

#[tokio::test]
async fn test_assign_rank_implies_membership() {
    // Policy: rank-tier authorization is a superset of add-member, so the
    // assignment proceeds for a non-member target and membership follows.
    let manager = manager();
    seed(&manager, "actor", &["iad"], &["iad-head"]).await;
    seed(&manager, "x", &[], &[]).await;

    let outcome = manager
        .manage(
            &AuthContext::officer("actor"),
            "iad",
            &request("x", ActionKind::AssignRank, Some("iad-deputy-head")),
        )
        .await
        .unwrap();

    assert!(outcome.changed);
    assert_eq!(outcome.memberships, vec!["iad"]);
    assert_eq!(outcome.ranks, vec!["iad-deputy-head"]);
    assert_eq!(outcome.primary_rank.as_deref(), Some("iad-deputy-head"));
}

#[tokio::test]
async fn test_remove_rank_keeps_membership() {
    let manager = manager();
    seed(&manager, "actor", &["iad"], &["iad-head"]).await;
    seed(&manager, "x", &["iad"], &["iad-deputy-head"]).await;

    let outcome = manager
        .manage(
            &AuthContext::officer("actor"),
            "iad",
            &request("x", ActionKind::RemoveRank, Some("iad-deputy-head")),
        )
        .await
        .unwrap();

    assert!(outcome.changed);
    assert_eq!(outcome.memberships, vec!["iad"]);
    assert!(outcome.ranks.is_empty());
}

#[tokio::test]
async fn test_rank_from_another_unit_is_forbidden() {
    let manager = manager();
    seed(&manager, "actor", &["iad"], &["iad-curator"]).await;
    seed(&manager, "x", &["iad"], &[]).await;

    // gu-head is a recognized rank, just not an IAD one: 403, not 400.
    let err = manager
        .manage(
            &AuthContext::officer("actor"),
            "iad",
            &request("x", ActionKind::AssignRank, Some("gu-head")),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "rank_not_in_unit");
}

#[tokio::test]
async fn test_catalog_lists_all_units() {
    let manager = manager();
    let catalog = manager.catalog();
    assert_eq!(catalog.len(), 6);

    let ftd = catalog.iter().find(|u| u.id == "ftd").unwrap();
    assert_eq!(ftd.ladder.len(), 2);
    assert!(ftd.ladder.iter().all(|r| r.tier != "deputy"));
}

#[tokio::test]
async fn test_unit_roster_sorted_by_level() {
    let manager = manager();
    seed(&manager, "alice", &["iad"], &[]).await;
    seed(&manager, "bob", &["iad"], &["iad-head"]).await;
    seed(&manager, "carol", &["iad", "gu"], &["iad-deputy-head", "gu-head"]).await;
    seed(&manager, "dave", &["gu"], &["gu-head"]).await;

    let roster = manager.unit_roster("iad").await.unwrap();
    let ids: Vec<&str> = roster.iter().map(|e| e.officer_id.as_str()).collect();
    assert_eq!(ids, vec!["bob", "carol", "alice"]);
    assert_eq!(roster[0].level, 3);
    assert_eq!(roster[1].ranks, vec!["iad-deputy-head"]);
    assert_eq!(roster[2].level, 1);
}

#[tokio::test]
async fn test_officer_view() {
    let manager = manager();
    seed(&manager, "carol", &["iad", "gu"], &["iad-deputy-head", "gu-head"]).await;

    let view = manager.officer("carol").await.unwrap();
    assert_eq!(view.memberships, vec!["iad", "gu"]);
    assert_eq!(view.primary_rank.as_deref(), Some("iad-deputy-head"));

    let iad_level = view.levels.iter().find(|l| l.unit == "iad").unwrap();
    assert_eq!(iad_level.level, 2);
    let gu_level = view.levels.iter().find(|l| l.unit == "gu").unwrap();
    assert_eq!(gu_level.level, 3);

    assert!(matches!(manager.officer("ghost").await, Err(Error::NotFound(_))));
}
