//! End-to-end assignment scenarios against the in-memory store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use leadbook_core::{AssignmentError, Inconsistency, LeadbookError};
use leadbook_engine::{FixType, LeadEngine};
use leadbook_storage::{AgentDirectory, InMemoryStore, LeadFilter, LeadStore};
use leadbook_test_utils::{assertions, fixtures};

fn engine_for(store: &InMemoryStore) -> LeadEngine {
    LeadEngine::with_store(Arc::new(store.clone()))
}

// ============================================================================
// SCENARIO A / B: history membership blocks re-assignment
// ============================================================================

#[tokio::test]
async fn scenario_a_reassigning_to_same_agent_is_skipped() {
    let a1 = fixtures::agent("Asha");
    let (store, _) = fixtures::seeded_store(&[a1.clone()], 0).await.unwrap();
    let l1 = fixtures::lead("9876543210");
    let l2 = fixtures::lead("9876543211");
    store.lead_insert(&l1).await.unwrap();
    store.lead_insert(&l2).await.unwrap();
    let engine = engine_for(&store);

    let first = engine.assign_specific(&[l1.id], a1.id, None).await.unwrap();
    assert_eq!(first.assigned_count, 1);

    let lead = store.lead_get(l1.id).await.unwrap().unwrap();
    assert!(lead.is_assigned);
    assert_eq!(lead.assignment_history.len(), 1);
    assert_eq!(lead.assignment_history[0].agent_id, a1.id);
    assert!(lead.assignment_history[0].unassigned_at.is_none());

    // Mixed request: L1 is skipped, L2 goes through.
    let again = engine
        .assign_specific(&[l1.id, l2.id], a1.id, None)
        .await
        .unwrap();
    assert_eq!(again.skipped_count, 1);
    assert_eq!(again.assigned_count, 1);

    // L1 alone: nothing qualifies.
    let err = engine.assign_specific(&[l1.id], a1.id, None).await.unwrap_err();
    assert!(matches!(
        err,
        LeadbookError::Assignment(AssignmentError::NoQualifyingLeads {
            requested: 1,
            already_seen: 1,
            ..
        })
    ));
    let lead = store.lead_get(l1.id).await.unwrap().unwrap();
    assert_eq!(lead.assignment_history.len(), 1);
}

#[tokio::test]
async fn scenario_b_history_survives_unassignment() {
    let a1 = fixtures::agent("Asha");
    let (store, leads) = fixtures::seeded_store(&[a1.clone()], 1).await.unwrap();
    let l1 = &leads[0];
    let engine = engine_for(&store);

    engine.assign_specific(&[l1.id], a1.id, None).await.unwrap();
    let outcome = engine.unassign_all(a1.id).await.unwrap();
    assert_eq!(outcome.unassigned_count, 1);
    assert_eq!(outcome.history_gaps, 0);

    let lead = store.lead_get(l1.id).await.unwrap().unwrap();
    assert!(!lead.is_assigned);
    assert!(lead.assigned_to.is_none());
    assert!(lead.assignment_history[0].unassigned_at.is_some());

    let err = engine.assign_specific(&[l1.id], a1.id, None).await.unwrap_err();
    assert!(matches!(
        err,
        LeadbookError::Assignment(AssignmentError::NoQualifyingLeads { .. })
    ));

    // Random assignment honours history too.
    let err = engine
        .assign_random(5, a1.id, None, None, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LeadbookError::Assignment(AssignmentError::NoCandidates { .. })
    ));
}

// ============================================================================
// SCENARIO C: phone duplicates under one agent
// ============================================================================

#[tokio::test]
async fn scenario_c_phone_duplicate_repair_keeps_latest() {
    let a2 = fixtures::agent("Bala");
    let (store, _) = fixtures::seeded_store(&[a2.clone()], 0).await.unwrap();
    let now = Utc::now();
    let l2 = fixtures::held_lead(&a2, "9000000000", now - Duration::hours(2));
    let l3 = fixtures::held_lead(&a2, "9000000000", now - Duration::minutes(5));
    store.lead_insert(&l2).await.unwrap();
    store.lead_insert(&l3).await.unwrap();
    let engine = engine_for(&store);

    let report = engine.detect_duplicates().await.unwrap();
    assert_eq!(report.summary.agents_checked, 1);
    assert_eq!(report.summary.agents_with_issues, 1);
    assert_eq!(report.summary.total_duplicates_found, 1);
    let groups = &report.duplicate_report[0].phone_duplicates;
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].phone, "9000000000");
    assert_eq!(groups[0].count, 2);

    let repair = engine
        .repair_duplicates(FixType::PhoneDuplicates, Some(a2.id))
        .await
        .unwrap();
    assert_eq!(repair.phone_duplicates_fixed, 1);
    assert_eq!(repair.leads_unassigned.len(), 1);
    assert_eq!(repair.leads_unassigned[0].lead_id, l2.id);
    assert_eq!(repair.leads_unassigned[0].kept_lead_id, l3.id);

    let kept = store.lead_get(l3.id).await.unwrap().unwrap();
    assert!(kept.is_assigned_to(a2.id));
    let released = store.lead_get(l2.id).await.unwrap().unwrap();
    assert!(released.is_unassigned());
    assert!(released.assignment_history[0].unassigned_at.is_some());

    let after = engine.detect_duplicates().await.unwrap();
    assert_eq!(after.summary.total_duplicates_found, 0);
    assert!(after.duplicate_report.is_empty());
    assert_eq!(
        store.agent_get(a2.id).await.unwrap().unwrap().assigned_lead_count,
        1
    );
}

// ============================================================================
// SCENARIO D: flag without reference
// ============================================================================

#[tokio::test]
async fn scenario_d_inconsistent_flag_repair() {
    let (store, _) = fixtures::seeded_store(&[], 0).await.unwrap();
    let corrupt = fixtures::flagged_without_agent("9123456789");
    store.lead_insert(&corrupt).await.unwrap();
    let engine = engine_for(&store);

    let report = engine.detect_duplicates().await.unwrap();
    assert_eq!(report.summary.inconsistent_leads_found, 1);
    assert_eq!(report.inconsistent_leads[0].lead_id, corrupt.id);
    assert_eq!(report.inconsistent_leads[0].kind, Inconsistency::AssignedWithoutAgent);
    assert_eq!(
        report.inconsistent_leads[0].reason,
        "Marked as assigned but no agent"
    );

    let repair = engine
        .repair_duplicates(FixType::InconsistentData, None)
        .await
        .unwrap();
    assert_eq!(repair.inconsistent_data_fixed, 1);

    let fixed = store.lead_get(corrupt.id).await.unwrap().unwrap();
    assert!(!fixed.is_assigned);
    assertions::assert_flag_consistent(&fixed);

    let after = engine.detect_duplicates().await.unwrap();
    assert_eq!(after.summary.inconsistent_leads_found, 0);
}

// ============================================================================
// RANDOM ASSIGNMENT AVAILABILITY
// ============================================================================

#[tokio::test]
async fn partial_availability_is_success() {
    let x = fixtures::agent("Xavier");
    let (store, _) = fixtures::seeded_store(&[x.clone()], 37).await.unwrap();
    let engine = engine_for(&store);

    let outcome = engine.assign_random(100, x.id, None, None, None).await.unwrap();
    assert_eq!(outcome.assigned_count, 37);
    assert_eq!(outcome.available_count, 37);
    assert_eq!(outcome.requested_count, 100);
    assert_eq!(outcome.agent_assigned_total, 37);
    assert!(outcome.message.contains("only 37 available"));
}

#[tokio::test]
async fn sampling_takes_exactly_requested_when_plenty() {
    let x = fixtures::agent("Xavier");
    let (store, _) = fixtures::seeded_store(&[x.clone()], 60).await.unwrap();
    let engine = engine_for(&store);

    let outcome = engine.assign_random(25, x.id, None, None, None).await.unwrap();
    assert_eq!(outcome.assigned_count, 25);
    assert_eq!(outcome.available_count, 60);
    assert_eq!(
        store.lead_count(&LeadFilter::new().held_by(x.id)).await.unwrap(),
        25
    );
    assert_eq!(
        store.lead_count(&LeadFilter::new().unassigned()).await.unwrap(),
        35
    );
}

#[tokio::test]
async fn exhausted_pool_is_distinct_failure() {
    let x = fixtures::agent("Xavier");
    let y = fixtures::agent("Yamini");
    let (store, _) = fixtures::seeded_store(&[x.clone(), y.clone()], 10)
        .await
        .unwrap();
    let engine = engine_for(&store);

    // X sees every lead, then releases them all.
    engine.assign_random(10, x.id, None, None, None).await.unwrap();
    engine.unassign_all(x.id).await.unwrap();

    let err = engine
        .assign_random(1, x.id, None, None, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LeadbookError::Assignment(AssignmentError::NoCandidates { .. })
    ));

    // The same pool is still fully available to Y.
    let outcome = engine.assign_random(10, y.id, None, None, None).await.unwrap();
    assert_eq!(outcome.assigned_count, 10);
}

#[tokio::test]
async fn unassign_all_on_empty_agent_is_reported() {
    let x = fixtures::agent("Xavier");
    let (store, _) = fixtures::seeded_store(&[x.clone()], 3).await.unwrap();
    let engine = engine_for(&store);

    let err = engine.unassign_all(x.id).await.unwrap_err();
    assert!(matches!(
        err,
        LeadbookError::Assignment(AssignmentError::NothingToUnassign { .. })
    ));
    assert!(engine.unassign_all(uuid::Uuid::now_v7()).await.is_err());
}
