mod helpers;

use std::sync::Arc;
use std::time::Duration;

use dashboard::orchestrator::DashboardOrchestrator;
use dashboard::state::Viewer;
use helpers::{CannedDirectory, ScriptedQuery, ScriptedResponse, make_test_state, page_of, raw_ticket};
use services::role_config::Role;

fn employee(id: &str) -> Viewer {
    Viewer::new(id, Role::Employee, format!("{id}@example.com"))
}

#[tokio::test]
async fn employee_cycle_commits_mine_as_stats_scope() {
    let query = Arc::new(ScriptedQuery::new());
    query.push_mine(ScriptedResponse::page(page_of(vec![
        raw_ticket("t-1", "raised", "low"),
        raw_ticket("t-2", "in_progress", "high"),
        raw_ticket("t-3", "resolved", "medium"),
    ])));

    let (state, notifier) = make_test_state(query, CannedDirectory::none());
    let orchestrator = DashboardOrchestrator::new(state, employee("u1"));

    let committed = orchestrator.refresh().await.unwrap();
    assert!(committed);
    assert!(!orchestrator.is_loading());
    assert!(notifier.is_empty());

    let view = orchestrator.view().await.unwrap();
    assert_eq!(view.role, Role::Employee);
    assert_eq!(view.stats.total_tickets, 3);
    assert_eq!(view.stats.open_tickets, 2);
    assert_eq!(view.stats.resolved_tickets, 1);
    assert_eq!(view.tabs.len(), 1);
    assert_eq!(view.tab("my_tickets").unwrap().tickets.len(), 3);
    assert_eq!(orchestrator.active_tab().await, "my_tickets");
}

#[tokio::test]
async fn org_admin_stats_come_from_the_organization_page() {
    let query = Arc::new(ScriptedQuery::new());
    query.push_mine(ScriptedResponse::page(page_of(vec![raw_ticket(
        "m-1", "raised", "low",
    )])));
    query.push_org_stats(ScriptedResponse::page(page_of(vec![
        raw_ticket("o-1", "raised", "critical"),
        raw_ticket("o-2", "raised", "low"),
        raw_ticket("o-3", "in_progress", "low"),
        raw_ticket("o-4", "resolved", "low"),
        raw_ticket("o-5", "approved", "low"),
    ])));
    query.push_org_recent(ScriptedResponse::page(page_of(vec![
        raw_ticket("o-1", "raised", "critical"),
        raw_ticket("o-2", "raised", "low"),
    ])));

    let (state, _notifier) = make_test_state(query, CannedDirectory::none());
    let orchestrator =
        DashboardOrchestrator::new(state, Viewer::new("admin", Role::OrgAdmin, "a@example.com"));

    assert!(orchestrator.refresh().await.unwrap());
    let view = orchestrator.view().await.unwrap();

    // Stats fold over the large page, recent tab shows the bounded page.
    assert_eq!(view.stats.total_tickets, 5);
    assert_eq!(view.stats.open_tickets, 3);
    assert_eq!(view.stats.resolved_tickets, 2);
    assert_eq!(view.tab("recent").unwrap().tickets.len(), 2);
    assert_eq!(view.tab("my_tickets").unwrap().tickets.len(), 1);
}

#[tokio::test]
async fn manager_department_subset_counts_into_stats() {
    let query = Arc::new(ScriptedQuery::new());
    query.push_mine(ScriptedResponse::page(page_of(vec![raw_ticket(
        "m-1", "raised", "low",
    )])));
    query.push_assigned(ScriptedResponse::page(page_of(vec![
        raw_ticket("a-1", "in_progress", "medium"),
        raw_ticket("a-2", "in_progress", "medium"),
    ])));
    query.push_department(ScriptedResponse::page(page_of(vec![
        raw_ticket("d-1", "raised", "low"),
        raw_ticket("d-2", "raised", "low"),
        raw_ticket("d-3", "resolved", "low"),
    ])));

    let (state, _notifier) = make_test_state(query.clone(), CannedDirectory::none());
    let viewer = Viewer::new("mgr", Role::Manager, "m@example.com").with_department("dept-7");
    let orchestrator = DashboardOrchestrator::new(state, viewer);

    assert!(orchestrator.refresh().await.unwrap());
    let view = orchestrator.view().await.unwrap();

    // Department slice is the stats scope for a role without org visibility.
    assert_eq!(view.stats.total_tickets, 3);
    assert_eq!(view.stats.assigned_tickets, 2);
    assert_eq!(view.stats.department_tickets, 3);
    assert_eq!(orchestrator.active_tab().await, "assigned");
    assert_eq!(
        query.department_ids_seen.lock().unwrap().as_slice(),
        ["dept-7".to_string()]
    );
}

#[tokio::test]
async fn department_is_resolved_via_directory_when_identity_lacks_it() {
    let query = Arc::new(ScriptedQuery::new());
    query.push_mine(ScriptedResponse::page(page_of(vec![])));
    query.push_assigned(ScriptedResponse::page(page_of(vec![])));
    query.push_department(ScriptedResponse::page(page_of(vec![raw_ticket(
        "d-1", "raised", "low",
    )])));

    let (state, _notifier) =
        make_test_state(query.clone(), CannedDirectory::with("dept-9", "Facilities"));
    let viewer = Viewer::new("mgr", Role::Manager, "m@example.com");
    let orchestrator = DashboardOrchestrator::new(state, viewer);

    assert!(orchestrator.refresh().await.unwrap());
    assert_eq!(
        query.department_ids_seen.lock().unwrap().as_slice(),
        ["dept-9".to_string()]
    );
}

#[tokio::test]
async fn failed_cycle_keeps_previous_view_and_raises_one_toast() {
    let query = Arc::new(ScriptedQuery::new());
    query.push_mine(ScriptedResponse::page(page_of(vec![raw_ticket(
        "t-1", "raised", "low",
    )])));
    query.push_mine(ScriptedResponse::failure("ticket service unavailable"));

    let (state, notifier) = make_test_state(query, CannedDirectory::none());
    let orchestrator = DashboardOrchestrator::new(state, employee("u1"));

    assert!(orchestrator.refresh().await.unwrap());
    let before = orchestrator.view().await.unwrap();

    let err = orchestrator.refresh().await.unwrap_err();
    assert!(err.to_string().contains("mine"));
    assert_eq!(notifier.len(), 1);
    assert!(!orchestrator.is_loading());

    // Stale-but-consistent: the earlier view model is untouched.
    assert_eq!(orchestrator.view().await.unwrap(), before);
}

#[tokio::test]
async fn multiple_failing_fetches_still_raise_exactly_one_toast() {
    let query = Arc::new(ScriptedQuery::new());
    query.push_mine(ScriptedResponse::failure("mine down"));
    query.push_org_stats(ScriptedResponse::failure("org down"));
    query.push_org_recent(ScriptedResponse::failure("org down"));

    let (state, notifier) = make_test_state(query, CannedDirectory::none());
    let orchestrator =
        DashboardOrchestrator::new(state, Viewer::new("admin", Role::OrgAdmin, "a@example.com"));

    assert!(orchestrator.refresh().await.is_err());
    assert_eq!(notifier.len(), 1);
    assert!(orchestrator.view().await.is_none());
}

#[tokio::test]
async fn stale_cycle_never_overwrites_a_newer_one() {
    let query = Arc::new(ScriptedQuery::new());
    // First cycle is slow and returns page A; second is fast with page B.
    query.push_mine(ScriptedResponse::page_after(
        150,
        page_of(vec![raw_ticket("stale", "raised", "low")]),
    ));
    query.push_mine(ScriptedResponse::page_after(
        10,
        page_of(vec![raw_ticket("fresh", "raised", "low")]),
    ));

    let (state, _notifier) = make_test_state(query, CannedDirectory::none());
    let orchestrator = Arc::new(DashboardOrchestrator::new(state, employee("u1")));

    let slow = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.refresh().await })
    };
    // Let the slow cycle claim its scripted response first.
    tokio::time::sleep(Duration::from_millis(30)).await;

    let fast_committed = orchestrator.refresh().await.unwrap();
    assert!(fast_committed);

    let slow_committed = slow.await.unwrap().unwrap();
    assert!(!slow_committed, "superseded cycle must not commit");

    let view = orchestrator.view().await.unwrap();
    assert_eq!(view.tab("my_tickets").unwrap().tickets[0].id, "fresh");
}

#[tokio::test]
async fn loading_tracks_outstanding_fetches_only() {
    let query = Arc::new(ScriptedQuery::new());
    query.push_mine(ScriptedResponse::page_after(
        80,
        page_of(vec![raw_ticket("t-1", "raised", "low")]),
    ));

    let (state, _notifier) = make_test_state(query, CannedDirectory::none());
    let orchestrator = Arc::new(DashboardOrchestrator::new(state, employee("u1")));

    let refresh = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(orchestrator.is_loading());

    refresh.await.unwrap().unwrap();
    assert!(!orchestrator.is_loading());

    // A tab switch selects already-fetched data; no loading flicker.
    assert!(orchestrator.set_active_tab("my_tickets").await);
    assert!(!orchestrator.is_loading());
}

#[tokio::test]
async fn set_active_tab_rejects_keys_outside_the_role_config() {
    let query = Arc::new(ScriptedQuery::new());
    query.push_mine(ScriptedResponse::page(page_of(vec![])));

    let (state, _notifier) = make_test_state(query, CannedDirectory::none());
    let orchestrator = DashboardOrchestrator::new(state, employee("u1"));
    orchestrator.refresh().await.unwrap();

    assert!(!orchestrator.set_active_tab("department").await);
    assert_eq!(orchestrator.active_tab().await, "my_tickets");
    assert!(orchestrator.set_active_tab("my_tickets").await);
}

#[tokio::test]
async fn set_viewer_rebuilds_the_view_for_the_new_role() {
    let query = Arc::new(ScriptedQuery::new());
    // Employee cycle.
    query.push_mine(ScriptedResponse::page(page_of(vec![raw_ticket(
        "t-1", "raised", "low",
    )])));
    // Manager cycle.
    query.push_mine(ScriptedResponse::page(page_of(vec![raw_ticket(
        "t-1", "raised", "low",
    )])));
    query.push_assigned(ScriptedResponse::page(page_of(vec![raw_ticket(
        "a-1", "in_progress", "medium",
    )])));
    query.push_department(ScriptedResponse::page(page_of(vec![raw_ticket(
        "d-1", "raised", "low",
    )])));

    let (state, _notifier) = make_test_state(query, CannedDirectory::none());
    let orchestrator = DashboardOrchestrator::new(state, employee("u1"));
    orchestrator.refresh().await.unwrap();
    assert_eq!(orchestrator.view().await.unwrap().role, Role::Employee);

    let manager = Viewer::new("u1", Role::Manager, "u1@example.com").with_department("dept-1");
    assert!(orchestrator.set_viewer(manager).await.unwrap());

    let view = orchestrator.view().await.unwrap();
    assert_eq!(view.role, Role::Manager);
    assert_eq!(orchestrator.active_tab().await, "assigned");
    assert_eq!(view.tabs.len(), 3);
    assert_eq!(view.stats.assigned_tickets, 1);
}
