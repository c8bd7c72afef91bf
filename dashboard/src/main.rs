use std::sync::Arc;

use dashboard::client::{RestDirectoryClient, RestTicketClient};
use dashboard::notify::TracingNotifier;
use dashboard::realtime::RealtimeDispatcher;
use dashboard::{AppState, DashboardOrchestrator, Viewer};
use services::role_config::Role;
use util::events::EventBus;

#[tokio::main]
async fn main() {
    // Load configuration and initialize logging
    let _log_guard =
        common::logger::init_logging(&common::config::log_file(), &common::config::log_level());

    let state = AppState::init(
        Arc::new(RestTicketClient::from_config()),
        Arc::new(RestDirectoryClient::from_config()),
        Arc::new(TracingNotifier),
        EventBus::new(),
    )
    .expect("Invalid role dashboard config table");

    // Headless runner: the viewer identity comes from the environment. A real
    // embedding passes whatever its identity provider resolved.
    let viewer = viewer_from_env();

    println!(
        "Starting {} dashboard for {} ({})",
        common::config::project_name(),
        viewer.id,
        viewer.role
    );

    let dispatcher = RealtimeDispatcher::new(state.bus(), state.notifier(), viewer.clone());
    let _subscription = dispatcher.start().await;

    let orchestrator = DashboardOrchestrator::new(state, viewer);
    match orchestrator.refresh().await {
        Ok(_) => {
            if let Some(view) = orchestrator.view().await {
                tracing::info!(
                    "Dashboard ready: {} tickets, {} open, {} overdue, {} tabs",
                    view.stats.total_tickets,
                    view.stats.open_tickets,
                    view.stats.overdue_tickets,
                    view.tabs.len()
                );
            }
        }
        Err(err) => tracing::error!("Initial dashboard load failed: {err}"),
    }

    // Keep pumping realtime events until interrupted.
    tokio::signal::ctrl_c().await.expect("Failed to listen for ctrl_c");
    println!("Shutting down");
}

fn viewer_from_env() -> Viewer {
    let id = std::env::var("VIEWER_ID").unwrap_or_else(|_| "demo-user".into());
    let role = Role::from_tag(&std::env::var("VIEWER_ROLE").unwrap_or_default());
    let email = std::env::var("VIEWER_EMAIL").unwrap_or_else(|_| "demo@example.com".into());
    let viewer = Viewer::new(id, role, email);
    match std::env::var("VIEWER_DEPARTMENT_ID") {
        Ok(department_id) if !department_id.is_empty() => viewer.with_department(department_id),
        _ => viewer,
    }
}
