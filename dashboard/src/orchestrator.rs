//! Dashboard data orchestration.
//!
//! One `refresh()` call is one orchestration cycle: resolve the viewer's role
//! config, fan out every enabled fetch concurrently, join, transform,
//! aggregate, and commit the new view model atomically. A cycle either
//! replaces the whole view model or leaves it untouched — the dashboard is
//! never half-updated.
//!
//! Rapid viewer/role switches can leave an older cycle in flight while a
//! newer one completes first. Every cycle records the epoch it was started
//! under and re-checks it at commit time; a stale cycle's results are
//! discarded, never merged.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use services::criteria::{SortField, TicketPage, TicketQueryCriteria};
use services::role_config::{DashboardConfig, Role, TabSource};
use services::stats::{DashboardStats, StatsInput};
use services::ticket::Ticket;
use strum::Display;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::notify::Notification;
use crate::query::FetchError;
use crate::state::{AppState, Viewer};

/// The named ticket subsets a cycle can fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Subset {
    Mine,
    Organization,
    Assigned,
    Department,
}

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("failed to fetch {subset} tickets: {source}")]
    Fetch {
        subset: Subset,
        #[source]
        source: FetchError,
    },
}

impl DashboardError {
    fn fetch(subset: Subset, source: FetchError) -> Self {
        DashboardError::Fetch { subset, source }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabView {
    pub key: String,
    pub label: String,
    pub icon: String,
    pub tickets: Vec<Ticket>,
}

/// Everything the presentation layer reads: one stats snapshot plus the
/// ticket list behind each tab, all produced by the same cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardViewModel {
    pub role: Role,
    pub stats: DashboardStats,
    pub tabs: Vec<TabView>,
    pub generated_at: DateTime<Utc>,
}

impl DashboardViewModel {
    pub fn tab(&self, key: &str) -> Option<&TabView> {
        self.tabs.iter().find(|t| t.key == key)
    }
}

/// Results of one fan-out, keyed by subset name. Keyed on purpose: the set of
/// enabled fetches varies by role, and positional indexing into a flat
/// response list breaks the moment a condition changes.
struct FetchOutcome {
    mine: TicketPage,
    organization: Option<OrgFetch>,
    assigned: Option<TicketPage>,
    department: Option<TicketPage>,
}

/// The organization subset is two pages: a large one that feeds the stats
/// fold and a small recent page for display.
struct OrgFetch {
    stats_page: TicketPage,
    recent_page: TicketPage,
}

pub struct DashboardOrchestrator {
    state: AppState,
    viewer: RwLock<Viewer>,
    /// Monotonically increasing cycle counter; commit requires it unchanged.
    epoch: AtomicU64,
    /// Number of cycles currently awaiting fetches. Loading is true iff > 0.
    in_flight: AtomicUsize,
    view: RwLock<Option<DashboardViewModel>>,
    active_tab: RwLock<String>,
}

impl DashboardOrchestrator {
    pub fn new(state: AppState, viewer: Viewer) -> Self {
        let default_tab = DashboardConfig::for_role(viewer.role).tabs[0].key.to_string();
        Self {
            state,
            viewer: RwLock::new(viewer),
            epoch: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            view: RwLock::new(None),
            active_tab: RwLock::new(default_tab),
        }
    }

    /// Runs one orchestration cycle. Returns `Ok(true)` when the cycle
    /// committed, `Ok(false)` when a newer cycle superseded it mid-flight.
    ///
    /// On failure the previous view model is left untouched and exactly one
    /// error toast is raised; the caller retriggers via another `refresh()`.
    pub async fn refresh(&self) -> Result<bool, DashboardError> {
        let viewer = self.viewer.read().await.clone();
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let result = self.run_cycle(epoch, &viewer).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match result {
            Ok(committed) => Ok(committed),
            Err(err) => {
                tracing::error!("Dashboard cycle {epoch} for {} failed: {err}", viewer.id);
                self.state
                    .notifier()
                    .notify(Notification::error("Dashboard refresh failed", err.to_string()));
                Err(err)
            }
        }
    }

    /// Swaps the viewer (login change, role change) and starts a fresh cycle.
    /// Any cycle still in flight for the old viewer is superseded by the
    /// epoch bump inside `refresh`.
    pub async fn set_viewer(&self, viewer: Viewer) -> Result<bool, DashboardError> {
        let default_tab = DashboardConfig::for_role(viewer.role).tabs[0].key.to_string();
        {
            let mut current = self.viewer.write().await;
            *current = viewer;
        }
        {
            let mut tab = self.active_tab.write().await;
            *tab = default_tab;
        }
        self.refresh().await
    }

    /// True while any cycle has outstanding fetches. Tab switches do not
    /// assert loading: they select already-fetched data.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Snapshot of the last committed view model, if any cycle has completed.
    pub async fn view(&self) -> Option<DashboardViewModel> {
        self.view.read().await.clone()
    }

    pub async fn active_tab(&self) -> String {
        self.active_tab.read().await.clone()
    }

    /// Selects a tab by key. Returns false (and keeps the selection) when the
    /// key is not part of the viewer's current tab list.
    pub async fn set_active_tab(&self, key: &str) -> bool {
        let role = self.viewer.read().await.role;
        let config = DashboardConfig::for_role(role);
        if !config.tabs.iter().any(|t| t.key == key) {
            return false;
        }
        let mut tab = self.active_tab.write().await;
        *tab = key.to_string();
        true
    }

    async fn run_cycle(&self, epoch: u64, viewer: &Viewer) -> Result<bool, DashboardError> {
        let config = DashboardConfig::for_role(viewer.role);
        let outcome = self.fetch_all(config, viewer).await?;

        let now = Utc::now();
        let view = build_view_model(config, outcome, now);

        // Commit only if no newer cycle started while we were fetching.
        let mut slot = self.view.write().await;
        if self.epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!(
                "Discarding stale dashboard cycle {epoch} for {} (superseded)",
                viewer.id
            );
            return Ok(false);
        }
        *slot = Some(view);
        Ok(true)
    }

    /// Issues every enabled fetch concurrently and joins them. Partial
    /// results never leave this function: the first failure (in subset
    /// order) wins and the rest are dropped.
    async fn fetch_all(
        &self,
        config: &DashboardConfig,
        viewer: &Viewer,
    ) -> Result<FetchOutcome, DashboardError> {
        let query = self.state.query();
        let stats_limit = common::config::stats_page_limit();
        let recent_limit = common::config::recent_page_limit();

        // Resolve the department before fanning out; the viewer identity
        // usually carries it and the directory is only asked when it doesn't.
        let department_id = if config.fetch.department {
            match &viewer.department_id {
                Some(id) => Some(id.clone()),
                None => self
                    .state
                    .directory()
                    .department_of(&viewer.id)
                    .await
                    .map_err(|e| DashboardError::fetch(Subset::Department, e))?
                    .map(|dept| dept.id),
            }
        } else {
            None
        };

        let mine_fut = async {
            query
                .search_my_tickets(
                    TicketQueryCriteria::page(0, stats_limit).sorted_desc(SortField::CreatedAt),
                )
                .await
                .map_err(|e| DashboardError::fetch(Subset::Mine, e))
        };

        let org_fut = async {
            if !config.fetch.organization {
                return Ok(None);
            }
            let stats_criteria = TicketQueryCriteria::page(0, stats_limit);
            let recent_criteria =
                TicketQueryCriteria::page(0, recent_limit).sorted_desc(SortField::CreatedAt);
            let (stats_page, recent_page) = tokio::join!(
                query.search_organization_tickets(stats_criteria),
                query.search_organization_tickets(recent_criteria),
            );
            Ok(Some(OrgFetch {
                stats_page: stats_page.map_err(|e| DashboardError::fetch(Subset::Organization, e))?,
                recent_page: recent_page.map_err(|e| DashboardError::fetch(Subset::Organization, e))?,
            }))
        };

        let assigned_fut = async {
            if !config.fetch.assigned {
                return Ok(None);
            }
            query
                .search_assigned_tickets(
                    TicketQueryCriteria::page(0, stats_limit).sorted_desc(SortField::CreatedAt),
                )
                .await
                .map(Some)
                .map_err(|e| DashboardError::fetch(Subset::Assigned, e))
        };

        let department_fut = async {
            match &department_id {
                None => Ok(None),
                Some(id) => query
                    .search_organization_tickets(
                        TicketQueryCriteria::page(0, stats_limit)
                            .with_department(id.clone())
                            .sorted_desc(SortField::CreatedAt),
                    )
                    .await
                    .map(Some)
                    .map_err(|e| DashboardError::fetch(Subset::Department, e)),
            }
        };

        let (mine, organization, assigned, department) =
            tokio::join!(mine_fut, org_fut, assigned_fut, department_fut);

        Ok(FetchOutcome {
            mine: mine?,
            organization: organization?,
            assigned: assigned?,
            department: department?,
        })
    }
}

/// Transform + aggregate, strictly after every fetch settled.
fn build_view_model(
    config: &DashboardConfig,
    outcome: FetchOutcome,
    now: DateTime<Utc>,
) -> DashboardViewModel {
    let mine = outcome.mine.into_tickets(now);
    let (org_stats, org_recent) = match outcome.organization {
        Some(org) => (
            Some(org.stats_page.into_tickets(now)),
            Some(org.recent_page.into_tickets(now)),
        ),
        None => (None, None),
    };
    let assigned = outcome.assigned.map(|p| p.into_tickets(now));
    let department = outcome.department.map(|p| p.into_tickets(now));

    // Stats scope per role branch: organization-wide when fetched, else the
    // department, else everything the viewer can see (mine + assigned).
    let fallback_union;
    let scope: &[Ticket] = if let Some(org) = &org_stats {
        org
    } else if let Some(dept) = &department {
        dept
    } else {
        fallback_union = union_by_id(&mine, assigned.as_deref());
        &fallback_union
    };

    let stats = DashboardStats::compute(
        StatsInput {
            scope,
            assigned: assigned.as_deref(),
            department: department.as_deref(),
            team_members: None,
            user_satisfaction: None,
        },
        now,
    );

    let tabs = config
        .tabs
        .iter()
        .map(|spec| {
            let tickets = match spec.source {
                TabSource::Mine => mine.clone(),
                TabSource::Organization => org_recent.clone().unwrap_or_default(),
                TabSource::Assigned => assigned.clone().unwrap_or_default(),
                TabSource::Department => department.clone().unwrap_or_default(),
            };
            TabView {
                key: spec.key.to_string(),
                label: spec.label.to_string(),
                icon: spec.icon.to_string(),
                tickets,
            }
        })
        .collect();

    DashboardViewModel {
        role: config.role,
        stats,
        tabs,
        generated_at: now,
    }
}

fn union_by_id(mine: &[Ticket], assigned: Option<&[Ticket]>) -> Vec<Ticket> {
    let mut union: Vec<Ticket> = mine.to_vec();
    if let Some(assigned) = assigned {
        for t in assigned {
            if !union.iter().any(|u| u.id == t.id) {
                union.push(t.clone());
            }
        }
    }
    union
}
