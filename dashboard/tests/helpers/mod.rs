//! Scripted collaborator doubles for orchestrator tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use dashboard::notify::BufferedNotifier;
use dashboard::query::{DepartmentRef, DirectoryService, FetchError, TicketQuery};
use dashboard::state::AppState;
use services::criteria::{TicketPage, TicketQueryCriteria};
use services::ticket::RawTicket;
use util::events::EventBus;

pub struct ScriptedResponse {
    pub delay_ms: u64,
    pub result: Result<TicketPage, FetchError>,
}

impl ScriptedResponse {
    pub fn page(page: TicketPage) -> Self {
        Self {
            delay_ms: 0,
            result: Ok(page),
        }
    }

    pub fn page_after(delay_ms: u64, page: TicketPage) -> Self {
        Self {
            delay_ms,
            result: Ok(page),
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            delay_ms: 0,
            result: Err(FetchError::Service(message.into())),
        }
    }
}

/// Pops one scripted response per call, keyed by operation. Organization
/// calls are further split: a department filter pops the department queue
/// and a small limit pops the recent queue, so the keying matches the
/// orchestrator's fetch plan rather than call order.
#[derive(Default)]
pub struct ScriptedQuery {
    pub mine: Mutex<VecDeque<ScriptedResponse>>,
    pub org_stats: Mutex<VecDeque<ScriptedResponse>>,
    pub org_recent: Mutex<VecDeque<ScriptedResponse>>,
    pub assigned: Mutex<VecDeque<ScriptedResponse>>,
    pub department: Mutex<VecDeque<ScriptedResponse>>,
    pub department_ids_seen: Mutex<Vec<String>>,
}

impl ScriptedQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_mine(&self, response: ScriptedResponse) {
        self.mine.lock().unwrap().push_back(response);
    }

    pub fn push_org_stats(&self, response: ScriptedResponse) {
        self.org_stats.lock().unwrap().push_back(response);
    }

    pub fn push_org_recent(&self, response: ScriptedResponse) {
        self.org_recent.lock().unwrap().push_back(response);
    }

    pub fn push_assigned(&self, response: ScriptedResponse) {
        self.assigned.lock().unwrap().push_back(response);
    }

    pub fn push_department(&self, response: ScriptedResponse) {
        self.department.lock().unwrap().push_back(response);
    }

    async fn take(
        queue: &Mutex<VecDeque<ScriptedResponse>>,
        name: &str,
    ) -> Result<TicketPage, FetchError> {
        let response = queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response left for '{name}'"));
        if response.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(response.delay_ms)).await;
        }
        response.result
    }
}

#[async_trait]
impl TicketQuery for ScriptedQuery {
    async fn search_my_tickets(
        &self,
        _criteria: TicketQueryCriteria,
    ) -> Result<TicketPage, FetchError> {
        Self::take(&self.mine, "mine").await
    }

    async fn search_organization_tickets(
        &self,
        criteria: TicketQueryCriteria,
    ) -> Result<TicketPage, FetchError> {
        if let Some(department_id) = &criteria.department_id {
            self.department_ids_seen
                .lock()
                .unwrap()
                .push(department_id.clone());
            return Self::take(&self.department, "department").await;
        }
        if criteria.limit <= 50 {
            return Self::take(&self.org_recent, "org_recent").await;
        }
        Self::take(&self.org_stats, "org_stats").await
    }

    async fn search_assigned_tickets(
        &self,
        _criteria: TicketQueryCriteria,
    ) -> Result<TicketPage, FetchError> {
        Self::take(&self.assigned, "assigned").await
    }
}

/// Directory double returning one canned department for every employee.
pub struct CannedDirectory {
    pub department: Option<DepartmentRef>,
}

impl CannedDirectory {
    pub fn none() -> Self {
        Self { department: None }
    }

    pub fn with(id: &str, name: &str) -> Self {
        Self {
            department: Some(DepartmentRef {
                id: id.into(),
                name: name.into(),
            }),
        }
    }
}

#[async_trait]
impl DirectoryService for CannedDirectory {
    async fn department_of(&self, _employee_id: &str) -> Result<Option<DepartmentRef>, FetchError> {
        Ok(self.department.clone())
    }
}

pub fn raw_ticket(id: &str, status: &str, priority: &str) -> RawTicket {
    RawTicket {
        id: id.into(),
        title: Some(format!("Ticket {id}")),
        status: Some(status.into()),
        priority: Some(priority.into()),
        created_at: Some(chrono::Utc::now() - chrono::Duration::hours(1)),
        updated_at: Some(chrono::Utc::now() - chrono::Duration::minutes(30)),
        ..Default::default()
    }
}

pub fn page_of(raws: Vec<RawTicket>) -> TicketPage {
    let total = Some(raws.len() as u64);
    TicketPage { items: raws, total }
}

pub fn make_test_state(
    query: Arc<ScriptedQuery>,
    directory: CannedDirectory,
) -> (AppState, Arc<BufferedNotifier>) {
    let notifier = Arc::new(BufferedNotifier::new());
    let state = AppState::init(
        query,
        Arc::new(directory),
        notifier.clone(),
        EventBus::new(),
    )
    .expect("role config table must validate");
    (state, notifier)
}
