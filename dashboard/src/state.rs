//! Shared composition state for the dashboard core.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use services::role_config::{self, Role, RoleConfigError};
use util::events::EventBus;

use crate::notify::NotificationSink;
use crate::query::{DirectoryService, TicketQuery};

/// The authenticated actor a dashboard or dispatcher instance serves.
///
/// Always passed explicitly into constructors; there is no ambient
/// "current user" anywhere in this workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub id: String,
    pub role: Role,
    pub department_id: Option<String>,
    pub email: String,
}

impl Viewer {
    pub fn new(id: impl Into<String>, role: Role, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            department_id: None,
            email: email.into(),
        }
    }

    pub fn with_department(mut self, department_id: impl Into<String>) -> Self {
        self.department_id = Some(department_id.into());
        self
    }
}

/// Holds the collaborator handles every dashboard component shares.
#[derive(Clone)]
pub struct AppState {
    query: Arc<dyn TicketQuery>,
    directory: Arc<dyn DirectoryService>,
    notifier: Arc<dyn NotificationSink>,
    bus: EventBus,
}

impl AppState {
    /// Validates the static role table, then wires the collaborators together.
    /// Call once at startup; the validation failure is a programming error in
    /// the config table, not a runtime condition.
    pub fn init(
        query: Arc<dyn TicketQuery>,
        directory: Arc<dyn DirectoryService>,
        notifier: Arc<dyn NotificationSink>,
        bus: EventBus,
    ) -> Result<Self, RoleConfigError> {
        role_config::validate_role_configs()?;
        Ok(Self::new(query, directory, notifier, bus))
    }

    pub fn new(
        query: Arc<dyn TicketQuery>,
        directory: Arc<dyn DirectoryService>,
        notifier: Arc<dyn NotificationSink>,
        bus: EventBus,
    ) -> Self {
        Self {
            query,
            directory,
            notifier,
            bus,
        }
    }

    pub fn query(&self) -> Arc<dyn TicketQuery> {
        self.query.clone()
    }

    pub fn directory(&self) -> Arc<dyn DirectoryService> {
        self.directory.clone()
    }

    pub fn notifier(&self) -> Arc<dyn NotificationSink> {
        self.notifier.clone()
    }

    pub fn bus(&self) -> EventBus {
        self.bus.clone()
    }
}
