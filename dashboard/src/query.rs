//! Collaborator seams for the remote ticket and directory services.

use async_trait::async_trait;
use serde::Deserialize;
use services::criteria::{TicketPage, TicketQueryCriteria};
use thiserror::Error;

/// Everything that can go wrong talking to a remote collaborator.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("service rejected the request: {0}")]
    Service(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("invalid criteria: {0}")]
    Criteria(String),
}

/// The three logical search operations the ticket service exposes.
#[async_trait]
pub trait TicketQuery: Send + Sync {
    async fn search_my_tickets(
        &self,
        criteria: TicketQueryCriteria,
    ) -> Result<TicketPage, FetchError>;

    async fn search_organization_tickets(
        &self,
        criteria: TicketQueryCriteria,
    ) -> Result<TicketPage, FetchError>;

    async fn search_assigned_tickets(
        &self,
        criteria: TicketQueryCriteria,
    ) -> Result<TicketPage, FetchError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentRef {
    pub id: String,
    pub name: String,
}

/// Department/employee directory, used only to resolve which department's
/// tickets the viewer's "department" subset covers.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    async fn department_of(&self, employee_id: &str) -> Result<Option<DepartmentRef>, FetchError>;
}
