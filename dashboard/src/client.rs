//! REST adapters for the remote ticket and directory services.
//!
//! The remote API wraps every response in the same envelope:
//! `{ "success": bool, "data": ..., "message": "..." }`. A `success: false`
//! envelope is a service-level rejection and surfaces as
//! [`FetchError::Service`] carrying the service's message.

use async_trait::async_trait;
use serde::Deserialize;
use services::criteria::{TicketPage, TicketQueryCriteria};
use services::ticket::RawTicket;
use validator::Validate;

use crate::query::{DepartmentRef, DirectoryService, FetchError, TicketQuery};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageData {
    #[serde(default)]
    items: Vec<RawTicket>,
    meta: Option<PageMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageMeta {
    total_items: Option<u64>,
}

fn decode_page(envelope: Envelope<PageData>) -> Result<TicketPage, FetchError> {
    if !envelope.success {
        return Err(FetchError::Service(envelope.message));
    }
    let data = envelope.data.unwrap_or_default();
    Ok(TicketPage {
        items: data.items,
        total: data.meta.and_then(|m| m.total_items),
    })
}

pub struct RestTicketClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl RestTicketClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// Builds a client from the global configuration, with the configured
    /// request timeout applied. Startup-time only.
    pub fn from_config() -> Self {
        let timeout = std::time::Duration::from_secs(common::config::request_timeout_seconds());
        Self {
            http: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: common::config::api_base_url(),
            token: common::config::api_token(),
        }
    }

    async fn post_search(
        &self,
        path: &str,
        criteria: &TicketQueryCriteria,
    ) -> Result<TicketPage, FetchError> {
        criteria
            .validate()
            .map_err(|e| FetchError::Criteria(e.to_string()))?;

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(criteria)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let envelope: Envelope<PageData> = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        decode_page(envelope)
    }
}

#[async_trait]
impl TicketQuery for RestTicketClient {
    async fn search_my_tickets(
        &self,
        criteria: TicketQueryCriteria,
    ) -> Result<TicketPage, FetchError> {
        self.post_search("tickets/search/mine", &criteria).await
    }

    async fn search_organization_tickets(
        &self,
        criteria: TicketQueryCriteria,
    ) -> Result<TicketPage, FetchError> {
        self.post_search("tickets/search/organization", &criteria)
            .await
    }

    async fn search_assigned_tickets(
        &self,
        criteria: TicketQueryCriteria,
    ) -> Result<TicketPage, FetchError> {
        self.post_search("tickets/search/assigned", &criteria).await
    }
}

pub struct RestDirectoryClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl RestDirectoryClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    pub fn from_config() -> Self {
        Self::new(common::config::api_base_url(), common::config::api_token())
    }
}

#[async_trait]
impl DirectoryService for RestDirectoryClient {
    async fn department_of(&self, employee_id: &str) -> Result<Option<DepartmentRef>, FetchError> {
        let url = format!(
            "{}/employees/{}/department",
            self.base_url.trim_end_matches('/'),
            employee_id
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let envelope: Envelope<DepartmentRef> = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        if !envelope.success {
            return Err(FetchError::Service(envelope.message));
        }
        Ok(envelope.data)
    }
}
