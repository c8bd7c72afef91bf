//! Query criteria and page types for the remote ticket search operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

use crate::ticket::{RawTicket, Ticket, TicketStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Priority,
    SlaDeadline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Search criteria sent to every ticket search operation. Serialized to the
/// wire as camelCase, matching the remote API's conventions.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TicketQueryCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub statuses: Vec<TicketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    pub offset: u32,
    #[validate(range(min = 1, max = 1000, message = "limit must be between 1 and 1000"))]
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
}

impl TicketQueryCriteria {
    /// A plain page with no filters.
    pub fn page(offset: u32, limit: u32) -> Self {
        Self {
            text: None,
            statuses: Vec::new(),
            department_id: None,
            offset,
            limit,
            sort: None,
        }
    }

    pub fn with_department(mut self, department_id: impl Into<String>) -> Self {
        self.department_id = Some(department_id.into());
        self
    }

    pub fn sorted_desc(mut self, field: SortField) -> Self {
        self.sort = Some(SortSpec {
            field,
            direction: SortDirection::Desc,
        });
        self
    }
}

/// One page of raw search results plus the service-reported total, when the
/// response carried one.
#[derive(Debug, Clone, Default)]
pub struct TicketPage {
    pub items: Vec<RawTicket>,
    pub total: Option<u64>,
}

impl TicketPage {
    /// Runs every raw item through the canonical transform with a shared `now`.
    pub fn into_tickets(self, now: DateTime<Utc>) -> Vec<Ticket> {
        self.items
            .into_iter()
            .map(|raw| Ticket::from_raw(raw, now))
            .collect()
    }
}
