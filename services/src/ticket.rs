//! Canonical ticket shape and the raw-record transform.
//!
//! Every ticket entering the dashboard passes through [`Ticket::from_raw`]
//! exactly once. Downstream code (stats, tab lists, realtime payload lookups)
//! never branches on field presence: the transform fills every optional raw
//! field with its documented default.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Lifecycle states a ticket moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TicketStatus {
    Raised,
    InProgress,
    PendingApproval,
    Resolved,
    Approved,
    Rejected,
}

impl TicketStatus {
    /// Statuses that count as "open" work.
    pub fn is_open(self) -> bool {
        matches!(
            self,
            TicketStatus::Raised | TicketStatus::InProgress | TicketStatus::PendingApproval
        )
    }

    /// Statuses that count as completed work.
    pub fn is_resolved(self) -> bool {
        matches!(self, TicketStatus::Resolved | TicketStatus::Approved)
    }

    /// Statuses still eligible to breach their SLA deadline.
    pub fn is_sla_tracked(self) -> bool {
        matches!(self, TicketStatus::Raised | TicketStatus::InProgress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl TicketPriority {
    /// Priorities surfaced on the "critical" dashboard card.
    pub fn is_escalated(self) -> bool {
        matches!(self, TicketPriority::High | TicketPriority::Critical)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author_id: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub file_name: String,
    pub size_bytes: u64,
}

/// A ticket record as the remote API returns it. Field names follow the wire
/// (camelCase); almost everything is optional because the various list
/// endpoints project different subsets of the record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTicket {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub sla_deadline: Option<DateTime<Utc>>,
    pub assigned_to: Option<String>,
    pub created_by: Option<String>,
    pub assigned_department_id: Option<String>,
    pub assigned_department_name: Option<String>,
    pub tags: Option<Vec<String>>,
    pub comments: Option<Vec<RawComment>>,
    pub attachments: Option<Vec<RawAttachment>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawComment {
    pub id: String,
    pub author_id: Option<String>,
    pub body: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawAttachment {
    pub id: String,
    pub file_name: Option<String>,
    pub size_bytes: Option<u64>,
}

/// Canonical in-memory ticket. All fields the stats fold reads are
/// non-optional; see [`Ticket::from_raw`] for the defaulting rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sla_deadline: DateTime<Utc>,
    pub assigned_to: Option<String>,
    pub created_by: Option<String>,
    pub assigned_department_id: Option<String>,
    pub assigned_department_name: Option<String>,
    pub tags: Vec<String>,
    pub comments: Vec<Comment>,
    pub attachments: Vec<Attachment>,
}

impl Ticket {
    /// Normalizes one raw API record into the canonical shape.
    ///
    /// Total and pure: never fails, no side effects beyond a `warn` log when
    /// an enum field carries an unknown value. Defaults:
    ///
    /// - missing `status` → `raised`; unknown value → `raised`
    /// - missing `priority` → `medium`; unknown value → `medium`
    /// - missing `created_at` → `now`
    /// - missing `updated_at` → `created_at`; always clamped to `>= created_at`
    /// - missing `sla_deadline` → `created_at + 24h`
    /// - missing `tags`/`comments`/`attachments` → empty; tags deduplicated
    ///   keeping first occurrence
    ///
    /// Idempotent on canonical fields: re-running the transform over a ticket
    /// that already went through it changes nothing the stats fold observes.
    pub fn from_raw(raw: RawTicket, now: DateTime<Utc>) -> Ticket {
        let status = parse_or_default(
            raw.status.as_deref(),
            TicketStatus::Raised,
            &raw.id,
            "status",
        );
        let priority = parse_or_default(
            raw.priority.as_deref(),
            TicketPriority::Medium,
            &raw.id,
            "priority",
        );

        let created_at = raw.created_at.unwrap_or(now);
        let updated_at = raw.updated_at.unwrap_or(created_at).max(created_at);
        let sla_deadline = raw
            .sla_deadline
            .unwrap_or_else(|| created_at + Duration::hours(24));

        let mut tags: Vec<String> = Vec::new();
        for tag in raw.tags.unwrap_or_default() {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        let comments = raw
            .comments
            .unwrap_or_default()
            .into_iter()
            .map(|c| Comment {
                id: c.id,
                author_id: c.author_id,
                body: c.body.unwrap_or_default(),
                created_at: c.created_at.unwrap_or(created_at),
            })
            .collect();

        let attachments = raw
            .attachments
            .unwrap_or_default()
            .into_iter()
            .map(|a| Attachment {
                id: a.id,
                file_name: a.file_name.unwrap_or_default(),
                size_bytes: a.size_bytes.unwrap_or(0),
            })
            .collect();

        Ticket {
            id: raw.id,
            title: raw.title.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            status,
            priority,
            created_at,
            updated_at,
            sla_deadline,
            assigned_to: raw.assigned_to,
            created_by: raw.created_by,
            assigned_department_id: raw.assigned_department_id,
            assigned_department_name: raw.assigned_department_name,
            tags,
            comments,
            attachments,
        }
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    pub fn attachment_count(&self) -> usize {
        self.attachments.len()
    }
}

impl From<Ticket> for RawTicket {
    /// Re-wraps a canonical ticket as a raw record, e.g. for outbound event
    /// payloads. `Ticket::from_raw(t.into(), _)` reproduces `t` exactly.
    fn from(t: Ticket) -> RawTicket {
        RawTicket {
            id: t.id,
            title: Some(t.title),
            description: Some(t.description),
            status: Some(t.status.to_string()),
            priority: Some(t.priority.to_string()),
            created_at: Some(t.created_at),
            updated_at: Some(t.updated_at),
            sla_deadline: Some(t.sla_deadline),
            assigned_to: t.assigned_to,
            created_by: t.created_by,
            assigned_department_id: t.assigned_department_id,
            assigned_department_name: t.assigned_department_name,
            tags: Some(t.tags),
            comments: Some(
                t.comments
                    .into_iter()
                    .map(|c| RawComment {
                        id: c.id,
                        author_id: c.author_id,
                        body: Some(c.body),
                        created_at: Some(c.created_at),
                    })
                    .collect(),
            ),
            attachments: Some(
                t.attachments
                    .into_iter()
                    .map(|a| RawAttachment {
                        id: a.id,
                        file_name: Some(a.file_name),
                        size_bytes: Some(a.size_bytes),
                    })
                    .collect(),
            ),
        }
    }
}

fn parse_or_default<T>(value: Option<&str>, fallback: T, ticket_id: &str, field: &str) -> T
where
    T: std::str::FromStr + Copy,
{
    match value {
        None => fallback,
        Some(s) => match s.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                log::warn!("Ticket {ticket_id}: unknown {field} '{s}', using default");
                fallback
            }
        },
    }
}
