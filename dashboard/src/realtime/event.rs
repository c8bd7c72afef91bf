//! Realtime event types and the viewer-relevance gate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::notify::Notification;
use crate::state::Viewer;

/// The closed set of push events the dashboard reacts to. The snake_case
/// name doubles as the bus channel the event arrives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EventKind {
    TicketCreated,
    TicketUpdated,
    TicketAssigned,
    TicketResolved,
    TicketClosed,
    SlaBreach,
    UserMentioned,
    SystemAlert,
}

impl EventKind {
    /// Stable channel name, usable where a `&'static str` is required.
    pub fn channel_name(self) -> &'static str {
        match self {
            EventKind::TicketCreated => "ticket_created",
            EventKind::TicketUpdated => "ticket_updated",
            EventKind::TicketAssigned => "ticket_assigned",
            EventKind::TicketResolved => "ticket_resolved",
            EventKind::TicketClosed => "ticket_closed",
            EventKind::SlaBreach => "sla_breach",
            EventKind::UserMentioned => "user_mentioned",
            EventKind::SystemAlert => "system_alert",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketEventRef {
    pub id: String,
    pub title: Option<String>,
    pub assigned_to: Option<String>,
    pub created_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserEventRef {
    pub id: String,
    pub display_name: Option<String>,
}

/// Variant payload carried by every event kind. Which fields are populated
/// depends on the kind; the relevance gate treats an absent field as
/// "not relevant to this viewer".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventData {
    pub ticket: Option<TicketEventRef>,
    pub user: Option<UserEventRef>,
    pub message: Option<String>,
    pub severity: Option<Severity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub data: EventData,
}

/// A dispatched event: payload plus the timestamp assigned at dispatch time
/// (never by the origin).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StampedEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub data: EventData,
    pub timestamp: DateTime<Utc>,
}

/// Decides whether `event` warrants a toast for `viewer`.
///
/// - ticket_assigned: only the new assignee
/// - ticket_updated: assignee or creator
/// - ticket_resolved / ticket_closed: only the creator
/// - sla_breach: only the assignee
/// - user_mentioned: only the mentioned user
/// - ticket_created / system_alert: everyone
pub fn concerns_viewer(viewer: &Viewer, kind: EventKind, data: &EventData) -> bool {
    let ticket = data.ticket.as_ref();
    let is_assignee = ticket
        .and_then(|t| t.assigned_to.as_deref())
        .is_some_and(|id| id == viewer.id);
    let is_creator = ticket
        .and_then(|t| t.created_by.as_deref())
        .is_some_and(|id| id == viewer.id);

    match kind {
        EventKind::TicketCreated | EventKind::SystemAlert => true,
        EventKind::TicketAssigned => is_assignee,
        EventKind::TicketUpdated => is_assignee || is_creator,
        EventKind::TicketResolved | EventKind::TicketClosed => is_creator,
        EventKind::SlaBreach => is_assignee,
        EventKind::UserMentioned => data
            .user
            .as_ref()
            .is_some_and(|u| u.id == viewer.id),
    }
}

/// Builds the toast for an event that passed the relevance gate.
pub fn to_notification(kind: EventKind, data: &EventData) -> Notification {
    let subject = data
        .ticket
        .as_ref()
        .and_then(|t| t.title.clone())
        .or_else(|| data.message.clone())
        .unwrap_or_default();

    match kind {
        EventKind::TicketCreated => Notification::info("New ticket", subject),
        EventKind::TicketUpdated => Notification::info("Ticket updated", subject),
        EventKind::TicketAssigned => Notification::info("Ticket assigned to you", subject),
        EventKind::TicketResolved => Notification::success("Your ticket was resolved", subject),
        EventKind::TicketClosed => Notification::info("Your ticket was closed", subject),
        EventKind::SlaBreach => Notification::warning("SLA breached", subject),
        EventKind::UserMentioned => Notification::info("You were mentioned", subject),
        EventKind::SystemAlert => match data.severity {
            Some(Severity::Critical) => Notification::error("System alert", subject),
            _ => Notification::warning("System alert", subject),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationKind;
    use services::role_config::Role;

    fn viewer(id: &str) -> Viewer {
        Viewer::new(id, Role::Employee, format!("{id}@example.com"))
    }

    fn ticket_data(assigned_to: Option<&str>, created_by: Option<&str>) -> EventData {
        EventData {
            ticket: Some(TicketEventRef {
                id: "t-1".into(),
                title: Some("Printer on fire".into()),
                assigned_to: assigned_to.map(Into::into),
                created_by: created_by.map(Into::into),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn assignment_only_concerns_the_assignee() {
        let data = ticket_data(Some("u1"), Some("u9"));
        assert!(concerns_viewer(&viewer("u1"), EventKind::TicketAssigned, &data));
        assert!(!concerns_viewer(&viewer("u2"), EventKind::TicketAssigned, &data));
    }

    #[test]
    fn updates_concern_assignee_and_creator() {
        let data = ticket_data(Some("u1"), Some("u2"));
        assert!(concerns_viewer(&viewer("u1"), EventKind::TicketUpdated, &data));
        assert!(concerns_viewer(&viewer("u2"), EventKind::TicketUpdated, &data));
        assert!(!concerns_viewer(&viewer("u3"), EventKind::TicketUpdated, &data));
    }

    #[test]
    fn resolution_and_closure_concern_only_the_creator() {
        let data = ticket_data(Some("u1"), Some("u2"));
        for kind in [EventKind::TicketResolved, EventKind::TicketClosed] {
            assert!(!concerns_viewer(&viewer("u1"), kind, &data));
            assert!(concerns_viewer(&viewer("u2"), kind, &data));
        }
    }

    #[test]
    fn sla_breach_concerns_only_the_assignee() {
        let data = ticket_data(Some("u1"), Some("u2"));
        assert!(concerns_viewer(&viewer("u1"), EventKind::SlaBreach, &data));
        assert!(!concerns_viewer(&viewer("u2"), EventKind::SlaBreach, &data));
    }

    #[test]
    fn mentions_match_the_target_user() {
        let data = EventData {
            user: Some(UserEventRef {
                id: "u5".into(),
                display_name: None,
            }),
            ..Default::default()
        };
        assert!(concerns_viewer(&viewer("u5"), EventKind::UserMentioned, &data));
        assert!(!concerns_viewer(&viewer("u6"), EventKind::UserMentioned, &data));
    }

    #[test]
    fn broadcasts_concern_everyone_even_without_payload() {
        let data = EventData::default();
        assert!(concerns_viewer(&viewer("anyone"), EventKind::TicketCreated, &data));
        assert!(concerns_viewer(&viewer("anyone"), EventKind::SystemAlert, &data));
    }

    #[test]
    fn absent_references_never_match() {
        let data = EventData::default();
        assert!(!concerns_viewer(&viewer("u1"), EventKind::TicketAssigned, &data));
        assert!(!concerns_viewer(&viewer("u1"), EventKind::UserMentioned, &data));
    }

    #[test]
    fn system_alert_severity_maps_to_toast_level() {
        let critical = EventData {
            severity: Some(Severity::Critical),
            message: Some("db down".into()),
            ..Default::default()
        };
        let mild = EventData {
            severity: Some(Severity::Info),
            ..Default::default()
        };
        assert_eq!(
            to_notification(EventKind::SystemAlert, &critical).kind,
            NotificationKind::Error
        );
        assert_eq!(
            to_notification(EventKind::SystemAlert, &mild).kind,
            NotificationKind::Warning
        );
    }

    #[test]
    fn kind_round_trips_through_its_channel_name() {
        use strum::IntoEnumIterator;
        for kind in EventKind::iter() {
            assert_eq!(kind.channel_name().parse::<EventKind>().unwrap(), kind);
        }
    }
}
