//! Dashboard statistics fold.
//!
//! One full pass over the viewer's stats scope per orchestration cycle; no
//! incremental updates. Deterministic given (tickets, `now`).

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;

use crate::ticket::{Ticket, TicketStatus};

/// Snapshot of every number the dashboard cards can show.
///
/// Ephemeral: recomputed from scratch on every refresh and discarded with the
/// view that owns it. The role-conditional fields (`pending_approvals`,
/// `team_members`, `assigned_tickets`, `department_tickets`) stay zero unless
/// the caller supplied the corresponding input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    // headline counts
    pub total_tickets: usize,
    pub open_tickets: usize,
    pub resolved_tickets: usize,
    pub critical_tickets: usize,
    pub overdue_tickets: usize,

    // creation windows, all computed from the same `now`
    pub today_tickets: usize,
    pub weekly_tickets: usize,
    pub monthly_tickets: usize,

    /// Integer percent in 0..=100; 0 when `monthly_tickets` is 0.
    pub team_efficiency: u8,
    /// Externally supplied; never computed here.
    pub user_satisfaction: Option<f32>,

    // role-conditional extensions
    pub pending_approvals: usize,
    pub team_members: usize,
    pub assigned_tickets: usize,
    pub department_tickets: usize,
}

/// Inputs for one fold. `scope` is the full ticket set for the viewer's
/// stats visibility; the optional slices are the role-specific subsets the
/// orchestrator happened to fetch this cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsInput<'a> {
    pub scope: &'a [Ticket],
    pub assigned: Option<&'a [Ticket]>,
    pub department: Option<&'a [Ticket]>,
    pub team_members: Option<usize>,
    pub user_satisfaction: Option<f32>,
}

#[inline]
fn in_window(ts: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    start <= ts && ts < end
}

impl DashboardStats {
    /// Folds `input.scope` into a stats snapshot, evaluated at `now`.
    pub fn compute(input: StatsInput<'_>, now: DateTime<Utc>) -> DashboardStats {
        let midnight = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let week_start = now - Duration::days(7);
        let month_start = now - Duration::days(30);

        let mut open = 0usize;
        let mut resolved = 0usize;
        let mut critical = 0usize;
        let mut overdue = 0usize;
        let mut today = 0usize;
        let mut weekly = 0usize;
        let mut monthly = 0usize;
        let mut resolved_this_month = 0usize;
        let mut pending_approvals = 0usize;

        for t in input.scope {
            if t.status.is_open() {
                open += 1;
            }
            if t.status.is_resolved() {
                resolved += 1;
            }
            if t.priority.is_escalated() {
                critical += 1;
            }
            if t.status.is_sla_tracked() && t.sla_deadline < now {
                overdue += 1;
            }
            if t.status == TicketStatus::PendingApproval {
                pending_approvals += 1;
            }

            if in_window(t.created_at, midnight, now) {
                today += 1;
            }
            if in_window(t.created_at, week_start, now) {
                weekly += 1;
            }
            if in_window(t.created_at, month_start, now) {
                monthly += 1;
            }
            if t.status.is_resolved() && in_window(t.updated_at, month_start, now) {
                resolved_this_month += 1;
            }
        }

        let team_efficiency = if monthly > 0 {
            ((resolved_this_month as f64 / monthly as f64) * 100.0).round() as u8
        } else {
            0
        };

        DashboardStats {
            total_tickets: input.scope.len(),
            open_tickets: open,
            resolved_tickets: resolved,
            critical_tickets: critical,
            overdue_tickets: overdue,
            today_tickets: today,
            weekly_tickets: weekly,
            monthly_tickets: monthly,
            team_efficiency,
            user_satisfaction: input.user_satisfaction,
            pending_approvals,
            team_members: input.team_members.unwrap_or(0),
            assigned_tickets: input.assigned.map(|s| s.len()).unwrap_or(0),
            department_tickets: input.department.map(|s| s.len()).unwrap_or(0),
        }
    }
}
