//! Role-to-dashboard configuration table.
//!
//! Pure lookup: a role maps to the ticket subsets to fetch, the tabs to
//! render, and the stat cards to show. The table is static data validated
//! once at startup; nothing here touches the network or any state.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use thiserror::Error;

/// Viewer roles recognized by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Role {
    Employee,
    Manager,
    OrgAdmin,
    HelpdeskDepartment,
    HelpdeskAdmin,
}

impl Role {
    /// Total parse: unrecognized tags resolve to the employee role so every
    /// viewer gets a working dashboard.
    pub fn from_tag(tag: &str) -> Role {
        tag.trim().parse().unwrap_or(Role::Employee)
    }
}

/// Which ticket subsets a cycle must fetch. `mine` is true for every role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsetFlags {
    pub mine: bool,
    pub organization: bool,
    pub assigned: bool,
    pub department: bool,
}

/// The subset a tab's ticket list is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabSource {
    Mine,
    /// The bounded "recent" page of the organization-wide fetch.
    Organization,
    Assigned,
    Department,
}

impl TabSource {
    fn is_fetched(self, fetch: SubsetFlags) -> bool {
        match self {
            TabSource::Mine => fetch.mine,
            TabSource::Organization => fetch.organization,
            TabSource::Assigned => fetch.assigned,
            TabSource::Department => fetch.department,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub source: TabSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatCardSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

/// One row of the role table.
#[derive(Debug, Clone, Copy)]
pub struct DashboardConfig {
    pub role: Role,
    pub fetch: SubsetFlags,
    pub tabs: &'static [TabSpec],
    pub cards: &'static [StatCardSpec],
}

const MINE_ONLY: SubsetFlags = SubsetFlags {
    mine: true,
    organization: false,
    assigned: false,
    department: false,
};

const CARD_TOTAL: StatCardSpec = StatCardSpec {
    key: "total",
    label: "Total Tickets",
    description: "Everything in your current view",
};
const CARD_OPEN: StatCardSpec = StatCardSpec {
    key: "open",
    label: "Open",
    description: "Raised, in progress or awaiting approval",
};
const CARD_RESOLVED: StatCardSpec = StatCardSpec {
    key: "resolved",
    label: "Resolved",
    description: "Resolved or approved",
};
const CARD_CRITICAL: StatCardSpec = StatCardSpec {
    key: "critical",
    label: "Critical",
    description: "High and critical priority",
};
const CARD_OVERDUE: StatCardSpec = StatCardSpec {
    key: "overdue",
    label: "Overdue",
    description: "Active tickets past their SLA deadline",
};
const CARD_EFFICIENCY: StatCardSpec = StatCardSpec {
    key: "team_efficiency",
    label: "Team Efficiency",
    description: "Resolved this month over created this month",
};
const CARD_ASSIGNED: StatCardSpec = StatCardSpec {
    key: "assigned",
    label: "Assigned To Me",
    description: "Tickets currently on your queue",
};
const CARD_DEPARTMENT: StatCardSpec = StatCardSpec {
    key: "department",
    label: "Department",
    description: "Tickets routed to your department",
};
const CARD_PENDING_APPROVALS: StatCardSpec = StatCardSpec {
    key: "pending_approvals",
    label: "Pending Approvals",
    description: "Tickets waiting on an approval decision",
};

static CONFIGS: &[DashboardConfig] = &[
    DashboardConfig {
        role: Role::Employee,
        fetch: MINE_ONLY,
        tabs: &[TabSpec {
            key: "my_tickets",
            label: "My Tickets",
            icon: "inbox",
            source: TabSource::Mine,
        }],
        cards: &[CARD_TOTAL, CARD_OPEN, CARD_RESOLVED, CARD_OVERDUE],
    },
    DashboardConfig {
        role: Role::Manager,
        fetch: SubsetFlags {
            mine: true,
            organization: false,
            assigned: true,
            department: true,
        },
        tabs: &[
            TabSpec {
                key: "assigned",
                label: "Assigned To Me",
                icon: "user-check",
                source: TabSource::Assigned,
            },
            TabSpec {
                key: "department",
                label: "Department",
                icon: "building",
                source: TabSource::Department,
            },
            TabSpec {
                key: "my_tickets",
                label: "My Tickets",
                icon: "inbox",
                source: TabSource::Mine,
            },
        ],
        cards: &[
            CARD_TOTAL,
            CARD_OPEN,
            CARD_ASSIGNED,
            CARD_DEPARTMENT,
            CARD_EFFICIENCY,
        ],
    },
    DashboardConfig {
        role: Role::OrgAdmin,
        fetch: SubsetFlags {
            mine: true,
            organization: true,
            assigned: false,
            department: false,
        },
        tabs: &[
            TabSpec {
                key: "recent",
                label: "Recent Activity",
                icon: "activity",
                source: TabSource::Organization,
            },
            TabSpec {
                key: "my_tickets",
                label: "My Tickets",
                icon: "inbox",
                source: TabSource::Mine,
            },
        ],
        cards: &[
            CARD_TOTAL,
            CARD_OPEN,
            CARD_RESOLVED,
            CARD_CRITICAL,
            CARD_OVERDUE,
            CARD_EFFICIENCY,
        ],
    },
    DashboardConfig {
        role: Role::HelpdeskDepartment,
        fetch: SubsetFlags {
            mine: true,
            organization: false,
            assigned: true,
            department: true,
        },
        tabs: &[
            TabSpec {
                key: "queue",
                label: "My Queue",
                icon: "list-checks",
                source: TabSource::Assigned,
            },
            TabSpec {
                key: "department",
                label: "Department",
                icon: "building",
                source: TabSource::Department,
            },
            TabSpec {
                key: "my_tickets",
                label: "My Tickets",
                icon: "inbox",
                source: TabSource::Mine,
            },
        ],
        cards: &[
            CARD_ASSIGNED,
            CARD_DEPARTMENT,
            CARD_OPEN,
            CARD_OVERDUE,
            CARD_CRITICAL,
        ],
    },
    DashboardConfig {
        role: Role::HelpdeskAdmin,
        fetch: SubsetFlags {
            mine: true,
            organization: true,
            assigned: true,
            department: false,
        },
        tabs: &[
            TabSpec {
                key: "recent",
                label: "Recent Activity",
                icon: "activity",
                source: TabSource::Organization,
            },
            TabSpec {
                key: "queue",
                label: "My Queue",
                icon: "list-checks",
                source: TabSource::Assigned,
            },
            TabSpec {
                key: "my_tickets",
                label: "My Tickets",
                icon: "inbox",
                source: TabSource::Mine,
            },
        ],
        cards: &[
            CARD_TOTAL,
            CARD_OPEN,
            CARD_PENDING_APPROVALS,
            CARD_CRITICAL,
            CARD_OVERDUE,
            CARD_EFFICIENCY,
        ],
    },
];

impl DashboardConfig {
    /// Resolves the configuration for `role`. Total over the enumeration;
    /// a role missing from the table resolves to the employee row.
    pub fn for_role(role: Role) -> &'static DashboardConfig {
        CONFIGS
            .iter()
            .find(|c| c.role == role)
            .unwrap_or(&CONFIGS[0])
    }

    pub fn all() -> &'static [DashboardConfig] {
        CONFIGS
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RoleConfigError {
    #[error("role {role} is missing from the dashboard config table")]
    MissingRole { role: Role },
    #[error("role {role} has no tabs configured")]
    NoTabs { role: Role },
    #[error("role {role} does not fetch its own tickets")]
    MineDisabled { role: Role },
    #[error("role {role} lists tab '{key}' more than once")]
    DuplicateTab { role: Role, key: &'static str },
    #[error("role {role} lists card '{key}' more than once")]
    DuplicateCard { role: Role, key: &'static str },
    #[error("role {role} tab '{key}' reads a subset the role never fetches")]
    TabSourceNotFetched { role: Role, key: &'static str },
}

/// Startup check over the built-in table. Catches the classes of drift that
/// hand-maintained tab lists accumulate: duplicate entries, missing roles,
/// tabs pointing at subsets the role never fetches.
pub fn validate_role_configs() -> Result<(), RoleConfigError> {
    validate_table(CONFIGS)
}

fn validate_table(configs: &[DashboardConfig]) -> Result<(), RoleConfigError> {
    for role in Role::iter() {
        let config = configs
            .iter()
            .find(|c| c.role == role)
            .ok_or(RoleConfigError::MissingRole { role })?;

        if config.tabs.is_empty() {
            return Err(RoleConfigError::NoTabs { role });
        }
        if !config.fetch.mine {
            return Err(RoleConfigError::MineDisabled { role });
        }

        let mut seen_tabs: Vec<&str> = Vec::new();
        for tab in config.tabs {
            if seen_tabs.contains(&tab.key) {
                return Err(RoleConfigError::DuplicateTab { role, key: tab.key });
            }
            seen_tabs.push(tab.key);

            if !tab.source.is_fetched(config.fetch) {
                return Err(RoleConfigError::TabSourceNotFetched { role, key: tab.key });
            }
        }

        let mut seen_cards: Vec<&str> = Vec::new();
        for card in config.cards {
            if seen_cards.contains(&card.key) {
                return Err(RoleConfigError::DuplicateCard { role, key: card.key });
            }
            seen_cards.push(card.key);
        }
    }
    Ok(())
}
