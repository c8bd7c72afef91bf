//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    /// Base URL of the remote ticketing API, e.g. `https://helpdesk.example.com/api`.
    pub api_base_url: String,
    /// Bearer token presented to the ticketing API.
    pub api_token: String,
    /// Page size for the organization-wide fetch used for stats computation.
    pub stats_page_limit: u32,
    /// Page size for the bounded "recent tickets" fetch shown on dashboard tabs.
    pub recent_page_limit: u32,
    /// Maximum number of realtime events retained in the trailing history.
    pub event_history_limit: usize,
    pub request_timeout_seconds: u64,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Only `API_BASE_URL` has no usable default; everything else falls back to
    /// a documented value so the pure domain crates stay usable without any
    /// environment at all.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "helpdesk-dashboard".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "dashboard=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "dashboard.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            api_base_url: env::var("API_BASE_URL").unwrap_or_default(),
            api_token: env::var("API_TOKEN").unwrap_or_default(),
            stats_page_limit: env::var("STATS_PAGE_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(500),
            recent_page_limit: env::var("RECENT_PAGE_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            event_history_limit: env::var("EVENT_HISTORY_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50),
            request_timeout_seconds: env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock.write().expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    ///
    /// Used by public per-field setter methods.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_project_name(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.project_name = value.into());
    }

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_log_file(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_file = value.into());
    }

    pub fn set_log_to_stdout(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stdout = value);
    }

    pub fn set_api_base_url(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.api_base_url = value.into());
    }

    pub fn set_api_token(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.api_token = value.into());
    }

    pub fn set_stats_page_limit(value: u32) {
        AppConfig::set_field(|cfg| cfg.stats_page_limit = value);
    }

    pub fn set_recent_page_limit(value: u32) {
        AppConfig::set_field(|cfg| cfg.recent_page_limit = value);
    }

    pub fn set_event_history_limit(value: usize) {
        AppConfig::set_field(|cfg| cfg.event_history_limit = value);
    }

    pub fn set_request_timeout_seconds(value: u64) {
        AppConfig::set_field(|cfg| cfg.request_timeout_seconds = value);
    }
}

// --- Module-level accessors, mirroring the field names ---

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn api_base_url() -> String {
    AppConfig::global().api_base_url.clone()
}

pub fn api_token() -> String {
    AppConfig::global().api_token.clone()
}

pub fn stats_page_limit() -> u32 {
    AppConfig::global().stats_page_limit
}

pub fn recent_page_limit() -> u32 {
    AppConfig::global().recent_page_limit
}

pub fn event_history_limit() -> usize {
    AppConfig::global().event_history_limit
}

pub fn request_timeout_seconds() -> u64 {
    AppConfig::global().request_timeout_seconds
}
