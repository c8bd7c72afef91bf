//! Fire-and-forget notification surface.
//!
//! The dashboard core never renders toasts itself; it hands `Notification`
//! values to whatever sink the embedding application wires in. No
//! acknowledgment contract.

use std::sync::Mutex;

use serde::Serialize;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl Notification {
    fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            duration_ms: None,
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, title, message)
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title, message)
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Default sink: forwards every toast to the log stream at a matching level.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.kind {
            NotificationKind::Error => tracing::error!("[toast] {}: {}", n.title, n.message),
            NotificationKind::Warning => tracing::warn!("[toast] {}: {}", n.title, n.message),
            _ => tracing::info!("[toast] {}: {}", n.title, n.message),
        }
    }
}

/// Collects notifications in memory. Used by tests and by embedders that
/// drain toasts on their own render cadence.
#[derive(Debug, Default)]
pub struct BufferedNotifier {
    buffer: Mutex<Vec<Notification>>,
}

impl BufferedNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns everything notified so far.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.buffer.lock().expect("notification buffer poisoned"))
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().expect("notification buffer poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NotificationSink for BufferedNotifier {
    fn notify(&self, notification: Notification) {
        self.buffer
            .lock()
            .expect("notification buffer poisoned")
            .push(notification);
    }
}
