//! Realtime event dispatch.
//!
//! The dispatcher subscribes to every event channel on the bus, stamps each
//! accepted payload with a dispatch timestamp, keeps `last_event` plus a
//! bounded trailing history, forwards the event to registered per-kind
//! callbacks, and raises a toast when the event concerns the viewer.
//!
//! Malformed payloads are logged and dropped; the pump keeps running.
//! Teardown is a disposer: dropping the [`Subscription`] aborts every pump
//! task, so remounting a consumer can never double-deliver.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use chrono::Utc;
use serde::Deserialize;
use strum::IntoEnumIterator;
use tokio::sync::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use util::events::EventBus;

use super::event::{self, EventData, EventKind, RealtimeEvent, StampedEvent};
use crate::notify::NotificationSink;
use crate::state::Viewer;

type Callback = dyn Fn(&StampedEvent) + Send + Sync;

#[derive(Default)]
struct CallbackRegistry {
    next_id: u64,
    by_kind: HashMap<EventKind, Vec<(u64, Arc<Callback>)>>,
}

/// Removes its callback on drop. Holding the guard is what keeps the
/// registration alive — there is no `off()` to forget to call.
pub struct CallbackGuard {
    registry: Weak<Mutex<CallbackRegistry>>,
    kind: EventKind,
    id: u64,
}

impl Drop for CallbackGuard {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.lock().expect("callback registry poisoned");
            if let Some(entries) = registry.by_kind.get_mut(&self.kind) {
                entries.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

/// Live bus subscription. Dropping it aborts every pump task; each `start`
/// is matched by exactly one teardown.
pub struct Subscription {
    tasks: Vec<JoinHandle<()>>,
}

impl Subscription {
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

struct EventLog {
    last_event: Option<StampedEvent>,
    history: VecDeque<StampedEvent>,
    history_limit: usize,
}

/// Envelope shape arriving on the bus; see `util::events::EventEnvelope`.
#[derive(Deserialize)]
struct InboundEnvelope {
    event: String,
    #[serde(default)]
    payload: serde_json::Value,
}

pub struct RealtimeDispatcher {
    bus: EventBus,
    notifier: Arc<dyn NotificationSink>,
    viewer: Viewer,
    notifications_enabled: bool,
    log: Arc<RwLock<EventLog>>,
    callbacks: Arc<Mutex<CallbackRegistry>>,
    dropped: Arc<AtomicU64>,
}

impl RealtimeDispatcher {
    /// History capacity comes from the global config; override with
    /// [`RealtimeDispatcher::with_history_limit`] when embedding.
    pub fn new(bus: EventBus, notifier: Arc<dyn NotificationSink>, viewer: Viewer) -> Self {
        Self::with_history_limit(bus, notifier, viewer, common::config::event_history_limit())
    }

    pub fn with_history_limit(
        bus: EventBus,
        notifier: Arc<dyn NotificationSink>,
        viewer: Viewer,
        history_limit: usize,
    ) -> Self {
        Self {
            bus,
            notifier,
            viewer,
            notifications_enabled: true,
            log: Arc::new(RwLock::new(EventLog {
                last_event: None,
                history: VecDeque::with_capacity(history_limit),
                history_limit,
            })),
            callbacks: Arc::new(Mutex::new(CallbackRegistry::default())),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Disables toast raising while leaving callbacks and history intact.
    pub fn without_notifications(mut self) -> Self {
        self.notifications_enabled = false;
        self
    }

    /// Registers a callback for one event kind. The registration lives as
    /// long as the returned guard.
    pub fn on(
        &self,
        kind: EventKind,
        callback: impl Fn(&StampedEvent) + Send + Sync + 'static,
    ) -> CallbackGuard {
        let mut registry = self.callbacks.lock().expect("callback registry poisoned");
        registry.next_id += 1;
        let id = registry.next_id;
        registry
            .by_kind
            .entry(kind)
            .or_default()
            .push((id, Arc::new(callback)));
        CallbackGuard {
            registry: Arc::downgrade(&self.callbacks),
            kind,
            id,
        }
    }

    /// Subscribes to every event channel and spawns one pump task per kind.
    pub async fn start(&self) -> Subscription {
        let mut tasks = Vec::new();
        for kind in EventKind::iter() {
            let mut rx = self.bus.subscribe(kind.channel_name()).await;
            let ctx = PumpContext {
                kind,
                viewer: self.viewer.clone(),
                notifier: self.notifier.clone(),
                notifications_enabled: self.notifications_enabled,
                log: self.log.clone(),
                callbacks: self.callbacks.clone(),
                dropped: self.dropped.clone(),
            };
            tasks.push(tokio::spawn(async move {
                loop {
                    match rx.recv().await {
                        Ok(raw) => ctx.ingest(&raw).await,
                        Err(RecvError::Lagged(missed)) => {
                            tracing::warn!(
                                "Realtime pump for '{}' lagged, {missed} events skipped",
                                ctx.kind
                            );
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }));
        }
        Subscription { tasks }
    }

    /// Publishes an outbound event on the bus under this kind's channel.
    pub async fn send(&self, kind: EventKind, data: &EventData) {
        util::events::emit(&self.bus, kind.channel_name(), kind.channel_name(), data).await;
    }

    pub async fn last_event(&self) -> Option<StampedEvent> {
        self.log.read().await.last_event.clone()
    }

    /// Trailing history, oldest first, capped at the configured limit.
    pub async fn history(&self) -> Vec<StampedEvent> {
        self.log.read().await.history.iter().cloned().collect()
    }

    /// Count of malformed payloads dropped so far. Diagnostics only.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

struct PumpContext {
    kind: EventKind,
    viewer: Viewer,
    notifier: Arc<dyn NotificationSink>,
    notifications_enabled: bool,
    log: Arc<RwLock<EventLog>>,
    callbacks: Arc<Mutex<CallbackRegistry>>,
    dropped: Arc<AtomicU64>,
}

impl PumpContext {
    async fn ingest(&self, raw: &str) {
        let data = match parse_payload(self.kind, raw) {
            Ok(data) => data,
            Err(reason) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Dropping malformed '{}' event: {reason}; raw={raw}", self.kind);
                return;
            }
        };

        // Dispatch timestamp is assigned here, not by the origin.
        let stamped = StampedEvent {
            kind: self.kind,
            data,
            timestamp: Utc::now(),
        };

        {
            let mut log = self.log.write().await;
            if log.history.len() == log.history_limit {
                log.history.pop_front();
            }
            log.history.push_back(stamped.clone());
            log.last_event = Some(stamped.clone());
        }

        let callbacks: Vec<Arc<Callback>> = {
            let registry = self.callbacks.lock().expect("callback registry poisoned");
            registry
                .by_kind
                .get(&self.kind)
                .map(|entries| entries.iter().map(|(_, cb)| cb.clone()).collect())
                .unwrap_or_default()
        };
        for callback in callbacks {
            callback(&stamped);
        }

        if self.notifications_enabled
            && event::concerns_viewer(&self.viewer, self.kind, &stamped.data)
        {
            self.notifier
                .notify(event::to_notification(self.kind, &stamped.data));
        }
    }
}

/// Accepts both wire shapes: the bus envelope (`{event, payload, ...}`) and a
/// bare event (`{type, data}`). Either way the declared name must match the
/// channel the message arrived on.
fn parse_payload(kind: EventKind, raw: &str) -> Result<EventData, String> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| format!("invalid json: {e}"))?;

    if value.get("event").is_some() {
        let envelope: InboundEnvelope =
            serde_json::from_value(value).map_err(|e| format!("invalid envelope: {e}"))?;
        if envelope.event.parse::<EventKind>().map_or(true, |k| k != kind) {
            return Err(format!("event name '{}' does not match channel", envelope.event));
        }
        return serde_json::from_value(envelope.payload)
            .map_err(|e| format!("invalid payload: {e}"));
    }

    let event: RealtimeEvent =
        serde_json::from_value(value).map_err(|e| format!("invalid event: {e}"))?;
    if event.kind != kind {
        return Err(format!("event type '{}' does not match channel", event.kind));
    }
    Ok(event.data)
}
