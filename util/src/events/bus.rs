//! A thread-safe push-event bus for channel-based message fan-out.
//!
//! Uses Tokio broadcast channels per event channel. This is the process-local
//! stand-in for the external push-event source; reconnection policy (if any)
//! lives with whatever feeds the bus, never here.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

/// Type alias for channel name.
type Channel = String;

/// Sender for a channel's broadcast queue.
type Sender = broadcast::Sender<String>;

/// Receiver for a channel's broadcast queue.
type Receiver = broadcast::Receiver<String>;

/// Manages broadcast queues per channel to support realtime event delivery.
///
/// - Lazily creates broadcast queues per channel on first subscription
/// - Removes channels when their subscriber count drops to zero after publishing
#[derive(Clone, Default)]
pub struct EventBus {
    /// Map of channels to broadcast senders.
    pub inner: Arc<RwLock<HashMap<Channel, Sender>>>,
}

impl EventBus {
    /// Creates a new, empty `EventBus`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to the given channel, creating it if necessary.
    pub async fn subscribe(&self, channel: &str) -> Receiver {
        let mut map = self.inner.write().await;
        map.entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(100).0)
            .subscribe()
    }

    /// Publishes a message to all subscribers of `channel`.
    ///
    /// If the channel does not exist, it's a no-op.
    /// If the channel has zero subscribers after sending, it is removed.
    pub async fn publish<T: Into<String>>(&self, channel: &str, msg: T) {
        let mut map = self.inner.write().await;
        if let Some(sender) = map.get(channel) {
            let _ = sender.send(msg.into());
            if sender.receiver_count() == 0 {
                tracing::info!("Removing channel '{channel}' due to no subscribers.");
                map.remove(channel);
            }
        }
    }

    /// Returns the number of live subscribers on `channel`.
    pub async fn subscriber_count(&self, channel: &str) -> usize {
        let map = self.inner.read().await;
        map.get(channel).map(|s| s.receiver_count()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Duration, timeout};

    #[tokio::test]
    async fn it_publishes_to_all_subscribers() {
        let bus = EventBus::new();
        let channel = "ticket_created";

        let mut r1 = bus.subscribe(channel).await;
        let mut r2 = bus.subscribe(channel).await;

        bus.publish(channel, "hello world").await;

        let msg1 = timeout(Duration::from_millis(50), r1.recv())
            .await
            .unwrap()
            .unwrap();
        let msg2 = timeout(Duration::from_millis(50), r2.recv())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(msg1, "hello world");
        assert_eq!(msg2, "hello world");
    }

    #[tokio::test]
    async fn it_creates_channel_lazily() {
        let bus = EventBus::new();
        let channel = "lazy-create";
        assert!(bus.inner.read().await.get(channel).is_none());
        let _ = bus.subscribe(channel).await;
        assert!(bus.inner.read().await.get(channel).is_some());
    }

    #[tokio::test]
    async fn publish_to_empty_channel_does_not_panic() {
        let bus = EventBus::new();
        bus.publish("no-subscribers", "silent").await;
    }

    #[tokio::test]
    async fn channel_is_removed_after_publish_if_no_subscribers() {
        let bus = EventBus::new();
        let channel = "ephemeral-channel";
        {
            let _ = bus.subscribe(channel).await;
        } // drop receiver
        bus.publish(channel, "cleanup").await;
        let map = bus.inner.read().await;
        assert!(!map.contains_key(channel));
    }

    #[tokio::test]
    async fn subscriber_count_tracks_live_receivers() {
        let bus = EventBus::new();
        let channel = "counted";
        assert_eq!(bus.subscriber_count(channel).await, 0);
        let r1 = bus.subscribe(channel).await;
        let r2 = bus.subscribe(channel).await;
        assert_eq!(bus.subscriber_count(channel).await, 2);
        drop(r1);
        drop(r2);
        bus.publish(channel, "bye").await;
        assert_eq!(bus.subscriber_count(channel).await, 0);
    }
}
