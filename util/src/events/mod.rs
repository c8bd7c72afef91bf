// util/src/events/mod.rs
pub mod bus;
pub use bus::EventBus;

use chrono::Utc;
use serde::Serialize;

/// Standard envelope published on every event channel.
#[derive(Serialize)]
pub struct EventEnvelope<'a, T> {
    #[serde(rename = "type")]
    pub r#type: &'static str,
    pub event: &'a str,
    pub channel: &'a str,
    pub payload: T,
    pub ts: String,
}

/// Publish a JSON-serialized `EventEnvelope` on `channel`.
pub async fn emit<T: Serialize>(bus: &EventBus, channel: &str, event: &str, payload: &T) {
    let env = EventEnvelope {
        r#type: "event",
        event,
        channel,
        payload,
        ts: Utc::now().to_rfc3339(),
    };
    if let Ok(json) = serde_json::to_string(&env) {
        bus.publish(channel, json).await;
    }
}
