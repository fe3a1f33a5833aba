// ── Host messages ──
//
// Wire shapes exchanged with the hosting dashboard. Outbound messages are
// `{payload, topic}` objects; the only inbound message the client reacts
// to is the worker reload signal.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use webpush_platform::PushSubscription;

/// Inbound payload that asks the client to refresh its worker script.
pub const RELOAD_SERVICE_WORKER: &str = "reload_service_worker";

/// Kind of an outbound report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Topic {
    /// A subscription found at startup (only when configured to send it).
    SubscriptionExisting,
    SubscriptionNew,
    Unsubscription,
    Error,
}

/// Body of an outbound report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Subscription(PushSubscription),
    Error(String),
}

/// A message sent to the host backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub payload: Payload,
    pub topic: Topic,
}

impl OutboundMessage {
    pub fn subscription(topic: Topic, subscription: PushSubscription) -> Self {
        Self {
            payload: Payload::Subscription(subscription),
            topic,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            payload: Payload::Error(message.into()),
            topic: Topic::Error,
        }
    }
}

/// Control signals recognised in inbound host messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    ReloadWorker,
}

impl Control {
    /// Recognise a control signal. Messages without a matching string
    /// `payload` are not control messages.
    pub fn from_message(message: &Value) -> Option<Self> {
        match message.get("payload").and_then(Value::as_str) {
            Some(RELOAD_SERVICE_WORKER) => Some(Self::ReloadWorker),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use webpush_platform::MemoryPlatform;

    #[test]
    fn subscription_report_wire_shape() {
        let sub = MemoryPlatform::sample_subscription("x");
        let msg = OutboundMessage::subscription(Topic::SubscriptionNew, sub);
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "payload": {
                    "endpoint": "https://push.example.invalid/send/x",
                    "expirationTime": null,
                    "keys": { "p256dh": "p256dh-x", "auth": "auth-x" }
                },
                "topic": "subscription_new"
            })
        );
    }

    #[test]
    fn error_report_carries_plain_string() {
        let msg = OutboundMessage::error("boom");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({ "payload": "boom", "topic": "error" })
        );
    }

    #[test]
    fn only_exact_reload_payload_is_a_control_message() {
        assert_eq!(
            Control::from_message(&json!({ "payload": "reload_service_worker" })),
            Some(Control::ReloadWorker)
        );
        assert_eq!(Control::from_message(&json!({ "payload": "reload" })), None);
        assert_eq!(Control::from_message(&json!({ "payload": 1 })), None);
        assert_eq!(Control::from_message(&json!({ "topic": "x" })), None);
        assert_eq!(Control::from_message(&json!("reload_service_worker")), None);
    }

    #[test]
    fn topics_render_snake_case() {
        assert_eq!(Topic::SubscriptionExisting.to_string(), "subscription_existing");
        assert_eq!("unsubscription".parse::<Topic>().unwrap(), Topic::Unsubscription);
    }
}
