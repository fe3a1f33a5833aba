// ── Platform value types ──
//
// Plain values that cross the platform boundary. `PushSubscription`
// serializes the same way the browser's `PushSubscription.toJSON()` does,
// so the backend receives the shape it already knows.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// What the browser offers, assessed once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub has_worker_support: bool,
    pub has_push_support: bool,
}

impl Capabilities {
    /// Both service workers and the push manager are available.
    pub const fn full() -> Self {
        Self {
            has_worker_support: true,
            has_push_support: true,
        }
    }

    /// Neither feature is available.
    pub const fn none() -> Self {
        Self {
            has_worker_support: false,
            has_push_support: false,
        }
    }

    /// The lifecycle machine is reachable only when this is `true`.
    pub const fn is_supported(self) -> bool {
        self.has_worker_support && self.has_push_support
    }
}

/// Result of a notification permission prompt.
///
/// `Default` means the user dismissed the prompt without deciding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    Default,
}

/// The two ways browsers expose a one-shot result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum CallingConvention {
    Promise,
    Callback,
}

/// Client keys of a subscription, base64url encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// An active push subscription issued by the browser's push service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub endpoint: String,
    /// Epoch milliseconds, when the push service announced one.
    #[serde(default)]
    pub expiration_time: Option<u64>,
    pub keys: SubscriptionKeys,
}

/// Options handed to `pushManager.subscribe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Raw (decoded) VAPID public key.
    pub application_server_key: Vec<u8>,
    pub user_visible_only: bool,
}

impl SubscribeOptions {
    /// Options for a subscription whose messages always surface a
    /// notification, the only mode browsers accept.
    pub fn user_visible(application_server_key: Vec<u8>) -> Self {
        Self {
            application_server_key,
            user_visible_only: true,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn subscription_serializes_like_browser_to_json() {
        let sub = PushSubscription {
            endpoint: "https://push.example.com/abc".into(),
            expiration_time: None,
            keys: SubscriptionKeys {
                p256dh: "BNc".into(),
                auth: "tBH".into(),
            },
        };

        let json = serde_json::to_value(&sub).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "endpoint": "https://push.example.com/abc",
                "expirationTime": null,
                "keys": { "p256dh": "BNc", "auth": "tBH" }
            })
        );
    }

    #[test]
    fn permission_state_parses_browser_strings() {
        assert_eq!("granted".parse::<PermissionState>().unwrap(), PermissionState::Granted);
        assert_eq!("default".parse::<PermissionState>().unwrap(), PermissionState::Default);
        assert_eq!(PermissionState::Denied.to_string(), "denied");
    }

    #[test]
    fn capabilities_require_both_features() {
        assert!(Capabilities::full().is_supported());
        assert!(!Capabilities::none().is_supported());
        let no_push = Capabilities {
            has_worker_support: true,
            has_push_support: false,
        };
        assert!(!no_push.is_supported());
    }
}
