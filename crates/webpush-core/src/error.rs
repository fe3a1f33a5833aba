// ── Core error types ──
//
// Lifecycle-level errors. Platform rejections never surface raw: each one
// is wrapped in the variant of the transition step that made the call, so
// the reported message says which step failed.

use thiserror::Error;
use webpush_platform::PermissionState;

use crate::codec::KeyDecodeError;

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    // ── Worker registration ──────────────────────────────────────────
    #[error("Could not register push worker {script_url}: {source}")]
    Registration {
        script_url: String,
        #[source]
        source: webpush_platform::Error,
    },

    #[error("Push worker is not registered")]
    NotRegistered,

    // ── Subscription state ───────────────────────────────────────────
    #[error("Could not query push subscription: {source}")]
    Query {
        #[source]
        source: webpush_platform::Error,
    },

    #[error("No push subscription exists to unsubscribe from")]
    SubscriptionMissing,

    // ── Permission ───────────────────────────────────────────────────
    #[error("Permission prompt failed: {source}")]
    PermissionPrompt {
        #[source]
        source: webpush_platform::Error,
    },

    #[error("{}", denial_message(.permission))]
    PermissionDenied { permission: PermissionState },

    // ── Subscribe / unsubscribe ──────────────────────────────────────
    #[error(transparent)]
    Decode(#[from] KeyDecodeError),

    #[error("Could not subscribe to push notifications: {source}")]
    Subscribe {
        #[source]
        source: webpush_platform::Error,
    },

    #[error("Could not unsubscribe from push notifications: {source}")]
    Unsubscribe {
        #[source]
        source: webpush_platform::Error,
    },

    #[error("Browser refused to remove the push subscription")]
    UnsubscribeRejected,

    // ── Misc ─────────────────────────────────────────────────────────
    #[error("No action is currently possible")]
    NoActionAvailable,

    #[error("Invalid instance id segment {segment:?}: {reason}")]
    InvalidInstanceId { segment: String, reason: String },
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn denial_message(permission: &PermissionState) -> &'static str {
    match permission {
        PermissionState::Default => "Notification permission prompt was dismissed",
        PermissionState::Denied | PermissionState::Granted => {
            "Notification permission was denied"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn denied_and_dismissed_read_differently() {
        let denied = CoreError::PermissionDenied {
            permission: PermissionState::Denied,
        };
        let dismissed = CoreError::PermissionDenied {
            permission: PermissionState::Default,
        };
        assert_eq!(denied.to_string(), "Notification permission was denied");
        assert_eq!(
            dismissed.to_string(),
            "Notification permission prompt was dismissed"
        );
    }

    #[test]
    fn platform_cause_is_kept_in_message() {
        let err = CoreError::Subscribe {
            source: webpush_platform::Error::Subscribe {
                message: "AbortError".into(),
            },
        };
        assert_eq!(
            err.to_string(),
            "Could not subscribe to push notifications: subscribe rejected: AbortError"
        );
    }
}
