// ── UI state projection ──
//
// Pure mapping from lifecycle state to the subscribe button. The UI never
// keeps state of its own; it is regenerated from scratch on every
// transition.

use serde::{Deserialize, Serialize};
use strum::Display;
use webpush_platform::Capabilities;

use crate::config::ClientConfig;
use crate::lifecycle::LifecycleState;

const ICON_UNSUPPORTED: &str = "fa-thumbs-o-up";
const ICON_SUBSCRIBE: &str = "fa-play-circle-o";
const ICON_UNSUBSCRIBE: &str = "fa-ban";

/// What a click on the button will do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ButtonAction {
    None,
    Subscribe,
    Unsubscribe,
}

/// Everything needed to render the subscribe button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UiState {
    pub action: ButtonAction,
    pub enabled: bool,
    pub busy: bool,
    pub icon: &'static str,
    pub label: String,
    /// Present only when tooltips are configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<&'static str>,
}

/// Render the button for the given lifecycle state.
///
/// `subscription_present` decides between subscribe and unsubscribe; it is
/// ignored when the platform lacks support.
pub fn project(
    capabilities: Capabilities,
    state: LifecycleState,
    subscription_present: bool,
    config: &ClientConfig,
) -> UiState {
    let busy = state.is_busy();

    let (action, icon, tooltip) = if !capabilities.has_worker_support {
        (ButtonAction::None, ICON_UNSUPPORTED, "No service worker support!")
    } else if !capabilities.has_push_support || state == LifecycleState::Unsupported {
        (
            ButtonAction::None,
            ICON_UNSUPPORTED,
            "No push notification support!",
        )
    } else if subscription_present {
        (
            ButtonAction::Unsubscribe,
            ICON_UNSUBSCRIBE,
            "Stop receiving notifications",
        )
    } else {
        (
            ButtonAction::Subscribe,
            ICON_SUBSCRIBE,
            "Start receiving notifications",
        )
    };

    let label = match action {
        ButtonAction::Unsubscribe => &config.unsubscribe_label,
        ButtonAction::None | ButtonAction::Subscribe => &config.subscribe_label,
    };

    let enabled = match action {
        ButtonAction::None => !config.disable_button_when_unsupported,
        ButtonAction::Subscribe | ButtonAction::Unsubscribe => !busy,
    };

    UiState {
        action,
        enabled,
        busy,
        icon,
        label: label.clone(),
        tooltip: config.show_tooltip.then_some(tooltip),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> ClientConfig {
        let mut config = ClientConfig::new("n1", "key");
        config.subscribe_label = "On".into();
        config.unsubscribe_label = "Off".into();
        config.show_tooltip = true;
        config
    }

    #[test]
    fn unsupported_worker_renders_inert_subscribe_label() {
        let no_worker = Capabilities {
            has_worker_support: false,
            has_push_support: true,
        };
        let ui = project(no_worker, LifecycleState::Unsupported, false, &config());
        assert_eq!(
            ui,
            UiState {
                action: ButtonAction::None,
                enabled: false,
                busy: false,
                icon: "fa-thumbs-o-up",
                label: "On".into(),
                tooltip: Some("No service worker support!"),
            }
        );
    }

    #[test]
    fn unsupported_push_has_its_own_tooltip() {
        let no_push = Capabilities {
            has_worker_support: true,
            has_push_support: false,
        };
        let ui = project(no_push, LifecycleState::Unsupported, true, &config());
        assert_eq!(ui.action, ButtonAction::None);
        assert_eq!(ui.tooltip, Some("No push notification support!"));
    }

    #[test]
    fn unsupported_button_stays_clickable_when_not_disabled() {
        let mut config = config();
        config.disable_button_when_unsupported = false;
        let ui = project(Capabilities::none(), LifecycleState::Unsupported, false, &config);
        assert!(ui.enabled);
        assert_eq!(ui.action, ButtonAction::None);
    }

    #[test]
    fn action_follows_subscription_presence() {
        let full = Capabilities::full();
        let on = project(full, LifecycleState::IdleSubscribed, true, &config());
        assert_eq!(on.action, ButtonAction::Unsubscribe);
        assert_eq!(on.icon, "fa-ban");
        assert_eq!(on.label, "Off");

        let off = project(full, LifecycleState::IdleUnsubscribed, false, &config());
        assert_eq!(off.action, ButtonAction::Subscribe);
        assert_eq!(off.icon, "fa-play-circle-o");
        assert_eq!(off.tooltip, Some("Start receiving notifications"));
    }

    #[test]
    fn busy_states_render_disabled() {
        for state in [
            LifecycleState::PermissionPending,
            LifecycleState::Subscribing,
            LifecycleState::Unsubscribing,
        ] {
            let ui = project(
                Capabilities::full(),
                state,
                state.subscription_present(),
                &config(),
            );
            assert!(ui.busy);
            assert!(!ui.enabled);
        }
    }

    #[test]
    fn tooltip_omitted_unless_configured() {
        let mut config = config();
        config.show_tooltip = false;
        let ui = project(Capabilities::full(), LifecycleState::IdleSubscribed, true, &config);
        assert_eq!(ui.tooltip, None);
        assert!(!serde_json::to_string(&ui).unwrap().contains("tooltip"));
    }
}
