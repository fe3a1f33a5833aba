// ── Subscription lifecycle ──
//
// The state machine behind the subscribe button. It registers the worker
// at startup, asks for permission, subscribes and unsubscribes through the
// platform, and reports every outcome to the host. Lifecycle and UI state
// are published on watch channels so renderers redraw on change.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use strum::Display;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};
use webpush_platform::{
    Capabilities, PermissionState, Platform, PushPlatform, PushSubscription, SubscribeOptions,
};

use crate::codec::decode_server_key;
use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::message::{Control, Topic};
use crate::projector::{UiState, project};
use crate::registry::WorkerRegistry;
use crate::reporter::{HostChannel, OutboundReporter};
use crate::store::SubscriptionStore;

// ── LifecycleState ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LifecycleState {
    /// Worker or push support is missing. Terminal.
    Unsupported,
    IdleUnsubscribed,
    IdleSubscribed,
    PermissionPending,
    Subscribing,
    Unsubscribing,
}

impl LifecycleState {
    /// A transition is in flight; clicks are ignored.
    pub const fn is_busy(self) -> bool {
        matches!(
            self,
            Self::PermissionPending | Self::Subscribing | Self::Unsubscribing
        )
    }

    /// Whether the browser holds a subscription while in this state.
    pub const fn subscription_present(self) -> bool {
        matches!(self, Self::IdleSubscribed | Self::Unsubscribing)
    }
}

// ── ClickOutcome ─────────────────────────────────────────────────

/// What a click on the button led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A transition was already running, or the button is disabled.
    Ignored,
    /// The transition completed and the machine rests in `state`.
    Settled(LifecycleState),
    /// The transition failed; `error` was reported and the machine fell
    /// back to `state`.
    Failed {
        state: LifecycleState,
        error: CoreError,
    },
}

/// The transition a click starts, decided atomically with the busy flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClickAction {
    Ignore,
    NoAction,
    Subscribe,
    Unsubscribe,
}

// ── SubscriptionLifecycle ────────────────────────────────────────

/// Push subscription lifecycle of one client instance.
///
/// Cheaply cloneable via `Arc`. All work happens on the caller's task;
/// nothing is spawned.
pub struct SubscriptionLifecycle<P: Platform, H> {
    inner: Arc<LifecycleInner<P, H>>,
}

struct LifecycleInner<P: Platform, H> {
    config: ClientConfig,
    capabilities: Capabilities,
    platform: Arc<P>,
    registry: WorkerRegistry<P>,
    store: SubscriptionStore<P>,
    reporter: OutboundReporter<H>,
    state: watch::Sender<LifecycleState>,
    ui: watch::Sender<UiState>,
}

impl<P: Platform, H> Clone for SubscriptionLifecycle<P, H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: PushPlatform, H: HostChannel> SubscriptionLifecycle<P, H> {
    /// Assess capabilities, register the worker and load the current
    /// subscription.
    ///
    /// Never fails: startup problems are reported through `host` and leave
    /// the machine in [`LifecycleState::IdleUnsubscribed`].
    pub async fn start(config: ClientConfig, platform: Arc<P>, host: H) -> Self {
        let capabilities = platform.capabilities();
        let initial = if capabilities.is_supported() {
            LifecycleState::IdleUnsubscribed
        } else {
            LifecycleState::Unsupported
        };

        let ui = project(capabilities, initial, false, &config);
        let (state, _) = watch::channel(initial);
        let (ui, _) = watch::channel(ui);

        let lifecycle = Self {
            inner: Arc::new(LifecycleInner {
                registry: WorkerRegistry::new(Arc::clone(&platform), config.script_url()),
                store: SubscriptionStore::new(Arc::clone(&platform)),
                reporter: OutboundReporter::new(host),
                config,
                capabilities,
                platform,
                state,
                ui,
            }),
        };

        if capabilities.is_supported() {
            lifecycle.initialize().await;
        } else {
            debug!(
                id = %lifecycle.inner.config.id,
                worker = capabilities.has_worker_support,
                push = capabilities.has_push_support,
                "push notifications unsupported"
            );
        }
        lifecycle
    }

    async fn initialize(&self) {
        match self.load_subscription().await {
            Ok(Some(subscription)) => {
                self.settle(LifecycleState::IdleSubscribed);
                if self.inner.config.send_existing_subscription_on_init {
                    self.inner
                        .reporter
                        .subscription(Topic::SubscriptionExisting, subscription);
                }
            }
            Ok(None) => self.settle(LifecycleState::IdleUnsubscribed),
            Err(err) => {
                self.inner.reporter.error(&err);
                self.settle(LifecycleState::IdleUnsubscribed);
            }
        }
    }

    async fn load_subscription(&self) -> Result<Option<PushSubscription>, CoreError> {
        let registration = self.inner.registry.ensure_registered().await?;
        self.inner.store.current_subscription(&registration).await
    }

    // ── User interaction ─────────────────────────────────────────

    /// Handle a click on the subscribe button.
    pub async fn click(&self) -> ClickOutcome {
        let disable_when_unsupported = self.inner.config.disable_button_when_unsupported;
        let mut action = ClickAction::Ignore;
        self.inner.state.send_if_modified(|state| {
            action = match *state {
                LifecycleState::IdleUnsubscribed => {
                    *state = LifecycleState::PermissionPending;
                    ClickAction::Subscribe
                }
                LifecycleState::IdleSubscribed => {
                    *state = LifecycleState::Unsubscribing;
                    ClickAction::Unsubscribe
                }
                LifecycleState::Unsupported if !disable_when_unsupported => ClickAction::NoAction,
                _ => ClickAction::Ignore,
            };
            matches!(action, ClickAction::Subscribe | ClickAction::Unsubscribe)
        });

        match action {
            ClickAction::Ignore => {
                debug!(state = %self.state(), "click ignored");
                ClickOutcome::Ignored
            }
            ClickAction::NoAction => {
                self.fail(LifecycleState::Unsupported, CoreError::NoActionAvailable)
            }
            ClickAction::Subscribe => {
                self.publish_ui();
                match self.subscribe().await {
                    Ok(()) => ClickOutcome::Settled(self.state()),
                    Err(err) => self.fail(LifecycleState::IdleUnsubscribed, err),
                }
            }
            ClickAction::Unsubscribe => {
                self.publish_ui();
                match self.unsubscribe().await {
                    Ok(()) => ClickOutcome::Settled(self.state()),
                    Err(err @ CoreError::SubscriptionMissing) => {
                        self.fail(LifecycleState::IdleUnsubscribed, err)
                    }
                    Err(err) => self.fail(LifecycleState::IdleSubscribed, err),
                }
            }
        }
    }

    async fn subscribe(&self) -> Result<(), CoreError> {
        let permission = self
            .inner
            .platform
            .request_permission()
            .await
            .map_err(|source| CoreError::PermissionPrompt { source })?;
        debug!(%permission, "permission prompt answered");
        if permission != PermissionState::Granted {
            return Err(CoreError::PermissionDenied { permission });
        }

        self.settle(LifecycleState::Subscribing);
        let key = decode_server_key(&self.inner.config.public_key)?;
        let registration = self.inner.registry.ensure_registered().await?;
        let subscription = self
            .inner
            .platform
            .subscribe(&registration, &SubscribeOptions::user_visible(key))
            .await
            .map_err(|source| CoreError::Subscribe { source })?;

        info!(
            id = %self.inner.config.id,
            endpoint = %subscription.endpoint,
            "subscribed to push notifications"
        );
        self.settle(LifecycleState::IdleSubscribed);
        self.inner
            .reporter
            .subscription(Topic::SubscriptionNew, subscription);
        Ok(())
    }

    async fn unsubscribe(&self) -> Result<(), CoreError> {
        let registration = self
            .inner
            .registry
            .registration()
            .ok_or(CoreError::NotRegistered)?;

        // Always ask the browser again; the subscription may have changed.
        let subscription = self
            .inner
            .store
            .current_subscription(&registration)
            .await?
            .ok_or(CoreError::SubscriptionMissing)?;

        let removed = self
            .inner
            .platform
            .unsubscribe(&registration, &subscription)
            .await
            .map_err(|source| CoreError::Unsubscribe { source })?;
        if !removed {
            return Err(CoreError::UnsubscribeRejected);
        }

        info!(
            id = %self.inner.config.id,
            endpoint = %subscription.endpoint,
            "unsubscribed from push notifications"
        );
        self.settle(LifecycleState::IdleUnsubscribed);
        self.inner
            .reporter
            .subscription(Topic::Unsubscription, subscription);
        Ok(())
    }

    // ── Host messages ────────────────────────────────────────────

    /// Handle an inbound host message. Returns `true` if it was a control
    /// message this client acted on.
    pub async fn handle_inbound(&self, message: &Value) -> bool {
        match Control::from_message(message) {
            Some(Control::ReloadWorker) => {
                self.reload_worker().await;
                true
            }
            None => false,
        }
    }

    /// Ask the browser to refresh the worker script. Never changes state.
    pub async fn reload_worker(&self) -> bool {
        if !self.inner.capabilities.has_worker_support {
            debug!("cannot reload push worker without service worker support");
            return false;
        }
        self.inner.registry.request_update().await
    }

    // ── Transitions ──────────────────────────────────────────────

    fn settle(&self, state: LifecycleState) {
        let previous = self.inner.state.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "lifecycle transition");
        }
        self.publish_ui();
    }

    fn fail(&self, state: LifecycleState, error: CoreError) -> ClickOutcome {
        self.inner.reporter.error(&error);
        self.settle(state);
        ClickOutcome::Failed { state, error }
    }
}

impl<P: Platform, H> SubscriptionLifecycle<P, H> {
    fn publish_ui(&self) {
        let state = self.state();
        let ui = project(
            self.inner.capabilities,
            state,
            state.subscription_present(),
            &self.inner.config,
        );
        self.inner.ui.send_replace(ui);
    }

    // ── State observation ────────────────────────────────────────

    pub fn state(&self) -> LifecycleState {
        *self.inner.state.borrow()
    }

    pub fn ui_state(&self) -> UiState {
        self.inner.ui.borrow().clone()
    }

    /// Subscribe to lifecycle state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<LifecycleState> {
        self.inner.state.subscribe()
    }

    /// Subscribe to UI state changes.
    pub fn subscribe_ui(&self) -> watch::Receiver<UiState> {
        self.inner.ui.subscribe()
    }

    /// UI states as a stream, starting with the current one.
    pub fn ui_updates(&self) -> WatchStream<UiState> {
        WatchStream::new(self.inner.ui.subscribe())
    }

    pub fn capabilities(&self) -> Capabilities {
        self.inner.capabilities
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn script_url(&self) -> &str {
        self.inner.registry.script_url()
    }

    /// The worker registration, once registration has succeeded.
    pub fn registration(&self) -> Option<P::Registration> {
        self.inner.registry.registration()
    }
}

impl<P: Platform, H> fmt::Debug for SubscriptionLifecycle<P, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionLifecycle")
            .field("id", &self.inner.config.id)
            .field("state", &self.state())
            .field("capabilities", &self.inner.capabilities)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_exactly_in_transient_states() {
        let busy: Vec<_> = [
            LifecycleState::Unsupported,
            LifecycleState::IdleUnsubscribed,
            LifecycleState::IdleSubscribed,
            LifecycleState::PermissionPending,
            LifecycleState::Subscribing,
            LifecycleState::Unsubscribing,
        ]
        .into_iter()
        .filter(|s| s.is_busy())
        .collect();

        assert_eq!(
            busy,
            vec![
                LifecycleState::PermissionPending,
                LifecycleState::Subscribing,
                LifecycleState::Unsubscribing,
            ]
        );
    }

    #[test]
    fn state_names_render_snake_case() {
        assert_eq!(LifecycleState::IdleSubscribed.to_string(), "idle_subscribed");
    }
}
