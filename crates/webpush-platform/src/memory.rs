// ── In-memory platform ──
//
// A browser stand-in that keeps registrations and subscriptions in a
// mutex-guarded map. It reproduces the browser rules the lifecycle leans
// on: registration is idempotent per script URL, subscriptions persist per
// registration scope, and subscribe is refused without granted permission.
// Faults can be injected per call site.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::trace;

use crate::error::Error;
use crate::platform::{PermissionPrompt, Platform, PushManager, WorkerContainer};
use crate::types::{
    Capabilities, PermissionState, PushSubscription, SubscribeOptions, SubscriptionKeys,
};

/// Handle to a worker registered with [`MemoryPlatform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegistration {
    pub id: u64,
    pub script_url: Arc<str>,
}

/// Platform call sites where a fault can be injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    Register,
    Update,
    Query,
    Subscribe,
    Unsubscribe,
    Prompt,
}

/// How many times each platform call was made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub register: usize,
    pub update: usize,
    pub get_subscription: usize,
    pub subscribe: usize,
    pub unsubscribe: usize,
    pub prompt: usize,
}

#[derive(Debug)]
struct MemoryState {
    registrations: HashMap<Arc<str>, MemoryRegistration>,
    /// Keyed by script URL: a subscription outlives page reloads.
    subscriptions: HashMap<Arc<str>, PushSubscription>,
    next_id: u64,
    issued: u64,
    permission: PermissionState,
    unsubscribe_result: bool,
    faults: HashMap<FaultPoint, String>,
    calls: CallCounts,
    last_subscribe: Option<SubscribeOptions>,
}

/// In-process implementation of every platform trait.
#[derive(Debug)]
pub struct MemoryPlatform {
    capabilities: Capabilities,
    state: Mutex<MemoryState>,
}

impl Default for MemoryPlatform {
    fn default() -> Self {
        Self::new(Capabilities::full())
    }
}

impl MemoryPlatform {
    /// A fresh browser profile: nothing registered, permission undecided
    /// but the prompt answers `granted`.
    pub fn new(capabilities: Capabilities) -> Self {
        Self {
            capabilities,
            state: Mutex::new(MemoryState {
                registrations: HashMap::new(),
                subscriptions: HashMap::new(),
                next_id: 1,
                issued: 0,
                permission: PermissionState::Granted,
                unsubscribe_result: true,
                faults: HashMap::new(),
                calls: CallCounts::default(),
                last_subscribe: None,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Scenario setup ───────────────────────────────────────────────

    /// What the permission prompt answers from now on.
    pub fn set_permission(&self, permission: PermissionState) {
        self.state().permission = permission;
    }

    /// Whether `unsubscribe` resolves `true` (removed) or `false`.
    pub fn set_unsubscribe_result(&self, removed: bool) {
        self.state().unsubscribe_result = removed;
    }

    /// Seed a subscription for a scope, as if created in an earlier visit.
    pub fn insert_subscription(&self, script_url: &str, subscription: PushSubscription) {
        self.state()
            .subscriptions
            .insert(Arc::from(script_url), subscription);
    }

    /// Drop a subscription behind the lifecycle's back (e.g. the user
    /// revoked it in browser settings).
    pub fn remove_subscription(&self, script_url: &str) -> Option<PushSubscription> {
        self.state().subscriptions.remove(script_url)
    }

    /// Make every call at `point` fail with `message` until cleared.
    pub fn fail(&self, point: FaultPoint, message: impl Into<String>) {
        self.state().faults.insert(point, message.into());
    }

    pub fn clear_fault(&self, point: FaultPoint) {
        self.state().faults.remove(&point);
    }

    // ── Inspection ───────────────────────────────────────────────────

    pub fn calls(&self) -> CallCounts {
        self.state().calls
    }

    pub fn subscription(&self, script_url: &str) -> Option<PushSubscription> {
        self.state().subscriptions.get(script_url).cloned()
    }

    pub fn registration_count(&self) -> usize {
        self.state().registrations.len()
    }

    pub fn last_subscribe_options(&self) -> Option<SubscribeOptions> {
        self.state().last_subscribe.clone()
    }

    /// A deterministic subscription value for seeding tests.
    pub fn sample_subscription(tag: &str) -> PushSubscription {
        PushSubscription {
            endpoint: format!("https://push.example.invalid/send/{tag}"),
            expiration_time: None,
            keys: SubscriptionKeys {
                p256dh: format!("p256dh-{tag}"),
                auth: format!("auth-{tag}"),
            },
        }
    }
}

impl MemoryState {
    fn fault(&self, point: FaultPoint) -> Option<String> {
        self.faults.get(&point).cloned()
    }
}

fn check_supported(capabilities: Capabilities) -> Result<(), Error> {
    if !capabilities.has_worker_support {
        return Err(Error::NotSupported {
            feature: "serviceWorker",
        });
    }
    if !capabilities.has_push_support {
        return Err(Error::NotSupported {
            feature: "PushManager",
        });
    }
    Ok(())
}

impl Platform for MemoryPlatform {
    type Registration = MemoryRegistration;

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
}

#[async_trait(?Send)]
impl WorkerContainer for MemoryPlatform {
    async fn register(&self, script_url: &str) -> Result<MemoryRegistration, Error> {
        let mut state = self.state();
        state.calls.register += 1;

        if !self.capabilities.has_worker_support {
            return Err(Error::NotSupported {
                feature: "serviceWorker",
            });
        }
        if let Some(message) = state.fault(FaultPoint::Register) {
            return Err(Error::Registration { message });
        }

        if let Some(existing) = state.registrations.get(script_url) {
            trace!(id = existing.id, "worker already active for script");
            return Ok(existing.clone());
        }

        let id = state.next_id;
        state.next_id += 1;
        let key: Arc<str> = Arc::from(script_url);
        let registration = MemoryRegistration {
            id,
            script_url: key.clone(),
        };
        state.registrations.insert(key, registration.clone());
        trace!(id, script_url, "worker registered");
        Ok(registration)
    }

    async fn update(&self, registration: &MemoryRegistration) -> Result<(), Error> {
        let mut state = self.state();
        state.calls.update += 1;

        if let Some(message) = state.fault(FaultPoint::Update) {
            return Err(Error::Update { message });
        }
        if !state.registrations.contains_key(&registration.script_url) {
            return Err(Error::Update {
                message: "registration is no longer active".into(),
            });
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl PushManager for MemoryPlatform {
    async fn get_subscription(
        &self,
        registration: &MemoryRegistration,
    ) -> Result<Option<PushSubscription>, Error> {
        let mut state = self.state();
        state.calls.get_subscription += 1;

        check_supported(self.capabilities)?;
        if let Some(message) = state.fault(FaultPoint::Query) {
            return Err(Error::Query { message });
        }
        Ok(state.subscriptions.get(&registration.script_url).cloned())
    }

    async fn subscribe(
        &self,
        registration: &MemoryRegistration,
        options: &SubscribeOptions,
    ) -> Result<PushSubscription, Error> {
        let mut state = self.state();
        state.calls.subscribe += 1;
        state.last_subscribe = Some(options.clone());

        check_supported(self.capabilities)?;
        if let Some(message) = state.fault(FaultPoint::Subscribe) {
            return Err(Error::Subscribe { message });
        }
        if state.permission != PermissionState::Granted {
            return Err(Error::Subscribe {
                message: "NotAllowedError: permission denied".into(),
            });
        }
        if !options.user_visible_only {
            return Err(Error::Subscribe {
                message: "NotSupportedError: userVisibleOnly must be true".into(),
            });
        }
        if options.application_server_key.is_empty() {
            return Err(Error::Subscribe {
                message: "InvalidAccessError: applicationServerKey is empty".into(),
            });
        }

        // Subscribing again with an existing subscription returns it.
        if let Some(existing) = state.subscriptions.get(&registration.script_url) {
            return Ok(existing.clone());
        }

        state.issued += 1;
        let subscription =
            Self::sample_subscription(&format!("{}-{}", registration.id, state.issued));
        state
            .subscriptions
            .insert(registration.script_url.clone(), subscription.clone());
        Ok(subscription)
    }

    async fn unsubscribe(
        &self,
        registration: &MemoryRegistration,
        subscription: &PushSubscription,
    ) -> Result<bool, Error> {
        let mut state = self.state();
        state.calls.unsubscribe += 1;

        if let Some(message) = state.fault(FaultPoint::Unsubscribe) {
            return Err(Error::Unsubscribe { message });
        }
        if !state.unsubscribe_result {
            return Ok(false);
        }

        let matches = state
            .subscriptions
            .get(&registration.script_url)
            .is_some_and(|current| current.endpoint == subscription.endpoint);
        if matches {
            state.subscriptions.remove(&registration.script_url);
        }
        Ok(matches)
    }
}

#[async_trait(?Send)]
impl PermissionPrompt for MemoryPlatform {
    async fn request_permission(&self) -> Result<PermissionState, Error> {
        let mut state = self.state();
        state.calls.prompt += 1;

        if let Some(message) = state.fault(FaultPoint::Prompt) {
            return Err(Error::Permission { message });
        }
        Ok(state.permission)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SCRIPT: &str = "ui_web_push/a%2Eb/nodered_push_service.js";

    #[tokio::test]
    async fn registration_is_idempotent_per_script_url() {
        let platform = MemoryPlatform::default();
        let first = platform.register(SCRIPT).await.unwrap();
        let second = platform.register(SCRIPT).await.unwrap();
        let other = platform.register("other.js").await.unwrap();

        assert_eq!(first, second);
        assert_ne!(first.id, other.id);
        assert_eq!(platform.registration_count(), 2);
    }

    #[tokio::test]
    async fn register_without_worker_support_fails() {
        let platform = MemoryPlatform::new(Capabilities::none());
        let err = platform.register(SCRIPT).await.unwrap_err();
        assert!(err.is_not_supported());
    }

    #[tokio::test]
    async fn subscribe_requires_granted_permission() {
        let platform = MemoryPlatform::default();
        platform.set_permission(PermissionState::Denied);
        let reg = platform.register(SCRIPT).await.unwrap();

        let err = platform
            .subscribe(&reg, &SubscribeOptions::user_visible(vec![4; 65]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Subscribe { .. }));
        assert_eq!(platform.get_subscription(&reg).await.unwrap(), None);
    }

    #[tokio::test]
    async fn subscriptions_survive_reregistration() {
        let platform = MemoryPlatform::default();
        let reg = platform.register(SCRIPT).await.unwrap();
        let sub = platform
            .subscribe(&reg, &SubscribeOptions::user_visible(vec![4; 65]))
            .await
            .unwrap();

        let again = platform.register(SCRIPT).await.unwrap();
        assert_eq!(platform.get_subscription(&again).await.unwrap(), Some(sub));
    }

    #[tokio::test]
    async fn unsubscribe_removes_only_matching_subscription() {
        let platform = MemoryPlatform::default();
        let reg = platform.register(SCRIPT).await.unwrap();
        let sub = platform
            .subscribe(&reg, &SubscribeOptions::user_visible(vec![4; 65]))
            .await
            .unwrap();

        let stale = MemoryPlatform::sample_subscription("stale");
        assert!(!platform.unsubscribe(&reg, &stale).await.unwrap());
        assert!(platform.unsubscribe(&reg, &sub).await.unwrap());
        assert_eq!(platform.subscription(SCRIPT), None);
    }

    #[tokio::test]
    async fn injected_faults_persist_until_cleared() {
        let platform = MemoryPlatform::default();
        let reg = platform.register(SCRIPT).await.unwrap();
        platform.fail(FaultPoint::Query, "boom");

        assert_eq!(
            platform.get_subscription(&reg).await,
            Err(Error::Query {
                message: "boom".into()
            })
        );
        assert!(platform.get_subscription(&reg).await.is_err());

        platform.clear_fault(FaultPoint::Query);
        assert_eq!(platform.get_subscription(&reg).await, Ok(None));
        assert_eq!(platform.calls().get_subscription, 3);
    }
}
