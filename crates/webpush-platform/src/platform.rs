// ── Platform traits ──
//
// One trait per browser surface the lifecycle touches. All of them are
// `?Send`: browser futures live on the UI thread and are never moved
// across threads.

use std::fmt;

use async_trait::async_trait;

use crate::error::Error;
use crate::types::{Capabilities, PermissionState, PushSubscription, SubscribeOptions};

/// Shared identity of a platform implementation.
pub trait Platform {
    /// Opaque handle to a registered background worker.
    type Registration: Clone + fmt::Debug;

    /// Feature detection, evaluated once at startup.
    fn capabilities(&self) -> Capabilities;
}

/// `navigator.serviceWorker`.
#[async_trait(?Send)]
pub trait WorkerContainer: Platform {
    /// Register the worker script. Registering a URL that an active worker
    /// already serves returns that worker's registration.
    async fn register(&self, script_url: &str) -> Result<Self::Registration, Error>;

    /// Ask the browser to check for a newer script version.
    async fn update(&self, registration: &Self::Registration) -> Result<(), Error>;
}

/// `registration.pushManager`.
#[async_trait(?Send)]
pub trait PushManager: Platform {
    async fn get_subscription(
        &self,
        registration: &Self::Registration,
    ) -> Result<Option<PushSubscription>, Error>;

    async fn subscribe(
        &self,
        registration: &Self::Registration,
        options: &SubscribeOptions,
    ) -> Result<PushSubscription, Error>;

    /// Resolves to `false` when the browser declined to remove it.
    async fn unsubscribe(
        &self,
        registration: &Self::Registration,
        subscription: &PushSubscription,
    ) -> Result<bool, Error>;
}

/// `Notification.requestPermission`, whatever convention the browser uses.
///
/// See [`PromptFallback`](crate::PromptFallback) for adapting browsers that
/// only offer the callback form.
#[async_trait(?Send)]
pub trait PermissionPrompt {
    async fn request_permission(&self) -> Result<PermissionState, Error>;
}

/// Everything the subscription lifecycle needs from a browser.
pub trait PushPlatform: WorkerContainer + PushManager + PermissionPrompt {}

impl<T> PushPlatform for T where T: WorkerContainer + PushManager + PermissionPrompt {}
