// ── Background worker registry ──
//
// Owns the single worker registration of one client instance. The handle
// is cached after the first successful registration; later calls return
// it without touching the platform.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::{debug, info, warn};
use webpush_platform::{Platform, WorkerContainer};

use crate::error::CoreError;

pub struct WorkerRegistry<P: Platform> {
    platform: Arc<P>,
    script_url: String,
    registration: ArcSwapOption<P::Registration>,
}

impl<P: Platform> WorkerRegistry<P> {
    pub fn new(platform: Arc<P>, script_url: impl Into<String>) -> Self {
        Self {
            platform,
            script_url: script_url.into(),
            registration: ArcSwapOption::empty(),
        }
    }

    pub fn script_url(&self) -> &str {
        &self.script_url
    }

    /// The cached registration, if registration has succeeded.
    pub fn registration(&self) -> Option<P::Registration> {
        self.registration.load_full().map(|reg| (*reg).clone())
    }
}

impl<P: WorkerContainer> WorkerRegistry<P> {
    /// Register the worker script unless a registration is already cached.
    pub async fn ensure_registered(&self) -> Result<P::Registration, CoreError> {
        if let Some(existing) = self.registration() {
            debug!(script_url = %self.script_url, "worker registration cached");
            return Ok(existing);
        }

        let registration = self
            .platform
            .register(&self.script_url)
            .await
            .map_err(|source| CoreError::Registration {
                script_url: self.script_url.clone(),
                source,
            })?;

        info!(script_url = %self.script_url, "push worker registered");
        self.registration.store(Some(Arc::new(registration.clone())));
        Ok(registration)
    }

    /// Ask the browser to fetch a newer worker script.
    ///
    /// Fire-and-forget: failures are logged, never returned. Returns whether
    /// an update was requested at all.
    pub async fn request_update(&self) -> bool {
        let Some(registration) = self.registration() else {
            debug!(script_url = %self.script_url, "no worker registration to update");
            return false;
        };

        match self.platform.update(&registration).await {
            Ok(()) => {
                info!(script_url = %self.script_url, "push worker update requested");
            }
            Err(err) => {
                warn!(script_url = %self.script_url, error = %err, "push worker update failed");
            }
        }
        true
    }
}

impl<P: Platform> fmt::Debug for WorkerRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerRegistry")
            .field("script_url", &self.script_url)
            .field("registration", &self.registration())
            .finish_non_exhaustive()
    }
}
