// ── Subscription store ──
//
// Read-only view of the browser's push subscription for a registration.
// Nothing is cached: the browser is the source of truth and the
// subscription may disappear behind our back.

use std::sync::Arc;

use tracing::trace;
use webpush_platform::{PushManager, PushSubscription};

use crate::error::CoreError;

#[derive(Debug)]
pub struct SubscriptionStore<P> {
    platform: Arc<P>,
}

impl<P: PushManager> SubscriptionStore<P> {
    pub fn new(platform: Arc<P>) -> Self {
        Self { platform }
    }

    /// The subscription currently held by `registration`, if any.
    pub async fn current_subscription(
        &self,
        registration: &P::Registration,
    ) -> Result<Option<PushSubscription>, CoreError> {
        let subscription = self
            .platform
            .get_subscription(registration)
            .await
            .map_err(|source| CoreError::Query { source })?;
        trace!(present = subscription.is_some(), "queried push subscription");
        Ok(subscription)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use webpush_platform::{FaultPoint, MemoryPlatform, WorkerContainer};

    const SCRIPT: &str = "ui_web_push/n1/nodered_push_service.js";

    #[tokio::test]
    async fn absence_is_a_valid_answer() {
        let platform = Arc::new(MemoryPlatform::default());
        let reg = platform.register(SCRIPT).await.unwrap();
        let store = SubscriptionStore::new(platform);

        assert_eq!(store.current_subscription(&reg).await.unwrap(), None);
    }

    #[tokio::test]
    async fn reflects_external_changes_immediately() {
        let platform = Arc::new(MemoryPlatform::default());
        let reg = platform.register(SCRIPT).await.unwrap();
        let sub = MemoryPlatform::sample_subscription("seed");
        platform.insert_subscription(SCRIPT, sub.clone());
        let store = SubscriptionStore::new(platform.clone());

        assert_eq!(store.current_subscription(&reg).await.unwrap(), Some(sub));
        platform.remove_subscription(SCRIPT);
        assert_eq!(store.current_subscription(&reg).await.unwrap(), None);
    }

    #[tokio::test]
    async fn platform_failure_maps_to_query_error() {
        let platform = Arc::new(MemoryPlatform::default());
        let reg = platform.register(SCRIPT).await.unwrap();
        platform.fail(FaultPoint::Query, "InvalidStateError");
        let store = SubscriptionStore::new(platform);

        let err = store.current_subscription(&reg).await.unwrap_err();
        assert_eq!(
            err,
            CoreError::Query {
                source: webpush_platform::Error::Query {
                    message: "InvalidStateError".into()
                }
            }
        );
    }
}
