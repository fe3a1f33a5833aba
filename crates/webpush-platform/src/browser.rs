// ── Browser backend ──
//
// `BrowserPlatform` drives the real browser APIs through `web-sys` when the
// crate is built for `wasm32` with the `wasm-web` feature. Everywhere else it
// reports every feature as missing, so the lifecycle settles in its
// unsupported state instead of failing to build.

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
mod wasm {
    use async_trait::async_trait;
    use js_sys::{Function, JSON, Object, Promise, Reflect, Uint8Array};
    use tracing::debug;
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    use crate::callback::{Callback, CallbackPrompt, PromisePrompt, PromptFallback};
    use crate::error::Error;
    use crate::platform::{PermissionPrompt, Platform, PushManager, WorkerContainer};
    use crate::types::{
        CallingConvention, Capabilities, PermissionState, PushSubscription, SubscribeOptions,
    };

    /// Handle to a `ServiceWorkerRegistration`.
    #[derive(Debug, Clone)]
    pub struct BrowserRegistration {
        inner: web_sys::ServiceWorkerRegistration,
    }

    impl BrowserRegistration {
        pub fn as_web_sys(&self) -> &web_sys::ServiceWorkerRegistration {
            &self.inner
        }

        fn push_manager(&self) -> Result<web_sys::PushManager, Error> {
            self.inner.push_manager().map_err(|_| Error::NotSupported {
                feature: "PushManager",
            })
        }
    }

    /// The page's `navigator.serviceWorker`, push manager and
    /// `Notification` prompt.
    #[derive(Debug)]
    pub struct BrowserPlatform {
        capabilities: Capabilities,
        container: Option<web_sys::ServiceWorkerContainer>,
        prompt: PromptFallback<NotificationPromise, NotificationCallback>,
    }

    impl BrowserPlatform {
        /// Feature-detect the current window.
        pub fn detect() -> Self {
            let window = web_sys::window().map(JsValue::from);
            let container = window
                .as_ref()
                .and_then(|w| property(w, "navigator"))
                .and_then(|navigator| property(&navigator, "serviceWorker"))
                .and_then(|container| container.dyn_into().ok());
            let has_push = window
                .as_ref()
                .is_some_and(|w| property(w, "PushManager").is_some());
            let notification = window.as_ref().and_then(|w| property(w, "Notification"));

            let capabilities = Capabilities {
                has_worker_support: container.is_some(),
                has_push_support: has_push,
            };
            debug!(?capabilities, "browser capabilities detected");

            Self {
                capabilities,
                container,
                prompt: PromptFallback::new(
                    NotificationPromise {
                        notification: notification.clone(),
                    },
                    NotificationCallback { notification },
                ),
            }
        }
    }

    impl Platform for BrowserPlatform {
        type Registration = BrowserRegistration;

        fn capabilities(&self) -> Capabilities {
            self.capabilities
        }
    }

    #[async_trait(?Send)]
    impl WorkerContainer for BrowserPlatform {
        async fn register(&self, script_url: &str) -> Result<BrowserRegistration, Error> {
            let container = self.container.as_ref().ok_or(Error::NotSupported {
                feature: "serviceWorker",
            })?;
            let value = JsFuture::from(container.register(script_url))
                .await
                .map_err(|err| Error::Registration {
                    message: js_message(&err),
                })?;
            let inner = value.dyn_into().map_err(|_| Error::Registration {
                message: "serviceWorker.register resolved to a non-registration".into(),
            })?;
            Ok(BrowserRegistration { inner })
        }

        async fn update(&self, registration: &BrowserRegistration) -> Result<(), Error> {
            let update = |err: JsValue| Error::Update {
                message: js_message(&err),
            };
            let promise = registration.inner.update().map_err(update)?;
            JsFuture::from(promise).await.map_err(update)?;
            Ok(())
        }
    }

    #[async_trait(?Send)]
    impl PushManager for BrowserPlatform {
        async fn get_subscription(
            &self,
            registration: &BrowserRegistration,
        ) -> Result<Option<PushSubscription>, Error> {
            let query = |message: String| Error::Query { message };
            match current_js_subscription(registration)
                .await
                .map_err(query)?
            {
                Some(value) => subscription_from_js(&value).map(Some).map_err(query),
                None => Ok(None),
            }
        }

        async fn subscribe(
            &self,
            registration: &BrowserRegistration,
            options: &SubscribeOptions,
        ) -> Result<PushSubscription, Error> {
            let subscribe = |message: String| Error::Subscribe { message };
            let init = Object::new();
            set(
                &init,
                "userVisibleOnly",
                &JsValue::from_bool(options.user_visible_only),
            )
            .map_err(subscribe)?;
            let key = Uint8Array::from(options.application_server_key.as_slice());
            set(&init, "applicationServerKey", &key).map_err(subscribe)?;

            let promise = registration
                .push_manager()?
                .subscribe_with_options(init.unchecked_ref())
                .map_err(|err| subscribe(js_message(&err)))?;
            let value = JsFuture::from(promise)
                .await
                .map_err(|err| subscribe(js_message(&err)))?;
            subscription_from_js(&value).map_err(subscribe)
        }

        async fn unsubscribe(
            &self,
            registration: &BrowserRegistration,
            subscription: &PushSubscription,
        ) -> Result<bool, Error> {
            let unsubscribe = |message: String| Error::Unsubscribe { message };
            let Some(value) = current_js_subscription(registration)
                .await
                .map_err(unsubscribe)?
            else {
                return Ok(false);
            };
            let endpoint = property(&value, "endpoint").and_then(|e| e.as_string());
            if endpoint.as_deref() != Some(subscription.endpoint.as_str()) {
                debug!("browser holds a different subscription, nothing removed");
                return Ok(false);
            }

            let current: web_sys::PushSubscription = value
                .dyn_into()
                .map_err(|_| unsubscribe("not a PushSubscription".into()))?;
            let promise = current
                .unsubscribe()
                .map_err(|err| unsubscribe(js_message(&err)))?;
            let removed = JsFuture::from(promise)
                .await
                .map_err(|err| unsubscribe(js_message(&err)))?;
            Ok(removed.as_bool().unwrap_or(false))
        }
    }

    #[async_trait(?Send)]
    impl PermissionPrompt for BrowserPlatform {
        async fn request_permission(&self) -> Result<PermissionState, Error> {
            self.prompt.request_permission().await
        }
    }

    // ── Notification.requestPermission ───────────────────────────────

    /// `Notification.requestPermission()` returning a promise.
    #[derive(Debug, Clone)]
    pub struct NotificationPromise {
        notification: Option<JsValue>,
    }

    #[async_trait(?Send)]
    impl PromisePrompt for NotificationPromise {
        async fn request(&self) -> Result<PermissionState, Error> {
            let (notification, request) = request_permission_fn(self.notification.as_ref())?;
            let unavailable = Error::ConventionUnavailable {
                convention: CallingConvention::Promise,
            };
            // Older Safari throws or returns undefined here.
            let Ok(returned) = request.call0(notification) else {
                return Err(unavailable);
            };
            let promise: Promise = returned.dyn_into().map_err(|_| unavailable)?;
            let answer = JsFuture::from(promise)
                .await
                .map_err(|err| Error::Permission {
                    message: js_message(&err),
                })?;
            parse_permission(&answer)
        }
    }

    /// `Notification.requestPermission(callback)`.
    #[derive(Debug, Clone)]
    pub struct NotificationCallback {
        notification: Option<JsValue>,
    }

    impl CallbackPrompt for NotificationCallback {
        fn request(&self, done: Callback<PermissionState>) -> Result<(), Error> {
            let (notification, request) = request_permission_fn(self.notification.as_ref())?;
            let callback = Closure::once_into_js(move |answer: JsValue| {
                match parse_permission(&answer) {
                    Ok(permission) => done(permission),
                    // Dropping `done` surfaces as `CallbackDropped`.
                    Err(err) => debug!(%err, "unreadable permission answer"),
                }
            });
            request
                .call1(notification, &callback)
                .map_err(|err| Error::Permission {
                    message: js_message(&err),
                })?;
            Ok(())
        }
    }

    fn request_permission_fn(notification: Option<&JsValue>) -> Result<(&JsValue, Function), Error> {
        let missing = Error::NotSupported {
            feature: "Notification",
        };
        let notification = notification.ok_or(missing.clone())?;
        let request = property(notification, "requestPermission")
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or(missing)?;
        Ok((notification, request))
    }

    fn parse_permission(answer: &JsValue) -> Result<PermissionState, Error> {
        let text = answer.as_string().unwrap_or_default();
        text.parse().map_err(|_| Error::Permission {
            message: format!("unknown permission answer {text:?}"),
        })
    }

    // ── JS helpers ───────────────────────────────────────────────────

    async fn current_js_subscription(
        registration: &BrowserRegistration,
    ) -> Result<Option<JsValue>, String> {
        let manager = registration.push_manager().map_err(|err| err.to_string())?;
        let promise = manager.get_subscription().map_err(|err| js_message(&err))?;
        let value = JsFuture::from(promise)
            .await
            .map_err(|err| js_message(&err))?;
        Ok((!value.is_null() && !value.is_undefined()).then_some(value))
    }

    /// Read a subscription through `toJSON()`, the shape the backend stores.
    fn subscription_from_js(value: &JsValue) -> Result<PushSubscription, String> {
        let json: String = JSON::stringify(value)
            .map_err(|err| js_message(&err))?
            .into();
        serde_json::from_str(&json).map_err(|err| format!("unreadable subscription: {err}"))
    }

    fn property(target: &JsValue, name: &str) -> Option<JsValue> {
        Reflect::get(target, &JsValue::from_str(name))
            .ok()
            .filter(|value| !value.is_undefined() && !value.is_null())
    }

    fn set(target: &Object, name: &str, value: &JsValue) -> Result<(), String> {
        Reflect::set(target, &JsValue::from_str(name), value)
            .map(|_| ())
            .map_err(|err| js_message(&err))
    }

    fn js_message(err: &JsValue) -> String {
        err.as_string()
            .or_else(|| property(err, "message").and_then(|m| m.as_string()))
            .unwrap_or_else(|| format!("{err:?}"))
    }
}

#[cfg(all(feature = "wasm-web", target_arch = "wasm32"))]
pub use wasm::{BrowserPlatform, BrowserRegistration, NotificationCallback, NotificationPromise};

#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
mod native {
    use async_trait::async_trait;

    use crate::error::Error;
    use crate::platform::{PermissionPrompt, Platform, PushManager, WorkerContainer};
    use crate::types::{Capabilities, PermissionState, PushSubscription, SubscribeOptions};

    /// Placeholder registration; never handed out.
    #[derive(Debug, Clone)]
    pub struct BrowserRegistration;

    /// Stand-in outside the browser: no feature is available.
    #[derive(Debug, Default)]
    pub struct BrowserPlatform;

    impl BrowserPlatform {
        pub fn detect() -> Self {
            Self
        }
    }

    impl Platform for BrowserPlatform {
        type Registration = BrowserRegistration;

        fn capabilities(&self) -> Capabilities {
            Capabilities::none()
        }
    }

    const WORKER: Error = Error::NotSupported {
        feature: "serviceWorker",
    };
    const PUSH: Error = Error::NotSupported {
        feature: "PushManager",
    };

    #[async_trait(?Send)]
    impl WorkerContainer for BrowserPlatform {
        async fn register(&self, _script_url: &str) -> Result<BrowserRegistration, Error> {
            Err(WORKER)
        }

        async fn update(&self, _registration: &BrowserRegistration) -> Result<(), Error> {
            Err(WORKER)
        }
    }

    #[async_trait(?Send)]
    impl PushManager for BrowserPlatform {
        async fn get_subscription(
            &self,
            _registration: &BrowserRegistration,
        ) -> Result<Option<PushSubscription>, Error> {
            Err(PUSH)
        }

        async fn subscribe(
            &self,
            _registration: &BrowserRegistration,
            _options: &SubscribeOptions,
        ) -> Result<PushSubscription, Error> {
            Err(PUSH)
        }

        async fn unsubscribe(
            &self,
            _registration: &BrowserRegistration,
            _subscription: &PushSubscription,
        ) -> Result<bool, Error> {
            Err(PUSH)
        }
    }

    #[async_trait(?Send)]
    impl PermissionPrompt for BrowserPlatform {
        async fn request_permission(&self) -> Result<PermissionState, Error> {
            Err(Error::NotSupported {
                feature: "Notification",
            })
        }
    }
}

#[cfg(not(all(feature = "wasm-web", target_arch = "wasm32")))]
pub use native::{BrowserPlatform, BrowserRegistration};

#[cfg(all(test, not(all(feature = "wasm-web", target_arch = "wasm32"))))]
mod tests {
    use super::*;
    use crate::platform::{PermissionPrompt, Platform, WorkerContainer};
    use crate::types::Capabilities;

    #[tokio::test]
    async fn native_browser_reports_unsupported() {
        let browser = BrowserPlatform::detect();
        assert_eq!(browser.capabilities(), Capabilities::none());

        let err = browser.register("ui_web_push/n1/nodered_push_service.js").await;
        assert!(err.is_err_and(|e| e.is_not_supported()));

        let prompt = browser.request_permission().await;
        assert!(prompt.is_err_and(|e| e.is_not_supported()));
    }
}
