// ── Calling-convention adapters ──
//
// Browsers expose the notification permission prompt either as a
// promise-returning function or as a function taking a callback (older
// Safari). Both are folded into one future here so the lifecycle never
// sees the difference.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::channel::oneshot;
use tracing::debug;

use crate::error::Error;
use crate::platform::PermissionPrompt;
use crate::types::{CallingConvention, PermissionState};

/// A one-shot completion handed to a callback-style API.
pub type Callback<T> = Box<dyn FnOnce(T)>;

/// Future side of a [`Callback`]; resolves when the callback runs.
///
/// Resolves to [`Error::CallbackDropped`] if the API dropped the callback
/// without invoking it.
#[derive(Debug)]
pub struct CallbackResult<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> CallbackResult<T> {
    /// Create a linked callback / future pair.
    pub fn pair() -> (Callback<T>, Self)
    where
        T: 'static,
    {
        let (tx, rx) = oneshot::channel();
        let callback: Callback<T> = Box::new(move |value| {
            // The receiver may be gone if the caller stopped waiting.
            let _ = tx.send(value);
        });
        (callback, Self { rx })
    }
}

impl<T> Future for CallbackResult<T> {
    type Output = Result<T, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.map_err(|_| Error::CallbackDropped))
    }
}

/// Promise-style prompt (`Notification.requestPermission().then(...)`).
///
/// Implementations return [`Error::ConventionUnavailable`] when the browser
/// does not return a promise.
#[async_trait(?Send)]
pub trait PromisePrompt {
    async fn request(&self) -> Result<PermissionState, Error>;
}

/// Callback-style prompt (`Notification.requestPermission(cb)`).
pub trait CallbackPrompt {
    /// Start the prompt; `done` must be invoked exactly once with the outcome.
    fn request(&self, done: Callback<PermissionState>) -> Result<(), Error>;
}

/// Tries the promise form first and falls back to the callback form.
#[derive(Debug, Clone)]
pub struct PromptFallback<P, C> {
    promise: P,
    callback: C,
}

impl<P, C> PromptFallback<P, C> {
    pub fn new(promise: P, callback: C) -> Self {
        Self { promise, callback }
    }
}

#[async_trait(?Send)]
impl<P, C> PermissionPrompt for PromptFallback<P, C>
where
    P: PromisePrompt,
    C: CallbackPrompt,
{
    async fn request_permission(&self) -> Result<PermissionState, Error> {
        match self.promise.request().await {
            Err(Error::ConventionUnavailable {
                convention: CallingConvention::Promise,
            }) => {
                debug!("promise permission prompt unavailable, using callback form");
                let (done, result) = CallbackResult::pair();
                self.callback.request(done)?;
                result.await
            }
            other => other,
        }
    }
}
