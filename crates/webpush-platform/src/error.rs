use thiserror::Error;

use crate::types::CallingConvention;

/// Top-level error type for the `webpush-platform` crate.
///
/// Every variant corresponds to one rejected platform call. The messages
/// carry whatever the browser reported (usually a `DOMException` string).
/// `webpush-core` maps these into lifecycle errors per transition step.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    // ── Capability ──────────────────────────────────────────────────
    /// The feature is missing from this browser or context (e.g. not HTTPS).
    #[error("{feature} is not available in this context")]
    NotSupported { feature: &'static str },

    // ── Worker container ────────────────────────────────────────────
    /// `serviceWorker.register` rejected.
    #[error("worker registration rejected: {message}")]
    Registration { message: String },

    /// `registration.update` rejected.
    #[error("worker update rejected: {message}")]
    Update { message: String },

    // ── Push manager ────────────────────────────────────────────────
    /// `pushManager.getSubscription` rejected.
    #[error("subscription query rejected: {message}")]
    Query { message: String },

    /// `pushManager.subscribe` rejected.
    #[error("subscribe rejected: {message}")]
    Subscribe { message: String },

    /// `subscription.unsubscribe` rejected.
    #[error("unsubscribe rejected: {message}")]
    Unsubscribe { message: String },

    // ── Permission prompt ───────────────────────────────────────────
    /// The permission prompt itself failed (not a denial).
    #[error("permission prompt failed: {message}")]
    Permission { message: String },

    /// The prompt is not callable in the requested convention.
    #[error("permission prompt does not support the {convention} calling convention")]
    ConventionUnavailable { convention: CallingConvention },

    /// A callback-style API dropped its callback without invoking it.
    #[error("callback was dropped before it was invoked")]
    CallbackDropped,
}

impl Error {
    /// Returns `true` if the failure means the feature is absent rather
    /// than that a single call went wrong.
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported { .. })
    }
}
