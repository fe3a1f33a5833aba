// webpush-core: Push subscription lifecycle between the browser platform and a host dashboard.

pub mod codec;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod message;
pub mod projector;
pub mod registry;
pub mod reporter;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use codec::{KeyDecodeError, decode_server_key};
pub use config::{ClientConfig, DEFAULT_SCRIPT_BASE, DEFAULT_SCRIPT_NAME, InstanceId};
pub use error::CoreError;
pub use lifecycle::{ClickOutcome, LifecycleState, SubscriptionLifecycle};
pub use message::{Control, OutboundMessage, Payload, RELOAD_SERVICE_WORKER, Topic};
pub use projector::{ButtonAction, UiState, project};
pub use registry::WorkerRegistry;
pub use reporter::{HostChannel, NullChannel, OutboundReporter};
pub use store::SubscriptionStore;
