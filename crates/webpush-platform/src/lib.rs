// webpush-platform: The browser surface the subscription lifecycle talks to.
//
// `browser::BrowserPlatform` implements the traits in `platform` over the
// real browser APIs (`wasm-web` feature on wasm32). `memory::MemoryPlatform`
// implements them in-process for tests and simulation.

pub mod browser;
pub mod callback;
pub mod error;
pub mod memory;
pub mod platform;
pub mod types;

pub use browser::{BrowserPlatform, BrowserRegistration};
pub use callback::{Callback, CallbackPrompt, CallbackResult, PromisePrompt, PromptFallback};
pub use error::Error;
pub use memory::{CallCounts, FaultPoint, MemoryPlatform, MemoryRegistration};
pub use platform::{PermissionPrompt, Platform, PushManager, PushPlatform, WorkerContainer};
pub use types::{
    Capabilities, CallingConvention, PermissionState, PushSubscription, SubscribeOptions,
    SubscriptionKeys,
};
