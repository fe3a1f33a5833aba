// ── Outbound reporter ──
//
// Forwards lifecycle events to the host backend. Errors are also written
// to the local diagnostic log. Reporting never fails from the lifecycle's
// point of view: a broken host channel is logged and otherwise ignored.

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, warn};
use webpush_platform::PushSubscription;

use crate::error::CoreError;
use crate::message::{OutboundMessage, Payload, Topic};

/// The host binding messages are delivered through.
///
/// Injected into the lifecycle at construction.
pub trait HostChannel {
    /// Deliver one message. Delivery problems are the channel's to log.
    fn send(&self, message: OutboundMessage);
}

impl HostChannel for mpsc::UnboundedSender<OutboundMessage> {
    fn send(&self, message: OutboundMessage) {
        if let Err(err) = mpsc::UnboundedSender::send(self, message) {
            debug!(topic = %err.0.topic, "host channel closed, report dropped");
        }
    }
}

/// Discards every message. For hosts without a backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullChannel;

impl HostChannel for NullChannel {
    fn send(&self, message: OutboundMessage) {
        debug!(topic = %message.topic, "report discarded");
    }
}

pub struct OutboundReporter<H> {
    channel: H,
}

impl<H: HostChannel> OutboundReporter<H> {
    pub fn new(channel: H) -> Self {
        Self { channel }
    }

    pub fn report(&self, topic: Topic, payload: Payload) {
        if let Payload::Error(ref message) = payload {
            warn!(%topic, error = %message, "push client error");
        } else {
            debug!(%topic, "reporting to host");
        }
        self.channel.send(OutboundMessage { payload, topic });
    }

    pub fn subscription(&self, topic: Topic, subscription: PushSubscription) {
        self.report(topic, Payload::Subscription(subscription));
    }

    pub fn error(&self, error: &CoreError) {
        self.report(Topic::Error, Payload::Error(error.to_string()));
    }
}

impl<H> fmt::Debug for OutboundReporter<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundReporter").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use webpush_platform::MemoryPlatform;

    #[test]
    fn error_report_uses_error_topic_and_display_text() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reporter = OutboundReporter::new(tx);

        reporter.error(&CoreError::UnsubscribeRejected);

        assert_eq!(
            rx.try_recv().unwrap(),
            OutboundMessage::error("Browser refused to remove the push subscription")
        );
    }

    #[test]
    fn closed_channel_is_not_an_error() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let reporter = OutboundReporter::new(tx);
        reporter.subscription(
            Topic::SubscriptionNew,
            MemoryPlatform::sample_subscription("gone"),
        );
    }
}
