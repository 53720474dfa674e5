//! Event system for gateway activity.
//!
//! Every command sent, diagnostic captured, and link transition is
//! recorded here; observers subscribe to receive them.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::diagnostics::LogEntry;
use crate::protocol::Command;

/// Event types that can be dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// The device link was opened.
    LinkOpened,
    /// The device link was closed.
    LinkClosed,
    /// A command line was written to the device.
    CommandSent(Command),
    /// A diagnostic line was captured from the device.
    Diagnostic(LogEntry),
}

/// A subscription to events.
pub struct Subscription {
    receiver: broadcast::Receiver<GatewayEvent>,
}

impl Subscription {
    /// Receives the next event.
    ///
    /// Events missed while lagging are skipped. Returns `None` once the
    /// dispatcher is gone.
    pub async fn recv(&mut self) -> Option<GatewayEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!("subscriber lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

struct EventDispatcherInner {
    sender: broadcast::Sender<GatewayEvent>,
}

/// Dispatches events to subscribers.
#[derive(Clone)]
pub struct EventDispatcher {
    inner: Arc<EventDispatcherInner>,
}

impl EventDispatcher {
    /// Creates a new event dispatcher.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(EventDispatcherInner { sender }),
        }
    }

    /// Dispatches an event to all subscribers.
    pub fn dispatch(&self, event: GatewayEvent) {
        // No receivers is fine
        let _ = self.inner.sender.send(event);
    }

    /// Subscribes to events dispatched from now on.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.inner.sender.subscribe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_dispatch() {
        let dispatcher = EventDispatcher::new(16);
        let mut sub = dispatcher.subscribe();

        dispatcher.dispatch(GatewayEvent::LinkOpened);
        dispatcher.dispatch(GatewayEvent::CommandSent(Command::SetBrightness { level: 3 }));

        let event = tokio::time::timeout(std::time::Duration::from_millis(100), sub.recv())
            .await
            .unwrap();
        assert_eq!(event, Some(GatewayEvent::LinkOpened));

        let event = sub.recv().await;
        assert_eq!(
            event,
            Some(GatewayEvent::CommandSent(Command::SetBrightness { level: 3 }))
        );
    }

    #[test]
    fn test_dispatch_without_subscribers() {
        let dispatcher = EventDispatcher::new(4);
        dispatcher.dispatch(GatewayEvent::LinkClosed);
    }

    #[tokio::test]
    async fn test_lagged_subscriber_keeps_receiving() {
        let dispatcher = EventDispatcher::new(2);
        let mut sub = dispatcher.subscribe();

        for level in 0..5 {
            dispatcher.dispatch(GatewayEvent::CommandSent(Command::SetBrightness { level }));
        }

        let event = sub.recv().await;
        assert_eq!(
            event,
            Some(GatewayEvent::CommandSent(Command::SetBrightness { level: 3 }))
        );
    }
}
