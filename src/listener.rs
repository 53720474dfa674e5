//! Background task draining device output.
//!
//! The listener polls the shared link for lines, keeps the ones carrying
//! the diagnostic marker and drops the rest. Read failures are logged and
//! followed by a backoff; the loop only ends when its task is aborted.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::diagnostics::{LogBuffer, LogEntry};
use crate::event::{EventDispatcher, GatewayEvent};
use crate::link::SerialLink;
use crate::protocol::is_diagnostic;
use crate::transport::Transport;

/// Wait between polls that found nothing.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Wait after a read failure.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// What the listener does before its next poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerState {
    /// A line just arrived; poll again right away.
    Draining,
    /// Nothing arrived; wait the poll interval.
    Idle,
    /// The read failed; wait the backoff.
    Backoff,
}

/// Polls a [`SerialLink`] and records diagnostics into a [`LogBuffer`].
pub struct InboundListener<T> {
    link: SerialLink<T>,
    logs: Arc<RwLock<LogBuffer>>,
    dispatcher: EventDispatcher,
    read_timeout: Duration,
    poll_interval: Duration,
    backoff: Duration,
}

impl<T: Transport + 'static> InboundListener<T> {
    /// Creates a listener with default intervals.
    #[must_use]
    pub fn new(
        link: SerialLink<T>,
        logs: Arc<RwLock<LogBuffer>>,
        dispatcher: EventDispatcher,
        read_timeout: Duration,
    ) -> Self {
        Self {
            link,
            logs,
            dispatcher,
            read_timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Sets the idle poll interval.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the failure backoff.
    #[must_use]
    pub const fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// How long to wait in `state` before the next poll.
    #[must_use]
    pub const fn delay(&self, state: ListenerState) -> Duration {
        match state {
            ListenerState::Draining => Duration::ZERO,
            ListenerState::Idle => self.poll_interval,
            ListenerState::Backoff => self.backoff,
        }
    }

    /// Performs one poll and returns the resulting state.
    pub async fn step(&self) -> ListenerState {
        match self.link.read_line(self.read_timeout).await {
            Ok(Some(line)) => {
                if is_diagnostic(&line) {
                    tracing::debug!("device: {}", line);
                    let entry = LogEntry::now(line);
                    self.logs.write().await.append(entry.clone());
                    self.dispatcher.dispatch(GatewayEvent::Diagnostic(entry));
                } else {
                    tracing::trace!("ignoring device line: {}", line);
                }
                ListenerState::Draining
            }
            Ok(None) => ListenerState::Idle,
            Err(e) => {
                tracing::error!("serial read failed: {}", e);
                if !self.link.is_open().await {
                    self.dispatcher.dispatch(GatewayEvent::LinkClosed);
                }
                tracing::warn!("listener backing off for {:?}", self.backoff);
                ListenerState::Backoff
            }
        }
    }

    /// Runs the poll loop forever.
    pub async fn run(self) {
        tracing::info!("inbound listener started");
        loop {
            let state = self.step().await;
            let delay = self.delay(state);
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Spawns the poll loop on the current runtime.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
