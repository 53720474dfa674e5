//! Main [`Gateway`] implementation.
//!
//! The gateway combines the serial link, the diagnostic buffer and the
//! inbound listener behind the two requests the control surface makes:
//! submitting a command and fetching recent diagnostics.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::config::{CallerId, GatewayConfig};
use crate::diagnostics::{LogBuffer, LogEntry};
use crate::error::{Error, Result};
use crate::event::{EventDispatcher, GatewayEvent, Subscription};
use crate::link::{LinkState, SerialLink};
use crate::listener::InboundListener;
use crate::protocol::{self, Command};
use crate::transport::{SerialTransport, Transport};

/// Capacity of the event broadcast channel.
const EVENT_CAPACITY: usize = 256;

/// A command that reached the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    /// The command written.
    pub command: Command,
    /// Confirmation text for the caller.
    pub confirmation: String,
}

/// Gateway between the control surface and the LED controller.
pub struct Gateway<T> {
    config: GatewayConfig,
    link: SerialLink<T>,
    logs: Arc<RwLock<LogBuffer>>,
    dispatcher: EventDispatcher,

    // Background task
    listener_task: Option<JoinHandle<()>>,
}

impl Gateway<SerialTransport> {
    /// Creates a gateway for the configured serial port.
    ///
    /// The gateway is not started; call [`Gateway::start`].
    #[must_use]
    pub fn serial(config: GatewayConfig) -> Self {
        let transport = SerialTransport::new(config.serial.clone());
        Self::with_transport(config, transport)
    }
}

impl<T: Transport + 'static> Gateway<T> {
    /// Creates a gateway over an arbitrary transport.
    #[must_use]
    pub fn with_transport(config: GatewayConfig, transport: T) -> Self {
        let logs = Arc::new(RwLock::new(LogBuffer::new(config.log_capacity)));
        let link = SerialLink::new(transport).write_timeout(config.serial.write_timeout);
        Self {
            config,
            link,
            logs,
            dispatcher: EventDispatcher::new(EVENT_CAPACITY),
            listener_task: None,
        }
    }

    /// Opens the link and starts the inbound listener.
    ///
    /// A port that cannot be opened is reported and leaves the gateway
    /// running degraded: commands are still validated but fail at the
    /// write step until a reopen succeeds.
    pub async fn start(&mut self) -> LinkState {
        match self.link.open().await {
            Ok(()) => self.dispatcher.dispatch(GatewayEvent::LinkOpened),
            Err(e) => {
                tracing::warn!(
                    "could not open {}: {}; running without device",
                    self.config.serial.port,
                    e
                );
            }
        }

        if self.listener_task.is_none() {
            let listener = InboundListener::new(
                self.link.clone(),
                Arc::clone(&self.logs),
                self.dispatcher.clone(),
                self.config.serial.read_timeout,
            )
            .poll_interval(self.config.poll_interval)
            .backoff(self.config.backoff);
            self.listener_task = Some(listener.spawn());
        }

        self.link.state().await
    }

    /// Stops the listener and closes the link.
    pub async fn shutdown(&mut self) -> Result<()> {
        if let Some(task) = self.listener_task.take() {
            task.abort();
            let _ = task.await;
        }

        if self.link.is_open().await {
            self.link.close().await?;
            self.dispatcher.dispatch(GatewayEvent::LinkClosed);
        }

        tracing::info!("gateway stopped");
        Ok(())
    }

    /// Validates `text` and writes the resulting command to the device.
    ///
    /// Nothing is written for unauthorized callers or invalid text. A
    /// closed link is reopened first.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthorized`] if `caller` is not the configured caller
    /// - [`Error::Parse`] if `text` is not a command
    /// - [`Error::LinkUnavailable`] if the device cannot be opened or written
    pub async fn submit_command(&self, text: &str, caller: CallerId) -> Result<Sent> {
        self.authorize(caller)?;

        tracing::info!("caller {}: {}", caller, text);
        let command = protocol::parse(text)?;

        match self.link.write_reopening(command.encode()).await {
            Ok(report) => {
                if report.reopened {
                    self.dispatcher.dispatch(GatewayEvent::LinkOpened);
                }
            }
            Err(e) => {
                tracing::error!("failed to send {}: {}", command, e);
                if !matches!(e, Error::PortUnavailable(_)) {
                    self.dispatcher.dispatch(GatewayEvent::LinkClosed);
                }
                return Err(e.into_link_unavailable());
            }
        }

        tracing::info!("device <- {}", command);
        self.dispatcher.dispatch(GatewayEvent::CommandSent(command));

        Ok(Sent {
            command,
            confirmation: command.confirmation(),
        })
    }

    /// Returns diagnostics received within `window`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] if `caller` is not the configured caller.
    pub async fn recent_logs(&self, window: Duration, caller: CallerId) -> Result<Vec<LogEntry>> {
        self.authorize(caller)?;
        Ok(self.logs.read().await.query(window))
    }

    /// Returns the current link state.
    pub async fn link_state(&self) -> LinkState {
        self.link.state().await
    }

    /// Returns the gateway configuration.
    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Subscribes to gateway events.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.dispatcher.subscribe()
    }

    fn authorize(&self, caller: CallerId) -> Result<()> {
        if self.config.is_authorized(caller) {
            Ok(())
        } else {
            tracing::warn!("rejected request from unauthorized caller {}", caller);
            Err(Error::Unauthorized)
        }
    }
}

impl<T> Drop for Gateway<T> {
    fn drop(&mut self) {
        // Abort background task; the link closes when its last handle drops
        if let Some(task) = self.listener_task.take() {
            task.abort();
        }
    }
}
