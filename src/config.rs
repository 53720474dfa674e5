//! Gateway configuration.

use std::time::Duration;

use crate::diagnostics::DEFAULT_LOG_CAPACITY;
use crate::listener::{DEFAULT_BACKOFF, DEFAULT_POLL_INTERVAL};
use crate::transport::SerialConfig;

/// Identifier of the party submitting requests (a chat id on the control surface).
pub type CallerId = i64;

/// Configuration for a [`Gateway`](crate::Gateway).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Serial link parameters.
    pub serial: SerialConfig,
    /// Number of diagnostics kept.
    pub log_capacity: usize,
    /// Only this caller may submit requests, if set.
    pub authorized_caller: Option<CallerId>,
    /// Listener wait between empty polls.
    pub poll_interval: Duration,
    /// Listener wait after a read failure.
    pub backoff: Duration,
}

impl GatewayConfig {
    /// Creates a configuration for `port` with default settings.
    #[must_use]
    pub fn new(port: impl Into<String>) -> Self {
        Self::with_serial(SerialConfig::new(port))
    }

    /// Creates a configuration around existing serial settings.
    #[must_use]
    pub const fn with_serial(serial: SerialConfig) -> Self {
        Self {
            serial,
            log_capacity: DEFAULT_LOG_CAPACITY,
            authorized_caller: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Sets the baud rate.
    #[must_use]
    pub const fn baud_rate(mut self, rate: u32) -> Self {
        self.serial.baud_rate = rate;
        self
    }

    /// Sets the serial read timeout.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.serial.read_timeout = timeout;
        self
    }

    /// Sets the bound on writing one command.
    #[must_use]
    pub const fn write_timeout(mut self, timeout: Duration) -> Self {
        self.serial.write_timeout = timeout;
        self
    }

    /// Sets the diagnostic history size.
    #[must_use]
    pub const fn log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }

    /// Restricts requests to one caller.
    ///
    /// `Some(0)` counts as unset, matching an empty `AUTHORIZED_CHAT_ID`.
    #[must_use]
    pub const fn authorized_caller(mut self, caller: Option<CallerId>) -> Self {
        self.authorized_caller = match caller {
            Some(0) | None => None,
            Some(id) => Some(id),
        };
        self
    }

    /// Sets the listener poll interval.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the listener backoff after read failures.
    #[must_use]
    pub const fn backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Returns true if `caller` may submit requests.
    #[must_use]
    pub fn is_authorized(&self, caller: CallerId) -> bool {
        self.authorized_caller.is_none_or(|id| id == caller)
    }
}
