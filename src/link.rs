//! The single shared connection to the device.
//!
//! Every operation on the underlying transport (open, close, write, read)
//! goes through one async mutex, so lines written by concurrent requests
//! never interleave and a reopen never overlaps a listener read.

use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::transport::serial::DEFAULT_WRITE_TIMEOUT;

/// Default upper bound for opening the device, board reset delay included.
pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(3);

/// Lifecycle state of a [`SerialLink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    /// No device handle is held.
    Closed,
    /// The device handle is open.
    Open,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("closed"),
            Self::Open => f.write_str("open"),
        }
    }
}

/// Result of a write that may have reopened the link first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteReport {
    /// The link was closed and had to be reopened for this write.
    pub reopened: bool,
}

/// Shared, lock-protected handle to a transport.
///
/// Opens and writes are bounded by timeouts here, whatever the transport
/// does; a transport that overruns is disconnected.
pub struct SerialLink<T> {
    transport: Arc<Mutex<T>>,
    open_timeout: Duration,
    write_timeout: Duration,
}

impl<T> Clone for SerialLink<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            open_timeout: self.open_timeout,
            write_timeout: self.write_timeout,
        }
    }
}

fn timeout_ms(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

impl<T: Transport> SerialLink<T> {
    /// Wraps a transport. The link starts in whatever state the transport is in,
    /// normally [`LinkState::Closed`].
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
            open_timeout: DEFAULT_OPEN_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Sets the bound on opening the device.
    #[must_use]
    pub const fn open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    /// Sets the bound on writing one line.
    #[must_use]
    pub const fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Opens the device. Opening an open link is a no-op.
    pub async fn open(&self) -> Result<()> {
        let mut transport = self.transport.lock().await;
        self.connect_bounded(&mut transport).await
    }

    /// Closes the device handle. Safe to call repeatedly.
    pub async fn close(&self) -> Result<()> {
        let mut transport = self.transport.lock().await;
        transport.disconnect().await
    }

    /// Writes one encoded line.
    pub async fn write(&self, data: Bytes) -> Result<()> {
        let mut transport = self.transport.lock().await;
        self.send_bounded(&mut transport, data).await
    }

    /// Writes one encoded line, reopening a closed link first.
    ///
    /// Reopen and write happen under one lock acquisition.
    pub async fn write_reopening(&self, data: Bytes) -> Result<WriteReport> {
        let mut transport = self.transport.lock().await;

        let reopened = if transport.is_connected() {
            false
        } else {
            tracing::info!("link closed, reopening before write");
            self.connect_bounded(&mut transport).await?;
            true
        };

        self.send_bounded(&mut transport, data).await?;
        Ok(WriteReport { reopened })
    }

    /// Reads one line if it arrives within `timeout`.
    ///
    /// A closed link yields `Ok(None)` right away; the listener never reopens.
    pub async fn read_line(&self, timeout: Duration) -> Result<Option<String>> {
        let mut transport = self.transport.lock().await;
        if !transport.is_connected() {
            return Ok(None);
        }
        transport.read_line(timeout).await
    }

    /// Returns the current lifecycle state.
    pub async fn state(&self) -> LinkState {
        if self.transport.lock().await.is_connected() {
            LinkState::Open
        } else {
            LinkState::Closed
        }
    }

    /// Returns true if the link is open.
    pub async fn is_open(&self) -> bool {
        self.state().await == LinkState::Open
    }

    async fn connect_bounded(&self, transport: &mut T) -> Result<()> {
        let result = tokio::time::timeout(self.open_timeout, transport.connect()).await;
        let Ok(result) = result else {
            tracing::warn!("opening the device timed out after {:?}", self.open_timeout);
            transport.disconnect().await?;
            return Err(Error::PortUnavailable(tokio_serial::Error::new(
                tokio_serial::ErrorKind::Io(io::ErrorKind::TimedOut),
                format!("open timed out after {}ms", timeout_ms(self.open_timeout)),
            )));
        };
        result
    }

    async fn send_bounded(&self, transport: &mut T, data: Bytes) -> Result<()> {
        let result = tokio::time::timeout(self.write_timeout, transport.send(data)).await;
        let Ok(result) = result else {
            tracing::error!("write timed out after {:?}, closing link", self.write_timeout);
            transport.disconnect().await?;
            return Err(Error::Timeout {
                timeout_ms: timeout_ms(self.write_timeout),
            });
        };
        result
    }
}
