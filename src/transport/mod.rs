//! Transport layer for device communication.
//!
//! This module provides the abstraction over the byte link to the LED
//! controller. The only production implementation is USB/Serial.

#[cfg(test)]
pub(crate) mod mock;
pub mod serial;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;

/// Trait for transport implementations.
///
/// Implementations are not required to be safe for concurrent use; callers
/// serialize access through [`SerialLink`](crate::link::SerialLink).
pub trait Transport: Send + Sync {
    /// Connects to the device. Connecting while connected is a no-op.
    fn connect(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Disconnects from the device. Safe to call repeatedly.
    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Sends data to the device.
    ///
    /// A failed send leaves the transport disconnected.
    fn send(&mut self, data: Bytes) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Reads one complete line, waiting at most `timeout`.
    ///
    /// Returns `Ok(None)` when no full line arrived in time. A hard read
    /// error leaves the transport disconnected.
    fn read_line(
        &mut self,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + '_>>;

    /// Returns true if connected.
    fn is_connected(&self) -> bool;
}

pub use serial::{SerialConfig, SerialTransport};
