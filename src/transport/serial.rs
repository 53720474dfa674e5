//! Serial/USB transport implementation.
//!
//! This module provides serial port communication for LED controllers
//! connected via USB (typically an Arduino-class board).

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use crate::error::{Error, Result};
use crate::protocol::LineDecoder;
use crate::transport::Transport;

/// Default baud rate of the controller firmware.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default timeout for a single line read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Default upper bound for writing one command.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Default delay after opening, while the board resets.
pub const DEFAULT_CONNECTION_DELAY: Duration = Duration::from_millis(300);

/// Configuration for serial transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Serial port path (e.g., "/dev/ttyACM0" or "COM4").
    pub port: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Timeout for a single line read.
    pub read_timeout: Duration,
    /// Timeout for writing one command, enforced by the link.
    pub write_timeout: Duration,
    /// Delay after connection before sending commands.
    pub connection_delay: Duration,
}

impl SerialConfig {
    /// Creates a new serial configuration with default settings.
    #[must_use]
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            connection_delay: DEFAULT_CONNECTION_DELAY,
        }
    }

    /// Sets the baud rate.
    #[must_use]
    pub const fn baud_rate(mut self, rate: u32) -> Self {
        self.baud_rate = rate;
        self
    }

    /// Sets the read timeout.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets the write timeout.
    #[must_use]
    pub const fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Sets the connection delay.
    #[must_use]
    pub const fn connection_delay(mut self, delay: Duration) -> Self {
        self.connection_delay = delay;
        self
    }
}

/// Serial transport for the LED controller.
///
/// Holds the whole stream; dropping the transport releases the port.
pub struct SerialTransport {
    config: SerialConfig,
    stream: Option<SerialStream>,
    decoder: LineDecoder,
}

impl SerialTransport {
    /// Creates a new serial transport with the given configuration.
    #[must_use]
    pub fn new(config: SerialConfig) -> Self {
        Self {
            config,
            stream: None,
            decoder: LineDecoder::new(),
        }
    }

    /// Creates a new serial transport for the given port with default settings.
    #[must_use]
    pub fn with_port(port: impl Into<String>) -> Self {
        Self::new(SerialConfig::new(port))
    }

    /// Returns the transport configuration.
    #[must_use]
    pub const fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn drop_stream(&mut self) {
        if self.stream.take().is_some() {
            tracing::info!("serial port {} closed", self.config.port);
        }
        self.decoder.clear();
    }
}

impl Transport for SerialTransport {
    fn connect(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            if self.stream.is_some() {
                return Ok(());
            }

            tracing::info!(
                "opening serial port {} at {} baud",
                self.config.port,
                self.config.baud_rate
            );

            let stream = tokio_serial::new(&self.config.port, self.config.baud_rate)
                .timeout(self.config.read_timeout)
                .open_native_async()
                .map_err(Error::PortUnavailable)?;

            // Opening the port resets most boards; give the firmware time to come up
            tokio::time::sleep(self.config.connection_delay).await;

            self.decoder.clear();
            self.stream = Some(stream);

            tracing::info!("serial port {} opened", self.config.port);
            Ok(())
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.drop_stream();
            Ok(())
        })
    }

    fn send(&mut self, data: Bytes) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

            tracing::trace!("writing {} bytes: {}", data.len(), hex::encode(&data));

            let result = async {
                stream.write_all(&data).await?;
                stream.flush().await
            }
            .await;

            if let Err(e) = result {
                tracing::error!("serial write error: {}", e);
                self.drop_stream();
                return Err(Error::WriteFailure(e));
            }
            Ok(())
        })
    }

    fn read_line(
        &mut self,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + '_>> {
        Box::pin(async move {
            if let Some(line) = self.decoder.decode() {
                return Ok(Some(line));
            }

            let Some(stream) = self.stream.as_mut() else {
                return Err(Error::NotConnected);
            };

            let deadline = tokio::time::Instant::now() + timeout;
            let mut buf = [0u8; 256];

            let failure = loop {
                match tokio::time::timeout_at(deadline, stream.read(&mut buf)).await {
                    Err(_) => return Ok(None),
                    Ok(Ok(0)) => {
                        break io::Error::new(io::ErrorKind::UnexpectedEof, "serial port closed");
                    }
                    Ok(Ok(n)) => {
                        tracing::trace!("received {} bytes", n);
                        self.decoder.feed(&buf[..n]);
                        if let Some(line) = self.decoder.decode() {
                            return Ok(Some(line));
                        }
                    }
                    Ok(Err(e)) if e.kind() == io::ErrorKind::TimedOut => return Ok(None),
                    Ok(Err(e)) => break e,
                }
            };

            tracing::error!("serial read error: {}", failure);
            self.drop_stream();
            Err(Error::ReadFailure(failure))
        })
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

/// Lists available serial ports.
///
/// # Errors
///
/// Returns an error if the port list cannot be retrieved.
pub fn list_ports() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports().map_err(Error::PortEnumeration)?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_config_defaults() {
        let config = SerialConfig::new("/dev/ttyACM0");
        assert_eq!(config.port, "/dev/ttyACM0");
        assert_eq!(config.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(config.read_timeout, DEFAULT_READ_TIMEOUT);
        assert_eq!(config.write_timeout, DEFAULT_WRITE_TIMEOUT);
    }

    #[test]
    fn test_serial_config_builder() {
        let config = SerialConfig::new("COM4")
            .baud_rate(115_200)
            .read_timeout(Duration::from_millis(50))
            .write_timeout(Duration::from_millis(500))
            .connection_delay(Duration::from_secs(2));
        assert_eq!(config.baud_rate, 115_200);
        assert_eq!(config.read_timeout, Duration::from_millis(50));
        assert_eq!(config.write_timeout, Duration::from_millis(500));
        assert_eq!(config.connection_delay, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_unconnected_transport() {
        let mut transport = SerialTransport::with_port("/dev/does-not-exist");
        assert!(!transport.is_connected());

        let err = transport.send(Bytes::from_static(b"L1\n")).await.unwrap_err();
        assert!(matches!(err, Error::NotConnected));

        let err = transport
            .read_line(Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotConnected));

        // Disconnecting twice is fine
        transport.disconnect().await.unwrap();
        transport.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_missing_port() {
        let mut transport = SerialTransport::with_port("/dev/ledgate-missing-port");
        let err = transport.connect().await.unwrap_err();
        assert!(matches!(err, Error::PortUnavailable(_)));
        assert!(!transport.is_connected());
    }

    #[test]
    #[ignore = "Requires /sys/class/tty - not available in sandboxed builds"]
    fn test_list_ports() {
        // Just verify it doesn't panic
        let _ = list_ports();
    }
}
