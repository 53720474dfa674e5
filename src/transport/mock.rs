//! In-memory transport standing in for the device in tests.

use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::transport::Transport;

#[derive(Debug, Default)]
pub(crate) struct MockState {
    pub connected: bool,
    pub opens: usize,
    pub fail_open: bool,
    pub fail_write: bool,
    /// `connect` never completes.
    pub hang_open: bool,
    /// `send` accepts half the line and then stalls forever.
    pub hang_write: bool,
    pub written: Vec<u8>,
    pub inbound: VecDeque<std::result::Result<String, io::ErrorKind>>,
}

/// Simulated device link. Clones share state, so a test can keep a handle
/// after moving the transport into a link.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn push_line(&self, line: &str) {
        self.with(|s| s.inbound.push_back(Ok(line.to_owned())));
    }

    pub fn push_read_error(&self, kind: io::ErrorKind) {
        self.with(|s| s.inbound.push_back(Err(kind)));
    }

    pub fn written(&self) -> String {
        self.with(|s| String::from_utf8(s.written.clone()).unwrap())
    }
}

impl Transport for MockTransport {
    fn connect(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            if self.with(|s| s.hang_open && !s.connected) {
                std::future::pending::<()>().await;
            }

            self.with(|s| {
                if s.connected {
                    return Ok(());
                }
                if s.fail_open {
                    return Err(Error::PortUnavailable(tokio_serial::Error::new(
                        tokio_serial::ErrorKind::NoDevice,
                        "mock port missing",
                    )));
                }
                s.connected = true;
                s.opens += 1;
                Ok(())
            })
        })
    }

    fn disconnect(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.with(|s| s.connected = false);
            Ok(())
        })
    }

    fn send(&mut self, data: Bytes) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let (first, second) = data.split_at(data.len() / 2);

            self.with(|s| {
                if !s.connected {
                    return Err(Error::NotConnected);
                }
                if s.fail_write {
                    s.connected = false;
                    return Err(Error::WriteFailure(io::Error::from(
                        io::ErrorKind::BrokenPipe,
                    )));
                }
                s.written.extend_from_slice(first);
                Ok(())
            })?;

            if self.with(|s| s.hang_write) {
                std::future::pending::<()>().await;
            }

            // Give other tasks a chance to run mid-write.
            tokio::task::yield_now().await;

            self.with(|s| s.written.extend_from_slice(second));
            Ok(())
        })
    }

    fn read_line(
        &mut self,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + '_>> {
        Box::pin(async move {
            let next = self.with(|s| {
                if s.connected {
                    Ok(s.inbound.pop_front())
                } else {
                    Err(Error::NotConnected)
                }
            })?;

            match next {
                Some(Ok(line)) => Ok(Some(line)),
                Some(Err(kind)) => {
                    self.with(|s| s.connected = false);
                    Err(Error::ReadFailure(io::Error::from(kind)))
                }
                None => {
                    tokio::time::sleep(timeout).await;
                    Ok(None)
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.with(|s| s.connected)
    }
}
