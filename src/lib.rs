//! # ledgate
//!
//! A gateway between a remote control surface and an RGB/brightness LED
//! controller attached over a serial link.
//!
//! The gateway validates command text, encodes it into the controller's
//! line protocol, serializes writes onto the single serial connection, and
//! keeps a bounded history of the diagnostic lines the device prints.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use ledgate::{Gateway, GatewayConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ledgate::Error> {
//!     let config = GatewayConfig::new("/dev/ttyACM0").authorized_caller(Some(42));
//!     let mut gateway = Gateway::serial(config);
//!     gateway.start().await;
//!
//!     let sent = gateway.submit_command("R255 G0 B128", 42).await?;
//!     println!("{}", sent.confirmation);
//!
//!     for entry in gateway.recent_logs(Duration::from_secs(30), 42).await? {
//!         println!("{} {}", entry.timestamp, entry.text);
//!     }
//!
//!     gateway.shutdown().await
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`protocol`] - Command parsing, wire encoding, inbound line reassembly
//! - [`transport`] - Transport implementations (currently USB/Serial)
//! - [`link`] - The lock-protected shared link
//! - [`diagnostics`] - Ring buffer of device diagnostics
//! - [`listener`] - Background task draining device output
//! - [`event`] - Broadcast of gateway activity
//! - [`gateway`] - High-level [`Gateway`]

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod gateway;
pub mod link;
pub mod listener;
pub mod protocol;
pub mod transport;

// Re-exports for convenience
pub use config::{CallerId, GatewayConfig};
pub use diagnostics::{DEFAULT_LOG_WINDOW, LogBuffer, LogEntry, render_entries};
pub use error::{Error, ErrorKind, ParseError, Result};
pub use event::{EventDispatcher, GatewayEvent, Subscription};
pub use gateway::{Gateway, Sent};
pub use link::{LinkState, SerialLink};
pub use listener::{InboundListener, ListenerState};
pub use protocol::{Command, PRESETS, parse};
pub use transport::{SerialConfig, SerialTransport, Transport, serial::list_ports};
