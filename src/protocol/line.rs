//! Reassembly of newline-terminated lines from the inbound byte stream.
//!
//! The device prints free-form text; only lines starting with
//! [`DIAGNOSTIC_MARKER`] are diagnostics, everything else is noise.

use bytes::{Buf, BytesMut};

use crate::protocol::command::LINE_TERMINATOR;

/// Prefix that marks a device line as a diagnostic entry.
pub const DIAGNOSTIC_MARKER: &str = "LOG:";

/// Longest partial line kept while waiting for a terminator.
pub const MAX_LINE_LEN: usize = 1024;

/// Returns true if the line is a device diagnostic.
#[must_use]
pub fn is_diagnostic(line: &str) -> bool {
    line.starts_with(DIAGNOSTIC_MARKER)
}

/// Line decoder that handles partial data.
///
/// No line longer than [`MAX_LINE_LEN`] is ever returned. Once a line has
/// been cut, everything up to its terminator is discarded too.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: BytesMut,
    /// Set while skipping the rest of a cut line.
    discarding: bool,
}

impl LineDecoder {
    /// Creates a new line decoder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
            discarding: false,
        }
    }

    /// Feeds data into the decoder.
    ///
    /// If the buffered partial line grows past [`MAX_LINE_LEN`] without a
    /// terminator it is discarded.
    pub fn feed(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);

        if !self.buffer.contains(&LINE_TERMINATOR) {
            self.drop_overflow();
        }
    }

    /// Attempts to decode the next complete line.
    ///
    /// Returns the line without its terminator, a trailing `\r`, or
    /// surrounding whitespace. Invalid UTF-8 is replaced, not rejected.
    pub fn decode(&mut self) -> Option<String> {
        loop {
            let Some(end) = self.buffer.iter().position(|&b| b == LINE_TERMINATOR) else {
                self.drop_overflow();
                return None;
            };
            let raw = self.buffer.split_to(end);
            self.buffer.advance(1);

            if std::mem::take(&mut self.discarding) {
                tracing::debug!("discarded {} trailing bytes of a cut line", raw.len());
                continue;
            }
            if raw.len() > MAX_LINE_LEN {
                tracing::warn!("dropping {} byte line", raw.len());
                continue;
            }

            return Some(String::from_utf8_lossy(&raw).trim().to_owned());
        }
    }

    /// Drops an unterminated tail that is already too long to be a line.
    fn drop_overflow(&mut self) {
        if self.buffer.len() > MAX_LINE_LEN {
            tracing::warn!(
                "dropping {} bytes of unterminated input",
                self.buffer.len()
            );
            self.buffer.clear();
            self.discarding = true;
        }
    }

    /// Returns the number of bytes currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Clears the internal buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.discarding = false;
    }
}
