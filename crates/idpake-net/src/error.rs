//! Transport error types

use thiserror::Error;

/// Transport layer errors; all are fatal to the session.
#[derive(Error, Debug)]
pub enum NetError {
    /// The rendezvous opener failed
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The peer did not show up in time
    #[error("timed out waiting for peer")]
    Timeout,

    /// A message arrived with the wrong counter header
    #[error("unexpected header {got:#04x}, expected {expected:#04x}")]
    Header {
        /// Counter value the channel expected
        expected: u8,
        /// Counter value the message carried
        got: u8,
    },

    /// A message arrived with the wrong length
    #[error("short message: expected {expected} bytes, got {got}")]
    Truncated {
        /// Expected message length including header
        expected: usize,
        /// Received length
        got: usize,
    },

    /// Underlying socket failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
