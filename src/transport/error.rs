//! Transport-level error types covering link, timing, and framing failures

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::protocol;

/// Unified error type for serial transport operations
#[derive(Error, Debug)]
pub enum TransportError {
    /// Writing the command frame to the link failed
    #[error("failed to write command frame")]
    Write(#[source] io::Error),

    /// The board sent nothing within the reply window
    #[error("no reply within {0:?}")]
    Timeout(Duration),

    /// The link itself failed (open, reconfigure, or read)
    #[error("serial link failure")]
    Link(#[source] io::Error),

    /// The reply frame failed size, echo, or checksum validation
    #[error("malformed reply to opcode 0x{opcode:02X}: {received:02X?}")]
    UnexpectedReply {
        /// Opcode byte of the command that was sent
        opcode: u8,
        /// The bytes that came back
        received: Vec<u8>,
    },

    /// The board answered NACK
    #[error("board rejected command 0x{opcode:02X}")]
    Rejected {
        /// Opcode byte of the rejected command
        opcode: u8,
    },

    /// Provided buffer was not large enough to hold the reply payload
    #[error("reply buffer too small: need {required} bytes, have {available}")]
    BufferTooSmall {
        /// Payload bytes the command will return
        required: usize,
        /// Bytes available in the supplied buffer
        available: usize,
    },

    /// No board answered the ping probes at any supported baud rate
    #[error("no board answered at {primary} or {fallback} baud")]
    LinkUnavailable {
        /// First rate probed
        primary: u32,
        /// Second rate probed
        fallback: u32,
    },

    /// Opening or configuring the serial port failed
    #[cfg(feature = "tty")]
    #[error("serial port error: {0}")]
    Port(#[from] serialport::Error),

    /// The command could not be encoded
    #[error(transparent)]
    Command(#[from] protocol::Error),
}

/// Result type alias for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;
