//! RCB-4 command message model
//!
//! This module provides the opcode table, operand encodings, and the
//! command message builder. It is pure: no I/O, no timing.

mod command;
mod error;
mod operand;
mod servo;
mod types;

pub use command::CommandMessage;
pub use error::{Error, Result};
pub use operand::{Destination, Source};
pub use servo::{ServoEntry, ServoSet};
pub use types::{Conditions, DestKind, Opcode, SourceKind};

/// Status byte for an accepted command
pub const ACK: u8 = 0x06;

/// Status byte for a rejected command
pub const NACK: u8 = 0x15;

/// Highest addressable byte of board RAM
pub const MAX_RAM_ADDRESS: u16 = 0x048F;

/// Highest addressable byte of board ROM
pub const MAX_ROM_ADDRESS: u32 = 0x03_FFFF;

/// Number of ICS servo-bus slots (wire ids 0-35, public ids 1-36)
pub const ICS_COUNT: u8 = 36;

/// Largest data size an ICS_WRITE command may carry
pub const MAX_ICS_WRITE_SIZE: u8 = 64;

/// Largest frame the board accepts, size and checksum bytes included
pub const MAX_FRAME_SIZE: u8 = 128;

/// Largest literal source, in bytes
pub const MAX_LITERAL_LEN: usize = 121;

/// RAM base address of the analog-digital converter block
pub const AD_BASE_ADDRESS: u16 = 0x0022;

/// Highest analog-digital converter id
pub const MAX_AD_ID: u8 = 10;
