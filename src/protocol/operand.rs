//! Source and destination operand encodings
//!
//! Pure value types. Range validation lives in
//! [`CommandMessage`](super::CommandMessage); these only know their byte
//! layout. Addresses are little-endian on the wire.

use bytes::{BufMut, BytesMut};

use super::{DestKind, SourceKind};

/// Source operand of a transfer-family command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Source {
    /// No source chosen yet; encodes as zero bytes
    #[default]
    None,
    /// Board RAM: 2-byte address plus data size
    Ram {
        /// RAM address
        addr: u16,
        /// Data size in bytes
        size: u8,
    },
    /// ICS bus: offset, device id (0-based on the wire), data size
    Ics {
        /// Byte offset within the device block
        offset: u8,
        /// Wire id, 0-35
        id: u8,
        /// Data size in bytes
        size: u8,
    },
    /// Inline literal bytes carried in the frame
    Literal(Vec<u8>),
    /// Board ROM: 3-byte address plus data size
    Rom {
        /// ROM address
        addr: u32,
        /// Data size in bytes
        size: u8,
    },
}

impl Source {
    /// Kind bits for the type byte, if a source is set
    #[must_use]
    pub fn kind(&self) -> Option<SourceKind> {
        match self {
            Self::None => None,
            Self::Ram { .. } => Some(SourceKind::Ram),
            Self::Ics { .. } => Some(SourceKind::Ics),
            Self::Literal(_) => Some(SourceKind::Literal),
            Self::Rom { .. } => Some(SourceKind::Rom),
        }
    }

    /// The declared data size, for kinds that carry one
    #[must_use]
    pub fn declared_size(&self) -> Option<u8> {
        match self {
            Self::Ram { size, .. } | Self::Ics { size, .. } | Self::Rom { size, .. } => Some(*size),
            Self::None | Self::Literal(_) => None,
        }
    }

    /// Rewrite the size sub-field in place
    ///
    /// No-op for `None` and `Literal`, matching the original's shared-union
    /// behavior where the size byte has nowhere to land.
    pub fn set_declared_size(&mut self, new_size: u8) {
        match self {
            Self::Ram { size, .. } | Self::Ics { size, .. } | Self::Rom { size, .. } => {
                *size = new_size;
            }
            Self::None | Self::Literal(_) => {}
        }
    }

    /// Append the operand bytes
    pub fn encode_into(&self, buf: &mut BytesMut) {
        match self {
            Self::None => {}
            Self::Ram { addr, size } => {
                buf.put_u16_le(*addr);
                buf.put_u8(*size);
            }
            Self::Ics { offset, id, size } => {
                buf.put_u8(*offset);
                buf.put_u8(*id);
                buf.put_u8(*size);
            }
            Self::Literal(bytes) => buf.put_slice(bytes),
            Self::Rom { addr, size } => {
                buf.put_u8(*addr as u8);
                buf.put_u8((*addr >> 8) as u8);
                buf.put_u8((*addr >> 16) as u8);
                buf.put_u8(*size);
            }
        }
    }
}

/// Destination operand
///
/// Always occupies 3 wire bytes in the transfer, NOT, and SHIFT layouts;
/// kinds narrower than 3 bytes are zero-padded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Destination {
    /// No destination chosen yet; encodes as three zero bytes
    #[default]
    None,
    /// Board RAM address
    Ram(u16),
    /// ICS bus offset and device id (0-based on the wire)
    Ics {
        /// Byte offset within the device block
        offset: u8,
        /// Wire id, 0-35
        id: u8,
    },
    /// The serial channel back to the host
    Com,
    /// Board ROM address
    Rom(u32),
}

impl Destination {
    /// Kind bits for the type byte, if a destination is set
    #[must_use]
    pub fn kind(&self) -> Option<DestKind> {
        match self {
            Self::None => None,
            Self::Ram(_) => Some(DestKind::Ram),
            Self::Ics { .. } => Some(DestKind::Ics),
            Self::Com => Some(DestKind::Com),
            Self::Rom(_) => Some(DestKind::Rom),
        }
    }

    /// Append the fixed 3-byte destination slot
    pub fn encode_into(&self, buf: &mut BytesMut) {
        match self {
            Self::None | Self::Com => buf.put_slice(&[0, 0, 0]),
            Self::Ram(addr) => {
                buf.put_u16_le(*addr);
                buf.put_u8(0);
            }
            Self::Ics { offset, id } => {
                buf.put_u8(*offset);
                buf.put_u8(*id);
                buf.put_u8(0);
            }
            Self::Rom(addr) => {
                buf.put_u8(*addr as u8);
                buf.put_u8((*addr >> 8) as u8);
                buf.put_u8((*addr >> 16) as u8);
            }
        }
    }
}
