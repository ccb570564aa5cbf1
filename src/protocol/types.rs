//! RCB-4 opcodes, operand kinds, and jump conditions

use std::fmt;

/// RCB-4 instruction opcodes
///
/// Each opcode fixes which operand setters on
/// [`CommandMessage`](super::CommandMessage) are legal. The control-flow
/// instructions (JMP 0x0B, CALL 0x0C, RET 0x0D) are not command messages;
/// the transport layer builds their fixed frames directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Copy source to destination
    Mov = 0x00,
    /// destination AND source
    And = 0x01,
    /// destination OR source
    Or = 0x02,
    /// destination XOR source
    Xor = 0x03,
    /// NOT destination
    Not = 0x04,
    /// destination shifted left or right
    Shift = 0x05,
    /// destination + source
    Add = 0x06,
    /// destination - source
    Sub = 0x07,
    /// destination * source
    Mul = 0x08,
    /// destination / source
    Div = 0x09,
    /// destination % source
    Mod = 0x0A,
    /// Raw ICS bus transfer staged through board RAM
    IcsWrite = 0x0E,
    /// Move one servo
    ServoSingle = 0x0F,
    /// Move several servos at one shared speed
    ServoConst = 0x10,
    /// Move several servos, each at its own speed
    ServoSeries = 0x11,
    /// Speed/stretch table. Accepted opcode with no encoder; every
    /// operation on it reports [`Error::Unimplemented`](super::Error).
    ServoSpeed = 0x12,
}

impl Opcode {
    /// Convert from the wire byte
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Mov),
            0x01 => Some(Self::And),
            0x02 => Some(Self::Or),
            0x03 => Some(Self::Xor),
            0x04 => Some(Self::Not),
            0x05 => Some(Self::Shift),
            0x06 => Some(Self::Add),
            0x07 => Some(Self::Sub),
            0x08 => Some(Self::Mul),
            0x09 => Some(Self::Div),
            0x0A => Some(Self::Mod),
            0x0E => Some(Self::IcsWrite),
            0x0F => Some(Self::ServoSingle),
            0x10 => Some(Self::ServoConst),
            0x11 => Some(Self::ServoSeries),
            0x12 => Some(Self::ServoSpeed),
            _ => None,
        }
    }

    /// Convert to the wire byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// AND, OR, XOR
    #[must_use]
    pub const fn is_logic(self) -> bool {
        matches!(self, Self::And | Self::Or | Self::Xor)
    }

    /// ADD through MOD
    #[must_use]
    pub const fn is_arithmetic(self) -> bool {
        matches!(
            self,
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Mod
        )
    }

    /// Opcodes whose payload is `{type_byte, destination, source}`
    #[must_use]
    pub const fn is_transfer(self) -> bool {
        matches!(self, Self::Mov) || self.is_logic() || self.is_arithmetic()
    }

    /// Opcodes that accept a destination operand
    #[must_use]
    pub const fn has_destination(self) -> bool {
        self.is_transfer() || matches!(self, Self::Not | Self::Shift)
    }

    /// Only MOV and the arithmetic family may address COM
    #[must_use]
    pub const fn allows_com_destination(self) -> bool {
        matches!(self, Self::Mov) || self.is_arithmetic()
    }

    /// Opcodes that accept the suppress-write flag
    #[must_use]
    pub const fn allows_suppress(self) -> bool {
        self.is_logic() || self.is_arithmetic() || matches!(self, Self::Not | Self::Shift)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mov => "MOV",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Not => "NOT",
            Self::Shift => "SHIFT",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
            Self::Mod => "MOD",
            Self::IcsWrite => "ICS_WRITE",
            Self::ServoSingle => "SERVO_SINGLE",
            Self::ServoConst => "SERVO_CONST",
            Self::ServoSeries => "SERVO_SERIES",
            Self::ServoSpeed => "SERVO_SPEED",
        };
        write!(f, "{name}")
    }
}

/// Source operand kind, encoded in bits 0-1 of the transfer type byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SourceKind {
    /// Board RAM address
    Ram = 0x00,
    /// ICS bus offset/id
    Ics = 0x01,
    /// Inline literal bytes
    Literal = 0x02,
    /// Board ROM address
    Rom = 0x03,
}

/// Destination operand kind, encoded in bits 4-5 of the transfer type byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DestKind {
    /// Board RAM address
    Ram = 0x00,
    /// ICS bus offset/id
    Ics = 0x10,
    /// The serial channel back to the host
    Com = 0x20,
    /// Board ROM address
    Rom = 0x30,
}

/// Mask of the source-kind bits in the type byte
pub(crate) const SRC_MASK: u8 = 0x03;

/// Mask of the destination-kind bits in the type byte
pub(crate) const DST_MASK: u8 = 0x30;

/// Suppress-write flag: skip the destination store, still update CPU flags
pub(crate) const SUPPRESS_FLAG: u8 = 0x80;

/// Condition mask for JMP and CALL instructions
///
/// Combines one carry-flag predicate and one zero-flag predicate; either or
/// both may be left at "ignore". Only the low 4 bits reach the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Conditions(u8);

impl Conditions {
    /// Unconditional (both flags ignored)
    pub const ALWAYS: Self = Self(0);

    const CARRY_TEST: u8 = 1 << 3;
    const CARRY_VALUE: u8 = 1 << 1;
    const ZERO_TEST: u8 = 1 << 2;
    const ZERO_VALUE: u8 = 1 << 0;

    /// Require the carry flag to be 1
    #[must_use]
    pub const fn carry_set(self) -> Self {
        Self(self.0 | Self::CARRY_TEST | Self::CARRY_VALUE)
    }

    /// Require the carry flag to be 0
    #[must_use]
    pub const fn carry_clear(self) -> Self {
        Self((self.0 | Self::CARRY_TEST) & !Self::CARRY_VALUE)
    }

    /// Require the zero flag to be 1
    #[must_use]
    pub const fn zero_set(self) -> Self {
        Self(self.0 | Self::ZERO_TEST | Self::ZERO_VALUE)
    }

    /// Require the zero flag to be 0
    #[must_use]
    pub const fn zero_clear(self) -> Self {
        Self((self.0 | Self::ZERO_TEST) & !Self::ZERO_VALUE)
    }

    /// The wire byte (low 4 bits)
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0 & 0x0F
    }
}

impl fmt::Display for Conditions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.0 & Self::CARRY_TEST != 0 {
            parts.push(if self.0 & Self::CARRY_VALUE != 0 {
                "C=1"
            } else {
                "C=0"
            });
        }
        if self.0 & Self::ZERO_TEST != 0 {
            parts.push(if self.0 & Self::ZERO_VALUE != 0 {
                "Z=1"
            } else {
                "Z=0"
            });
        }
        if parts.is_empty() {
            write!(f, "ALWAYS")
        } else {
            write!(f, "{}", parts.join(" & "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_roundtrip() {
        for byte in 0x00..=0x12u8 {
            if let Some(op) = Opcode::from_u8(byte) {
                assert_eq!(op.as_u8(), byte);
            }
        }
        // Control-flow bytes are not command opcodes.
        assert_eq!(Opcode::from_u8(0x0B), None);
        assert_eq!(Opcode::from_u8(0x0C), None);
        assert_eq!(Opcode::from_u8(0x0D), None);
    }

    #[test]
    fn opcode_families() {
        assert!(Opcode::Mov.is_transfer());
        assert!(Opcode::Xor.is_logic());
        assert!(Opcode::Mod.is_arithmetic());
        assert!(!Opcode::Not.is_transfer());
        assert!(Opcode::Not.has_destination());
        assert!(Opcode::Mov.allows_com_destination());
        assert!(!Opcode::And.allows_com_destination());
        assert!(!Opcode::Mov.allows_suppress());
        assert!(Opcode::Shift.allows_suppress());
    }

    #[test]
    fn condition_bits() {
        assert_eq!(Conditions::ALWAYS.as_u8(), 0x00);
        assert_eq!(Conditions::ALWAYS.carry_set().as_u8(), 0x0A);
        assert_eq!(Conditions::ALWAYS.carry_clear().as_u8(), 0x08);
        assert_eq!(Conditions::ALWAYS.zero_set().as_u8(), 0x05);
        assert_eq!(Conditions::ALWAYS.zero_clear().as_u8(), 0x04);
        assert_eq!(
            Conditions::ALWAYS.carry_set().zero_clear().as_u8(),
            0x0A | 0x04
        );
    }
}
