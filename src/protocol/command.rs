//! RCB-4 command message builder
//!
//! One [`CommandMessage`] holds a single instruction for the board. The
//! payload shape is fixed by the opcode at creation; operand setters are
//! validated against the opcode and reject anything outside its legal set.
//!
//! A message may be sent before every required operand is set. Unset
//! operands encode as zeros and the board acts on whatever arrives; that is
//! the board's documented behavior, not an error this layer detects.

use bytes::{BufMut, BytesMut};

use super::operand::{Destination, Source};
use super::servo::{ServoEntry, ServoSet};
use super::types::{DST_MASK, SRC_MASK, SUPPRESS_FLAG};
use super::{
    Error, Opcode, Result, ICS_COUNT, MAX_FRAME_SIZE, MAX_ICS_WRITE_SIZE, MAX_LITERAL_LEN,
    MAX_RAM_ADDRESS, MAX_ROM_ADDRESS,
};

/// Per-opcode payload storage
#[derive(Debug, Clone, PartialEq, Eq)]
enum Payload {
    /// MOV, AND, OR, XOR, ADD, SUB, MUL, DIV, MOD
    Transfer {
        suppress: bool,
        dst: Destination,
        src: Source,
    },
    /// NOT: destination and an explicit size, no source
    Not {
        suppress: bool,
        dst: Destination,
        size: u8,
    },
    /// SHIFT: destination, signed shift byte, explicit size
    Shift {
        suppress: bool,
        dst: Destination,
        shifts: u8,
        size: u8,
    },
    /// ICS_WRITE: bus transfer staged through RAM, fixed 9 bytes
    IcsWrite {
        ics_id: u8,
        data_size: u8,
        src_addr: u16,
        dst_addr: u16,
    },
    /// SERVO_SINGLE: one embedded slot, fixed 7 bytes
    ServoSingle { ics_id: u8, speed: u8, position: u16 },
    /// SERVO_CONST: shared speed plus position list
    ServoConst { speed: u8, servos: ServoSet },
    /// SERVO_SERIES: per-servo speed and position list
    ServoSeries { servos: ServoSet },
    /// SERVO_SPEED: accepted, never encodable
    ServoSpeed,
}

/// A single RCB-4 instruction, buildable and re-sendable
///
/// Created for one opcode, mutated by operand setters, encoded to a
/// checksummed frame any number of times, and optionally [`reset`] to a new
/// opcode reusing the storage.
///
/// [`reset`]: CommandMessage::reset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMessage {
    opcode: Opcode,
    /// On-wire frame length including the size and checksum bytes.
    /// Zero for variable-shape opcodes until an operand pins it down.
    total_size: u8,
    payload: Payload,
}

impl CommandMessage {
    /// Create an empty message for `opcode`
    ///
    /// Fixed-shape opcodes get their frame size immediately (NOT/SHIFT 10,
    /// ICS_WRITE 9, SERVO_SINGLE 7); variable shapes start at size 0 until
    /// a source or servo list determines the length.
    #[must_use]
    pub fn new(opcode: Opcode) -> Self {
        let (total_size, payload) = match opcode {
            op if op.is_transfer() => (
                0,
                Payload::Transfer {
                    suppress: false,
                    dst: Destination::None,
                    src: Source::None,
                },
            ),
            Opcode::Not => (
                10,
                Payload::Not {
                    suppress: false,
                    dst: Destination::None,
                    size: 0,
                },
            ),
            Opcode::Shift => (
                10,
                Payload::Shift {
                    suppress: false,
                    dst: Destination::None,
                    shifts: 0,
                    size: 0,
                },
            ),
            Opcode::IcsWrite => (
                9,
                Payload::IcsWrite {
                    ics_id: 0,
                    data_size: 0,
                    src_addr: 0,
                    dst_addr: 0,
                },
            ),
            Opcode::ServoSingle => (
                7,
                Payload::ServoSingle {
                    ics_id: 0,
                    speed: 0,
                    position: 0,
                },
            ),
            Opcode::ServoConst => (
                0,
                Payload::ServoConst {
                    speed: 0,
                    servos: ServoSet::new(),
                },
            ),
            Opcode::ServoSeries => (
                0,
                Payload::ServoSeries {
                    servos: ServoSet::new(),
                },
            ),
            Opcode::ServoSpeed => (0, Payload::ServoSpeed),
            _ => unreachable!("transfer opcodes matched above"),
        };
        Self {
            opcode,
            total_size,
            payload,
        }
    }

    /// Zero the message and switch it to `opcode`, reusing the storage
    pub fn reset(&mut self, opcode: Opcode) {
        *self = Self::new(opcode);
    }

    /// The message's opcode
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Current on-wire frame length, checksum included (0 while unsized)
    #[must_use]
    pub const fn total_size(&self) -> u8 {
        self.total_size
    }

    /// The servo set, for SERVO_CONST and SERVO_SERIES messages
    #[must_use]
    pub fn servos(&self) -> Option<&ServoSet> {
        match &self.payload {
            Payload::ServoConst { servos, .. } | Payload::ServoSeries { servos } => Some(servos),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Source setters (MOV, logic, arithmetic; RAM also feeds ICS_WRITE)
    // ------------------------------------------------------------------

    /// Use `size` bytes at board RAM `addr` as the source
    ///
    /// For ICS_WRITE this sets the staging address instead: size is capped
    /// at 64 and the frame size is pinned to 9 rather than recomputed.
    pub fn set_source_ram(&mut self, addr: u16, size: u8) -> Result<()> {
        check_range("data size", size, 1, u32::from(MAX_FRAME_SIZE) - 10)?;
        check_range("RAM address", addr, 0, MAX_RAM_ADDRESS.into())?;
        match &mut self.payload {
            Payload::Transfer { src, .. } => {
                *src = Source::Ram { addr, size };
                self.total_size = 10;
                Ok(())
            }
            Payload::IcsWrite {
                data_size,
                src_addr,
                ..
            } => {
                check_range("ICS data size", size, 1, MAX_ICS_WRITE_SIZE.into())?;
                *data_size = size;
                *src_addr = addr;
                self.total_size = 9;
                Ok(())
            }
            _ => Err(self.invalid_operation("set_source_ram")),
        }
    }

    /// Use `size` bytes at `offset` within ICS device `ics` (1-36) as the source
    pub fn set_source_ics(&mut self, offset: u8, ics: u8, size: u8) -> Result<()> {
        check_range("data size", size, 1, MAX_FRAME_SIZE.into())?;
        check_range("ICS id", ics, 1, ICS_COUNT.into())?;
        match &mut self.payload {
            Payload::Transfer { src, .. } => {
                *src = Source::Ics {
                    offset,
                    id: ics - 1,
                    size,
                };
                self.total_size = 10;
                Ok(())
            }
            _ => Err(self.invalid_operation("set_source_ics")),
        }
    }

    /// Embed `literal` (1-121 bytes, little-endian for numbers) as the source
    pub fn set_source_literal(&mut self, literal: &[u8]) -> Result<()> {
        check_range("literal length", literal.len() as u32, 1, MAX_LITERAL_LEN as u32)?;
        match &mut self.payload {
            Payload::Transfer { src, .. } => {
                *src = Source::Literal(literal.to_vec());
                self.total_size = literal.len() as u8 + 7;
                Ok(())
            }
            _ => Err(self.invalid_operation("set_source_literal")),
        }
    }

    /// Use `size` bytes at board ROM `addr` as the source
    pub fn set_source_rom(&mut self, addr: u32, size: u8) -> Result<()> {
        check_range("data size", size, 1, MAX_FRAME_SIZE.into())?;
        check_range("ROM address", addr, 0, MAX_ROM_ADDRESS)?;
        match &mut self.payload {
            Payload::Transfer { src, .. } => {
                *src = Source::Rom { addr, size };
                self.total_size = 11;
                Ok(())
            }
            _ => Err(self.invalid_operation("set_source_rom")),
        }
    }

    // ------------------------------------------------------------------
    // Destination setters
    // ------------------------------------------------------------------

    /// Write the result to board RAM `addr`
    ///
    /// For ICS_WRITE this sets the destination staging address.
    pub fn set_destination_ram(&mut self, addr: u16) -> Result<()> {
        check_range("RAM address", addr, 0, MAX_RAM_ADDRESS.into())?;
        match &mut self.payload {
            Payload::Transfer { dst, .. }
            | Payload::Not { dst, .. }
            | Payload::Shift { dst, .. } => {
                *dst = Destination::Ram(addr);
                Ok(())
            }
            Payload::IcsWrite { dst_addr, .. } => {
                *dst_addr = addr;
                Ok(())
            }
            _ => Err(self.invalid_operation("set_destination_ram")),
        }
    }

    /// Write the result to `offset` within ICS device `ics` (1-36)
    pub fn set_destination_ics(&mut self, offset: u8, ics: u8) -> Result<()> {
        check_range("ICS id", ics, 1, ICS_COUNT.into())?;
        match &mut self.payload {
            Payload::Transfer { dst, .. }
            | Payload::Not { dst, .. }
            | Payload::Shift { dst, .. } => {
                *dst = Destination::Ics {
                    offset,
                    id: ics - 1,
                };
                Ok(())
            }
            _ => Err(self.invalid_operation("set_destination_ics")),
        }
    }

    /// Send the result back over the serial channel as the reply payload
    ///
    /// Legal for MOV and the arithmetic family only.
    pub fn set_destination_com(&mut self) -> Result<()> {
        if !self.opcode.allows_com_destination() {
            return Err(self.invalid_operation("set_destination_com"));
        }
        match &mut self.payload {
            Payload::Transfer { dst, .. } => {
                *dst = Destination::Com;
                Ok(())
            }
            _ => Err(self.invalid_operation("set_destination_com")),
        }
    }

    /// Write the result to board ROM `addr`
    pub fn set_destination_rom(&mut self, addr: u32) -> Result<()> {
        check_range("ROM address", addr, 0, MAX_ROM_ADDRESS)?;
        match &mut self.payload {
            Payload::Transfer { dst, .. }
            | Payload::Not { dst, .. }
            | Payload::Shift { dst, .. } => {
                *dst = Destination::Rom(addr);
                Ok(())
            }
            _ => Err(self.invalid_operation("set_destination_rom")),
        }
    }

    /// Skip the destination store; condition flags still update
    ///
    /// Legal for logic, NOT, SHIFT, and arithmetic; never MOV. A
    /// destination operand is still required because it remains an input
    /// of the operation.
    pub fn set_do_not_save(&mut self) -> Result<()> {
        if !self.opcode.allows_suppress() {
            return Err(self.invalid_operation("set_do_not_save"));
        }
        match &mut self.payload {
            Payload::Transfer { suppress, .. }
            | Payload::Not { suppress, .. }
            | Payload::Shift { suppress, .. } => {
                *suppress = true;
                Ok(())
            }
            _ => Err(self.invalid_operation("set_do_not_save")),
        }
    }

    // ------------------------------------------------------------------
    // Data setters
    // ------------------------------------------------------------------

    /// Set the operand size in bytes
    ///
    /// For MOV/logic this rewrites the currently selected source's size
    /// sub-field (a no-op when no sized source is set); NOT and SHIFT have
    /// a dedicated size field; arithmetic accepts only 1 or 2; ICS_WRITE
    /// caps at 64.
    pub fn set_data_size(&mut self, size: u8) -> Result<()> {
        check_range("data size", size, 1, MAX_FRAME_SIZE.into())?;
        match &mut self.payload {
            Payload::Transfer { src, .. } => {
                if self.opcode.is_arithmetic() && size > 2 {
                    return Err(Error::InvalidParameter {
                        name: "data size",
                        value: size.into(),
                        min: 1,
                        max: 2,
                    });
                }
                src.set_declared_size(size);
                Ok(())
            }
            Payload::Not { size: field, .. } | Payload::Shift { size: field, .. } => {
                *field = size;
                Ok(())
            }
            Payload::IcsWrite { data_size, .. } => {
                check_range("ICS data size", size, 1, MAX_ICS_WRITE_SIZE.into())?;
                *data_size = size;
                Ok(())
            }
            _ => Err(self.invalid_operation("set_data_size")),
        }
    }

    /// Shift left by `shifts` bits (SHIFT only, 0-127)
    pub fn set_shift_left(&mut self, shifts: u8) -> Result<()> {
        check_range("shift count", shifts, 0, 127)?;
        self.store_shifts(shifts)
    }

    /// Shift right by `shifts` bits (SHIFT only, 0-127)
    ///
    /// Stored as the two's-complement residue `256 - shifts` so the board
    /// reads the single signed shift byte as a right shift; 0 stays 0.
    pub fn set_shift_right(&mut self, shifts: u8) -> Result<()> {
        check_range("shift count", shifts, 0, 127)?;
        self.store_shifts(0u8.wrapping_sub(shifts))
    }

    fn store_shifts(&mut self, raw: u8) -> Result<()> {
        match &mut self.payload {
            Payload::Shift { shifts, .. } => {
                *shifts = raw;
                Ok(())
            }
            _ => Err(self.invalid_operation("set_shift")),
        }
    }

    /// Set the ICS device id for an ICS_WRITE transfer (wire id, 0-35)
    pub fn set_ics_id(&mut self, ics: u8) -> Result<()> {
        check_range("ICS id", ics, 0, u32::from(ICS_COUNT) - 1)?;
        match &mut self.payload {
            Payload::IcsWrite { ics_id, .. } => {
                *ics_id = ics;
                Ok(())
            }
            _ => Err(self.invalid_operation("set_ics_id")),
        }
    }

    /// Set the shared speed of a SERVO_CONST message, 1 (slowest) to 255
    ///
    /// The board's convention is inverted (1 fastest); the value is stored
    /// as `256 - speed`.
    pub fn set_speed(&mut self, speed: u8) -> Result<()> {
        check_range("speed", speed, 1, 255)?;
        match &mut self.payload {
            Payload::ServoConst { speed: field, .. } => {
                *field = 0u8.wrapping_sub(speed);
                Ok(())
            }
            _ => Err(self.invalid_operation("set_speed")),
        }
    }

    /// Set speed and position for servo `ics` (1-36)
    ///
    /// SERVO_SINGLE overwrites its one slot. SERVO_CONST and SERVO_SERIES
    /// insert into the ordered set, overwriting a repeated id in place; the
    /// frame size follows the servo count (`9 + 2n` CONST, `8 + 3n`
    /// SERIES). `speed` is ignored by SERVO_CONST, which uses
    /// [`set_speed`](Self::set_speed) instead.
    pub fn set_servo(&mut self, ics: u8, speed: u8, position: u16) -> Result<()> {
        if speed == 0 && self.opcode != Opcode::ServoConst {
            return Err(Error::InvalidParameter {
                name: "speed",
                value: 0,
                min: 1,
                max: 255,
            });
        }
        check_range("ICS id", ics, 1, ICS_COUNT.into())?;
        let inverted = 0u8.wrapping_sub(speed);
        match &mut self.payload {
            Payload::ServoSingle {
                ics_id,
                speed: field,
                position: pos,
            } => {
                *ics_id = ics - 1;
                *field = inverted;
                *pos = position;
                Ok(())
            }
            Payload::ServoConst { servos, .. } => {
                servos.insert(
                    ics,
                    ServoEntry {
                        speed: inverted,
                        position,
                    },
                );
                self.total_size = 9 + 2 * servos.len() as u8;
                Ok(())
            }
            Payload::ServoSeries { servos } => {
                servos.insert(
                    ics,
                    ServoEntry {
                        speed: inverted,
                        position,
                    },
                );
                self.total_size = 8 + 3 * servos.len() as u8;
                Ok(())
            }
            _ => Err(self.invalid_operation("set_servo")),
        }
    }

    // ------------------------------------------------------------------
    // Encoding
    // ------------------------------------------------------------------

    /// Frame bytes up to but not including the checksum
    fn encode_body(&self) -> Result<BytesMut> {
        let mut buf = BytesMut::with_capacity(usize::from(self.total_size).max(8));
        buf.put_u8(self.total_size);
        buf.put_u8(self.opcode.as_u8());
        match &self.payload {
            Payload::Transfer { suppress, dst, src } => {
                buf.put_u8(type_byte(src, dst, *suppress));
                dst.encode_into(&mut buf);
                src.encode_into(&mut buf);
            }
            Payload::Not {
                suppress,
                dst,
                size,
            } => {
                buf.put_u8(type_byte(&Source::None, dst, *suppress));
                dst.encode_into(&mut buf);
                buf.put_slice(&[0, 0]);
                buf.put_u8(*size);
            }
            Payload::Shift {
                suppress,
                dst,
                shifts,
                size,
            } => {
                buf.put_u8(type_byte(&Source::None, dst, *suppress));
                dst.encode_into(&mut buf);
                buf.put_u8(0);
                buf.put_u8(*shifts);
                buf.put_u8(*size);
            }
            Payload::IcsWrite {
                ics_id,
                data_size,
                src_addr,
                dst_addr,
            } => {
                buf.put_u8(*ics_id);
                buf.put_u8(*data_size);
                buf.put_u16_le(*src_addr);
                buf.put_u16_le(*dst_addr);
            }
            Payload::ServoSingle {
                ics_id,
                speed,
                position,
            } => {
                buf.put_u8(*ics_id);
                buf.put_u8(*speed);
                buf.put_u16_le(*position);
            }
            Payload::ServoConst { speed, servos } => {
                buf.put_slice(servos.bitset());
                buf.put_u8(*speed);
                for entry in servos.entries() {
                    buf.put_u16_le(entry.position);
                }
            }
            Payload::ServoSeries { servos } => {
                buf.put_slice(servos.bitset());
                for entry in servos.entries() {
                    buf.put_u8(entry.speed);
                    buf.put_u16_le(entry.position);
                }
            }
            Payload::ServoSpeed => {
                return Err(Error::Unimplemented {
                    opcode: self.opcode,
                })
            }
        }
        Ok(buf)
    }

    /// Unsigned 8-bit wraparound sum of every frame byte before the checksum
    pub fn checksum(&self) -> Result<u8> {
        Ok(sum_bytes(&self.encode_body()?))
    }

    /// The complete on-wire frame, checksum appended
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut body = self.encode_body()?;
        let checksum = sum_bytes(&body);
        body.put_u8(checksum);
        Ok(body.to_vec())
    }

    /// How many payload bytes the board will send back
    ///
    /// Zero unless the destination is COM; then the active source's
    /// declared size, or the literal's length for a literal source.
    #[must_use]
    pub fn expected_reply_size(&self) -> u8 {
        match &self.payload {
            Payload::Transfer {
                dst: Destination::Com,
                src,
                ..
            } => match src {
                Source::Ram { size, .. } | Source::Ics { size, .. } | Source::Rom { size, .. } => {
                    *size
                }
                Source::Literal(_) => self.total_size - 7,
                Source::None => 0,
            },
            _ => 0,
        }
    }

    /// Hex rendering of the frame bytes plus checksum, for diagnostics
    #[must_use]
    pub fn debug_dump(&self) -> String {
        match self.encode_body() {
            Ok(body) => {
                let mut out = String::new();
                for byte in &body {
                    out.push_str(&format!("0x{byte:02X} "));
                }
                let checksum = sum_bytes(&body);
                out.push_str(&format!("Checksum = {checksum} (0x{checksum:02X})"));
                out
            }
            Err(err) => format!("<{err}>"),
        }
    }

    fn invalid_operation(&self, operation: &'static str) -> Error {
        if self.opcode == Opcode::ServoSpeed {
            Error::Unimplemented {
                opcode: self.opcode,
            }
        } else {
            Error::InvalidOperation {
                opcode: self.opcode,
                operation,
            }
        }
    }
}

/// Transfer/NOT/SHIFT type byte: source kind, destination kind, suppress flag
fn type_byte(src: &Source, dst: &Destination, suppress: bool) -> u8 {
    let mut byte = 0u8;
    if let Some(kind) = src.kind() {
        byte |= kind as u8 & SRC_MASK;
    }
    if let Some(kind) = dst.kind() {
        byte |= kind as u8 & DST_MASK;
    }
    if suppress {
        byte |= SUPPRESS_FLAG;
    }
    byte
}

fn sum_bytes(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}

fn check_range<T: Into<u32>>(name: &'static str, value: T, min: u32, max: u32) -> Result<()> {
    let value = value.into();
    if value < min || value > max {
        return Err(Error::InvalidParameter {
            name,
            value,
            min,
            max,
        });
    }
    Ok(())
}
