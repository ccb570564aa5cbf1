//! Program-counter control: JMP, CALL, and RET frames
//!
//! These instructions steer the board's interpreter rather than move data,
//! so they bypass [`CommandMessage`](crate::protocol::CommandMessage) and
//! encode as fixed frames. All three answer with a plain status frame.

use super::error::Result;
use super::serial::SerialLink;
use super::session::{checksum, Session};
use crate::protocol::{Conditions, Error, MAX_ROM_ADDRESS};

const JMP: u8 = 0x0B;
const CALL: u8 = 0x0C;
const RET: u8 = 0x0D;

impl<L: SerialLink> Session<L> {
    /// Jump to program ROM `address` when `conditions` hold
    pub fn jump(&mut self, address: u32, conditions: Conditions) -> Result<()> {
        self.branch(JMP, address, conditions)
    }

    /// Call the subroutine at program ROM `address` when `conditions` hold
    pub fn call(&mut self, address: u32, conditions: Conditions) -> Result<()> {
        self.branch(CALL, address, conditions)
    }

    /// Return from the current subroutine
    pub fn ret(&mut self) -> Result<()> {
        // Fixed frame; 0x10 is its checksum.
        self.send_frame_expect_ack(&[0x03, RET, 0x10], RET)
    }

    fn branch(&mut self, opcode: u8, address: u32, conditions: Conditions) -> Result<()> {
        if address > MAX_ROM_ADDRESS {
            return Err(Error::InvalidParameter {
                name: "ROM address",
                value: address,
                min: 0,
                max: MAX_ROM_ADDRESS,
            }
            .into());
        }
        let mut frame = [
            0x07,
            opcode,
            address as u8,
            (address >> 8) as u8,
            (address >> 16) as u8,
            conditions.as_u8(),
            0,
        ];
        frame[6] = checksum(&frame[..6]);
        self.send_frame_expect_ack(&frame, opcode)
    }
}
