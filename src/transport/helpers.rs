//! Convenience reads built from plain commands

use super::error::Result;
use super::serial::SerialLink;
use super::session::Session;
use crate::protocol::{CommandMessage, Error, Opcode, AD_BASE_ADDRESS, MAX_AD_ID};

impl<L: SerialLink> Session<L> {
    /// Read analog-digital converter channel `ad_id` (0-10)
    ///
    /// Channel 0 is the board's supply voltage monitor. Issues a 2-byte
    /// RAM-to-COM MOV from the converter block and decodes the
    /// little-endian sample.
    pub fn read_ad(&mut self, ad_id: u8) -> Result<u16> {
        if ad_id > MAX_AD_ID {
            return Err(Error::InvalidParameter {
                name: "AD channel",
                value: ad_id.into(),
                min: 0,
                max: MAX_AD_ID.into(),
            }
            .into());
        }
        let mut command = CommandMessage::new(Opcode::Mov);
        command.set_source_ram(AD_BASE_ADDRESS + 2 * u16::from(ad_id), 2)?;
        command.set_destination_com()?;

        let mut sample = [0u8; 2];
        self.send(&command, Some(&mut sample))?;
        Ok(u16::from_le_bytes(sample))
    }
}
