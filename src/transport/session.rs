//! Command exchange session over a serial link
//!
//! A [`Session`] owns a [`SerialLink`], finds the board's baud rate by
//! pinging, and then runs the strict request/reply cycle: one frame out,
//! one validated frame back, with the board's settle delays in between.

use std::io;
use std::thread;

use tracing::{debug, info, trace};

use super::error::{Result, TransportError};
use super::serial::SerialLink;
use super::{COMMAND_DELAY, FALLBACK_BAUD, PRIMARY_BAUD, PROBE_RETRY_DELAY, REPLY_TIMEOUT};
use crate::protocol::{CommandMessage, ACK, NACK};

/// Ping request frame: size 3, the 0xFE probe opcode, checksum
const PING_FRAME: [u8; 3] = [0x03, 0xFE, 0x01];

/// Opcode byte echoed in ping replies
const PING_OPCODE: u8 = 0xFE;

/// Outcome of a ping exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingReply {
    /// Board acknowledged
    Ack,
    /// Board answered but refused
    Nack,
}

/// An open exchange session with an RCB-4 board
///
/// Replies are validated before any payload reaches the caller: echoed
/// size, echoed opcode, status byte, and checksum all have to match.
#[derive(Debug)]
pub struct Session<L: SerialLink> {
    link: L,
    baud: u32,
    closed: bool,
}

impl<L: SerialLink> Session<L> {
    /// Probe for the board and open a session at whichever baud it answers
    ///
    /// Tries the primary rate first, then the fallback; each rate gets two
    /// pings, the second after a settle delay. A link that answers nothing
    /// at either rate yields [`TransportError::LinkUnavailable`]; hard I/O
    /// failures abort the probe immediately.
    pub fn open(link: L) -> Result<Self> {
        let mut session = Self {
            link,
            baud: 0,
            closed: false,
        };
        for baud in [PRIMARY_BAUD, FALLBACK_BAUD] {
            session.link.configure(baud).map_err(TransportError::Link)?;
            session.baud = baud;
            for retry in 0..2 {
                if retry > 0 {
                    thread::sleep(PROBE_RETRY_DELAY);
                }
                match session.ping() {
                    Ok(PingReply::Ack) => {
                        info!(baud, "board answered ping");
                        return Ok(session);
                    }
                    Ok(PingReply::Nack)
                    | Err(TransportError::Timeout(_) | TransportError::UnexpectedReply { .. }) => {
                        trace!(baud, retry, "ping unanswered");
                    }
                    Err(err) => {
                        session.link.restore();
                        session.closed = true;
                        return Err(err);
                    }
                }
            }
        }
        session.link.restore();
        session.closed = true;
        Err(TransportError::LinkUnavailable {
            primary: PRIMARY_BAUD,
            fallback: FALLBACK_BAUD,
        })
    }

    /// The baud rate the board answered at
    #[must_use]
    pub const fn baud(&self) -> u32 {
        self.baud
    }

    /// Send a ping and report how the board answered
    pub fn ping(&mut self) -> Result<PingReply> {
        let reply = self.exchange(&PING_FRAME, 4)?;
        if reply[0] != 4 || reply[1] != PING_OPCODE || reply[3] != checksum(&reply[..3]) {
            return Err(TransportError::UnexpectedReply {
                opcode: PING_OPCODE,
                received: reply,
            });
        }
        match reply[2] {
            ACK => Ok(PingReply::Ack),
            NACK => Ok(PingReply::Nack),
            _ => Err(TransportError::UnexpectedReply {
                opcode: PING_OPCODE,
                received: reply,
            }),
        }
    }

    /// Send a command and read its reply
    ///
    /// Commands with no COM destination answer with a 4-byte status frame;
    /// an ACK yields `Ok(0)` and a NACK is [`TransportError::Rejected`].
    /// Commands addressed to COM answer with a data frame whose payload is
    /// copied into `reply` (if given); the return value is the payload
    /// length either way.
    pub fn send(&mut self, command: &CommandMessage, reply: Option<&mut [u8]>) -> Result<usize> {
        let frame = command.encode()?;
        let opcode = command.opcode().as_u8();
        let payload_len = usize::from(command.expected_reply_size());
        trace!(frame = %command.debug_dump(), "sending command");

        if payload_len == 0 {
            let status = self.exchange(&frame, 4)?;
            check_ack(opcode, &status)?;
            return Ok(0);
        }

        let total = payload_len + 3;
        let received = self.exchange(&frame, total)?;
        if usize::from(received[0]) != total
            || received[1] != opcode
            || received[total - 1] != checksum(&received[..total - 1])
        {
            return Err(TransportError::UnexpectedReply {
                opcode,
                received,
            });
        }
        if let Some(buf) = reply {
            if buf.len() < payload_len {
                return Err(TransportError::BufferTooSmall {
                    required: payload_len,
                    available: buf.len(),
                });
            }
            buf[..payload_len].copy_from_slice(&received[2..2 + payload_len]);
        }
        Ok(payload_len)
    }

    /// Release the link; further use of the session is a logic error
    ///
    /// Safe to call more than once. Also runs on drop.
    pub fn close(&mut self) {
        if !self.closed {
            self.link.restore();
            self.closed = true;
            debug!("session closed");
        }
    }

    /// Send a raw frame that must be answered with a plain ACK
    pub(crate) fn send_frame_expect_ack(&mut self, frame: &[u8], opcode: u8) -> Result<()> {
        let status = self.exchange(frame, 4)?;
        check_ack(opcode, &status)
    }

    /// One write/read cycle with the board's settle delays on both sides
    fn exchange(&mut self, frame: &[u8], reply_len: usize) -> Result<Vec<u8>> {
        self.link.flush_input().map_err(TransportError::Link)?;
        self.link.write_all(frame).map_err(TransportError::Write)?;
        thread::sleep(COMMAND_DELAY);

        let mut reply = vec![0u8; reply_len];
        match self.link.read_exact(&mut reply, REPLY_TIMEOUT) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::TimedOut => {
                return Err(TransportError::Timeout(REPLY_TIMEOUT));
            }
            Err(err) => return Err(TransportError::Link(err)),
        }
        thread::sleep(COMMAND_DELAY);
        Ok(reply)
    }

}

impl<L: SerialLink> Drop for Session<L> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Validate a 4-byte status frame: size, opcode echo, status, checksum
fn check_ack(opcode: u8, status: &[u8]) -> Result<()> {
    if status[0] != 4 || status[1] != opcode || status[3] != checksum(&status[..3]) {
        return Err(TransportError::UnexpectedReply {
            opcode,
            received: status.to_vec(),
        });
    }
    match status[2] {
        ACK => Ok(()),
        NACK => Err(TransportError::Rejected { opcode }),
        _ => Err(TransportError::UnexpectedReply {
            opcode,
            received: status.to_vec(),
        }),
    }
}

/// Low byte of the sum of `bytes`
pub(crate) fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}
