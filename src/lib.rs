//! Host-side driver for the Kondo RCB-4 servo controller board
//!
//! The RCB-4 is driven over a serial line by small checksummed command
//! frames: data moves between board RAM, ROM, the ICS servo bus, and the
//! serial channel itself, plus dedicated multi-servo motion commands. This
//! crate splits the work in two layers:
//!
//! - [`protocol`] builds and validates command frames. Pure, no I/O.
//! - [`transport`] runs the request/reply exchange over a serial link,
//!   including baud-rate probing and the board's settle delays.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! # #[cfg(not(feature = "tty"))] fn main() {}
//! # #[cfg(feature = "tty")]
//! # fn main() -> Result<(), rcb4::TransportError> {
//! use rcb4::{CommandMessage, Opcode, Session, TtyLink};
//!
//! let link = TtyLink::open("/dev/ttyUSB0")?;
//! let mut session = Session::open(link)?;
//!
//! // Move servo 1 to its neutral position.
//! let mut command = CommandMessage::new(Opcode::ServoSingle);
//! command.set_servo(1, 127, 7500)?;
//! session.send(&command, None)?;
//!
//! // Read back two bytes of board RAM.
//! let mut command = CommandMessage::new(Opcode::Mov);
//! command.set_source_ram(0x0000, 2)?;
//! command.set_destination_com()?;
//! let mut reply = [0u8; 2];
//! session.send(&command, Some(&mut reply))?;
//! # Ok(())
//! # }
//! ```
//!
//! The example needs the `tty` feature for [`TtyLink`]; any
//! [`SerialLink`](transport::SerialLink) implementation works in its place.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod protocol;
pub mod transport;

pub use protocol::{CommandMessage, Conditions, Error, Opcode, ServoEntry, ServoSet};
pub use transport::{PingReply, Session, TransportError};

#[cfg(feature = "tty")]
pub use transport::TtyLink;
