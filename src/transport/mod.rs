//! Serial transport: link abstraction, session exchange, control frames
//!
//! The board is a strict request/reply device. Every outbound frame is
//! answered by exactly one inbound frame, and the board needs a settle
//! delay after each exchange before it will accept the next one. The
//! timing constants here come from the board's documented behavior.

mod control;
mod error;
mod helpers;
mod serial;
mod session;

pub use error::{Result, TransportError};
pub use serial::SerialLink;
pub use session::{PingReply, Session};

#[cfg(feature = "tty")]
pub use serial::TtyLink;

use std::time::Duration;

/// Baud rate probed first when opening a session
pub const PRIMARY_BAUD: u32 = 115_200;

/// Baud rate probed if the primary gets no answer
pub const FALLBACK_BAUD: u32 = 1_250_000;

/// How long to wait for a reply frame
pub const REPLY_TIMEOUT: Duration = Duration::from_millis(500);

/// Settle delay after each write and after each reply
pub const COMMAND_DELAY: Duration = Duration::from_millis(50);

/// Delay before the second ping probe at each baud rate
pub const PROBE_RETRY_DELAY: Duration = Duration::from_millis(100);
