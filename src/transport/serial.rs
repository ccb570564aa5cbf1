//! Serial link abstraction and the host tty implementation
//!
//! [`Session`](super::Session) talks to the board through the [`SerialLink`]
//! trait so the exchange logic can be driven by a scripted link in tests.
//! [`TtyLink`] is the real implementation over a host serial device, gated
//! behind the `tty` feature.

use std::io;
use std::time::Duration;

/// A byte pipe to the board with reconfigurable speed
///
/// Implementations must deliver exact-length reads and report an elapsed
/// reply window as [`io::ErrorKind::TimedOut`].
pub trait SerialLink {
    /// Switch the link to `baud` and settle it for the next exchange
    fn configure(&mut self, baud: u32) -> io::Result<()>;

    /// Drop any unread inbound bytes
    fn flush_input(&mut self) -> io::Result<()>;

    /// Write the whole frame
    fn write_all(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Fill `buf` exactly, waiting at most `timeout`
    fn read_exact(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<()>;

    /// Return the underlying device to its pre-session state
    fn restore(&mut self);
}

#[cfg(feature = "tty")]
pub use tty::TtyLink;

#[cfg(feature = "tty")]
mod tty {
    use std::io::{self, Read, Write};
    use std::time::Duration;

    use tracing::debug;

    use super::SerialLink;
    use crate::transport::{Result, PRIMARY_BAUD, REPLY_TIMEOUT};

    /// Serial link over a host tty device
    ///
    /// The board speaks 8 data bits, even parity, one stop bit, no flow
    /// control.
    pub struct TtyLink {
        port: Box<dyn serialport::SerialPort>,
    }

    impl TtyLink {
        /// Open the serial device at `path`
        ///
        /// The port starts at the primary baud rate; session setup reprobes
        /// from there.
        pub fn open(path: &str) -> Result<Self> {
            let port = serialport::new(path, PRIMARY_BAUD)
                .data_bits(serialport::DataBits::Eight)
                .parity(serialport::Parity::Even)
                .stop_bits(serialport::StopBits::One)
                .flow_control(serialport::FlowControl::None)
                .timeout(REPLY_TIMEOUT)
                .open()?;
            debug!(path, "serial port opened");
            Ok(Self { port })
        }
    }

    impl SerialLink for TtyLink {
        fn configure(&mut self, baud: u32) -> io::Result<()> {
            self.port.set_baud_rate(baud).map_err(io::Error::other)?;
            self.port
                .clear(serialport::ClearBuffer::All)
                .map_err(io::Error::other)
        }

        fn flush_input(&mut self) -> io::Result<()> {
            self.port
                .clear(serialport::ClearBuffer::Input)
                .map_err(io::Error::other)
        }

        fn write_all(&mut self, frame: &[u8]) -> io::Result<()> {
            self.port.write_all(frame)?;
            self.port.flush()
        }

        fn read_exact(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<()> {
            self.port.set_timeout(timeout).map_err(io::Error::other)?;
            self.port.read_exact(buf)
        }

        fn restore(&mut self) {
            // The port is owned, not a borrowed terminal; dropping it
            // releases the device. Leave it at whatever baud won.
        }
    }
}
