//! Command-construction error types

use thiserror::Error;

use super::Opcode;

/// Errors from building a command message
///
/// Every setter validates before it mutates: a message that produced an
/// error is byte-for-byte unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Setter not allowed for the message's current opcode
    #[error("{operation} is not valid for {opcode} commands")]
    InvalidOperation {
        /// The message's opcode
        opcode: Opcode,
        /// The rejected setter
        operation: &'static str,
    },

    /// Value outside the documented range
    #[error("{name} out of range: {value} (allowed {min}..={max})")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Rejected value
        value: u32,
        /// Lowest accepted value
        min: u32,
        /// Highest accepted value
        max: u32,
    },

    /// The opcode is accepted by the protocol but has no encoder
    #[error("{opcode} commands have no encoder")]
    Unimplemented {
        /// The unencodable opcode
        opcode: Opcode,
    },
}

/// Result type alias for command construction
pub type Result<T> = std::result::Result<T, Error>;
