//! The error sum type that every component in this crate returns.
//!
//! Replaces the overloaded integer status codes the original driver used
//! (see the design notes on error handling): one enum, converted to the
//! host's integer protocol only at the facade boundary.

use core::fmt;

/// The bits latched in `SR` that indicate a failed operation other than
/// `WRPERR`, preserved verbatim so the facade can report them to the user.
pub type ControllerErrorBits = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The underlying debug link read or write failed.
    Transport,
    /// Operation attempted on a running target.
    NotHalted,
    /// `BSY` failed to clear within the timeout.
    Timeout,
    /// Key sequence did not clear `LOCK`/`OPTLOCK`.
    UnlockFailed,
    /// `offset` was not an 8-byte multiple.
    Alignment,
    /// Device ID was not found in the part registry.
    UnsupportedPart,
    /// Scratch RAM allocation was refused by the host's working-area
    /// allocator.
    NoWorkingArea,
    /// `WRPERR` was latched during the operation.
    WriteProtected,
    /// Some other `SR` error bit was latched.
    ControllerError(ControllerErrorBits),
    /// Command arguments were malformed.
    SyntaxError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Transport => write!(f, "debug link transport error"),
            Error::NotHalted => write!(f, "target is not halted"),
            Error::Timeout => write!(f, "timed out waiting for BSY to clear"),
            Error::UnlockFailed => write!(f, "flash controller did not unlock"),
            Error::Alignment => write!(f, "offset is not a multiple of 8 bytes"),
            Error::UnsupportedPart => write!(f, "unsupported part"),
            Error::NoWorkingArea => write!(f, "no working area available on target"),
            Error::WriteProtected => write!(f, "target region is write-protected"),
            Error::ControllerError(bits) => {
                write!(f, "flash controller reported error bits 0x{bits:08x}")
            }
            Error::SyntaxError => write!(f, "malformed command arguments"),
        }
    }
}

impl std::error::Error for Error {}
