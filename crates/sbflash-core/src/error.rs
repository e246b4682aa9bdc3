//! Error types for sbflash-core
//!
//! This module provides a no_std compatible error type that is shared by the
//! bus layer and the flash command layer.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Bus errors
    /// The companion controller did not acknowledge a bus handover
    BusClaimFailed,
    /// Transfer does not fit the controller FIFO
    TransferTooLarge,
    /// Transfer has no command byte
    InvalidTransfer,
    /// Controller or chip did not become ready in time
    Timeout,

    // Chip errors
    /// Identification code is not in the chip table
    UnsupportedChip(u16),

    // Operation errors
    /// Write Enable command could not be issued
    WriteEnableFailed,
    /// Page Program transaction failed
    ProgramFailed,
    /// Status register write failed
    StatusWriteFailed,
    /// Erase transaction failed
    EraseFailed,
    /// Read transaction failed
    ReadFailed,
    /// Read-back did not match the expected data
    VerifyFailed,
    /// A buffer for the operation could not be allocated
    AllocationFailed,

    // Address/size errors
    /// Range extends beyond the end of the chip
    AddressOutOfBounds,
    /// Offset or length is not aligned to the erase unit
    InvalidAlignment,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusClaimFailed => write!(f, "unable to claim SPI bus"),
            Self::TransferTooLarge => write!(f, "SPI transfer exceeds controller FIFO"),
            Self::InvalidTransfer => write!(f, "SPI transfer has no command byte"),
            Self::Timeout => write!(f, "operation timed out"),
            Self::UnsupportedChip(id) => write!(f, "unsupported flash ID {:04x}", id),
            Self::WriteEnableFailed => write!(f, "enabling write failed"),
            Self::ProgramFailed => write!(f, "page program failed"),
            Self::StatusWriteFailed => write!(f, "status register write failed"),
            Self::EraseFailed => write!(f, "erase failed"),
            Self::ReadFailed => write!(f, "read failed"),
            Self::VerifyFailed => write!(f, "verify failed: data mismatch"),
            Self::AllocationFailed => write!(f, "failed to allocate memory"),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::InvalidAlignment => write!(f, "invalid alignment"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
