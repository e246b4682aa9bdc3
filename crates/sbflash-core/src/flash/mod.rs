//! Flash command layer
//!
//! This module turns generic flash operations into MX25xx command
//! sequences on top of an [`SpiMaster`](crate::programmer::SpiMaster).

mod chunks;
mod device;
mod erase;
mod macronix;

pub use chunks::{PageChunk, PageChunks};
pub use device::SpiFlash;
pub use erase::erase_sectors;
pub use macronix::MacronixFlash;

/// Ready-poll budgets of the flash command layer
///
/// All values are in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashTimeouts {
    /// Delay between two status register reads
    pub poll_delay_us: u32,
    /// Page program
    pub program_us: u32,
    /// Sector erase
    pub sector_erase_us: u32,
    /// Status register write
    pub status_write_us: u32,
    /// Whole chip erase
    pub chip_erase_us: u32,
}

impl Default for FlashTimeouts {
    fn default() -> Self {
        Self {
            poll_delay_us: 10,
            program_us: 200_000,
            sector_erase_us: 1_000_000,
            status_write_us: 100_000,
            // MX25L12805D datasheet: up to 200s for a chip erase
            chip_erase_us: 200_000_000,
        }
    }
}

/// Block protection state decoded from BP3..BP0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
    /// No block protected
    Unprotected,
    /// Part of the array protected; the BP level (1-14)
    Partial(u8),
    /// All protection bits set
    Full,
}

impl Protection {
    /// Decode a BP level (0-15)
    pub fn from_level(level: u8) -> Self {
        match level & 0x0F {
            0 => Self::Unprotected,
            0x0F => Self::Full,
            n => Self::Partial(n),
        }
    }
}

impl core::fmt::Display for Protection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unprotected => write!(f, "unprotected"),
            Self::Partial(level) => write!(f, "partially protected (BP level {})", level),
            Self::Full => write!(f, "fully protected"),
        }
    }
}
