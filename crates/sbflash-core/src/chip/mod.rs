//! Flash chip descriptors
//!
//! The set of supported parts is fixed at compile time; identification is a
//! pure lookup in a static table.

mod macronix;

pub use macronix::MACRONIX_CHIPS;

/// Geometry and name of one supported flash part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipParams {
    /// Device ID: memory type byte in the high half, capacity byte in the low half
    pub idcode: u16,
    /// Page program unit in bytes
    pub page_size: u16,
    /// Pages per erase sector
    pub pages_per_sector: u16,
    /// Sectors per 64 KiB block
    pub sectors_per_block: u16,
    /// Number of blocks
    pub nr_blocks: u16,
    /// Part name
    pub name: &'static str,
}

impl ChipParams {
    /// Size of the smallest erase unit in bytes
    pub const fn sector_size(&self) -> u32 {
        self.page_size as u32 * self.pages_per_sector as u32
    }

    /// Size of the block erase unit in bytes
    pub const fn block_size(&self) -> u32 {
        self.sector_size() * self.sectors_per_block as u32
    }

    /// Total chip size in bytes
    pub const fn total_size(&self) -> u32 {
        self.block_size() * self.nr_blocks as u32
    }
}

/// Form the 16-bit device ID from a JEDEC ID response
///
/// `idcode[0]` is the manufacturer; bytes 1 and 2 are memory type and
/// capacity. Returns `None` if fewer than three bytes are given.
pub fn idcode_to_id(idcode: &[u8]) -> Option<u16> {
    match idcode {
        [_, ty, cap, ..] => Some(((*ty as u16) << 8) | *cap as u16),
        _ => None,
    }
}

/// Look up a device ID in the Macronix table
pub fn find_chip(id: u16) -> Option<&'static ChipParams> {
    MACRONIX_CHIPS.iter().find(|chip| chip.idcode == id)
}

/// Look up a chip by its part name (case-insensitive)
pub fn find_by_name(name: &str) -> Option<&'static ChipParams> {
    MACRONIX_CHIPS
        .iter()
        .find(|chip| chip.name.eq_ignore_ascii_case(name))
}
