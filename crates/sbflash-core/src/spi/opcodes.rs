//! MX25xx SPI flash opcodes
//!
//! The command set shared by the Macronix MX25L parts in the chip table.
//! All addressed commands take a 3-byte, most-significant-first address.

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required before any program/erase/status write
pub const WREN: u8 = 0x06;
/// Write Disable - clears WEL bit in status register
pub const WRDI: u8 = 0x04;

// ============================================================================
// Status register operations
// ============================================================================

/// Read Status Register
pub const RDSR: u8 = 0x05;
/// Write Status Register
pub const WRSR: u8 = 0x01;

// ============================================================================
// Identification
// ============================================================================

/// Read JEDEC ID (manufacturer + device ID)
pub const RDID: u8 = 0x9F;

// ============================================================================
// Read commands
// ============================================================================

/// Read Data Bytes
pub const READ: u8 = 0x03;
/// Read Data Bytes at Higher Speed (one dummy byte after the address)
pub const FAST_READ: u8 = 0x0B;

// ============================================================================
// Program / erase
// ============================================================================

/// Page Program
pub const PP: u8 = 0x02;
/// Sector Erase (4 KiB)
pub const SE: u8 = 0x20;
/// Block Erase (64 KiB)
pub const BE: u8 = 0xD8;
/// Chip Erase
pub const CE: u8 = 0xC7;

// ============================================================================
// Power management
// ============================================================================

/// Deep Power-down
pub const DP: u8 = 0xB9;
/// Release from Deep Power-down, and Read Electronic Signature
pub const RES: u8 = 0xAB;

// ============================================================================
// Manufacturer IDs
// ============================================================================

/// JEDEC manufacturer ID of Macronix
pub const MFR_MACRONIX: u8 = 0xC2;
