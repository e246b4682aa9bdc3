//! Flash device trait

use crate::error::Result;

/// Generic operations on an identified flash chip
///
/// This is the operation table a probed chip exposes to its users. Callers
/// never see chip-specific command sequences.
///
/// # Example
///
/// ```ignore
/// use sbflash_core::flash::SpiFlash;
///
/// fn first_sector<F: SpiFlash>(flash: &mut F) -> Result<[u8; 16]> {
///     let mut buf = [0u8; 16];
///     flash.read(0, &mut buf)?;
///     Ok(buf)
/// }
/// ```
pub trait SpiFlash {
    /// Part name of the identified chip
    fn name(&self) -> &'static str;

    /// Get the total flash size in bytes
    fn size(&self) -> u32;

    /// Get the erase unit in bytes
    ///
    /// All erase operations must be aligned to this size and be a multiple
    /// of this size.
    fn sector_size(&self) -> u32;

    /// Read flash contents into the provided buffer
    ///
    /// # Errors
    /// * `AddressOutOfBounds` - If the read extends beyond flash size
    /// * `ReadFailed` - If a bus transaction fails
    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()>;

    /// Program data into flash
    ///
    /// The target region should be erased first (all bytes 0xFF). Page
    /// boundaries are handled internally.
    ///
    /// # Errors
    /// * `AddressOutOfBounds` - If the write extends beyond flash size
    /// * `WriteEnableFailed`, `ProgramFailed`, `Timeout` - From the first
    ///   failing chunk; earlier chunks stay programmed
    fn write(&mut self, offset: u32, buf: &[u8]) -> Result<()>;

    /// Erase a sector-aligned region of flash
    ///
    /// # Errors
    /// * `AddressOutOfBounds` - If the erase extends beyond flash size
    /// * `InvalidAlignment` - If offset or length is not sector aligned
    /// * `EraseFailed`, `Timeout` - From the first failing sector
    fn erase(&mut self, offset: u32, len: u32) -> Result<()>;

    /// Set all block protection bits
    fn lock(&mut self) -> Result<()>;

    /// Clear all block protection bits
    fn unlock(&mut self) -> Result<()>;

    /// Whether the whole chip is protected
    ///
    /// Reports `false` if the status register can not be read.
    fn is_locked(&mut self) -> bool;

    /// Check if a range is valid for this device
    fn is_valid_range(&self, offset: u32, len: usize) -> bool {
        // Use u64 arithmetic to avoid truncation when len > u32::MAX
        let end = offset as u64 + len as u64;
        end <= self.size() as u64
    }
}
