//! Shared sector erase loop

use super::FlashTimeouts;
use crate::error::{Error, Result};
use crate::programmer::{with_bus, BusIntent, SpiMaster};
use crate::protocol;
use crate::spi::SpiCommand;

/// Erase `[offset, offset + len)` one sector at a time
///
/// `offset` and `len` must both be multiples of `sector_size`, and the
/// range must fit in `flash_size`. Each sector gets its own Write Enable,
/// erase command and ready poll; the whole loop holds one write claim on
/// the bus.
///
/// `opcode` is the erase command for one `sector_size` unit (e.g. SE);
/// the ready poll uses `timeouts.sector_erase_us`.
pub fn erase_sectors<M: SpiMaster + ?Sized>(
    master: &mut M,
    opcode: u8,
    sector_size: u32,
    flash_size: u32,
    offset: u32,
    len: u32,
    timeouts: &FlashTimeouts,
) -> Result<()> {
    if sector_size == 0 || offset % sector_size != 0 || len % sector_size != 0 {
        log::error!(
            "SF: Erase offset/length not multiple of sector size ({:#x})",
            sector_size
        );
        return Err(Error::InvalidAlignment);
    }
    if offset as u64 + len as u64 > flash_size as u64 {
        return Err(Error::AddressOutOfBounds);
    }
    if len == 0 {
        return Ok(());
    }

    with_bus(master, BusIntent::Write, |master| {
        let end = offset + len;
        let mut addr = offset;
        while addr < end {
            protocol::write_enable(master)?;

            let mut cmd = SpiCommand::erase_3b(opcode, addr);
            master.execute(&mut cmd).map_err(|e| {
                log::debug!("SF: Erase at {:#08x} failed: {}", addr, e);
                Error::EraseFailed
            })?;

            protocol::wait_ready(master, timeouts.poll_delay_us, timeouts.sector_erase_us)?;
            log::debug!("SF: Successfully erased sector at {:#08x}", addr);
            addr += sector_size;
        }
        Ok(())
    })
}
