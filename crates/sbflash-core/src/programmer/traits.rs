//! Programmer trait definitions

use crate::error::Result;
use crate::spi::SpiCommand;

/// What a caller intends to do while it holds the bus
///
/// Only program/erase/status-write sequences need exclusive ownership of the
/// flash bus; reads share it with the companion controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusIntent {
    /// Read-only access, no arbitration
    Read,
    /// Program, erase or status register write
    Write,
}

/// SPI Master trait
///
/// This trait is the seam between the flash command layer and a bus
/// controller. The flash layer builds `SpiCommand`s and never touches
/// controller registers itself.
pub trait SpiMaster {
    /// Get the maximum number of bytes that can be read in a single transaction
    ///
    /// This is the payload limit for an addressed read with one dummy byte.
    fn max_read_len(&self) -> usize;

    /// Get the maximum number of bytes that can be written in a single transaction
    ///
    /// This is the payload limit for an addressed program command. It is a
    /// power of two so that it evenly divides a flash page.
    fn max_write_len(&self) -> usize;

    /// Execute a single SPI command
    ///
    /// The command contains all the information needed for the transaction:
    /// - `opcode`: The SPI command opcode
    /// - `address`: Optional 3-byte address
    /// - `dummy_bytes`: Bytes clocked out after the address
    /// - `write_data`: Data to write after the header
    /// - `read_buf`: Buffer to read data into
    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()>;

    /// Take ownership of the bus for `intent`
    ///
    /// Every successful claim must be paired with exactly one
    /// `release_bus` with the same intent.
    fn claim_bus(&mut self, _intent: BusIntent) -> Result<()> {
        Ok(())
    }

    /// Give back ownership of the bus
    fn release_bus(&mut self, _intent: BusIntent) -> Result<()> {
        Ok(())
    }

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);
}

impl<M: SpiMaster + ?Sized> SpiMaster for &mut M {
    fn max_read_len(&self) -> usize {
        (**self).max_read_len()
    }

    fn max_write_len(&self) -> usize {
        (**self).max_write_len()
    }

    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        (**self).execute(cmd)
    }

    fn claim_bus(&mut self, intent: BusIntent) -> Result<()> {
        (**self).claim_bus(intent)
    }

    fn release_bus(&mut self, intent: BusIntent) -> Result<()> {
        (**self).release_bus(intent)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

// Blanket impl for boxed SPI masters to allow trait objects
#[cfg(feature = "alloc")]
impl SpiMaster for alloc::boxed::Box<dyn SpiMaster + Send> {
    fn max_read_len(&self) -> usize {
        (**self).max_read_len()
    }

    fn max_write_len(&self) -> usize {
        (**self).max_write_len()
    }

    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        (**self).execute(cmd)
    }

    fn claim_bus(&mut self, intent: BusIntent) -> Result<()> {
        (**self).claim_bus(intent)
    }

    fn release_bus(&mut self, intent: BusIntent) -> Result<()> {
        (**self).release_bus(intent)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

/// Run `f` with the bus claimed for `intent`
///
/// The bus is released on every exit path. An error from `f` takes
/// precedence over an error from the release.
pub fn with_bus<M, T, F>(master: &mut M, intent: BusIntent, f: F) -> Result<T>
where
    M: SpiMaster + ?Sized,
    F: FnOnce(&mut M) -> Result<T>,
{
    if let Err(e) = master.claim_bus(intent) {
        log::debug!("SF: Unable to claim SPI bus");
        return Err(e);
    }

    let result = f(master);
    let released = master.release_bus(intent);

    let value = result?;
    released?;
    Ok(value)
}
