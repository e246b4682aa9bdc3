//! FIFO SPI controller bus layer
//!
//! This module drives the SB700/SB800 family SPI controller: a small
//! memory-mapped register block with an opcode register, a packed
//! transmit/receive byte-count register, control bits and an 8-byte FIFO
//! behind a single data port.
//!
//! The controller is accessed through the [`RegisterFile`] capability so the
//! engine runs unchanged against real MMIO or a simulation.

mod arbitration;
pub mod regs;
mod sb800;

pub use arbitration::{Arbitration, Companion, NoCompanion};
pub use sb800::{encode_byte_count, BusTimeouts, Sb800Spi, FIFO_DEPTH, MAX_READ_PAYLOAD, PAGE_LIMIT};

/// Byte-wide access to a controller register block
pub trait RegisterFile {
    /// Read the 8-bit register at `offset`
    fn read8(&mut self, offset: usize) -> u8;

    /// Write the 8-bit register at `offset`
    fn write8(&mut self, offset: usize, value: u8);

    /// Busy-wait for the specified number of microseconds
    fn delay_us(&mut self, us: u32) {
        for _ in 0..us {
            core::hint::spin_loop();
        }
    }
}

impl<R: RegisterFile + ?Sized> RegisterFile for &mut R {
    fn read8(&mut self, offset: usize) -> u8 {
        (**self).read8(offset)
    }

    fn write8(&mut self, offset: usize, value: u8) {
        (**self).write8(offset, value)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}
