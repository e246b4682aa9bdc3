//! sbflash-internal - SB700/SB800 southbridge SPI controller access
//!
//! This crate locates the southbridge's FIFO SPI controller through PCI
//! configuration space, maps its register window from /dev/mem and hands
//! it to the bus engine in `sbflash-core`.
//!
//! # Safety
//!
//! This crate accesses hardware directly and requires root privileges.
//! Incorrect use can brick your system.

pub mod error;
pub mod pci;
pub mod physmap;

use std::time::Duration;

use sbflash_core::bus::{regs, RegisterFile, Sb800Spi};

pub use error::{InternalError, Result};
use physmap::PhysMap;

/// Controller register window mapped from physical memory
pub struct PhysRegisters {
    map: PhysMap,
}

impl PhysRegisters {
    /// Map the controller registers at `spi_base`
    pub fn map(spi_base: u64) -> Result<Self> {
        let map = PhysMap::new(spi_base, regs::SPI_REG_SIZE)?;
        Ok(Self { map })
    }

    /// Physical address of the register window
    pub fn base(&self) -> u64 {
        self.map.phys_addr()
    }
}

impl RegisterFile for PhysRegisters {
    fn read8(&mut self, offset: usize) -> u8 {
        self.map.read8(offset)
    }

    fn write8(&mut self, offset: usize, value: u8) {
        self.map.write8(offset, value)
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(us as u64));
    }
}

/// Bus handle over the real controller
pub type InternalSpi = Sb800Spi<PhysRegisters>;

/// Open the SPI controller
///
/// Uses `spi_base` when given, otherwise reads it from the southbridge.
pub fn open(spi_base: Option<u64>) -> Result<InternalSpi> {
    let base = match spi_base {
        Some(base) => base,
        None => pci::find_spi_base()?,
    };
    let regs = PhysRegisters::map(base)?;
    log::info!("Using SPI controller at {:#x}", regs.base());

    Ok(Sb800Spi::new(regs))
}
