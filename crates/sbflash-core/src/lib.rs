//! sbflash-core - SB700/SB800 SPI controller and MX25xx flash driver
//!
//! This crate provides the two layers needed to program the boot flash of
//! an SB700/SB800 southbridge: a bus engine that frames single SPI
//! transactions through the controller's 8-byte FIFO, and a flash command
//! layer that turns read/write/erase/lock requests into Macronix MX25xx
//! command sequences. It is `no_std` compatible.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable heap allocation for `read_to_vec`
//!
//! # Example
//!
//! ```ignore
//! use sbflash_core::bus::Sb800Spi;
//! use sbflash_core::flash::{MacronixFlash, SpiFlash};
//!
//! let spi = Sb800Spi::new(regs);
//! let mut flash = MacronixFlash::probe_jedec(spi)?;
//! println!("Found: {} ({} bytes)", flash.name(), flash.size());
//! flash.unlock()?;
//! flash.erase(0, flash.sector_size())?;
//! flash.write(0, b"hello")?;
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod bus;
pub mod chip;
pub mod error;
pub mod flash;
pub mod programmer;
pub mod protocol;
pub mod spi;

pub use error::{Error, Result};
