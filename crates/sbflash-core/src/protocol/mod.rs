//! Protocol implementations
//!
//! This module contains the SPI25 command sequences used by the flash
//! command layer.

mod spi25;

pub use spi25::*;
