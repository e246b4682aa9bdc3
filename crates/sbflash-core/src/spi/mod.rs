//! SPI types and command structures
//!
//! This module provides the transaction descriptor and the MX25xx opcodes.

mod address;
mod command;
pub mod opcodes;

pub use address::{encode_address, ADDRESS_BYTES, MAX_ADDRESSABLE};
pub use command::SpiCommand;
pub use opcodes::*;
