//! Error types for the internal programmer

use thiserror::Error;

use crate::pci::PciAddress;

/// Errors while locating or mapping the SPI controller
#[derive(Debug, Error)]
pub enum InternalError {
    /// Failed to read PCI configuration space
    #[error("failed to read PCI config of {device} at {register:#04x}: {source}")]
    PciConfigRead {
        device: PciAddress,
        register: u8,
        #[source]
        source: std::io::Error,
    },

    /// No device answers at the SPI controller's PCI function
    #[error("no SPI controller at {0}")]
    NoController(PciAddress),

    /// The SPI base address register is not programmed
    #[error("SPI base address not set (register value {0:#010x})")]
    InvalidSpiBase(u32),

    /// Failed to map the register window
    #[error("failed to map memory at {address:#x} (size {size}): {source}")]
    MemoryMap {
        address: u64,
        size: usize,
        #[source]
        source: std::io::Error,
    },

    /// Operation not supported on this platform
    #[error("not supported: {0}")]
    NotSupported(&'static str),
}

/// Result type for internal programmer operations
pub type Result<T> = std::result::Result<T, InternalError>;
