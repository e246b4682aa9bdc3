//! PCI configuration access
//!
//! This module reads PCI configuration space through the Linux sysfs
//! interface (/sys/bus/pci/devices/*/config).

use core::fmt;

use crate::error::{InternalError, Result};

/// Bus/device/function of a PCI function in domain 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PciAddress {
    /// PCI bus number
    pub bus: u8,
    /// PCI device (slot) number
    pub device: u8,
    /// PCI function number
    pub function: u8,
}

impl PciAddress {
    /// Create a PCI address
    pub const fn new(bus: u8, device: u8, function: u8) -> Self {
        Self {
            bus,
            device,
            function,
        }
    }

    /// sysfs path of the configuration space file
    pub fn config_path(&self) -> String {
        format!("/sys/bus/pci/devices/0000:{}/config", self)
    }
}

impl fmt::Display for PciAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}:{:02x}.{:x}", self.bus, self.device, self.function)
    }
}

/// LPC bridge function of the southbridge, which holds the SPI base
pub const SB800_LPC: PciAddress = PciAddress::new(0x00, 0x14, 0x3);

/// Configuration register holding the SPI controller base address
pub const SPI_BASE_REG: u8 = 0xA0;

/// Low bits of the SPI base register that are not address bits
const SPI_BASE_FLAGS: u32 = 0x1F;

/// Southbridges known to carry the FIFO SPI controller
const KNOWN_BRIDGES: &[(u16, u16, &str)] = &[
    (0x1002, 0x438d, "SB600"),
    (0x1002, 0x439d, "SB700/SB800"),
    (0x1022, 0x780e, "Hudson"),
];

/// Extract the register window address from the SPI base register
///
/// Returns `None` if the register is unprogrammed or the read floated.
pub fn spi_base_from_config(raw: u32) -> Option<u64> {
    let base = raw & !SPI_BASE_FLAGS;
    if base == 0 || raw == u32::MAX {
        None
    } else {
        Some(base as u64)
    }
}

/// Read `N` bytes of configuration space at `offset`
fn read_config<const N: usize>(dev: PciAddress, offset: u8) -> Result<[u8; N]> {
    use std::io::{Read, Seek, SeekFrom};

    let mut buf = [0u8; N];
    std::fs::File::open(dev.config_path())
        .and_then(|mut file| {
            file.seek(SeekFrom::Start(offset as u64))?;
            file.read_exact(&mut buf)
        })
        .map_err(|source| InternalError::PciConfigRead {
            device: dev,
            register: offset,
            source,
        })?;
    Ok(buf)
}

/// Read a word from PCI configuration space
pub fn read_config16(dev: PciAddress, offset: u8) -> Result<u16> {
    read_config::<2>(dev, offset).map(u16::from_le_bytes)
}

/// Read a dword from PCI configuration space
pub fn read_config32(dev: PciAddress, offset: u8) -> Result<u32> {
    read_config::<4>(dev, offset).map(u32::from_le_bytes)
}

/// Locate the SPI controller register window
pub fn find_spi_base() -> Result<u64> {
    let vendor = read_config16(SB800_LPC, 0x00)?;
    let device = read_config16(SB800_LPC, 0x02)?;
    if vendor == 0xFFFF {
        return Err(InternalError::NoController(SB800_LPC));
    }

    match KNOWN_BRIDGES
        .iter()
        .find(|(v, d, _)| *v == vendor && *d == device)
    {
        Some((_, _, name)) => log::info!("Found {} southbridge at {}", name, SB800_LPC),
        None => log::warn!(
            "Unknown southbridge {:04x}:{:04x} at {}, trying anyway",
            vendor,
            device,
            SB800_LPC
        ),
    }

    let raw = read_config32(SB800_LPC, SPI_BASE_REG)?;
    let base = spi_base_from_config(raw).ok_or(InternalError::InvalidSpiBase(raw))?;
    log::debug!("SPI base register {:#010x} -> {:#x}", raw, base);
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spi_base_masks_flag_bits() {
        assert_eq!(spi_base_from_config(0xFEC1_001F), Some(0xFEC1_0000));
        assert_eq!(spi_base_from_config(0xFEC1_0002), Some(0xFEC1_0000));
    }

    #[test]
    fn test_spi_base_unprogrammed() {
        assert_eq!(spi_base_from_config(0x0000_001F), None);
        assert_eq!(spi_base_from_config(0xFFFF_FFFF), None);
    }

    #[test]
    fn test_config_path() {
        assert_eq!(
            SB800_LPC.config_path(),
            "/sys/bus/pci/devices/0000:00:14.3/config"
        );
    }

    #[test]
    #[ignore] // Requires an SB700/SB800 board
    fn test_find_spi_base() {
        let base = find_spi_base().unwrap();
        assert_eq!(base & 0x1F, 0);
    }
}
