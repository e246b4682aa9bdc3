//! SPI25 protocol implementation
//!
//! This module implements the MX25xx command sequences that are shared by
//! every flash operation: identification, status register access, write
//! enable latch handling and ready polling.

use crate::error::{Error, Result};
use crate::programmer::SpiMaster;
use crate::spi::{opcodes, SpiCommand};
use bitflags::bitflags;

bitflags! {
    /// Status register bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        /// Write In Progress
        const WIP  = 1 << 0;
        /// Write Enable Latch
        const WEL  = 1 << 1;
        /// Block Protect bit 0
        const BP0  = 1 << 2;
        /// Block Protect bit 1
        const BP1  = 1 << 3;
        /// Block Protect bit 2
        const BP2  = 1 << 4;
        /// Block Protect bit 3
        const BP3  = 1 << 5;
        /// Status Register Write Disable
        const SRWD = 1 << 7;

        /// All block protection bits
        const BP_MASK = Self::BP0.bits() | Self::BP1.bits() | Self::BP2.bits() | Self::BP3.bits();
    }
}

impl Status {
    /// Block protection level (0-15) encoded in BP3..BP0
    pub fn protection_level(&self) -> u8 {
        (self.bits() & Self::BP_MASK.bits()) >> 2
    }
}

/// Read the JEDEC ID from a flash chip
///
/// Returns the three raw bytes: manufacturer, memory type, capacity.
pub fn read_jedec_id<M: SpiMaster + ?Sized>(master: &mut M) -> Result<[u8; 3]> {
    let mut buf = [0u8; 3];
    let mut cmd = SpiCommand::read_reg(opcodes::RDID, &mut buf);
    master.execute(&mut cmd)?;
    Ok(buf)
}

/// Read the status register
///
/// Bits this driver does not know about are kept so a read-modify-write
/// puts them back untouched.
pub fn read_status<M: SpiMaster + ?Sized>(master: &mut M) -> Result<Status> {
    let mut buf = [0u8; 1];
    let mut cmd = SpiCommand::read_reg(opcodes::RDSR, &mut buf);
    master.execute(&mut cmd)?;
    Ok(Status::from_bits_retain(buf[0]))
}

/// Send the Write Enable command
pub fn write_enable<M: SpiMaster + ?Sized>(master: &mut M) -> Result<()> {
    let mut cmd = SpiCommand::simple(opcodes::WREN);
    master.execute(&mut cmd).map_err(|e| {
        log::debug!("SF: Enabling Write failed: {}", e);
        Error::WriteEnableFailed
    })
}

/// Send the Write Disable command
pub fn write_disable<M: SpiMaster + ?Sized>(master: &mut M) -> Result<()> {
    let mut cmd = SpiCommand::simple(opcodes::WRDI);
    master.execute(&mut cmd).map_err(|e| {
        log::debug!("SF: Write disable failed: {}", e);
        Error::StatusWriteFailed
    })
}

/// Write the status register
///
/// The caller is responsible for the preceding Write Enable and for waiting
/// until the write has completed.
pub fn write_status<M: SpiMaster + ?Sized>(master: &mut M, value: Status) -> Result<()> {
    let data = [value.bits()];
    let mut cmd = SpiCommand::write_reg(opcodes::WRSR, &data);
    master.execute(&mut cmd).map_err(|e| {
        log::debug!("SF: Status register write failed: {}", e);
        Error::StatusWriteFailed
    })
}

/// Wait for the WIP (Write In Progress) bit to clear
///
/// Polls the status register until the Write In Progress bit clears.
///
/// # Arguments
/// * `poll_delay_us` - Delay in microseconds between status register polls
/// * `timeout_us` - Maximum time to wait before returning Error::Timeout
pub fn wait_ready<M: SpiMaster + ?Sized>(
    master: &mut M,
    poll_delay_us: u32,
    timeout_us: u32,
) -> Result<()> {
    let max_polls = if poll_delay_us > 0 {
        timeout_us / poll_delay_us
    } else {
        timeout_us // Fall back to polling once per microsecond
    };

    // Always look at least once, even with a zero timeout
    for _ in 0..max_polls.max(1) {
        if !is_busy(master)? {
            return Ok(());
        }
        if poll_delay_us > 0 {
            master.delay_us(poll_delay_us);
        }
    }

    log::error!("SF: Timeout waiting for flash to become ready");
    Err(Error::Timeout)
}

/// Read data with FAST_READ, chunked to the master's read limit
pub fn fast_read<M: SpiMaster + ?Sized>(master: &mut M, addr: u32, buf: &mut [u8]) -> Result<()> {
    let max_len = master.max_read_len();
    let mut offset = 0;

    while offset < buf.len() {
        let chunk_len = core::cmp::min(max_len, buf.len() - offset);
        let chunk = &mut buf[offset..offset + chunk_len];
        let mut cmd =
            SpiCommand::read_3b(opcodes::FAST_READ, addr + offset as u32, chunk).with_dummy_bytes(1);
        master.execute(&mut cmd).map_err(|e| {
            log::debug!("SF: Fast read at {:#08x} failed: {}", addr + offset as u32, e);
            Error::ReadFailed
        })?;
        offset += chunk_len;
    }

    Ok(())
}

/// Check if a write or erase operation is in progress
pub fn is_busy<M: SpiMaster + ?Sized>(master: &mut M) -> Result<bool> {
    Ok(read_status(master)?.contains(Status::WIP))
}
