//! SB700/SB800 FIFO SPI controller driver
//!
//! # Architecture
//!
//! The controller has:
//! - An opcode register; the command byte never goes through the FIFO
//! - A packed byte-count register (receive count in the high nibble,
//!   transmit count in the low nibble)
//! - An 8-byte FIFO behind one data port with a single shared read/write
//!   pointer, which must be cleared before every FIFO phase
//! - An execute bit that the hardware clears once the transfer is done
//!
//! After execution the FIFO holds the transmitted bytes followed by the
//! received bytes, so the echo has to be skipped before reading.

use super::arbitration::{Arbitration, Companion, NoCompanion};
use super::regs::{self, cntrl_bits, status_bits};
use super::RegisterFile;
use crate::error::{Error, Result};
use crate::programmer::{BusIntent, SpiMaster};
use crate::spi::{SpiCommand, ADDRESS_BYTES};

/// FIFO size (in bytes), shared between transmitted and received bytes
pub const FIFO_DEPTH: usize = 8;

/// Largest command frame: opcode plus a full FIFO
const MAX_FRAME: usize = FIFO_DEPTH + 1;

/// Maximum payload of a page program
///
/// The largest power of two that fits the FIFO behind a 3-byte address, so
/// chunks of this size never straddle a flash page.
pub const PAGE_LIMIT: usize = 4;

/// Maximum payload of a fast read (3 address bytes plus one dummy byte)
pub const MAX_READ_PAYLOAD: usize = FIFO_DEPTH - ADDRESS_BYTES - 1;

/// Polling parameters for the controller handshakes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusTimeouts {
    /// Delay between two polls of a register, in microseconds
    pub poll_delay_us: u32,
    /// Number of polls before giving up
    pub max_polls: u32,
}

impl Default for BusTimeouts {
    fn default() -> Self {
        // 1 second at 1us per poll
        Self {
            poll_delay_us: 1,
            max_polls: 1_000_000,
        }
    }
}

/// Encode the transmit/receive byte-count register
///
/// Without a transmit phase the controller needs the receive count bumped by
/// one, otherwise the first received byte is lost.
///
/// Both counts are nibbles: `bytes_out` must be below 16 and `bytes_in`
/// below 15. `transfer` never passes more than `FIFO_DEPTH` in total.
pub const fn encode_byte_count(bytes_out: u8, bytes_in: u8) -> u8 {
    debug_assert!(bytes_out < 16 && bytes_in < 15);
    let read_off_by_one = if bytes_out == 0 { 1 } else { 0 };
    ((bytes_in + read_off_by_one) << 4) | bytes_out
}

/// SB700/SB800 SPI controller (the bus handle)
///
/// Owns the register window and the arbitration state. Deliberately not
/// `Clone`: there is exactly one handle per controller.
pub struct Sb800Spi<R, C = NoCompanion> {
    regs: R,
    arbitration: Arbitration<C>,
    timeouts: BusTimeouts,
}

impl<R: RegisterFile> Sb800Spi<R, NoCompanion> {
    /// Create a controller handle for a platform without a companion controller
    pub fn new(regs: R) -> Self {
        Self::with_companion(regs, NoCompanion)
    }
}

impl<R: RegisterFile, C: Companion> Sb800Spi<R, C> {
    /// Create a controller handle that arbitrates writes with `companion`
    pub fn with_companion(regs: R, companion: C) -> Self {
        Self {
            regs,
            arbitration: Arbitration::new(companion),
            timeouts: BusTimeouts::default(),
        }
    }

    /// Override the polling parameters
    pub fn with_timeouts(mut self, timeouts: BusTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Access the register file
    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Mutable access to the register file
    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Access the arbitration state
    pub fn arbitration(&self) -> &Arbitration<C> {
        &self.arbitration
    }

    /// Mutable access to the arbitration state
    pub fn arbitration_mut(&mut self) -> &mut Arbitration<C> {
        &mut self.arbitration
    }

    fn set_bits(&mut self, reg: usize, bits: u8) {
        let val = self.regs.read8(reg);
        self.regs.write8(reg, val | bits);
    }

    /// Rearm the shared FIFO pointer
    fn reset_fifo_pointer(&mut self) -> Result<()> {
        for _ in 0..self.timeouts.max_polls {
            self.set_bits(regs::SPI_CNTRL, cntrl_bits::FIFO_PTR_CLR);
            if self.regs.read8(regs::SPI_FIFO_PTR) & regs::FIFO_PTR_MASK == 0 {
                return Ok(());
            }
            self.regs.delay_us(self.timeouts.poll_delay_us);
        }

        log::error!("SPI FIFO pointer did not reset");
        Err(Error::Timeout)
    }

    /// Start the programmed command and wait for the controller to finish
    fn execute_command(&mut self) -> Result<()> {
        self.set_bits(regs::SPI_CNTRL, cntrl_bits::EXECUTE);

        for _ in 0..self.timeouts.max_polls {
            let busy = self.regs.read8(regs::SPI_CNTRL) & cntrl_bits::EXECUTE != 0
                && self.regs.read8(regs::SPI_STATUS) & status_bits::BUSY != 0;
            if !busy {
                return Ok(());
            }
            self.regs.delay_us(self.timeouts.poll_delay_us);
        }

        log::error!(
            "SPI transfer timed out (status: {:#04x})",
            self.regs.read8(regs::SPI_STATUS)
        );
        Err(Error::Timeout)
    }

    /// Run one command/address/data exchange
    ///
    /// `dout[0]` is the command byte; the rest of `dout` is shifted out
    /// through the FIFO. `din.len()` bytes are shifted in afterwards.
    pub fn transfer(&mut self, dout: &[u8], din: &mut [u8]) -> Result<()> {
        let (&cmd, payload) = dout.split_first().ok_or(Error::InvalidTransfer)?;
        let bytes_out = payload.len();
        let bytes_in = din.len();

        if bytes_out + bytes_in > FIFO_DEPTH {
            log::error!(
                "SPI controller can not transfer {} + {} bytes",
                bytes_out,
                bytes_in
            );
            return Err(Error::TransferTooLarge);
        }

        let count = encode_byte_count(bytes_out as u8, bytes_in as u8);
        log::trace!(
            "Executing opcode {:#04x} (out {}, in {}, count {:#04x})",
            cmd,
            bytes_out,
            bytes_in,
            count
        );

        self.regs.write8(regs::SPI_BYTE_COUNT, count);
        self.regs.write8(regs::SPI_OPCODE, cmd);

        self.reset_fifo_pointer()?;
        for &byte in payload {
            self.regs.write8(regs::SPI_FIFO, byte);
        }

        self.reset_fifo_pointer()?;
        self.execute_command()?;

        self.reset_fifo_pointer()?;
        // Skip the bytes we sent
        for _ in 0..bytes_out {
            self.regs.read8(regs::SPI_FIFO);
        }
        for byte in din.iter_mut() {
            *byte = self.regs.read8(regs::SPI_FIFO);
        }

        Ok(())
    }
}

impl<R: RegisterFile, C: Companion> SpiMaster for Sb800Spi<R, C> {
    fn max_read_len(&self) -> usize {
        MAX_READ_PAYLOAD
    }

    fn max_write_len(&self) -> usize {
        PAGE_LIMIT
    }

    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        let header_len = cmd.header_len();
        let total = header_len + cmd.write_data.len();
        if total > MAX_FRAME {
            return Err(Error::TransferTooLarge);
        }

        let mut frame: heapless::Vec<u8, MAX_FRAME> = heapless::Vec::new();
        frame
            .resize(total, 0)
            .map_err(|_| Error::TransferTooLarge)?;
        cmd.encode_header(&mut frame);
        frame[header_len..].copy_from_slice(cmd.write_data);

        self.transfer(&frame, cmd.read_buf)
    }

    fn claim_bus(&mut self, intent: BusIntent) -> Result<()> {
        self.arbitration.claim(intent)
    }

    fn release_bus(&mut self, intent: BusIntent) -> Result<()> {
        self.arbitration.release(intent)
    }

    fn delay_us(&mut self, us: u32) {
        self.regs.delay_us(us);
    }
}
