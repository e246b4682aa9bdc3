//! Register-level model of the SB700/SB800 SPI controller

use sbflash_core::bus::regs::{self, cntrl_bits, status_bits};
use sbflash_core::bus::{RegisterFile, FIFO_DEPTH};

use crate::chip::SimulatedChip;

/// Emulated controller register block with a chip on its bus
///
/// Mimics the FIFO quirks of the real part: one pointer shared by both
/// directions, the transmitted bytes echoed in front of the received ones,
/// and the receive count off by one when nothing is transmitted.
pub struct SimulatedController {
    chip: SimulatedChip,
    opcode: u8,
    byte_count: u8,
    cntrl: u8,
    fifo: [u8; FIFO_DEPTH],
    fifo_ptr: usize,
    busy_polls: u32,
    exec_latency: u32,
    stuck: bool,
    transactions: u32,
    delayed_us: u64,
}

impl SimulatedController {
    /// Create a controller with `chip` attached
    pub fn new(chip: SimulatedChip) -> Self {
        Self {
            chip,
            opcode: 0,
            byte_count: 0,
            cntrl: 0,
            fifo: [0; FIFO_DEPTH],
            fifo_ptr: 0,
            busy_polls: 0,
            exec_latency: 2,
            stuck: false,
            transactions: 0,
            delayed_us: 0,
        }
    }

    /// Number of polls the execute bit stays set after a command starts
    pub fn with_exec_latency(mut self, polls: u32) -> Self {
        self.exec_latency = polls;
        self
    }

    /// Never finish executing (hung controller)
    pub fn set_stuck(&mut self, stuck: bool) {
        self.stuck = stuck;
    }

    /// The attached chip
    pub fn chip(&self) -> &SimulatedChip {
        &self.chip
    }

    /// Mutable access to the attached chip
    pub fn chip_mut(&mut self) -> &mut SimulatedChip {
        &mut self.chip
    }

    /// Number of executed commands
    pub fn transactions(&self) -> u32 {
        self.transactions
    }

    /// Total time requested through `delay_us`
    pub fn delayed_us(&self) -> u64 {
        self.delayed_us
    }

    /// Shift the programmed command through the chip
    fn execute(&mut self) {
        let bytes_out = (self.byte_count & 0x0F) as usize;
        let mut bytes_in = (self.byte_count >> 4) as usize;
        if bytes_out == 0 {
            bytes_in = bytes_in.saturating_sub(1);
        }
        if bytes_out + bytes_in > FIFO_DEPTH {
            log::warn!(
                "sim: byte count {:#04x} overflows the FIFO",
                self.byte_count
            );
            return;
        }

        let mut out = [0u8; FIFO_DEPTH + 1];
        out[0] = self.opcode;
        out[1..=bytes_out].copy_from_slice(&self.fifo[..bytes_out]);

        let mut din = [0u8; FIFO_DEPTH];
        self.chip.transact(&out[..=bytes_out], &mut din[..bytes_in]);
        self.fifo[bytes_out..bytes_out + bytes_in].copy_from_slice(&din[..bytes_in]);

        self.transactions += 1;
        log::trace!(
            "sim: opcode {:#04x} out {} in {}",
            self.opcode,
            bytes_out,
            bytes_in
        );
    }

    fn is_busy(&self) -> bool {
        self.stuck || self.busy_polls > 0
    }
}

impl RegisterFile for SimulatedController {
    fn read8(&mut self, offset: usize) -> u8 {
        match offset {
            regs::SPI_OPCODE => self.opcode,
            regs::SPI_BYTE_COUNT => self.byte_count,
            regs::SPI_CNTRL => {
                let busy = self.is_busy();
                if !self.stuck {
                    self.busy_polls = self.busy_polls.saturating_sub(1);
                }
                if busy {
                    self.cntrl | cntrl_bits::EXECUTE
                } else {
                    self.cntrl & !cntrl_bits::EXECUTE
                }
            }
            regs::SPI_STATUS => {
                if self.is_busy() {
                    status_bits::BUSY
                } else {
                    0
                }
            }
            regs::SPI_FIFO => {
                let byte = self.fifo[self.fifo_ptr];
                self.fifo_ptr = (self.fifo_ptr + 1) % FIFO_DEPTH;
                byte
            }
            regs::SPI_FIFO_PTR => self.fifo_ptr as u8,
            _ => 0,
        }
    }

    fn write8(&mut self, offset: usize, value: u8) {
        match offset {
            regs::SPI_OPCODE => self.opcode = value,
            regs::SPI_BYTE_COUNT => self.byte_count = value,
            regs::SPI_CNTRL => {
                if value & cntrl_bits::FIFO_PTR_CLR != 0 {
                    self.fifo_ptr = 0;
                }
                if value & cntrl_bits::EXECUTE != 0 && !self.is_busy() {
                    self.execute();
                    self.busy_polls = self.exec_latency;
                }
                // Both command bits are self-clearing
                self.cntrl = value & !(cntrl_bits::EXECUTE | cntrl_bits::FIFO_PTR_CLR);
            }
            regs::SPI_FIFO => {
                self.fifo[self.fifo_ptr] = value;
                self.fifo_ptr = (self.fifo_ptr + 1) % FIFO_DEPTH;
            }
            _ => {}
        }
    }

    fn delay_us(&mut self, us: u32) {
        self.delayed_us += us as u64;
    }
}
