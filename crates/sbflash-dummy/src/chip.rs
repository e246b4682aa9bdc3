//! Wire-level model of a Macronix MX25xx chip

use alloc::vec;
use alloc::vec::Vec;

use sbflash_core::chip::ChipParams;
use sbflash_core::protocol::Status;
use sbflash_core::spi::{opcodes, MFR_MACRONIX};

/// Status bits software can change through WRSR
const WRITABLE_STATUS: u8 = Status::BP_MASK.bits() | Status::SRWD.bits() | 0x40;

/// Polls of RDSR each internal operation stays busy for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipLatency {
    /// Page program
    pub program: u32,
    /// Sector or block erase
    pub erase: u32,
    /// Chip erase
    pub chip_erase: u32,
    /// Status register write
    pub status_write: u32,
}

impl Default for ChipLatency {
    fn default() -> Self {
        Self {
            program: 1,
            erase: 3,
            chip_erase: 5,
            status_write: 1,
        }
    }
}

/// Emulated MX25xx flash chip
///
/// Commands arrive as the full byte sequence the controller shifted out
/// (opcode first). The chip answers with the bytes it shifts back.
pub struct SimulatedChip {
    idcode: [u8; 3],
    page_size: usize,
    sector_size: usize,
    block_size: usize,
    data: Vec<u8>,
    /// Non-volatile status bits (BP, SRWD, bit 6)
    status: u8,
    write_enabled: bool,
    busy_polls: u32,
    latency: ChipLatency,
    powered_down: bool,
    last_status_write: Option<u8>,
    rejected: u32,
}

impl SimulatedChip {
    /// Create a blank (all 0xFF) chip matching a chip table row
    pub fn new(params: &ChipParams) -> Self {
        Self {
            idcode: [
                MFR_MACRONIX,
                (params.idcode >> 8) as u8,
                params.idcode as u8,
            ],
            page_size: params.page_size as usize,
            sector_size: params.sector_size() as usize,
            block_size: params.block_size() as usize,
            data: vec![0xFF; params.total_size() as usize],
            status: 0,
            write_enabled: false,
            busy_polls: 0,
            latency: ChipLatency::default(),
            powered_down: false,
            last_status_write: None,
            rejected: 0,
        }
    }

    /// Replace the JEDEC ID the chip reports
    pub fn with_idcode(mut self, idcode: [u8; 3]) -> Self {
        self.idcode = idcode;
        self
    }

    /// Override the busy durations
    pub fn with_latency(mut self, latency: ChipLatency) -> Self {
        self.latency = latency;
        self
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Status register as RDSR would report it
    pub fn status(&self) -> u8 {
        let mut status = self.status;
        if self.write_enabled {
            status |= Status::WEL.bits();
        }
        if self.busy_polls > 0 {
            status |= Status::WIP.bits();
        }
        status
    }

    /// Force the non-volatile status bits
    pub fn set_status(&mut self, status: u8) {
        self.status = status & WRITABLE_STATUS;
    }

    /// Keep WIP set for the next `polls` status reads
    pub fn set_busy(&mut self, polls: u32) {
        self.busy_polls = polls;
    }

    /// Raw value of the last accepted WRSR
    pub fn last_status_write(&self) -> Option<u8> {
        self.last_status_write
    }

    /// Number of program/erase/status commands the chip refused
    pub fn rejected(&self) -> u32 {
        self.rejected
    }

    /// Whether the chip is in deep power-down
    pub fn is_powered_down(&self) -> bool {
        self.powered_down
    }

    fn protection_level(&self) -> u8 {
        (self.status & Status::BP_MASK.bits()) >> 2
    }

    /// Protected range for the current BP level: the top of the array
    fn protected_range(&self) -> core::ops::Range<usize> {
        let size = self.data.len();
        let protected = match self.protection_level() {
            0 => 0,
            level => {
                let shift = (level - 1) as u32;
                self.block_size
                    .checked_shl(shift)
                    .filter(|&n| n < size)
                    .unwrap_or(size)
            }
        };
        size - protected..size
    }

    fn is_protected(&self, start: usize, len: usize) -> bool {
        let range = self.protected_range();
        start < range.end && start + len > range.start
    }

    fn address(bytes: &[u8]) -> usize {
        ((bytes[0] as usize) << 16) | ((bytes[1] as usize) << 8) | bytes[2] as usize
    }

    /// Consume the write enable latch for a modifying command
    ///
    /// Returns `false` (and counts a rejection) if the command must be
    /// ignored.
    fn begin_modify(&mut self, start: usize, len: usize) -> bool {
        let allowed = self.write_enabled && !self.is_protected(start, len);
        if !allowed {
            log::debug!("sim: rejecting modify at {:#x}+{:#x}", start, len);
            self.rejected += 1;
        }
        self.write_enabled = false;
        allowed
    }

    /// Run one command
    ///
    /// `out[0]` is the opcode; `din` receives the bytes shifted in after
    /// the last transmitted byte.
    pub fn transact(&mut self, out: &[u8], din: &mut [u8]) {
        din.fill(0xFF);
        let Some((&opcode, args)) = out.split_first() else {
            return;
        };

        if self.powered_down {
            if opcode == opcodes::RES {
                self.powered_down = false;
                if let Some(sig) = din.first_mut() {
                    *sig = self.idcode[2].wrapping_sub(1);
                }
            }
            return;
        }

        match opcode {
            opcodes::RDID => {
                for (byte, id) in din.iter_mut().zip(self.idcode) {
                    *byte = id;
                }
            }
            opcodes::RDSR => {
                let status = self.status();
                din.fill(status);
                self.busy_polls = self.busy_polls.saturating_sub(1);
            }
            opcodes::WREN => self.write_enabled = true,
            opcodes::WRDI => self.write_enabled = false,
            opcodes::WRSR => {
                if !self.write_enabled || args.is_empty() {
                    self.rejected += 1;
                    return;
                }
                self.last_status_write = Some(args[0]);
                self.status = args[0] & WRITABLE_STATUS;
                self.write_enabled = false;
                self.busy_polls = self.latency.status_write;
            }
            opcodes::READ | opcodes::FAST_READ if args.len() >= 3 => {
                let addr = Self::address(args);
                for (i, byte) in din.iter_mut().enumerate() {
                    *byte = self.data[(addr + i) % self.data.len()];
                }
            }
            opcodes::PP if args.len() >= 3 => {
                let addr = Self::address(args) % self.data.len();
                let page = addr - addr % self.page_size;
                let payload = &args[3..];
                if !self.begin_modify(page, self.page_size) {
                    return;
                }
                // Programming can only clear bits and wraps within the page
                for (i, &byte) in payload.iter().enumerate() {
                    let at = page + (addr - page + i) % self.page_size;
                    self.data[at] &= byte;
                }
                self.busy_polls = self.latency.program;
            }
            opcodes::SE | opcodes::BE if args.len() >= 3 => {
                let unit = if opcode == opcodes::SE {
                    self.sector_size
                } else {
                    self.block_size
                };
                let addr = Self::address(args) % self.data.len();
                let start = addr - addr % unit;
                if !self.begin_modify(start, unit) {
                    return;
                }
                self.data[start..start + unit].fill(0xFF);
                self.busy_polls = self.latency.erase;
            }
            opcodes::CE => {
                if !self.begin_modify(0, self.data.len()) {
                    return;
                }
                self.data.fill(0xFF);
                self.busy_polls = self.latency.chip_erase;
            }
            opcodes::DP => self.powered_down = true,
            opcodes::RES => {
                if let Some(sig) = din.first_mut() {
                    *sig = self.idcode[2].wrapping_sub(1);
                }
            }
            _ => log::warn!("sim: unhandled opcode {:#04x}", opcode),
        }
    }
}
