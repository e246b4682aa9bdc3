//! Macronix MX25xx chip driver

use super::chunks::PageChunks;
use super::device::SpiFlash;
use super::erase::erase_sectors;
use super::{FlashTimeouts, Protection};
use crate::chip::{find_chip, idcode_to_id, ChipParams};
use crate::error::{Error, Result};
use crate::programmer::{with_bus, BusIntent, SpiMaster};
use crate::protocol::{self, Status};
use crate::spi::{opcodes, SpiCommand};

/// Size of the stack buffer used by `verify`
const VERIFY_CHUNK: usize = 64;

/// An identified Macronix flash chip behind an SPI master
///
/// Only constructed by a successful probe, so every instance refers to a
/// row of the chip table.
pub struct MacronixFlash<M> {
    master: M,
    chip: &'static ChipParams,
    timeouts: FlashTimeouts,
}

impl<M: SpiMaster> MacronixFlash<M> {
    /// Identify the chip from an already read JEDEC ID
    ///
    /// Fails with `UnsupportedChip` if the ID is not in the table, in which
    /// case no instance exists.
    pub fn probe(master: M, idcode: &[u8]) -> Result<Self> {
        let id = idcode_to_id(idcode).ok_or(Error::UnsupportedChip(0))?;
        let chip = match find_chip(id) {
            Some(chip) => chip,
            None => {
                log::warn!("SF: Unsupported Macronix ID {:04x}", id);
                return Err(Error::UnsupportedChip(id));
            }
        };

        log::info!(
            "SF: Detected {} with page size {}, total {} bytes",
            chip.name,
            chip.page_size,
            chip.total_size()
        );

        Ok(Self {
            master,
            chip,
            timeouts: FlashTimeouts::default(),
        })
    }

    /// Read the JEDEC ID and identify the chip
    ///
    /// The manufacturer byte must be Macronix.
    pub fn probe_jedec(mut master: M) -> Result<Self> {
        let idcode = protocol::read_jedec_id(&mut master)?;
        log::debug!(
            "SF: Got idcode {:02x} {:02x} {:02x}",
            idcode[0],
            idcode[1],
            idcode[2]
        );

        if idcode[0] != opcodes::MFR_MACRONIX {
            log::warn!("SF: Unsupported manufacturer {:02x}", idcode[0]);
            return Err(Error::UnsupportedChip(
                idcode_to_id(&idcode).unwrap_or_default(),
            ));
        }

        Self::probe(master, &idcode)
    }

    /// Override the ready-poll budgets
    pub fn with_timeouts(mut self, timeouts: FlashTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// The matched chip table row
    pub fn chip(&self) -> &'static ChipParams {
        self.chip
    }

    /// Access the SPI master
    pub fn master(&self) -> &M {
        &self.master
    }

    /// Mutable access to the SPI master
    pub fn master_mut(&mut self) -> &mut M {
        &mut self.master
    }

    /// Give back the SPI master
    pub fn into_inner(self) -> M {
        self.master
    }

    fn check_range(&self, offset: u32, len: usize) -> Result<()> {
        if self.is_valid_range(offset, len) {
            Ok(())
        } else {
            log::error!(
                "SF: Range {:#08x}+{:#x} exceeds {} bytes",
                offset,
                len,
                self.chip.total_size()
            );
            Err(Error::AddressOutOfBounds)
        }
    }

    /// Read-modify-write the block protection bits
    fn set_lock_flags(&mut self, lock: bool) -> Result<()> {
        let timeouts = self.timeouts;

        with_bus(&mut self.master, BusIntent::Write, |master| {
            let status = protocol::read_status(master)?;
            let new_status = if lock {
                status | Status::BP_MASK
            } else {
                status.difference(Status::BP_MASK)
            };
            log::debug!(
                "SF: Status register {:#04x} -> {:#04x}",
                status.bits(),
                new_status.bits()
            );

            protocol::write_enable(master)?;
            protocol::write_status(master, new_status)?;
            protocol::wait_ready(master, timeouts.poll_delay_us, timeouts.status_write_us)?;

            protocol::write_disable(master)?;
            protocol::wait_ready(master, timeouts.poll_delay_us, timeouts.status_write_us)
        })
    }

    /// Decode the block protection field
    pub fn protection(&mut self) -> Result<Protection> {
        let status = protocol::read_status(&mut self.master)?;
        Ok(Protection::from_level(status.protection_level()))
    }

    /// Current status register value
    pub fn status(&mut self) -> Result<Status> {
        protocol::read_status(&mut self.master)
    }

    /// Erase the whole chip
    pub fn chip_erase(&mut self) -> Result<()> {
        let timeouts = self.timeouts;

        with_bus(&mut self.master, BusIntent::Write, |master| {
            protocol::write_enable(master)?;

            let mut cmd = SpiCommand::simple(opcodes::CE);
            master.execute(&mut cmd).map_err(|e| {
                log::debug!("SF: Chip erase failed: {}", e);
                Error::EraseFailed
            })?;

            protocol::wait_ready(master, timeouts.poll_delay_us, timeouts.chip_erase_us)
        })
    }

    /// Put the chip into deep power-down
    ///
    /// The chip ignores everything except `release_power_down` afterwards.
    pub fn power_down(&mut self) -> Result<()> {
        let mut cmd = SpiCommand::simple(opcodes::DP);
        self.master.execute(&mut cmd)
    }

    /// Wake the chip from deep power-down
    ///
    /// Returns the electronic signature byte the chip answers with.
    pub fn release_power_down(&mut self) -> Result<u8> {
        let mut signature = [0u8; 1];
        // RES is followed by three dummy bytes
        let mut cmd = SpiCommand::read_reg(opcodes::RES, &mut signature).with_dummy_bytes(3);
        self.master.execute(&mut cmd)?;
        Ok(signature[0])
    }

    /// Compare flash contents against `expected`
    ///
    /// Fails with `VerifyFailed` at the first mismatching byte.
    pub fn verify(&mut self, offset: u32, expected: &[u8]) -> Result<()> {
        self.check_range(offset, expected.len())?;

        let mut buf = [0u8; VERIFY_CHUNK];
        for (i, want) in expected.chunks(VERIFY_CHUNK).enumerate() {
            let addr = offset + (i * VERIFY_CHUNK) as u32;
            let have = &mut buf[..want.len()];
            self.read(addr, have)?;

            if let Some(pos) = have.iter().zip(want).position(|(h, w)| h != w) {
                log::error!(
                    "SF: Verify failed at {:#08x}: expected {:#04x}, got {:#04x}",
                    addr + pos as u32,
                    want[pos],
                    have[pos]
                );
                return Err(Error::VerifyFailed);
            }
        }

        Ok(())
    }

    /// Read `len` bytes into a freshly allocated buffer
    #[cfg(feature = "alloc")]
    pub fn read_to_vec(&mut self, offset: u32, len: usize) -> Result<alloc::vec::Vec<u8>> {
        self.check_range(offset, len)?;

        let mut buf = alloc::vec::Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|_| Error::AllocationFailed)?;
        buf.resize(len, 0);

        self.read(offset, &mut buf)?;
        Ok(buf)
    }
}

impl<M: SpiMaster> SpiFlash for MacronixFlash<M> {
    fn name(&self) -> &'static str {
        self.chip.name
    }

    fn size(&self) -> u32 {
        self.chip.total_size()
    }

    fn sector_size(&self) -> u32 {
        self.chip.sector_size()
    }

    fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<()> {
        self.check_range(offset, buf.len())?;
        with_bus(&mut self.master, BusIntent::Read, |master| {
            protocol::fast_read(master, offset, buf)
        })
    }

    fn write(&mut self, offset: u32, buf: &[u8]) -> Result<()> {
        self.check_range(offset, buf.len())?;
        if buf.is_empty() {
            return Ok(());
        }

        let chunk_size = core::cmp::min(self.chip.page_size as usize, self.master.max_write_len());
        let timeouts = self.timeouts;

        with_bus(&mut self.master, BusIntent::Write, |master| {
            for chunk in PageChunks::new(offset, buf.len(), chunk_size) {
                protocol::write_enable(master)?;

                let mut cmd = SpiCommand::write_3b(opcodes::PP, chunk.addr, &buf[chunk.range()]);
                master.execute(&mut cmd).map_err(|e| {
                    log::debug!("SF: Macronix Page Program failed: {}", e);
                    Error::ProgramFailed
                })?;

                protocol::wait_ready(master, timeouts.poll_delay_us, timeouts.program_us)?;
                log::trace!(
                    "SF: PP {:#08x} <- {} bytes",
                    chunk.addr,
                    chunk.len
                );
            }

            log::debug!(
                "SF: Macronix: Successfully programmed {} bytes @ {:#x}",
                buf.len(),
                offset
            );
            Ok(())
        })
    }

    fn erase(&mut self, offset: u32, len: u32) -> Result<()> {
        erase_sectors(
            &mut self.master,
            opcodes::SE,
            self.chip.sector_size(),
            self.chip.total_size(),
            offset,
            len,
            &self.timeouts,
        )
    }

    fn lock(&mut self) -> Result<()> {
        self.set_lock_flags(true)
    }

    fn unlock(&mut self) -> Result<()> {
        self.set_lock_flags(false)
    }

    fn is_locked(&mut self) -> bool {
        match protocol::read_status(&mut self.master) {
            Ok(status) => status.contains(Status::BP_MASK),
            Err(e) => {
                log::debug!("SF: Failed to read status register: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records opcodes and plays a chip with a status register and no array
    struct MockMaster {
        status: u8,
        log: heapless::Vec<u8, 64>,
        fail_opcode: Option<u8>,
        busy_polls: u32,
        claims: i32,
        max_claims: i32,
    }

    impl MockMaster {
        fn new(status: u8) -> Self {
            Self {
                status,
                log: heapless::Vec::new(),
                fail_opcode: None,
                busy_polls: 0,
                claims: 0,
                max_claims: 0,
            }
        }

        fn flash(self, idcode: [u8; 3]) -> MacronixFlash<Self> {
            MacronixFlash::probe(self, &idcode).unwrap()
        }
    }

    impl SpiMaster for MockMaster {
        fn max_read_len(&self) -> usize {
            4
        }

        fn max_write_len(&self) -> usize {
            4
        }

        fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
            self.log.push(cmd.opcode).unwrap();
            if self.fail_opcode == Some(cmd.opcode) {
                return Err(Error::Timeout);
            }
            match cmd.opcode {
                opcodes::RDSR => {
                    let wip = if self.busy_polls > 0 {
                        self.busy_polls -= 1;
                        Status::WIP.bits()
                    } else {
                        0
                    };
                    cmd.read_buf[0] = self.status | wip;
                }
                opcodes::WRSR => self.status = cmd.write_data[0],
                _ => {}
            }
            Ok(())
        }

        fn claim_bus(&mut self, intent: BusIntent) -> Result<()> {
            if intent == BusIntent::Write {
                self.claims += 1;
                self.max_claims = self.max_claims.max(self.claims);
            }
            Ok(())
        }

        fn release_bus(&mut self, intent: BusIntent) -> Result<()> {
            if intent == BusIntent::Write {
                self.claims -= 1;
            }
            Ok(())
        }

        fn delay_us(&mut self, _us: u32) {}
    }

    #[test]
    fn test_probe_unsupported_id() {
        let result = MacronixFlash::probe(MockMaster::new(0), &[0xC2, 0x99, 0x99]);
        assert!(matches!(result, Err(Error::UnsupportedChip(0x9999))));
    }

    #[test]
    fn test_probe_short_idcode() {
        let result = MacronixFlash::probe(MockMaster::new(0), &[0xC2]);
        assert!(matches!(result, Err(Error::UnsupportedChip(_))));
    }

    #[test]
    fn test_probe_geometry() {
        let flash = MockMaster::new(0).flash([0xC2, 0x20, 0x16]);
        assert_eq!(flash.name(), "MX25L3205D");
        assert_eq!(flash.sector_size(), 4096);
        assert_eq!(flash.size(), 4_194_304);
    }

    #[test]
    fn test_lock_sequence() {
        let mut flash = MockMaster::new(0x80).flash([0xC2, 0x20, 0x17]);
        flash.lock().unwrap();

        let m = flash.master();
        assert_eq!(
            &m.log[..],
            &[
                opcodes::RDSR,
                opcodes::WREN,
                opcodes::WRSR,
                opcodes::RDSR,
                opcodes::WRDI,
                opcodes::RDSR
            ]
        );
        assert_eq!(m.status, 0xBC);
        assert_eq!(m.claims, 0);
        assert_eq!(m.max_claims, 1);
    }

    #[test]
    fn test_unlock_keeps_other_bits() {
        let mut flash = MockMaster::new(0xBE).flash([0xC2, 0x20, 0x17]);
        assert!(flash.is_locked());
        flash.unlock().unwrap();
        assert_eq!(flash.master().status, 0x82);
        assert!(!flash.is_locked());
    }

    #[test]
    fn test_unlock_keeps_undefined_status_bit() {
        let mut flash = MockMaster::new(0x7C).flash([0xC2, 0x5e, 0x16]);
        flash.unlock().unwrap();

        let master = flash.into_inner();
        assert_eq!(master.status, 0x40);
        assert_eq!(master.claims, 0);
    }

    #[test]
    fn test_lock_keeps_undefined_status_bit() {
        let mut flash = MockMaster::new(0x40).flash([0xC2, 0x5e, 0x16]);
        flash.lock().unwrap();
        assert_eq!(flash.master().status, 0x7C);
    }

    #[test]
    fn test_partial_protection_is_not_locked() {
        let mut flash = MockMaster::new(0x0C).flash([0xC2, 0x20, 0x17]);
        assert!(!flash.is_locked());
        assert_eq!(flash.protection().unwrap(), Protection::Partial(3));
    }

    #[test]
    fn test_failed_status_read_aborts_lock() {
        let mut master = MockMaster::new(0);
        master.fail_opcode = Some(opcodes::RDSR);
        let mut flash = master.flash([0xC2, 0x20, 0x17]);

        assert_eq!(flash.lock(), Err(Error::Timeout));
        assert!(!flash.is_locked());
        let m = flash.master();
        assert!(!m.log.contains(&opcodes::WRSR));
        assert_eq!(m.claims, 0);
    }

    #[test]
    fn test_status_write_failure() {
        let mut master = MockMaster::new(0);
        master.fail_opcode = Some(opcodes::WRSR);
        let mut flash = master.flash([0xC2, 0x20, 0x17]);

        assert_eq!(flash.lock(), Err(Error::StatusWriteFailed));
        assert_eq!(flash.master().claims, 0);
    }

    #[test]
    fn test_write_enable_failure_releases_bus() {
        let mut master = MockMaster::new(0);
        master.fail_opcode = Some(opcodes::WREN);
        let mut flash = master.flash([0xC2, 0x20, 0x17]);

        assert_eq!(flash.write(0, &[1, 2, 3]), Err(Error::WriteEnableFailed));
        let m = flash.master();
        assert_eq!(&m.log[..], &[opcodes::WREN]);
        assert_eq!(m.claims, 0);
    }

    #[test]
    fn test_program_failure() {
        let mut master = MockMaster::new(0);
        master.fail_opcode = Some(opcodes::PP);
        let mut flash = master.flash([0xC2, 0x20, 0x17]);

        assert_eq!(flash.write(0x100, &[0xAA; 9]), Err(Error::ProgramFailed));
        assert_eq!(flash.master().claims, 0);
    }

    #[test]
    fn test_write_polls_every_chunk() {
        let mut flash = MockMaster::new(0).flash([0xC2, 0x20, 0x17]);
        flash.write(0x102, &[0x55; 6]).unwrap();

        // Two chunks (2 + 4 bytes), one claim for the whole write
        let m = flash.master();
        let count = |op| m.log.iter().filter(|&&o| o == op).count();
        assert_eq!(count(opcodes::WREN), 2);
        assert_eq!(count(opcodes::PP), 2);
        assert_eq!(count(opcodes::RDSR), 2);
        assert_eq!(m.max_claims, 1);
        assert_eq!(m.claims, 0);
    }

    #[test]
    fn test_write_timeout() {
        let mut master = MockMaster::new(0);
        master.busy_polls = u32::MAX;
        let timeouts = FlashTimeouts {
            poll_delay_us: 10,
            program_us: 100,
            ..FlashTimeouts::default()
        };
        let mut flash = master.flash([0xC2, 0x20, 0x17]).with_timeouts(timeouts);

        assert_eq!(flash.write(0, &[0]), Err(Error::Timeout));
        let m = flash.master();
        assert_eq!(m.log.iter().filter(|&&o| o == opcodes::RDSR).count(), 10);
        assert_eq!(m.claims, 0);
    }

    #[test]
    fn test_write_out_of_bounds_touches_nothing() {
        let mut flash = MockMaster::new(0).flash([0xC2, 0x20, 0x15]);
        let size = flash.size();
        assert_eq!(flash.write(size - 1, &[0, 0]), Err(Error::AddressOutOfBounds));
        assert!(flash.master().log.is_empty());
    }

    #[test]
    fn test_erase_alignment() {
        let mut flash = MockMaster::new(0).flash([0xC2, 0x20, 0x17]);
        assert_eq!(flash.erase(0x800, 0x1000), Err(Error::InvalidAlignment));
        assert_eq!(flash.erase(0x1000, 0x800), Err(Error::InvalidAlignment));
        flash.erase(0x1000, 0x2000).unwrap();

        let m = flash.master();
        assert_eq!(m.log.iter().filter(|&&o| o == opcodes::SE).count(), 2);
        assert_eq!(m.claims, 0);
    }
}
