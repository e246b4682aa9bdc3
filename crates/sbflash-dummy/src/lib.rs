//! sbflash-dummy - Simulated SB800 controller with an MX25xx chip
//!
//! This crate emulates the SB700/SB800 SPI controller at the register level
//! together with a Macronix flash chip behind it. The real bus engine runs
//! unchanged against it, which makes it useful for testing and development
//! without real hardware.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
mod chip;
mod companion;
#[cfg(feature = "alloc")]
mod controller;

#[cfg(feature = "alloc")]
pub use chip::{ChipLatency, SimulatedChip};
pub use companion::SimulatedCompanion;
#[cfg(feature = "alloc")]
pub use controller::SimulatedController;

#[cfg(feature = "alloc")]
use sbflash_core::bus::Sb800Spi;
#[cfg(feature = "alloc")]
use sbflash_core::chip::ChipParams;

/// Bus handle over the simulated controller
#[cfg(feature = "alloc")]
pub type SimulatedSpi = Sb800Spi<SimulatedController, SimulatedCompanion>;

/// Create a bus handle with a blank `params` chip and a cooperative companion
#[cfg(feature = "alloc")]
pub fn simulated_spi(params: &ChipParams) -> SimulatedSpi {
    let controller = SimulatedController::new(SimulatedChip::new(params));
    Sb800Spi::with_companion(controller, SimulatedCompanion::new())
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use sbflash_core::bus::BusTimeouts;
    use sbflash_core::chip::{find_chip, MACRONIX_CHIPS};
    use sbflash_core::flash::{FlashTimeouts, MacronixFlash, Protection, SpiFlash};
    use sbflash_core::protocol::{self, Status};
    use sbflash_core::Error;

    type Flash = MacronixFlash<SimulatedSpi>;

    fn flash(id: u16) -> Flash {
        MacronixFlash::probe_jedec(simulated_spi(find_chip(id).unwrap())).unwrap()
    }

    fn chip(flash: &Flash) -> &SimulatedChip {
        flash.master().registers().chip()
    }

    fn chip_mut(flash: &mut Flash) -> &mut SimulatedChip {
        flash.master_mut().registers_mut().chip_mut()
    }

    fn companion(flash: &Flash) -> &SimulatedCompanion {
        flash.master().arbitration().companion()
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    #[test]
    fn test_probe_every_chip() {
        for params in MACRONIX_CHIPS.iter() {
            let flash = flash(params.idcode);
            assert_eq!(flash.name(), params.name);
            assert_eq!(flash.size(), params.total_size());
        }
    }

    #[test]
    fn test_probe_mx25l3205d_geometry() {
        let flash = flash(0x2016);
        assert_eq!(flash.sector_size(), 4096);
        assert_eq!(flash.size(), 4_194_304);
    }

    #[test]
    fn test_probe_unsupported_id() {
        let params = find_chip(0x2016).unwrap();
        let controller =
            SimulatedController::new(SimulatedChip::new(params).with_idcode([0xC2, 0x99, 0x16]));
        let spi = Sb800Spi::with_companion(controller, SimulatedCompanion::new());

        let result = MacronixFlash::probe_jedec(spi);
        assert!(matches!(result, Err(Error::UnsupportedChip(0x9916))));
    }

    #[test]
    fn test_probe_foreign_manufacturer() {
        let params = find_chip(0x2016).unwrap();
        let controller =
            SimulatedController::new(SimulatedChip::new(params).with_idcode([0xEF, 0x40, 0x18]));
        let spi = Sb800Spi::with_companion(controller, SimulatedCompanion::new());

        assert!(matches!(
            MacronixFlash::probe_jedec(spi),
            Err(Error::UnsupportedChip(0x4018))
        ));
    }

    #[test]
    fn test_write_read_round_trip() {
        let mut flash = flash(0x2017);
        let data = pattern(300);

        // Starts three bytes before a page boundary
        flash.write(0x1FD, &data).unwrap();

        let mut buf = vec![0u8; data.len()];
        flash.read(0x1FD, &mut buf).unwrap();
        assert_eq!(buf, data);
        assert_eq!(&chip(&flash).data()[0x1FD..0x1FD + 300], &data[..]);
        assert_eq!(chip(&flash).data()[0x1FC], 0xFF);
        assert_eq!(chip(&flash).data()[0x1FD + 300], 0xFF);
        assert_eq!(chip(&flash).rejected(), 0);
    }

    #[test]
    fn test_write_single_byte_at_end() {
        let mut flash = flash(0x2015);
        let last = flash.size() - 1;
        flash.write(last, &[0x42]).unwrap();
        assert_eq!(flash.read_to_vec(last, 1).unwrap(), vec![0x42]);
        assert_eq!(flash.write(last, &[0, 0]), Err(Error::AddressOutOfBounds));
    }

    #[test]
    fn test_erase_then_rewrite() {
        let mut flash = flash(0x2016);
        flash.write(0x1000, &[0x00; 16]).unwrap();
        flash.erase(0x1000, 0x1000).unwrap();
        assert!(chip(&flash).data()[0x1000..0x2000].iter().all(|&b| b == 0xFF));

        flash.write(0x1000, b"sbflash").unwrap();
        flash.verify(0x1000, b"sbflash").unwrap();
        assert_eq!(flash.erase(0x1800, 0x1000), Err(Error::InvalidAlignment));
    }

    #[test]
    fn test_verify_detects_mismatch() {
        let mut flash = flash(0x2016);
        flash.write(0, &[1, 2, 3]).unwrap();
        assert_eq!(flash.verify(0, &[1, 2, 4]), Err(Error::VerifyFailed));
    }

    #[test]
    fn test_lock_unlock() {
        let mut flash = flash(0x2017);
        assert!(!flash.is_locked());

        flash.lock().unwrap();
        assert!(flash.is_locked());
        assert_eq!(flash.protection().unwrap(), Protection::Full);

        flash.unlock().unwrap();
        assert!(!flash.is_locked());
        assert_eq!(flash.protection().unwrap(), Protection::Unprotected);
    }

    #[test]
    fn test_lock_preserves_unrelated_bits() {
        let mut flash = flash(0x2017);
        chip_mut(&mut flash).set_status(Status::SRWD.bits() | 0x40);
        // Still busy with an earlier operation on the first status read
        chip_mut(&mut flash).set_busy(1);

        flash.lock().unwrap();
        let written = chip(&flash).last_status_write().unwrap();
        assert_eq!(written, 0xC0 | Status::WIP.bits() | Status::BP_MASK.bits());
        assert_eq!(chip(&flash).status(), 0xFC);

        flash.unlock().unwrap();
        assert_eq!(chip(&flash).last_status_write(), Some(0xC0));
        assert_eq!(chip(&flash).status(), 0xC0);
    }

    #[test]
    fn test_locked_chip_ignores_program() {
        let mut flash = flash(0x2017);
        flash.lock().unwrap();

        // The chip drops the program silently; only a read-back notices
        flash.write(0, &[0x00; 4]).unwrap();
        assert_eq!(flash.verify(0, &[0x00; 4]), Err(Error::VerifyFailed));
        assert_eq!(chip(&flash).rejected(), 1);

        flash.unlock().unwrap();
        flash.write(0, &[0x00; 4]).unwrap();
        flash.verify(0, &[0x00; 4]).unwrap();
    }

    #[test]
    fn test_claims_balanced_on_success() {
        let mut flash = flash(0x2017);
        flash.write(0x10, &pattern(20)).unwrap();
        flash.erase(0, 0x1000).unwrap();
        flash.lock().unwrap();
        flash.unlock().unwrap();

        let c = companion(&flash);
        assert_eq!(c.sleeps, 4);
        assert_eq!(c.wakeups, 4);
        assert!(!c.is_asleep());
        assert_eq!(flash.master().arbitration().depth(), 0);
    }

    #[test]
    fn test_reads_do_not_wake_companion() {
        let mut flash = flash(0x2017);
        let mut buf = [0u8; 32];
        flash.read(0, &mut buf).unwrap();
        flash.is_locked();

        assert_eq!(companion(&flash).sleeps, 0);
        assert_eq!(companion(&flash).wakeups, 0);
    }

    #[test]
    fn test_claims_balanced_on_failure() {
        let params = find_chip(0x2017).unwrap();
        let spi = simulated_spi(params).with_timeouts(BusTimeouts {
            poll_delay_us: 1,
            max_polls: 100,
        });
        let mut flash = MacronixFlash::probe_jedec(spi).unwrap();

        flash.master_mut().registers_mut().set_stuck(true);
        assert_eq!(flash.write(0, &[1, 2, 3]), Err(Error::WriteEnableFailed));
        assert_eq!(flash.lock(), Err(Error::Timeout));
        assert_eq!(flash.erase(0, 0x1000), Err(Error::WriteEnableFailed));

        let c = companion(&flash);
        assert_eq!(c.sleeps, 3);
        assert_eq!(c.wakeups, 3);
        assert_eq!(flash.master().arbitration().depth(), 0);
    }

    #[test]
    fn test_companion_refuses_bus() {
        let mut flash = flash(0x2017);
        flash
            .master_mut()
            .arbitration_mut()
            .companion_mut()
            .fail_sleep = true;
        let before = flash.master().registers().transactions();

        assert_eq!(flash.write(0, &[1]), Err(Error::BusClaimFailed));
        assert_eq!(flash.lock(), Err(Error::BusClaimFailed));
        assert_eq!(flash.master().registers().transactions(), before);
        assert_eq!(flash.master().arbitration().depth(), 0);
        assert_eq!(chip(&flash).data()[0], 0xFF);
    }

    #[test]
    fn test_companion_misses_wakeup() {
        let mut flash = flash(0x2017);
        flash
            .master_mut()
            .arbitration_mut()
            .companion_mut()
            .fail_wakeup = true;

        // The data went out, but the handover back failed
        assert_eq!(flash.write(0, &[0x5A]), Err(Error::BusClaimFailed));
        assert_eq!(chip(&flash).data()[0], 0x5A);
        assert_eq!(flash.master().arbitration().depth(), 0);
    }

    #[test]
    fn test_program_timeout() {
        let params = find_chip(0x2016).unwrap();
        let slow = SimulatedChip::new(params).with_latency(ChipLatency {
            program: u32::MAX,
            ..ChipLatency::default()
        });
        let spi = Sb800Spi::with_companion(SimulatedController::new(slow), SimulatedCompanion::new());
        let mut flash = MacronixFlash::probe_jedec(spi).unwrap().with_timeouts(FlashTimeouts {
            poll_delay_us: 10,
            program_us: 1_000,
            ..FlashTimeouts::default()
        });

        assert_eq!(flash.write(0, &[0; 8]), Err(Error::Timeout));
        // Aborted after the first chunk
        assert_eq!(chip(&flash).data()[..8], [0, 0, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(companion(&flash).wakeups, 1);
        assert!(flash.master().registers().delayed_us() >= 1_000);
    }

    #[test]
    fn test_chip_erase() {
        let mut flash = flash(0x2015);
        flash.write(0x10_0000, &[0; 4]).unwrap();
        flash.chip_erase().unwrap();
        assert!(chip(&flash).data().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_power_down_cycle() {
        let mut flash = flash(0x2016);
        flash.power_down().unwrap();
        assert!(chip(&flash).is_powered_down());

        // Only RES is answered while asleep
        let idcode = protocol::read_jedec_id(flash.master_mut()).unwrap();
        assert_eq!(idcode, [0xFF; 3]);

        assert_eq!(flash.release_power_down().unwrap(), 0x15);
        assert!(!chip(&flash).is_powered_down());
    }

    #[test]
    fn test_read_to_vec() {
        let mut flash = flash(0x2018);
        let data = pattern(64);
        flash.write(0xFF_FFC0, &data).unwrap();
        assert_eq!(flash.read_to_vec(0xFF_FFC0, 64).unwrap(), data);
        assert_eq!(
            flash.read_to_vec(0xFF_FFC0, 65),
            Err(Error::AddressOutOfBounds)
        );
    }
}
