//! Erase command implementation

use super::progress_bar;
use indicatif::{ProgressBar, ProgressStyle};
use sbflash_core::flash::{MacronixFlash, SpiFlash};
use sbflash_core::programmer::SpiMaster;
use std::time::Duration;

/// Run the erase command
///
/// Without a range the whole chip is erased with a single chip erase.
pub fn run_erase<M: SpiMaster>(
    flash: &mut MacronixFlash<M>,
    start: Option<u32>,
    length: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    if start.is_none() && length.is_none() {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Erasing {} ({} bytes)...", flash.name(), flash.size()));
        pb.enable_steady_tick(Duration::from_millis(100));

        flash.chip_erase()?;
        pb.finish_with_message("Erase complete");
        return Ok(());
    }

    let size = flash.size();
    let start = start.unwrap_or(0);
    if start >= size {
        return Err(format!("Start address {:#x} is beyond the chip ({} bytes)", start, size).into());
    }
    let length = length.unwrap_or(size - start);
    erase_range(flash, start, length)?;

    println!("Erased {} bytes at {:#x}", length, start);
    Ok(())
}

/// Erase a sector-aligned range one sector at a time, with progress
pub fn erase_range<M: SpiMaster>(
    flash: &mut MacronixFlash<M>,
    start: u32,
    length: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let sector_size = flash.sector_size();
    if start % sector_size != 0 || length % sector_size != 0 {
        return Err(format!(
            "Erase range {:#x}+{:#x} must be aligned to the {} byte sector size",
            start, length, sector_size
        )
        .into());
    }
    if !flash.is_valid_range(start, length as usize) {
        return Err(format!("Erase range {:#x}+{:#x} exceeds the chip", start, length).into());
    }

    let pb = progress_bar(length as u64, "Erasing");
    let mut done = 0;
    while done < length {
        flash.erase(start + done, sector_size)?;
        done += sector_size;
        pb.set_position(done as u64);
    }
    pb.finish_with_message("Erase complete");
    Ok(())
}
