//! Probe command implementation

use super::format_size;
use sbflash_core::flash::{MacronixFlash, SpiFlash};
use sbflash_core::programmer::SpiMaster;

/// Print what the probe found
pub fn run_probe<M: SpiMaster>(flash: &mut MacronixFlash<M>) -> Result<(), Box<dyn std::error::Error>> {
    let chip = flash.chip();

    println!("Found flash chip:");
    println!("  Vendor: Macronix");
    println!("  Name:   {}", chip.name);
    println!(
        "  Size:   {} bytes ({})",
        chip.total_size(),
        format_size(chip.total_size())
    );
    println!("  JEDEC ID: C2 {:04X}", chip.idcode);
    println!(
        "  Page: {} bytes, sector: {} bytes, {} blocks",
        chip.page_size,
        chip.sector_size(),
        chip.nr_blocks
    );

    match flash.status() {
        Ok(status) => println!("  Status: {:#04x} ({})", status.bits(), flash.protection()?),
        Err(e) => log::warn!("Failed to read status register: {}", e),
    }
    if flash.is_locked() {
        println!("  Chip is write protected; use 'wp disable' before writing");
    }

    Ok(())
}
