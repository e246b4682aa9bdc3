//! Block protection command implementations

use sbflash_core::flash::{MacronixFlash, SpiFlash};
use sbflash_core::programmer::SpiMaster;
use sbflash_core::protocol::Status;
use std::error::Error;

/// Show the current block protection state
pub fn cmd_status<M: SpiMaster>(flash: &mut MacronixFlash<M>) -> Result<(), Box<dyn Error>> {
    let status = flash
        .status()
        .map_err(|e| format!("Failed to read status register: {}", e))?;

    println!("Status register: {:#04x}", status.bits());
    println!(
        "Block protection: {} (BP3..BP0 = {:04b})",
        flash.protection()?,
        status.protection_level()
    );
    println!(
        "Status register write disable: {}",
        if status.contains(Status::SRWD) { "set" } else { "clear" }
    );
    Ok(())
}

/// Protect the whole chip
pub fn cmd_enable<M: SpiMaster>(flash: &mut MacronixFlash<M>) -> Result<(), Box<dyn Error>> {
    flash.lock()?;
    if !flash.is_locked() {
        return Err("Block protection did not stick (status register write protected?)".into());
    }
    println!("Block protection enabled");
    Ok(())
}

/// Remove all block protection
pub fn cmd_disable<M: SpiMaster>(flash: &mut MacronixFlash<M>) -> Result<(), Box<dyn Error>> {
    flash.unlock()?;
    if flash.is_locked() {
        return Err("Block protection did not clear (status register write protected?)".into());
    }
    println!("Block protection disabled");
    Ok(())
}
