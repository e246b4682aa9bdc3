//! Verify command implementation

use super::{progress_bar, CHUNK_SIZE};
use sbflash_core::flash::{MacronixFlash, SpiFlash};
use sbflash_core::programmer::SpiMaster;
use std::path::Path;

/// Run the verify command
pub fn run_verify<M: SpiMaster>(
    flash: &mut MacronixFlash<M>,
    input: &Path,
    start: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let expected = std::fs::read(input)?;
    println!("Read {} bytes from {:?}", expected.len(), input);

    if !flash.is_valid_range(start, expected.len()) {
        return Err(format!(
            "File ({} bytes at {:#x}) exceeds chip size ({} bytes)",
            expected.len(),
            start,
            flash.size()
        )
        .into());
    }

    verify_flash_with_progress(flash, start, &expected)?;
    println!("Verification passed!");
    Ok(())
}

/// Verify flash contents against expected data with progress bar
pub fn verify_flash_with_progress<M: SpiMaster>(
    flash: &mut MacronixFlash<M>,
    start: u32,
    expected: &[u8],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let pb = progress_bar(expected.len() as u64, "Verifying");

    let mut mismatch_count = 0usize;
    let mut first_mismatch: Option<(usize, u8, u8)> = None;

    for (i, want) in expected.chunks(CHUNK_SIZE).enumerate() {
        let offset = i * CHUNK_SIZE;
        let have = &mut buf[..want.len()];
        flash.read(start + offset as u32, have)?;

        for (j, (actual, expected)) in have.iter().zip(want).enumerate() {
            if actual != expected {
                if first_mismatch.is_none() {
                    first_mismatch = Some((start as usize + offset + j, *actual, *expected));
                }
                mismatch_count += 1;
            }
        }
        pb.set_position((offset + want.len()) as u64);
    }

    if let Some((addr, actual, expected)) = first_mismatch {
        pb.abandon_with_message("Verification failed!");
        return Err(format!(
            "Verification failed: {} byte(s) differ. First mismatch at 0x{:08X}: expected 0x{:02X}, got 0x{:02X}",
            mismatch_count, addr, expected, actual
        )
        .into());
    }

    pb.finish_with_message("Verification passed");
    Ok(())
}
