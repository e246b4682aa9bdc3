//! Write command implementation

use super::erase::erase_range;
use super::verify::verify_flash_with_progress;
use super::{progress_bar, CHUNK_SIZE};
use sbflash_core::flash::{MacronixFlash, Protection, SpiFlash};
use sbflash_core::programmer::SpiMaster;
use std::path::Path;

/// Options of a write
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions {
    /// Erase the covered sectors first
    pub erase: bool,
    /// Read back and compare afterwards
    pub verify: bool,
}

/// Run the write command
pub fn run_write<M: SpiMaster>(
    flash: &mut MacronixFlash<M>,
    input: &Path,
    start: u32,
    options: WriteOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(input)?;
    println!("Read {} bytes from {:?}", data.len(), input);

    write_image(flash, start, &data, options)?;
    println!("Write complete!");
    Ok(())
}

/// Sector-aligned span `[start, end)` covering `len` bytes at `offset`
pub fn sector_span(offset: u32, len: u32, sector_size: u32) -> (u32, u32) {
    let start = offset - offset % sector_size;
    let end = (offset + len).div_ceil(sector_size) * sector_size;
    (start, end)
}

/// Program `data` at `start`
///
/// With erasing enabled, the sectors covering the target are read first and
/// the bytes around the target are written back after the erase.
pub fn write_image<M: SpiMaster>(
    flash: &mut MacronixFlash<M>,
    start: u32,
    data: &[u8],
    options: WriteOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    if !flash.is_valid_range(start, data.len()) {
        return Err(format!(
            "Image ({} bytes at {:#x}) exceeds chip size ({} bytes)",
            data.len(),
            start,
            flash.size()
        )
        .into());
    }
    if data.is_empty() {
        return Ok(());
    }

    match flash.protection()? {
        Protection::Unprotected => {}
        state => log::warn!(
            "Chip is {}; protected areas will not be programmed (use 'wp disable')",
            state
        ),
    }

    let (base, image) = if options.erase {
        let sector_size = flash.sector_size();
        let (span_start, span_end) = sector_span(start, data.len() as u32, sector_size);

        let mut image = flash.read_to_vec(span_start, (span_end - span_start) as usize)?;
        let at = (start - span_start) as usize;
        image[at..at + data.len()].copy_from_slice(data);

        erase_range(flash, span_start, span_end - span_start)?;
        (span_start, image)
    } else {
        (start, data.to_vec())
    };

    let pb = progress_bar(image.len() as u64, "Writing");
    for (i, chunk) in image.chunks(CHUNK_SIZE).enumerate() {
        let offset = i * CHUNK_SIZE;
        // Erased flash already reads as 0xFF
        if !options.erase || chunk.iter().any(|&b| b != 0xFF) {
            flash.write(base + offset as u32, chunk)?;
        }
        pb.set_position((offset + chunk.len()) as u64);
    }
    pb.finish_with_message("Write complete");

    if options.verify {
        verify_flash_with_progress(flash, base, &image)?;
    }
    Ok(())
}
