//! Read command implementation

use super::{progress_bar, CHUNK_SIZE};
use sbflash_core::flash::{MacronixFlash, SpiFlash};
use sbflash_core::programmer::SpiMaster;
use sbflash_core::Error;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Run the read command
pub fn run_read<M: SpiMaster>(
    flash: &mut MacronixFlash<M>,
    output: &Path,
    start: u32,
    length: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let size = flash.size();
    if start >= size {
        return Err(format!("Start address {:#x} is beyond the chip ({} bytes)", start, size).into());
    }
    let length = length.unwrap_or(size - start);

    let data = read_flash_with_progress(flash, start, length as usize)?;

    let mut file = File::create(output)?;
    file.write_all(&data)?;

    println!("Wrote {} bytes to {:?}", data.len(), output);
    Ok(())
}

/// Read a flash region with progress bar
pub fn read_flash_with_progress<M: SpiMaster>(
    flash: &mut MacronixFlash<M>,
    start: u32,
    len: usize,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    if !flash.is_valid_range(start, len) {
        return Err(Error::AddressOutOfBounds.into());
    }
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailed)?;
    data.resize(len, 0);

    let pb = progress_bar(len as u64, "Reading");
    for (i, chunk) in data.chunks_mut(CHUNK_SIZE).enumerate() {
        let offset = i * CHUNK_SIZE;
        flash.read(start + offset as u32, chunk)?;
        pb.set_position((offset + chunk.len()) as u64);
    }

    pb.finish_with_message("Read complete");
    Ok(data)
}
