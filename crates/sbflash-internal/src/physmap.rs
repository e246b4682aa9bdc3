//! Physical memory mapping for MMIO access
//!
//! Maps the SPI controller register window through /dev/mem on Linux.
//!
//! # Safety
//!
//! Accessing physical memory is inherently unsafe and requires root privileges.
//! The mapping functions ensure proper alignment and size constraints.

use crate::error::{InternalError, Result};

/// A mapped region of physical memory
#[cfg(target_os = "linux")]
pub struct PhysMap {
    /// Pointer to the first requested byte
    ptr: *mut u8,
    /// Requested size
    len: usize,
    /// Offset of `ptr` into the page-aligned mapping
    page_offset: usize,
    /// Size of the page-aligned mapping
    map_size: usize,
    phys_addr: u64,
}

#[cfg(target_os = "linux")]
impl PhysMap {
    /// Map `size` bytes of physical memory at `phys_addr`
    ///
    /// The region must be MMIO registers, not RAM.
    pub fn new(phys_addr: u64, size: usize) -> Result<Self> {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;
        use std::os::unix::io::AsRawFd;

        let map_err = |source| InternalError::MemoryMap {
            address: phys_addr,
            size,
            source,
        };

        // O_SYNC for uncached access (required for MMIO)
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open("/dev/mem")
            .map_err(map_err)?;

        let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
        let page_mask = page_size - 1;
        let page_offset = (phys_addr as usize) & page_mask;
        let aligned_addr = phys_addr & !(page_mask as u64);
        let map_size = (size + page_offset + page_mask) & !page_mask;

        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                map_size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                aligned_addr as libc::off_t,
            )
        };

        if ptr == libc::MAP_FAILED {
            return Err(map_err(std::io::Error::last_os_error()));
        }

        log::debug!(
            "Mapped {:#x} bytes at physical {:#x}",
            size,
            phys_addr
        );

        Ok(Self {
            ptr: unsafe { (ptr as *mut u8).add(page_offset) },
            len: size,
            page_offset,
            map_size,
            phys_addr,
        })
    }

    /// Read an 8-bit value from the mapped region
    #[inline]
    pub fn read8(&self, offset: usize) -> u8 {
        debug_assert!(offset < self.len);
        unsafe { core::ptr::read_volatile(self.ptr.add(offset)) }
    }

    /// Write an 8-bit value to the mapped region
    #[inline]
    pub fn write8(&self, offset: usize, value: u8) {
        debug_assert!(offset < self.len);
        unsafe { core::ptr::write_volatile(self.ptr.add(offset), value) }
    }

    /// Get the physical address of this mapping
    pub fn phys_addr(&self) -> u64 {
        self.phys_addr
    }
}

#[cfg(target_os = "linux")]
impl Drop for PhysMap {
    fn drop(&mut self) {
        unsafe {
            let base = self.ptr.sub(self.page_offset);
            libc::munmap(base as *mut libc::c_void, self.map_size);
        }
    }
}

// MMIO registers have no aliasing concerns across threads
#[cfg(target_os = "linux")]
unsafe impl Send for PhysMap {}

// Stub for non-Linux platforms
#[cfg(not(target_os = "linux"))]
pub struct PhysMap {
    _private: (),
}

#[cfg(not(target_os = "linux"))]
impl PhysMap {
    pub fn new(_phys_addr: u64, _size: usize) -> Result<Self> {
        Err(InternalError::NotSupported(
            "physical memory mapping only supported on Linux",
        ))
    }

    pub fn read8(&self, _offset: usize) -> u8 {
        0xFF
    }

    pub fn write8(&self, _offset: usize, _value: u8) {}

    pub fn phys_addr(&self) -> u64 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // Requires root and /dev/mem access
    fn test_map_spi_window() {
        let base = crate::pci::find_spi_base().unwrap();
        let map = PhysMap::new(base, sbflash_core::bus::regs::SPI_REG_SIZE).unwrap();
        assert_eq!(map.phys_addr(), base);
    }
}
