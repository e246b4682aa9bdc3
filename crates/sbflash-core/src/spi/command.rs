//! SPI command structure

use super::address::{encode_address, ADDRESS_BYTES};

/// A single SPI transaction
///
/// Designed to avoid allocation - uses slices for data.
/// The lifetime parameter `'a` ties the command to the buffers it references.
pub struct SpiCommand<'a> {
    /// The opcode byte
    pub opcode: u8,

    /// 3-byte address (if any)
    pub address: Option<u32>,

    /// Number of dummy bytes clocked out after the address
    pub dummy_bytes: u8,

    /// Data to write after opcode/address/dummy
    pub write_data: &'a [u8],

    /// Buffer to read into (mutable)
    pub read_buf: &'a mut [u8],
}

impl<'a> SpiCommand<'a> {
    /// Create a simple command with no address or data (e.g., WREN, WRDI)
    pub fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
            dummy_bytes: 0,
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Create a read register command with no address (e.g., RDSR, RDID)
    pub fn read_reg(opcode: u8, buf: &'a mut [u8]) -> Self {
        Self {
            opcode,
            address: None,
            dummy_bytes: 0,
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create a write register command with no address (e.g., WRSR)
    pub fn write_reg(opcode: u8, data: &'a [u8]) -> Self {
        Self {
            opcode,
            address: None,
            dummy_bytes: 0,
            write_data: data,
            read_buf: &mut [],
        }
    }

    /// Create a read command with 3-byte address (e.g., READ)
    pub fn read_3b(opcode: u8, addr: u32, buf: &'a mut [u8]) -> Self {
        Self {
            opcode,
            address: Some(addr),
            dummy_bytes: 0,
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create a write command with 3-byte address (e.g., PP)
    pub fn write_3b(opcode: u8, addr: u32, data: &'a [u8]) -> Self {
        Self {
            opcode,
            address: Some(addr),
            dummy_bytes: 0,
            write_data: data,
            read_buf: &mut [],
        }
    }

    /// Create an erase command with 3-byte address (e.g., SE)
    pub fn erase_3b(opcode: u8, addr: u32) -> Self {
        Self {
            opcode,
            address: Some(addr),
            dummy_bytes: 0,
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Set the number of dummy bytes
    pub fn with_dummy_bytes(mut self, count: u8) -> Self {
        self.dummy_bytes = count;
        self
    }

    /// Length of opcode + address + dummy bytes
    pub fn header_len(&self) -> usize {
        let addr_len = if self.address.is_some() {
            ADDRESS_BYTES
        } else {
            0
        };
        1 + addr_len + self.dummy_bytes as usize
    }

    /// Encode opcode, address and dummy bytes into `buf`
    ///
    /// Returns the number of bytes written. `buf` must hold at least
    /// `header_len()` bytes.
    pub fn encode_header(&self, buf: &mut [u8]) -> usize {
        buf[0] = self.opcode;
        let mut len = 1;
        if let Some(addr) = self.address {
            encode_address(addr, &mut buf[1..1 + ADDRESS_BYTES]);
            len += ADDRESS_BYTES;
        }
        for byte in &mut buf[len..len + self.dummy_bytes as usize] {
            *byte = 0;
        }
        len + self.dummy_bytes as usize
    }

    /// Number of bytes shifted out after the opcode
    pub fn bytes_out(&self) -> usize {
        self.header_len() - 1 + self.write_data.len()
    }

    /// Number of bytes shifted in
    pub fn bytes_in(&self) -> usize {
        self.read_buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spi::opcodes;

    #[test]
    fn test_page_program_header() {
        let data = [0xAA, 0xBB];
        let cmd = SpiCommand::write_3b(opcodes::PP, 0x12_3456, &data);
        let mut buf = [0u8; 4];
        assert_eq!(cmd.encode_header(&mut buf), 4);
        assert_eq!(buf, [0x02, 0x12, 0x34, 0x56]);
        assert_eq!(cmd.bytes_out(), 5);
        assert_eq!(cmd.bytes_in(), 0);
    }

    #[test]
    fn test_fast_read_has_dummy_byte() {
        let mut out = [0u8; 4];
        let cmd = SpiCommand::read_3b(opcodes::FAST_READ, 0x00_1000, &mut out).with_dummy_bytes(1);
        assert_eq!(cmd.header_len(), 5);
        let mut buf = [0xFFu8; 5];
        cmd.encode_header(&mut buf);
        assert_eq!(buf, [0x0B, 0x00, 0x10, 0x00, 0x00]);
        assert_eq!(cmd.bytes_out(), 4);
        assert_eq!(cmd.bytes_in(), 4);
    }

    #[test]
    fn test_status_read_has_no_output() {
        let mut status = [0u8; 1];
        let cmd = SpiCommand::read_reg(opcodes::RDSR, &mut status);
        assert_eq!(cmd.header_len(), 1);
        assert_eq!(cmd.bytes_out(), 0);
        assert_eq!(cmd.bytes_in(), 1);
    }
}
