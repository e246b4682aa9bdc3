//! Address encoding

/// Number of address bytes on the wire
pub const ADDRESS_BYTES: usize = 3;

/// Maximum addressable size with a 3-byte address (16 MiB)
pub const MAX_ADDRESSABLE: u32 = 1 << 24;

/// Encode a 24-bit address, most significant byte first
pub fn encode_address(address: u32, buf: &mut [u8]) {
    buf[0] = (address >> 16) as u8;
    buf[1] = (address >> 8) as u8;
    buf[2] = address as u8;
}
