//! Register offsets and bits of the FIFO SPI controller

/// SPI opcode register (command byte, sent outside the FIFO)
pub const SPI_OPCODE: usize = 0x00;

/// Packed byte counts: receive count in bits 7:4, transmit count in bits 3:0
pub const SPI_BYTE_COUNT: usize = 0x01;

/// Control register holding the execute and FIFO-pointer-clear bits
pub const SPI_CNTRL: usize = 0x02;

/// Status byte holding the busy bit
pub const SPI_STATUS: usize = 0x03;

/// FIFO data port; each access moves the FIFO pointer by one
pub const SPI_FIFO: usize = 0x0C;

/// Current FIFO pointer in bits 2:0
pub const SPI_FIFO_PTR: usize = 0x0D;

/// Size of the register window to map
pub const SPI_REG_SIZE: usize = 0x10;

/// Control register bits
pub mod cntrl_bits {
    /// Start executing the programmed opcode; cleared by hardware when done
    pub const EXECUTE: u8 = 1 << 0;
    /// Reset the FIFO pointer to 0
    pub const FIFO_PTR_CLR: u8 = 1 << 4;
}

/// Status register bits
pub mod status_bits {
    /// Controller is shifting data
    pub const BUSY: u8 = 1 << 7;
}

/// Mask for the FIFO pointer register
pub const FIFO_PTR_MASK: u8 = 0x07;
