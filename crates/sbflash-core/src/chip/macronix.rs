//! Macronix MX25xx parts known to the driver

use super::ChipParams;

/// Supported Macronix parts, matched by linear scan on `idcode`
pub static MACRONIX_CHIPS: [ChipParams; 6] = [
    ChipParams {
        idcode: 0x2015,
        page_size: 256,
        pages_per_sector: 16,
        sectors_per_block: 16,
        nr_blocks: 32,
        name: "MX25L1605D",
    },
    ChipParams {
        idcode: 0x2016,
        page_size: 256,
        pages_per_sector: 16,
        sectors_per_block: 16,
        nr_blocks: 64,
        name: "MX25L3205D",
    },
    ChipParams {
        idcode: 0x5e16,
        page_size: 256,
        pages_per_sector: 16,
        sectors_per_block: 16,
        nr_blocks: 64,
        // Also sold as MX25L3225D and MX25L3237D
        name: "MX25L3235D",
    },
    ChipParams {
        idcode: 0x2017,
        page_size: 256,
        pages_per_sector: 16,
        sectors_per_block: 16,
        nr_blocks: 128,
        name: "MX25L6405D",
    },
    ChipParams {
        idcode: 0x2018,
        page_size: 256,
        pages_per_sector: 16,
        sectors_per_block: 16,
        nr_blocks: 256,
        name: "MX25L12805D",
    },
    ChipParams {
        idcode: 0x2618,
        page_size: 256,
        pages_per_sector: 16,
        sectors_per_block: 16,
        nr_blocks: 256,
        name: "MX25L12855E",
    },
];
