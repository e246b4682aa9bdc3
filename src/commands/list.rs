//! List commands implementation

use super::format_size;
use crate::programmers;
use sbflash_core::chip::MACRONIX_CHIPS;

/// List all supported programmers
pub fn list_programmers() {
    print!("{}", programmers::programmer_help());
}

/// List all supported chips
pub fn list_chips() {
    println!("Supported flash chips:");
    println!();
    println!(
        "{:<14} {:>8} {:>10} {:>8} {:>10}",
        "Name", "JEDEC ID", "Size", "Page", "Sector"
    );
    println!("{}", "-".repeat(54));

    for chip in MACRONIX_CHIPS.iter() {
        println!(
            "{:<14} {:>8} {:>10} {:>8} {:>10}",
            chip.name,
            format!("C2 {:04X}", chip.idcode),
            format_size(chip.total_size()),
            chip.page_size,
            format_size(chip.sector_size())
        );
    }
}
