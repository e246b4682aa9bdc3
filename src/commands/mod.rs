//! CLI command implementations
//!
//! Every command works on a probed [`MacronixFlash`](sbflash_core::flash::MacronixFlash)
//! over any SPI master, so the same code drives the simulated and the real
//! controller.

pub mod erase;
mod list;
pub mod probe;
pub mod read;
pub mod verify;
pub mod wp;
pub mod write;

use indicatif::{ProgressBar, ProgressStyle};

pub use list::{list_chips, list_programmers};

/// Chunk size for reads, writes and verification with progress
const CHUNK_SIZE: usize = 4096;

/// Byte progress bar for a phase of an operation
fn progress_bar(total: u64, phase: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                phase
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Format a byte count for humans
fn format_size(bytes: u32) -> String {
    if bytes >= 1024 * 1024 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}
