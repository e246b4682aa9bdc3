//! Programmer registration and dispatch
//!
//! This module provides a centralized registry for all programmers, with support
//! for feature-gated inclusion and dynamic help text generation.

use sbflash_core::flash::MacronixFlash;
use sbflash_core::programmer::SpiMaster;

/// Boxed bus handle of any programmer
pub type Master = Box<dyn SpiMaster + Send>;

/// Probed flash chip on any programmer
pub type Flash = MacronixFlash<Master>;

/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Short description
    pub description: &'static str,
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        description: "Simulated SB800 controller with a blank chip (chip=<name>)",
    });

    #[cfg(feature = "internal")]
    programmers.push(ProgrammerInfo {
        name: "internal",
        description: "SB700/SB800 southbridge SPI controller (spibar=<addr>) - requires root",
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with programmer features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");
    for p in &programmers {
        help.push_str(&format!("  {:10} - {}\n", p.name, p.description));
    }
    help
}

/// Generate a short list of programmer names for CLI help
pub fn programmer_names_short() -> String {
    let programmers = available_programmers();
    let names: Vec<&str> = programmers.iter().map(|p| p.name).collect();
    names.join(", ")
}

/// Parse a programmer string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_programmer_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

/// Look up an option value
#[allow(dead_code)]
fn option<'a>(options: &[(&str, &'a str)], key: &str) -> Option<&'a str> {
    options.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Open the bus handle of a programmer
#[allow(unused_variables)]
pub fn open_master(programmer: &str) -> Result<Master, Box<dyn std::error::Error>> {
    let (name, options) = parse_programmer_string(programmer);

    match name {
        #[cfg(feature = "dummy")]
        "dummy" => {
            let chip_name = option(&options, "chip").unwrap_or("MX25L6405D");
            let params = sbflash_core::chip::find_by_name(chip_name).ok_or_else(|| {
                format!(
                    "Unknown chip: {}\nUse 'sbflash list-chips' to see supported chips",
                    chip_name
                )
            })?;

            log::info!("Opening simulated controller with {}", params.name);
            Ok(Box::new(sbflash_dummy::simulated_spi(params)))
        }

        #[cfg(feature = "internal")]
        "internal" => {
            let spibar = option(&options, "spibar")
                .map(|v| crate::cli::parse_hex_u32(v).map(u64::from))
                .transpose()
                .map_err(|e| format!("Invalid spibar: {}", e))?;

            log::info!("Opening SB700/SB800 internal programmer...");
            let master = sbflash_internal::open(spibar).map_err(|e| {
                format!(
                    "Failed to initialize internal programmer: {}\n\
                     Make sure you have root privileges and an SB700/SB800 chipset.",
                    e
                )
            })?;
            Ok(Box::new(master))
        }

        _ => Err(unknown_programmer_error(name)),
    }
}

/// Open a programmer and identify the flash chip behind it
pub fn open_flash(programmer: &str) -> Result<Flash, Box<dyn std::error::Error>> {
    let master = open_master(programmer)?;
    let flash = MacronixFlash::probe_jedec(master)?;
    Ok(flash)
}

fn unknown_programmer_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown programmer: {}\n\n", name);
    msg.push_str(&programmer_help());
    msg.push_str("\nUse 'sbflash list-programmers' for more details");
    msg.into()
}
