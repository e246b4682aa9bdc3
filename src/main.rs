//! sbflash - SPI flash programmer for AMD SB700/SB800 southbridges
//!
//! Reads, writes, erases and write-protects Macronix MX25xx flash chips
//! attached to the southbridge FIFO SPI controller.
//!
//! # Architecture
//!
//! - **Bus engine** (`sbflash-core::bus`) - drives the controller registers and
//!   arbitrates access with the embedded controller
//! - **Flash layer** (`sbflash-core::flash`) - chip probing, paged writes,
//!   sector erase and block protection on top of any SPI master
//! - **Programmers** - the real controller over /dev/mem (`internal`) or a
//!   simulated controller and chip (`dummy`)

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands, WpCommands};
use commands::write::WriteOptions;
use programmers::open_flash;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let result = match cli.command {
        Commands::Probe { programmer } => {
            let mut flash = open_flash(&programmer)?;
            commands::probe::run_probe(&mut flash)
        }
        Commands::Read {
            programmer,
            output,
            start,
            length,
        } => {
            let mut flash = open_flash(&programmer)?;
            commands::read::run_read(&mut flash, &output, start, length)
        }
        Commands::Write {
            programmer,
            input,
            start,
            no_verify,
            no_erase,
        } => {
            let mut flash = open_flash(&programmer)?;
            let options = WriteOptions {
                erase: !no_erase,
                verify: !no_verify,
            };
            commands::write::run_write(&mut flash, &input, start, options)
        }
        Commands::Erase {
            programmer,
            start,
            length,
        } => {
            let mut flash = open_flash(&programmer)?;
            commands::erase::run_erase(&mut flash, start, length)
        }
        Commands::Verify {
            programmer,
            input,
            start,
        } => {
            let mut flash = open_flash(&programmer)?;
            commands::verify::run_verify(&mut flash, &input, start)
        }
        Commands::Wp(subcmd) => match subcmd {
            WpCommands::Status { programmer } => {
                let mut flash = open_flash(&programmer)?;
                commands::wp::cmd_status(&mut flash)
            }
            WpCommands::Enable { programmer } => {
                let mut flash = open_flash(&programmer)?;
                commands::wp::cmd_enable(&mut flash)
            }
            WpCommands::Disable { programmer } => {
                let mut flash = open_flash(&programmer)?;
                commands::wp::cmd_disable(&mut flash)
            }
        },
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
        Commands::ListChips => {
            commands::list_chips();
            Ok(())
        }
    };

    result
}
