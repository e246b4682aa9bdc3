//! Writes sbflash.1 plus one page per subcommand (sbflash-read.1, ...)
//!
//! Usage: gen-manpage [output-dir]   (defaults to ./man)

use clap::CommandFactory;
use std::io;
use std::path::{Path, PathBuf};

#[path = "../cli.rs"]
mod cli;
#[allow(dead_code)]
#[path = "../programmers.rs"]
mod programmers;

/// Render `cmd` to `<dir>/<name>.1` and recurse into its subcommands
fn render_pages(cmd: &clap::Command, name: &str, dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut page = Vec::new();
    clap_mangen::Man::new(cmd.clone()).render(&mut page)?;

    let path = dir.join(format!("{}.1", name));
    std::fs::write(&path, page)?;

    let mut written = vec![path];
    for sub in cmd.get_subcommands().filter(|s| s.get_name() != "help") {
        let sub_name = format!("{}-{}", name, sub.get_name());
        written.extend(render_pages(sub, &sub_name, dir)?);
    }
    Ok(written)
}

fn main() -> io::Result<()> {
    let dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    std::fs::create_dir_all(&dir)?;

    let mut cmd = cli::Cli::command();
    cmd.build();
    for path in render_pages(&cmd, "sbflash", &dir)? {
        println!("{}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_for_every_subcommand() {
        let dir = std::env::temp_dir().join(format!("sbflash-man-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut cmd = cli::Cli::command();
        cmd.build();
        let pages = render_pages(&cmd, "sbflash", &dir).unwrap();

        for name in ["sbflash.1", "sbflash-write.1", "sbflash-wp.1", "sbflash-wp-disable.1"] {
            assert!(pages.contains(&dir.join(name)), "missing {}", name);
        }
        let top = std::fs::read_to_string(dir.join("sbflash.1")).unwrap();
        assert!(top.contains("sbflash"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
