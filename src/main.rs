//! Command-line entry point: translate a `.vm` file or a directory of
//! `.vm` files into Hack assembly.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

/// Translate Hack VM bytecode into Hack assembly.
#[derive(Debug, Parser)]
#[command(name = "hackvm", version, about)]
struct Args {
    /// A `.vm` file, or a directory containing one or more `.vm` files.
    path: PathBuf,

    /// Increase log verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args.path) {
        Ok(output_path) => {
            log::info!("wrote {}", output_path.display());
            Ok(())
        }
        Err(err) => {
            log::error!("{:#}", err);
            Err(err)
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

fn run(path: &Path) -> Result<PathBuf> {
    let asm = hackvm_ir::translate(path).with_context(|| format!("translating {}", path.display()))?;
    let output_path = output_path_for(path)?;
    write_atomically(&output_path, &asm)
        .with_context(|| format!("writing {}", output_path.display()))?;
    Ok(output_path)
}

fn output_path_for(path: &Path) -> Result<PathBuf> {
    if path.is_dir() {
        let name = path
            .file_name()
            .context("path has no file name component")?
            .to_string_lossy()
            .into_owned();
        Ok(path.join(format!("{}.asm", name)))
    } else {
        let stem = path
            .file_stem()
            .context("path has no file stem")?
            .to_string_lossy()
            .into_owned();
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(dir.join(format!("{}.asm", stem)))
    }
}

/// Write `contents` to a temporary file in the destination's directory and
/// rename it into place, so a failing write never leaves a half-written
/// `.asm` file at `dest`.
fn write_atomically(dest: &Path, contents: &str) -> std::io::Result<()> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let tmp = dir.join(format!(
        ".{}.tmp",
        dest.file_name().and_then(|n| n.to_str()).unwrap_or("hackvm-output")
    ));
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, dest)
}
