use anyhow::Result;
use clap::Args;
use colored::Colorize;
use rcss_editor::{Overwrite, Session};
use std::path::{Path, PathBuf};

use super::{resolve, ConsoleHost};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct FmtArgs {
    /// Input .rcss file
    pub input: PathBuf,

    /// Write the spritesheets to a new file instead of in place
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Overwrite even if the file changed since it was read
    #[arg(long)]
    pub force: bool,
}

pub fn fmt(args: FmtArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let input = resolve(cwd, &args.input);

    let mut session = Session::new(Box::new(ConsoleHost), config.editor);
    session.load_path(&input)?;

    let report = match &args.output {
        Some(output) => session.save_as_new(resolve(cwd, output))?,
        None => session.save_in_place(&input, overwrite(args.force))?,
    };

    println!(
        "{} {} (lines {}-{})",
        "✓".green(),
        report.path.display(),
        report.line_range.start,
        report.line_range.end
    );
    if let Some(backup) = &report.backup {
        println!("   Backup: {}", backup.display());
    }

    Ok(())
}

pub fn overwrite(force: bool) -> Overwrite {
    if force {
        Overwrite::Confirmed
    } else {
        Overwrite::Guarded
    }
}
