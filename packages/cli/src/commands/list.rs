use anyhow::Result;
use clap::Args;
use colored::Colorize;
use rcss_editor::{Document, Spritesheet};
use std::path::{Path, PathBuf};

use super::resolve;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Input .rcss file
    pub input: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn list(args: ListArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let input = resolve(cwd, &args.input);
    let document = Document::load_with(&input, &config.editor)?;

    match args.format.as_str() {
        "json" => {
            let sheets: Vec<&Spritesheet> = document.spritesheets().collect();
            println!("{}", serde_json::to_string_pretty(&sheets)?);
        }
        "text" => {
            for sheet in document.spritesheets() {
                print!("{}", describe(sheet));
            }
            for warning in document.warnings() {
                println!("{} {}", "warning:".yellow().bold(), warning.message);
            }
        }
        other => {
            return Err(anyhow::anyhow!(
                "Invalid format: {}. Use: text or json",
                other
            ))
        }
    }

    Ok(())
}

fn describe(sheet: &Spritesheet) -> String {
    let mut out = format!("{} {}", "@spritesheet".cyan(), sheet.name.bold());
    if let Some(range) = sheet.line_range {
        out.push_str(&format!(" (lines {}-{})", range.start, range.end));
    }
    out.push('\n');

    out.push_str(&format!("   src: {}\n", sheet.source));
    if let Some(resolution) = sheet.resolution {
        out.push_str(&format!("   resolution: {}x\n", resolution));
    }

    for sprite in sheet.sprites.iter() {
        let (x, y, width, height) = sprite.geometry();
        let mut flips = String::new();
        if sprite.is_flipped_x() {
            flips.push_str(" [flip x]");
        }
        if sprite.is_flipped_y() {
            flips.push_str(" [flip y]");
        }
        out.push_str(&format!(
            "   {} {},{} {}x{}{}\n",
            sprite.name, x, y, width, height, flips
        ));
    }

    out
}
