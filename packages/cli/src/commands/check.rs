use anyhow::Result;
use clap::Args;
use colored::Colorize;
use rcss_editor::{Document, LoadError};
use rcss_parser::{format_errors, parse_rcss};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::resolve;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Input .rcss file or directory to check
    pub input: PathBuf,

    /// Also list files without problems
    #[arg(short = 'a', long)]
    pub all: bool,
}

#[derive(Debug, Default)]
struct Tally {
    files: usize,
    sheets: usize,
    failures: usize,
    warnings: usize,
}

pub fn check(args: CheckArgs, cwd: &Path) -> Result<()> {
    let config = Config::load(cwd)?;
    let input = resolve(cwd, &args.input);

    println!("🔍 {} RCSS check", "Starting".green().bold());
    println!("   Input: {}", input.display());
    println!();

    let files = if input.is_file() {
        vec![input.clone()]
    } else if input.is_dir() {
        let files = find_rcss_files(&input);
        println!("   Found {} .rcss files", files.len());
        println!();
        files
    } else {
        return Err(anyhow::anyhow!(
            "Input path does not exist: {}",
            input.display()
        ));
    };

    let mut tally = Tally::default();
    for file in &files {
        check_file(file, &config, args.all, &mut tally)?;
    }

    println!();
    println!(
        "✨ {} Check complete!",
        if tally.failures > 0 {
            "Done".red().bold()
        } else {
            "Done".green().bold()
        }
    );
    println!("   Files checked: {}", tally.files);
    println!("   Spritesheets: {}", tally.sheets);
    if tally.failures > 0 {
        println!("   {} {}", "Failures:".red(), tally.failures);
    }
    if tally.warnings > 0 {
        println!("   {} {}", "Warnings:".yellow(), tally.warnings);
    }

    if tally.failures > 0 {
        return Err(anyhow::anyhow!("{} file(s) failed to load", tally.failures));
    }

    Ok(())
}

fn check_file(path: &Path, config: &Config, all: bool, tally: &mut Tally) -> Result<()> {
    let source = fs::read_to_string(path)?;
    tally.files += 1;

    let parsed = parse_rcss(&source);
    if !parsed.errors.is_empty() {
        tally.failures += 1;
        eprintln!("{} {}", "✗".red(), path.display());
        eprint!(
            "{}",
            format_errors(&source, &path.to_string_lossy(), &parsed.errors)
        );
        return Ok(());
    }

    let basepath = path.parent().unwrap_or_else(|| Path::new(""));
    match Document::from_source_with(&source, basepath, &config.editor) {
        Ok(document) => {
            tally.sheets += document.len();
            tally.warnings += document.warnings().len();

            if document.warnings().is_empty() {
                if all {
                    println!("{} {}", "✓".green(), path.display());
                }
                return Ok(());
            }

            println!("{} {}", "!".yellow(), path.display());
            for warning in document.warnings() {
                let line = warning
                    .line
                    .map(|line| format!(":{}", line))
                    .unwrap_or_default();
                println!(
                    "  {} {}{} {}",
                    "warning".yellow().bold(),
                    warning.sheet,
                    line,
                    warning.message
                );
            }
        }
        Err(LoadError::NoSpritesheets) => {
            if all {
                println!("{} {} (no spritesheets)", "-".dimmed(), path.display());
            }
        }
        Err(err) => {
            tally.failures += 1;
            eprintln!("{} {}: {}", "✗".red(), path.display(), err);
        }
    }

    Ok(())
}

fn find_rcss_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().map(|e| e == "rcss").unwrap_or(false))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_rcss_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a.rcss"), "").unwrap();
        fs::write(dir.path().join("nested/b.rcss"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let files = find_rcss_files(dir.path());
        assert_eq!(
            files,
            vec![dir.path().join("a.rcss"), dir.path().join("nested/b.rcss")]
        );
    }

    #[test]
    fn test_check_counts_failures() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.rcss");
        let bad = dir.path().join("bad.rcss");
        fs::write(&good, "@spritesheet s { src: s.png; a: 0 0 1 1; b: 1 2; }").unwrap();
        fs::write(&bad, "@spritesheet s { a: 0 0 1 1; }").unwrap();

        let config = Config::default();
        let mut tally = Tally::default();
        check_file(&good, &config, false, &mut tally).unwrap();
        check_file(&bad, &config, false, &mut tally).unwrap();

        assert_eq!(tally.files, 2);
        assert_eq!(tally.sheets, 1);
        assert_eq!(tally.warnings, 1);
        assert_eq!(tally.failures, 1);
    }
}
