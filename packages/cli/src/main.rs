mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{check, edit, fmt, list, CheckArgs, EditArgs, FmtArgs, ListArgs};
use tracing_subscriber::EnvFilter;

/// RCSS sprite editor - inspect and edit @spritesheet blocks
#[derive(Parser, Debug)]
#[command(name = "rcss")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse .rcss files and report problems
    Check(CheckArgs),

    /// List the spritesheets and sprites of a file
    List(ListArgs),

    /// Rewrite the spritesheets of a file in canonical form
    Fmt(FmtArgs),

    /// Apply edits to a spritesheet and save the file
    Edit(EditArgs),
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Check(args) => check(args, &cwd),
        Command::List(args) => list(args, &cwd),
        Command::Fmt(args) => fmt(args, &cwd),
        Command::Edit(args) => edit(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
