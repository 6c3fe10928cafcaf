pub mod check;
pub mod edit;
pub mod fmt;
pub mod list;

pub use check::{check, CheckArgs};
pub use edit::{edit, EditArgs};
pub use fmt::{fmt, FmtArgs};
pub use list::{list, ListArgs};

use colored::Colorize;
use rcss_editor::Host;
use std::path::{Path, PathBuf};

/// Prints session status lines and accepts any existing image file
#[derive(Debug, Default)]
pub struct ConsoleHost;

impl Host for ConsoleHost {
    fn status(&mut self, message: &str) {
        println!("   {}", message.dimmed());
    }

    fn load_image(&mut self, path: &Path) -> Result<(), String> {
        if path.is_file() {
            Ok(())
        } else {
            Err(format!("{} does not exist", path.display()))
        }
    }
}

/// Resolve a command line path against the working directory
pub fn resolve(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
