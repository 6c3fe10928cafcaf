//! Collaborators the editing core reports to
//!
//! Status messages and image loading belong to whatever embeds the editor (a
//! window, a CLI, a test). They are passed in explicitly.

use std::path::Path;

use tracing::info;

pub trait Host {
    /// Informational message for the user
    fn status(&mut self, message: &str);

    /// Load the image a sheet is about to point at
    fn load_image(&mut self, path: &Path) -> Result<(), String>;
}

/// Logs status through tracing and accepts any existing file as an image
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHost;

impl Host for DefaultHost {
    fn status(&mut self, message: &str) {
        info!("{}", message);
    }

    fn load_image(&mut self, path: &Path) -> Result<(), String> {
        if path.is_file() {
            Ok(())
        } else {
            Err(format!("{} is not a file", path.display()))
        }
    }
}
