//! Error types for the editor

use std::path::PathBuf;

use rcss_parser::ParseError;
use thiserror::Error;

/// Why a document could not be loaded. A failed load never replaces the
/// current document.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} syntax error(s), first: {}", .0.len(), first_error(.0))]
    Syntax(Vec<ParseError>),

    #[error("No @spritesheet blocks found")]
    NoSpritesheets,

    #[error("Spritesheet {sheet} (line {line}): {}", .messages.join("; "))]
    Schema {
        sheet: String,
        line: usize,
        messages: Vec<String>,
    },
}

fn first_error(errors: &[ParseError]) -> String {
    errors
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

/// A command was refused. State is unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Sprite not found: {0}")]
    SpriteNotFound(String),

    #[error("A sprite named {0} already exists")]
    DuplicateSprite(String),

    #[error("Invalid name: '{0}'")]
    InvalidName(String),

    #[error("Invalid axis '{0}', expected x or y")]
    InvalidAxis(String),

    #[error("Resolution must be positive, got {0}")]
    InvalidResolution(f64),

    #[error("Failed to load image {path}: {reason}")]
    ImageLoad { path: PathBuf, reason: String },

    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    #[error("Invalid value for {property}: {reason}")]
    InvalidValue { property: String, reason: String },
}

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("{path} changed on disk since it was loaded (expected checksum {expected:08x}, found {found:08x})")]
    ChecksumMismatch {
        path: PathBuf,
        expected: u32,
        found: u32,
    },

    #[error("Failed to write backup {path}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Save error: {0}")]
    Save(#[from] SaveError),

    #[error("No document is loaded")]
    NoDocument,

    #[error("Spritesheet not found: {0}")]
    SheetNotFound(String),

    #[error("No spritesheet at index {index}, the document has {len}")]
    SheetIndexOutOfRange { index: usize, len: usize },
}
