//! # RCSS Sprite Editor
//!
//! Editing engine for `@spritesheet` blocks in RCSS files.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: .rcss text → spritesheet rules      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: Document lifecycle + commands       │
//! │  - Load documents (all or nothing)          │
//! │  - Issue commands with per-sheet undo       │
//! │  - Splice edited blocks back into the file  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ host: status messages + image loading       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rcss_editor::{CommandSpec, Overwrite, Session};
//!
//! let mut session = Session::default();
//! session.load_path("ui/hud.rcss")?;
//!
//! session.issue(&CommandSpec::FlipSprite {
//!     name: "cursor".to_string(),
//!     axis: "x".to_string(),
//! })?;
//! session.undo()?;
//!
//! session.save_in_place("ui/hud.rcss", Overwrite::Guarded)?;
//! ```

mod commands;
mod document;
mod errors;
mod history;
mod host;
mod options;
mod property;
mod session;
mod sprite;
mod spritesheet;
mod writer;

pub use commands::{Command, CommandSpec, Issued};
pub use document::{checksum, Document, LoadWarning};
pub use errors::{CommandError, EditorError, LoadError, SaveError};
pub use history::History;
pub use host::{DefaultHost, Host};
pub use options::EditorOptions;
pub use property::{
    sprite_property, spritesheet_property, Property, PropertyTarget, PropertyValue, ValueKind,
    SPRITESHEET_PROPERTIES, SPRITE_PROPERTIES,
};
pub use session::Session;
pub use sprite::{Axis, Sprite};
pub use spritesheet::{
    is_identifier, is_valid_sprite_name, sprite_id_from_path, LineRange, SpriteList, Spritesheet,
};
pub use writer::{backup_path, save_as_new, save_in_place, Overwrite, SaveReport};
