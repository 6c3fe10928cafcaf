//! # Document
//!
//! One RCSS file's spritesheets and their editing state.
//!
//! ## Lifecycle
//!
//! ```text
//! Load → Parse → Assemble → Issue commands → Save
//!   ↓      ↓        ↓             ↓            ↓
//! File  Rules  Spritesheets   Histories   Spliced file
//! ```
//!
//! Loading is all or nothing: a syntax error, a file without spritesheets or
//! a sheet missing a required property rejects the whole file.

use std::path::{Path, PathBuf};

use rcss_parser::{parse_rcss, SpritesheetIssue, SpritesheetRule};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::commands::{CommandSpec, Issued};
use crate::errors::{CommandError, LoadError};
use crate::history::History;
use crate::host::Host;
use crate::options::EditorOptions;
use crate::sprite::Sprite;
use crate::spritesheet::{LineRange, Spritesheet};

/// CRC32 of a file's bytes, used to notice edits made behind our back
pub fn checksum(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}

/// A non-fatal problem found while loading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadWarning {
    pub sheet: String,
    pub line: Option<usize>,
    pub message: String,
}

#[derive(Debug)]
struct Entry {
    sheet: Spritesheet,
    history: History,
}

#[derive(Debug)]
pub struct Document {
    entries: Vec<Entry>,
    active: usize,

    /// File the document was loaded from or last saved to. `None` is untitled.
    path: Option<PathBuf>,

    /// Checksum of that file as of the last load or save
    checksum: Option<u32>,

    dirty: bool,
    warnings: Vec<LoadWarning>,
}

impl Document {
    /// Build a document from sheets created in memory (e.g. by an image
    /// packer). The result is untitled.
    pub fn new(sheets: Vec<Spritesheet>, options: &EditorOptions) -> Result<Self, LoadError> {
        if sheets.is_empty() {
            return Err(LoadError::NoSpritesheets);
        }

        Ok(Self {
            entries: sheets
                .into_iter()
                .map(|sheet| Entry {
                    sheet,
                    history: History::with_max_levels(options.history_limit),
                })
                .collect(),
            active: 0,
            path: None,
            checksum: None,
            dirty: false,
            warnings: Vec::new(),
        })
    }

    /// Parse in-memory text. Image paths resolve against the working directory.
    pub fn from_source(source: &str) -> Result<Self, LoadError> {
        Self::from_source_with(source, Path::new(""), &EditorOptions::default())
    }

    /// Parse text whose image paths are relative to `basepath`
    pub fn from_source_with(
        source: &str,
        basepath: &Path,
        options: &EditorOptions,
    ) -> Result<Self, LoadError> {
        let parsed = parse_rcss(source);
        if !parsed.errors.is_empty() {
            return Err(LoadError::Syntax(parsed.errors));
        }

        let mut sheets = Vec::new();
        let mut warnings = Vec::new();

        for rule in parsed.into_spritesheets() {
            warnings.extend(rule.warnings().map(|issue| LoadWarning {
                sheet: rule.name.clone(),
                line: issue.line(),
                message: issue.to_string(),
            }));
            sheets.push(assemble(rule, basepath)?);
        }

        for warning in &warnings {
            warn!(sheet = %warning.sheet, line = ?warning.line, "{}", warning.message);
        }

        let mut document = Self::new(sheets, options)?;
        document.warnings = warnings;
        Ok(document)
    }

    /// Load a file, recording its checksum for the in-place writer
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::load_with(path, &EditorOptions::default())
    }

    pub fn load_with(path: impl AsRef<Path>, options: &EditorOptions) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let basepath = path.parent().unwrap_or_else(|| Path::new(""));

        let mut document = Self::from_source_with(&source, basepath, options)?;
        document.path = Some(path.to_path_buf());
        document.checksum = Some(checksum(source.as_bytes()));

        info!(
            path = %path.display(),
            sheets = document.entries.len(),
            "loaded document"
        );
        Ok(document)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn checksum(&self) -> Option<u32> {
        self.checksum
    }

    /// Whether there are unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn spritesheets(&self) -> impl Iterator<Item = &Spritesheet> {
        self.entries.iter().map(|entry| &entry.sheet)
    }

    pub fn spritesheet(&self, index: usize) -> Option<&Spritesheet> {
        self.entries.get(index).map(|entry| &entry.sheet)
    }

    pub fn find_spritesheet(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.sheet.name == name)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_sheet(&self) -> &Spritesheet {
        &self.entries[self.active].sheet
    }

    pub fn active_history(&self) -> &History {
        &self.entries[self.active].history
    }

    pub fn history(&self, index: usize) -> Option<&History> {
        self.entries.get(index).map(|entry| &entry.history)
    }

    /// Make another sheet the target of commands. Histories are kept.
    pub fn set_active(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        self.active = index;
        true
    }

    pub fn select_sprite(&mut self, name: &str) -> bool {
        self.entries[self.active].sheet.sprites.select(name)
    }

    pub fn clear_selection(&mut self) {
        self.entries[self.active].sheet.sprites.clear_selection();
    }

    /// Build, check and apply a command against the active sheet
    pub fn issue(&mut self, spec: &CommandSpec, host: &mut dyn Host) -> Result<Issued, CommandError> {
        let entry = &mut self.entries[self.active];
        let command = spec.build(&entry.sheet)?;

        if let Some(reason) = command.noop_reason() {
            debug!(command = command.name(), "ignored: {}", reason);
            return Ok(Issued::Ignored(reason.to_string()));
        }

        command.validate(&entry.sheet, host)?;
        command.apply(&mut entry.sheet)?;

        let description = command.description();
        entry.history.push(command);
        self.dirty = true;

        Ok(Issued::Applied(description))
    }

    pub fn can_undo(&self) -> bool {
        self.active_history().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.active_history().can_redo()
    }

    pub fn undo(&mut self) -> Result<Option<String>, CommandError> {
        let entry = &mut self.entries[self.active];
        let undone = entry.history.undo(&mut entry.sheet)?;
        if undone.is_some() {
            self.dirty = true;
        }
        Ok(undone)
    }

    pub fn redo(&mut self) -> Result<Option<String>, CommandError> {
        let entry = &mut self.entries[self.active];
        let redone = entry.history.redo(&mut entry.sheet)?;
        if redone.is_some() {
            self.dirty = true;
        }
        Ok(redone)
    }

    /// Every sheet, in order, separated by a blank line
    pub fn serialize_all(&self) -> String {
        self.spritesheets()
            .map(Spritesheet::serialize)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Record a successful write: all sheets now share `range` in `path`
    pub(crate) fn mark_saved(&mut self, path: &Path, checksum: u32, range: LineRange) {
        for entry in &mut self.entries {
            entry.sheet.line_range = Some(range);
        }
        self.path = Some(path.to_path_buf());
        self.checksum = Some(checksum);
        self.dirty = false;
    }
}

/// Turn one parsed block into a sheet, or name what makes it unusable
fn assemble(rule: SpritesheetRule, basepath: &Path) -> Result<Spritesheet, LoadError> {
    let fatal: Vec<String> = rule.fatal_issues().map(SpritesheetIssue::to_string).collect();
    let source = rule
        .source()
        .filter(|_| fatal.is_empty())
        .map(str::to_string);
    let Some(source) = source else {
        return Err(LoadError::Schema {
            sheet: rule.name,
            line: rule.line,
            messages: fatal,
        });
    };

    let mut sheet = Spritesheet::new(rule.name.clone(), source).with_basepath(basepath);
    sheet.resolution = rule.resolution();
    sheet.line_range = Some(LineRange::new(rule.line, rule.end_line));
    for decl in &rule.sprites {
        sheet.sprites.push(Sprite::from_decl(decl));
    }

    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::DefaultHost;

    const HUD: &str = "@spritesheet hud { src: hud.png; resolution: 2x; cursor: 10px 20px 30px 40px; }";

    #[test]
    fn test_load_hud() {
        let doc = Document::from_source(HUD).unwrap();

        assert_eq!(doc.len(), 1);
        assert!(!doc.is_dirty());
        assert!(doc.path().is_none());

        let sheet = doc.active_sheet();
        assert_eq!(sheet.name, "hud");
        assert_eq!(sheet.source, "hud.png");
        assert_eq!(sheet.resolution, Some(2.0));
        assert_eq!(sheet.line_range, Some(LineRange::new(1, 1)));

        let cursor = sheet.sprites.get("cursor").unwrap();
        assert_eq!(cursor.geometry(), (10, 20, 30, 40));
        assert!(!cursor.is_flipped_x() && !cursor.is_flipped_y());
        assert!(doc.warnings().is_empty());
    }

    #[test]
    fn test_load_failures() {
        assert!(matches!(
            Document::from_source("body { color: red; }"),
            Err(LoadError::NoSpritesheets)
        ));
        assert!(matches!(
            Document::from_source("@spritesheet a { src: a.png; } }"),
            Err(LoadError::Syntax(_))
        ));

        match Document::from_source("@spritesheet ok { src: a.png; }\n@spritesheet broken { a: 0 0 1 1; }") {
            Err(LoadError::Schema { sheet, line, messages }) => {
                assert_eq!(sheet, "broken");
                assert_eq!(line, 2);
                assert_eq!(messages, vec!["Missing required property 'src'".to_string()]);
            }
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_declaration_issues_become_warnings() {
        let doc = Document::from_source("@spritesheet a {\n src: a.png;\n bad: 1 2 3;\n ok: 1 2 3 4;\n}").unwrap();

        assert_eq!(doc.active_sheet().sprites.len(), 1);
        assert_eq!(
            doc.warnings(),
            &[LoadWarning {
                sheet: "a".to_string(),
                line: Some(3),
                message: "Sprite bad has 3 props, expected 4".to_string(),
            }]
        );
    }

    #[test]
    fn test_issue_marks_dirty_and_ignores_noops() {
        let mut doc = Document::from_source(HUD).unwrap();
        let mut host = DefaultHost;

        let same = doc
            .issue(&CommandSpec::SetResolution { resolution: Some(2.0) }, &mut host)
            .unwrap();
        assert!(!same.is_applied());
        assert_eq!(doc.active_history().undo_levels(), 0);
        assert!(!doc.is_dirty());

        let changed = doc
            .issue(&CommandSpec::SetResolution { resolution: Some(1.0) }, &mut host)
            .unwrap();
        assert_eq!(changed, Issued::Applied("Set resolution from 2x to 1x".to_string()));
        assert!(doc.is_dirty());
        assert!(doc.can_undo());
    }

    #[test]
    fn test_histories_are_per_sheet() {
        let mut doc = Document::from_source(
            "@spritesheet a { src: a.png; }\n@spritesheet b { src: b.png; }",
        )
        .unwrap();
        let mut host = DefaultHost;
        let create = CommandSpec::CreateSprite {
            name: "s".to_string(),
            x: 0,
            y: 0,
            width: 1,
            height: 1,
        };

        doc.issue(&create, &mut host).unwrap();
        assert!(doc.set_active(1));
        assert!(!doc.can_undo());
        doc.issue(&create, &mut host).unwrap();

        assert_eq!(doc.history(0).unwrap().undo_levels(), 1);
        assert_eq!(doc.history(1).unwrap().undo_levels(), 1);
        assert!(!doc.set_active(2));

        doc.undo().unwrap();
        assert!(doc.spritesheet(1).unwrap().sprites.is_empty());
        assert_eq!(doc.spritesheet(0).unwrap().sprites.len(), 1);
    }

    #[test]
    fn test_default_history_undoes_every_command() {
        let mut doc = Document::from_source(HUD).unwrap();
        let mut host = DefaultHost;

        for i in 0..150 {
            let create = CommandSpec::CreateSprite {
                name: format!("s{}", i),
                x: 0,
                y: 0,
                width: 1,
                height: 1,
            };
            assert!(doc.issue(&create, &mut host).unwrap().is_applied());
        }
        assert_eq!(doc.active_history().undo_levels(), 150);

        let mut undone = 0;
        while doc.undo().unwrap().is_some() {
            undone += 1;
        }
        assert_eq!(undone, 150);
        assert_eq!(doc.active_sheet().sprites.len(), 1);
        assert!(doc.active_sheet().sprites.get("cursor").is_some());
    }

    #[test]
    fn test_load_non_ascii_selector_and_bom() {
        let source = ".título { color: red; }\n@spritesheet hud { src: hud.png; ícone: 0 0 8 8; }\n";
        let doc = Document::from_source(source).unwrap();
        assert_eq!(doc.active_sheet().line_range, Some(LineRange::new(2, 2)));
        assert!(doc.active_sheet().sprites.get("ícone").is_some());

        let with_bom = format!("\u{FEFF}{}", HUD);
        let doc = Document::from_source(&with_bom).unwrap();
        assert_eq!(doc.active_sheet().name, "hud");
        assert_eq!(doc.active_sheet().line_range, Some(LineRange::new(1, 1)));
    }

    #[test]
    fn test_serialize_all_separates_sheets() {
        let doc = Document::from_source(
            "@spritesheet a { src: a.png; }\n@spritesheet b { src: b.png; }",
        )
        .unwrap();

        let text = doc.serialize_all();
        assert!(text.contains("}\n\n@spritesheet b"));
        assert_eq!(Document::from_source(&text).unwrap().len(), 2);
    }

    #[test]
    fn test_new_requires_a_sheet() {
        assert!(matches!(
            Document::new(Vec::new(), &EditorOptions::default()),
            Err(LoadError::NoSpritesheets)
        ));

        let doc = Document::new(
            vec![Spritesheet::new("packed", "atlas.png")],
            &EditorOptions::default(),
        )
        .unwrap();
        assert_eq!(doc.active_sheet().line_range, None);
    }
}
