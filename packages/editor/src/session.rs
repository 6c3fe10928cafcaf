//! # Edit Session
//!
//! Owns the loaded document and the host it reports to. Every outcome
//! (applied, ignored, refused, saved) is also sent to the host's status sink.

use std::path::Path;

use crate::commands::{CommandSpec, Issued};
use crate::document::Document;
use crate::errors::{EditorError, LoadError, SaveError};
use crate::host::{DefaultHost, Host};
use crate::options::EditorOptions;
use crate::writer::{self, Overwrite, SaveReport};

pub struct Session {
    document: Option<Document>,
    host: Box<dyn Host>,
    options: EditorOptions,
}

impl Session {
    pub fn new(host: Box<dyn Host>, options: EditorOptions) -> Self {
        Self {
            document: None,
            host,
            options,
        }
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn host_mut(&mut self) -> &mut dyn Host {
        self.host.as_mut()
    }

    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    pub fn document(&self) -> Result<&Document, EditorError> {
        self.document.as_ref().ok_or(EditorError::NoDocument)
    }

    pub fn document_mut(&mut self) -> Result<&mut Document, EditorError> {
        self.document.as_mut().ok_or(EditorError::NoDocument)
    }

    /// Parse text into a new untitled document. On failure the current
    /// document stays as it was.
    pub fn load_str(&mut self, text: &str) -> Result<&Document, EditorError> {
        let loaded = Document::from_source_with(text, Path::new(""), &self.options);
        self.replace(loaded)
    }

    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<&Document, EditorError> {
        let loaded = Document::load_with(path, &self.options);
        self.replace(loaded)
    }

    /// Adopt a document built elsewhere, e.g. by an image packer
    pub fn open(&mut self, document: Document) -> &Document {
        self.document.insert(document)
    }

    fn replace(
        &mut self,
        loaded: Result<Document, LoadError>,
    ) -> Result<&Document, EditorError> {
        let document = match loaded {
            Ok(document) => document,
            Err(err) => {
                self.host.status(&format!("Failed to load: {}", err));
                return Err(err.into());
            }
        };

        self.host.status(&format!(
            "Loaded {} spritesheet(s)",
            document.len()
        ));
        for warning in document.warnings() {
            self.host.status(&warning.message);
        }

        Ok(&*self.document.insert(document))
    }

    pub fn issue(&mut self, spec: &CommandSpec) -> Result<Issued, EditorError> {
        let document = self.document.as_mut().ok_or(EditorError::NoDocument)?;

        match document.issue(spec, self.host.as_mut()) {
            Ok(issued) => {
                self.host.status(issued.message());
                Ok(issued)
            }
            Err(err) => {
                self.host.status(&err.to_string());
                Err(err.into())
            }
        }
    }

    pub fn undo(&mut self) -> Result<Option<String>, EditorError> {
        let undone = self.document_mut()?.undo()?;
        match &undone {
            Some(description) => self.host.status(&format!("Undo: {}", description)),
            None => self.host.status("Nothing to undo"),
        }
        Ok(undone)
    }

    pub fn redo(&mut self) -> Result<Option<String>, EditorError> {
        let redone = self.document_mut()?.redo()?;
        match &redone {
            Some(description) => self.host.status(&format!("Redo: {}", description)),
            None => self.host.status("Nothing to redo"),
        }
        Ok(redone)
    }

    /// Make the named sheet the target of commands
    pub fn select_sheet(&mut self, name: &str) -> Result<(), EditorError> {
        let document = self.document_mut()?;
        let index = document
            .find_spritesheet(name)
            .ok_or_else(|| EditorError::SheetNotFound(name.to_string()))?;
        document.set_active(index);
        Ok(())
    }

    /// Make the sheet at `index` the target of commands. Unnamed sheets can
    /// only be reached this way.
    pub fn select_sheet_index(&mut self, index: usize) -> Result<(), EditorError> {
        let document = self.document_mut()?;
        if document.set_active(index) {
            return Ok(());
        }
        Err(EditorError::SheetIndexOutOfRange {
            index,
            len: document.len(),
        })
    }

    pub fn serialize_all(&self) -> Result<String, EditorError> {
        Ok(self.document()?.serialize_all())
    }

    pub fn save_in_place(
        &mut self,
        path: impl AsRef<Path>,
        overwrite: Overwrite,
    ) -> Result<SaveReport, EditorError> {
        let document = self.document.as_mut().ok_or(EditorError::NoDocument)?;
        let result = writer::save_in_place(document, path.as_ref(), overwrite, &self.options);
        self.report_save(result)
    }

    pub fn save_as_new(&mut self, path: impl AsRef<Path>) -> Result<SaveReport, EditorError> {
        let document = self.document.as_mut().ok_or(EditorError::NoDocument)?;
        let result = writer::save_as_new(document, path.as_ref());
        self.report_save(result)
    }

    fn report_save(
        &mut self,
        result: Result<SaveReport, SaveError>,
    ) -> Result<SaveReport, EditorError> {
        match &result {
            Ok(report) => self
                .host
                .status(&format!("Saved {}", report.path.display())),
            Err(SaveError::ChecksumMismatch { path, .. }) => self.host.status(&format!(
                "{} was modified outside the editor; confirm to overwrite it",
                path.display()
            )),
            Err(err) => self.host.status(&err.to_string()),
        }
        Ok(result?)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Box::new(DefaultHost), EditorOptions::default())
    }
}
