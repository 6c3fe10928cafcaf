//! # Undo/Redo History
//!
//! One history per spritesheet.
//!
//! - Commands are pushed after they have been applied
//! - Undo reverts the most recent command and moves it to the redo stack
//! - Redo reapplies it
//! - A new command clears the redo stack
//! - The oldest entries are dropped past `max_levels`

use tracing::debug;

use crate::commands::Command;
use crate::errors::CommandError;
use crate::spritesheet::Spritesheet;

#[derive(Debug)]
pub struct History {
    /// Applied commands (most recent last)
    undo_stack: Vec<Box<dyn Command>>,

    /// Undone commands (most recent last)
    redo_stack: Vec<Box<dyn Command>>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl History {
    /// Create a history that keeps every level
    pub fn new() -> Self {
        Self::with_max_levels(0)
    }

    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
        }
    }

    /// Record a command that has just been applied
    pub fn push(&mut self, command: Box<dyn Command>) {
        debug!(command = command.name(), "recorded");
        self.undo_stack.push(command);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        self.redo_stack.clear();
    }

    /// Revert the most recent command. Returns its description, or `None`
    /// when there is nothing to undo.
    pub fn undo(&mut self, sheet: &mut Spritesheet) -> Result<Option<String>, CommandError> {
        let Some(command) = self.undo_stack.pop() else {
            return Ok(None);
        };

        if let Err(err) = command.revert(sheet) {
            self.undo_stack.push(command);
            return Err(err);
        }

        let description = command.description();
        self.redo_stack.push(command);
        Ok(Some(description))
    }

    /// Reapply the most recently undone command
    pub fn redo(&mut self, sheet: &mut Spritesheet) -> Result<Option<String>, CommandError> {
        let Some(command) = self.redo_stack.pop() else {
            return Ok(None);
        };

        if let Err(err) = command.apply(sheet) {
            self.redo_stack.push(command);
            return Err(err);
        }

        let description = command.description();
        self.undo_stack.push(command);
        Ok(Some(description))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.last().map(|command| command.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(|command| command.description())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandSpec;
    use crate::sprite::Sprite;

    fn sheet() -> Spritesheet {
        let mut sheet = Spritesheet::new("test", "test.png");
        sheet.sprites.push(Sprite::new("a", 0, 0, 10, 10));
        sheet
    }

    fn apply(history: &mut History, sheet: &mut Spritesheet, spec: CommandSpec) {
        let command = spec.build(sheet).unwrap();
        command.apply(sheet).unwrap();
        history.push(command);
    }

    fn move_a(x: i32) -> CommandSpec {
        CommandSpec::ModifySprite {
            name: "a".to_string(),
            x,
            y: 0,
            width: 10,
            height: 10,
            rename: None,
        }
    }

    #[test]
    fn test_history_creation() {
        let history = History::new();
        assert_eq!(history.undo_levels(), 0);
        assert_eq!(history.redo_levels(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_apply_and_undo() {
        let mut sheet = sheet();
        let mut history = History::new();

        apply(&mut history, &mut sheet, move_a(5));
        assert_eq!(history.undo_levels(), 1);
        assert_eq!(history.undo_description().as_deref(), Some("Modify sprite a"));

        let undone = history.undo(&mut sheet).unwrap();
        assert_eq!(undone.as_deref(), Some("Modify sprite a"));
        assert_eq!(sheet.sprites.get("a").unwrap().x(), 0);
        assert!(history.can_redo());

        let redone = history.redo(&mut sheet).unwrap();
        assert!(redone.is_some());
        assert_eq!(sheet.sprites.get("a").unwrap().x(), 5);
        assert_eq!(history.redo_levels(), 0);
    }

    #[test]
    fn test_empty_undo_and_redo() {
        let mut sheet = sheet();
        let mut history = History::new();

        assert_eq!(history.undo(&mut sheet).unwrap(), None);
        assert_eq!(history.redo(&mut sheet).unwrap(), None);
    }

    #[test]
    fn test_new_command_clears_redo() {
        let mut sheet = sheet();
        let mut history = History::new();

        apply(&mut history, &mut sheet, move_a(5));
        history.undo(&mut sheet).unwrap();
        assert_eq!(history.redo_levels(), 1);

        apply(&mut history, &mut sheet, move_a(7));
        assert_eq!(history.redo_levels(), 0);
    }

    #[test]
    fn test_max_levels_enforced() {
        let mut sheet = sheet();
        let mut history = History::with_max_levels(2);

        for x in 1..=3 {
            apply(&mut history, &mut sheet, move_a(x));
        }

        assert_eq!(history.undo_levels(), 2);
        history.undo(&mut sheet).unwrap();
        history.undo(&mut sheet).unwrap();
        assert_eq!(sheet.sprites.get("a").unwrap().x(), 1);
    }
}
