//! # Commands
//!
//! Every change to a spritesheet is a command that knows how to apply and
//! revert itself.
//!
//! ## Admission
//!
//! 1. [`CommandSpec::build`] reads the current state and captures the
//!    previous values. Callers never supply "old" values.
//! 2. [`Command::noop_reason`]: a command that would change nothing is
//!    reported as ignored and never reaches the history.
//! 3. [`Command::validate`] checks domain rules (unique names, axis, image
//!    loads). A failure is a [`CommandError`] and nothing is mutated.
//! 4. [`Command::apply`], then the command is pushed onto the history.
//!
//! `apply` and `revert` are exact inverses, including list positions and
//! selection.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::CommandError;
use crate::host::Host;
use crate::property::{
    sprite_property, spritesheet_property, Property, PropertyTarget, PropertyValue,
};
use crate::sprite::{Axis, Sprite};
use crate::spritesheet::{is_identifier, is_valid_sprite_name, Spritesheet};

const SAME_VALUE: &str = "Old and new value are the same, ignoring";
const SAME_IMAGE: &str = "Selected image has already been loaded, ignoring";

/// A reversible change to one spritesheet
pub trait Command: fmt::Debug {
    /// Human-readable summary, shown in status messages and undo labels
    fn description(&self) -> String;

    /// Why applying this command would change nothing, if it wouldn't
    fn noop_reason(&self) -> Option<&'static str> {
        None
    }

    /// Check preconditions against the sheet the command will be applied to
    fn validate(&self, _sheet: &Spritesheet, _host: &mut dyn Host) -> Result<(), CommandError> {
        Ok(())
    }

    fn apply(&self, sheet: &mut Spritesheet) -> Result<(), CommandError>;

    fn revert(&self, sheet: &mut Spritesheet) -> Result<(), CommandError>;

    /// Debug name
    fn name(&self) -> &'static str;
}

/// Outcome of issuing a command that was not refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issued {
    /// Applied and recorded in history
    Applied(String),
    /// A no-op. Nothing was recorded.
    Ignored(String),
}

impl Issued {
    pub fn is_applied(&self) -> bool {
        matches!(self, Issued::Applied(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Issued::Applied(message) | Issued::Ignored(message) => message,
        }
    }
}

/// What the user asked for, before it is bound to the current state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandSpec {
    CreateSprite {
        name: String,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    },
    DeleteSprite {
        name: String,
    },
    /// New geometry, optionally with a new name
    ModifySprite {
        name: String,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        #[serde(default)]
        rename: Option<String>,
    },
    FlipSprite {
        name: String,
        axis: String,
    },
    /// Point the sheet at another image. Only the file name is kept.
    SetImage {
        path: PathBuf,
    },
    SetResolution {
        resolution: Option<f64>,
    },
    SetProperty {
        target: PropertyTarget,
        property: String,
        value: String,
    },
}

impl CommandSpec {
    /// Bind the request to `sheet`, capturing the state it will replace
    pub fn build(&self, sheet: &Spritesheet) -> Result<Box<dyn Command>, CommandError> {
        let command: Box<dyn Command> = match self {
            CommandSpec::CreateSprite {
                name,
                x,
                y,
                width,
                height,
            } => Box::new(CreateSprite {
                sprite: Sprite::new(name.clone(), *x, *y, *width, *height),
            }),

            CommandSpec::DeleteSprite { name } => {
                let (index, sprite) = sprite_snapshot(sheet, name)?;
                Box::new(DeleteSprite {
                    was_selected: sheet.sprites.selected_name() == Some(name.as_str()),
                    sprite,
                    index,
                })
            }

            CommandSpec::ModifySprite {
                name,
                x,
                y,
                width,
                height,
                rename,
            } => {
                let (index, before) = sprite_snapshot(sheet, name)?;
                let mut after = before.clone();
                after.set_geometry(*x, *y, *width, *height);
                if let Some(rename) = rename {
                    after.name = rename.clone();
                }
                Box::new(ModifySprite {
                    index,
                    before,
                    after,
                })
            }

            CommandSpec::FlipSprite { name, axis } => Box::new(FlipSprite {
                index: find_sprite(sheet, name)?,
                name: name.clone(),
                axis: axis.clone(),
            }),

            CommandSpec::SetImage { path } => {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| CommandError::InvalidValue {
                        property: "src".to_string(),
                        reason: format!("{} has no file name", path.display()),
                    })?;
                let image = if path.is_relative() {
                    sheet.basepath.join(path)
                } else {
                    path.clone()
                };
                Box::new(SetImage {
                    before: sheet.source.clone(),
                    after: file_name,
                    image,
                })
            }

            CommandSpec::SetResolution { resolution } => Box::new(SetResolution {
                before: sheet.resolution,
                after: *resolution,
            }),

            CommandSpec::SetProperty {
                target: PropertyTarget::Spritesheet,
                property,
                value,
            } => {
                let property = spritesheet_property(property)
                    .ok_or_else(|| CommandError::UnknownProperty(property.clone()))?;
                let after = parse_value(property, value)?;
                Box::new(SetSheetProperty {
                    property,
                    before: (property.get)(sheet),
                    after,
                })
            }

            CommandSpec::SetProperty {
                target: PropertyTarget::Sprite(name),
                property,
                value,
            } => {
                let property = sprite_property(property)
                    .ok_or_else(|| CommandError::UnknownProperty(property.clone()))?;
                let value = parse_value(property, value)?;
                let (index, before) = sprite_snapshot(sheet, name)?;
                let mut after = before.clone();
                (property.set)(&mut after, &value);
                Box::new(SetSpriteProperty {
                    property,
                    index,
                    value,
                    before,
                    after,
                })
            }
        };

        Ok(command)
    }
}

fn find_sprite(sheet: &Spritesheet, name: &str) -> Result<usize, CommandError> {
    sheet
        .sprites
        .index_of(name)
        .ok_or_else(|| CommandError::SpriteNotFound(name.to_string()))
}

fn sprite_snapshot(sheet: &Spritesheet, name: &str) -> Result<(usize, Sprite), CommandError> {
    let index = find_sprite(sheet, name)?;
    let sprite = sheet
        .sprites
        .get_index(index)
        .cloned()
        .ok_or_else(|| CommandError::SpriteNotFound(name.to_string()))?;
    Ok((index, sprite))
}

fn parse_value<T>(property: &Property<T>, value: &str) -> Result<PropertyValue, CommandError> {
    PropertyValue::parse(property.kind, value).map_err(|reason| CommandError::InvalidValue {
        property: property.name.to_string(),
        reason,
    })
}

/// A rename must keep names unique and writable
fn check_rename(sheet: &Spritesheet, before: &str, after: &str) -> Result<(), CommandError> {
    if before == after {
        return Ok(());
    }
    if !is_valid_sprite_name(after) {
        return Err(CommandError::InvalidName(after.to_string()));
    }
    if sheet.sprites.contains(after) {
        return Err(CommandError::DuplicateSprite(after.to_string()));
    }
    Ok(())
}

fn replace_sprite(sheet: &mut Spritesheet, index: usize, sprite: &Sprite) -> Result<(), CommandError> {
    let name = sprite.name.clone();
    sheet
        .sprites
        .replace(index, sprite.clone())
        .map(|_| ())
        .ok_or(CommandError::SpriteNotFound(name))
}

#[derive(Debug)]
pub struct CreateSprite {
    sprite: Sprite,
}

impl Command for CreateSprite {
    fn description(&self) -> String {
        format!("Create sprite {}", self.sprite.name)
    }

    fn validate(&self, sheet: &Spritesheet, _host: &mut dyn Host) -> Result<(), CommandError> {
        if !is_valid_sprite_name(&self.sprite.name) {
            return Err(CommandError::InvalidName(self.sprite.name.clone()));
        }
        if sheet.sprites.contains(&self.sprite.name) {
            return Err(CommandError::DuplicateSprite(self.sprite.name.clone()));
        }
        Ok(())
    }

    fn apply(&self, sheet: &mut Spritesheet) -> Result<(), CommandError> {
        if sheet.sprites.push(self.sprite.clone()) {
            Ok(())
        } else {
            Err(CommandError::DuplicateSprite(self.sprite.name.clone()))
        }
    }

    fn revert(&self, sheet: &mut Spritesheet) -> Result<(), CommandError> {
        sheet
            .sprites
            .remove(&self.sprite.name)
            .map(|_| ())
            .ok_or_else(|| CommandError::SpriteNotFound(self.sprite.name.clone()))
    }

    fn name(&self) -> &'static str {
        "CreateSprite"
    }
}

#[derive(Debug)]
pub struct DeleteSprite {
    sprite: Sprite,
    index: usize,
    was_selected: bool,
}

impl Command for DeleteSprite {
    fn description(&self) -> String {
        format!("Delete sprite {}", self.sprite.name)
    }

    fn apply(&self, sheet: &mut Spritesheet) -> Result<(), CommandError> {
        sheet
            .sprites
            .remove(&self.sprite.name)
            .map(|_| ())
            .ok_or_else(|| CommandError::SpriteNotFound(self.sprite.name.clone()))
    }

    fn revert(&self, sheet: &mut Spritesheet) -> Result<(), CommandError> {
        if !sheet.sprites.insert(self.index, self.sprite.clone()) {
            return Err(CommandError::DuplicateSprite(self.sprite.name.clone()));
        }
        if self.was_selected {
            sheet.sprites.select(&self.sprite.name);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "DeleteSprite"
    }
}

/// Geometry and name change, applied and reverted as one unit
#[derive(Debug)]
pub struct ModifySprite {
    index: usize,
    before: Sprite,
    after: Sprite,
}

impl Command for ModifySprite {
    fn description(&self) -> String {
        if self.before.name == self.after.name {
            format!("Modify sprite {}", self.before.name)
        } else {
            format!("Modify sprite {} (renamed to {})", self.before.name, self.after.name)
        }
    }

    fn noop_reason(&self) -> Option<&'static str> {
        (self.before == self.after).then_some(SAME_VALUE)
    }

    fn validate(&self, sheet: &Spritesheet, _host: &mut dyn Host) -> Result<(), CommandError> {
        check_rename(sheet, &self.before.name, &self.after.name)
    }

    fn apply(&self, sheet: &mut Spritesheet) -> Result<(), CommandError> {
        replace_sprite(sheet, self.index, &self.after)
    }

    fn revert(&self, sheet: &mut Spritesheet) -> Result<(), CommandError> {
        replace_sprite(sheet, self.index, &self.before)
    }

    fn name(&self) -> &'static str {
        "ModifySprite"
    }
}

/// Toggle one flip flag. Its own inverse.
#[derive(Debug)]
pub struct FlipSprite {
    index: usize,
    name: String,
    axis: String,
}

impl FlipSprite {
    fn toggle(&self, sheet: &mut Spritesheet) -> Result<(), CommandError> {
        let axis = Axis::parse(&self.axis)
            .ok_or_else(|| CommandError::InvalidAxis(self.axis.clone()))?;
        let sprite = sheet
            .sprites
            .get_index_mut(self.index)
            .ok_or_else(|| CommandError::SpriteNotFound(self.name.clone()))?;
        sprite.flip(axis);
        Ok(())
    }
}

impl Command for FlipSprite {
    fn description(&self) -> String {
        format!("Flip sprite {} on {}", self.name, self.axis)
    }

    fn validate(&self, _sheet: &Spritesheet, _host: &mut dyn Host) -> Result<(), CommandError> {
        Axis::parse(&self.axis)
            .map(|_| ())
            .ok_or_else(|| CommandError::InvalidAxis(self.axis.clone()))
    }

    fn apply(&self, sheet: &mut Spritesheet) -> Result<(), CommandError> {
        self.toggle(sheet)
    }

    fn revert(&self, sheet: &mut Spritesheet) -> Result<(), CommandError> {
        self.toggle(sheet)
    }

    fn name(&self) -> &'static str {
        "FlipSprite"
    }
}

#[derive(Debug)]
pub struct SetImage {
    before: String,
    after: String,
    /// Path handed to the host for loading
    image: PathBuf,
}

impl Command for SetImage {
    fn description(&self) -> String {
        format!("Set src from {} to {}", self.before, self.after)
    }

    fn noop_reason(&self) -> Option<&'static str> {
        (self.before == self.after).then_some(SAME_IMAGE)
    }

    fn validate(&self, _sheet: &Spritesheet, host: &mut dyn Host) -> Result<(), CommandError> {
        host.load_image(&self.image)
            .map_err(|reason| CommandError::ImageLoad {
                path: self.image.clone(),
                reason,
            })
    }

    fn apply(&self, sheet: &mut Spritesheet) -> Result<(), CommandError> {
        sheet.source = self.after.clone();
        Ok(())
    }

    fn revert(&self, sheet: &mut Spritesheet) -> Result<(), CommandError> {
        sheet.source = self.before.clone();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "SetImage"
    }
}

#[derive(Debug)]
pub struct SetResolution {
    before: Option<f64>,
    after: Option<f64>,
}

impl Command for SetResolution {
    fn description(&self) -> String {
        let show = |r: Option<f64>| r.map_or_else(|| "none".to_string(), |r| format!("{}x", r));
        format!("Set resolution from {} to {}", show(self.before), show(self.after))
    }

    fn noop_reason(&self) -> Option<&'static str> {
        (self.before == self.after).then_some(SAME_VALUE)
    }

    fn validate(&self, _sheet: &Spritesheet, _host: &mut dyn Host) -> Result<(), CommandError> {
        match self.after {
            Some(r) if !(r.is_finite() && r > 0.0) => Err(CommandError::InvalidResolution(r)),
            _ => Ok(()),
        }
    }

    fn apply(&self, sheet: &mut Spritesheet) -> Result<(), CommandError> {
        sheet.resolution = self.after;
        Ok(())
    }

    fn revert(&self, sheet: &mut Spritesheet) -> Result<(), CommandError> {
        sheet.resolution = self.before;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "SetResolution"
    }
}

/// Replace one sheet field through its accessors
#[derive(Debug)]
pub struct SetSheetProperty {
    property: &'static Property<Spritesheet>,
    before: PropertyValue,
    after: PropertyValue,
}

impl Command for SetSheetProperty {
    fn description(&self) -> String {
        format!(
            "Set {} from {} to {}",
            self.property.name, self.before, self.after
        )
    }

    fn noop_reason(&self) -> Option<&'static str> {
        (self.before == self.after).then_some(SAME_VALUE)
    }

    fn validate(&self, _sheet: &Spritesheet, _host: &mut dyn Host) -> Result<(), CommandError> {
        match (self.property.name, &self.after) {
            ("name", PropertyValue::Text(name)) if !is_identifier(name) => {
                Err(CommandError::InvalidName(name.clone()))
            }
            ("src", PropertyValue::Text(source)) if source.is_empty() => {
                Err(CommandError::InvalidValue {
                    property: "src".to_string(),
                    reason: "src is required".to_string(),
                })
            }
            (_, PropertyValue::OptionalNumber(Some(r))) if *r <= 0.0 => {
                Err(CommandError::InvalidResolution(*r))
            }
            _ => Ok(()),
        }
    }

    fn apply(&self, sheet: &mut Spritesheet) -> Result<(), CommandError> {
        (self.property.set)(sheet, &self.after);
        Ok(())
    }

    fn revert(&self, sheet: &mut Spritesheet) -> Result<(), CommandError> {
        (self.property.set)(sheet, &self.before);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "SetSheetProperty"
    }
}

/// Replace one sprite field through its accessors
///
/// Setting a geometry field can toggle a flip flag, so the whole sprite is
/// captured on both sides.
#[derive(Debug)]
pub struct SetSpriteProperty {
    property: &'static Property<Sprite>,
    index: usize,
    value: PropertyValue,
    before: Sprite,
    after: Sprite,
}

impl Command for SetSpriteProperty {
    fn description(&self) -> String {
        format!(
            "Set {}.{} from {} to {}",
            self.before.name,
            self.property.name,
            (self.property.get)(&self.before),
            self.value
        )
    }

    fn noop_reason(&self) -> Option<&'static str> {
        (self.before == self.after).then_some(SAME_VALUE)
    }

    fn validate(&self, sheet: &Spritesheet, _host: &mut dyn Host) -> Result<(), CommandError> {
        check_rename(sheet, &self.before.name, &self.after.name)
    }

    fn apply(&self, sheet: &mut Spritesheet) -> Result<(), CommandError> {
        replace_sprite(sheet, self.index, &self.after)
    }

    fn revert(&self, sheet: &mut Spritesheet) -> Result<(), CommandError> {
        replace_sprite(sheet, self.index, &self.before)
    }

    fn name(&self) -> &'static str {
        "SetSpriteProperty"
    }
}
