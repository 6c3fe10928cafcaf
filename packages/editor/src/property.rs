//! Editable fields as get/set pairs
//!
//! The set-property command only ever calls these accessors, so it never
//! needs to know whether it is editing a sprite or a sheet.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::sprite::Sprite;
use crate::spritesheet::Spritesheet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueKind {
    Text,
    Integer,
    /// A number, or `none` for absent
    OptionalNumber,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Integer(i32),
    OptionalNumber(Option<f64>),
}

impl PropertyValue {
    /// Parse user input according to `kind`
    pub fn parse(kind: ValueKind, input: &str) -> Result<Self, String> {
        let input = input.trim();
        match kind {
            ValueKind::Text => Ok(PropertyValue::Text(input.to_string())),
            ValueKind::Integer => input
                .trim_end_matches("px")
                .parse()
                .map(PropertyValue::Integer)
                .map_err(|_| format!("'{}' is not an integer", input)),
            ValueKind::OptionalNumber if input.eq_ignore_ascii_case("none") || input.is_empty() => {
                Ok(PropertyValue::OptionalNumber(None))
            }
            ValueKind::OptionalNumber => input
                .trim_end_matches('x')
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(|n| PropertyValue::OptionalNumber(Some(n)))
                .ok_or_else(|| format!("'{}' is not a number", input)),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(text) => write!(f, "{}", text),
            PropertyValue::Integer(n) => write!(f, "{}", n),
            PropertyValue::OptionalNumber(Some(n)) => write!(f, "{}", n),
            PropertyValue::OptionalNumber(None) => write!(f, "none"),
        }
    }
}

/// A named field of `T`
pub struct Property<T> {
    pub name: &'static str,
    pub kind: ValueKind,
    pub get: fn(&T) -> PropertyValue,
    /// Only called with values of the matching kind
    pub set: fn(&mut T, &PropertyValue),
}

impl<T> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// What a set-property command edits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyTarget {
    Spritesheet,
    Sprite(String),
}

impl fmt::Display for PropertyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyTarget::Spritesheet => write!(f, "spritesheet"),
            PropertyTarget::Sprite(name) => write!(f, "{}", name),
        }
    }
}

fn text(value: &PropertyValue) -> Option<&str> {
    match value {
        PropertyValue::Text(text) => Some(text),
        _ => None,
    }
}

fn integer(value: &PropertyValue) -> Option<i32> {
    match value {
        PropertyValue::Integer(n) => Some(*n),
        _ => None,
    }
}

pub static SPRITE_PROPERTIES: &[Property<Sprite>] = &[
    Property {
        name: "name",
        kind: ValueKind::Text,
        get: |s| PropertyValue::Text(s.name.clone()),
        set: |s, v| {
            if let Some(name) = text(v) {
                s.name = name.to_string();
            }
        },
    },
    Property {
        name: "x",
        kind: ValueKind::Integer,
        get: |s| PropertyValue::Integer(s.x()),
        set: |s, v| {
            if let Some(x) = integer(v) {
                s.set_geometry(x, s.y(), s.width(), s.height());
            }
        },
    },
    Property {
        name: "y",
        kind: ValueKind::Integer,
        get: |s| PropertyValue::Integer(s.y()),
        set: |s, v| {
            if let Some(y) = integer(v) {
                s.set_geometry(s.x(), y, s.width(), s.height());
            }
        },
    },
    Property {
        name: "width",
        kind: ValueKind::Integer,
        get: |s| PropertyValue::Integer(s.width()),
        set: |s, v| {
            if let Some(width) = integer(v) {
                s.set_geometry(s.x(), s.y(), width, s.height());
            }
        },
    },
    Property {
        name: "height",
        kind: ValueKind::Integer,
        get: |s| PropertyValue::Integer(s.height()),
        set: |s, v| {
            if let Some(height) = integer(v) {
                s.set_geometry(s.x(), s.y(), s.width(), height);
            }
        },
    },
];

pub static SPRITESHEET_PROPERTIES: &[Property<Spritesheet>] = &[
    Property {
        name: "name",
        kind: ValueKind::Text,
        get: |s| PropertyValue::Text(s.name.clone()),
        set: |s, v| {
            if let Some(name) = text(v) {
                s.name = name.to_string();
            }
        },
    },
    Property {
        name: "src",
        kind: ValueKind::Text,
        get: |s| PropertyValue::Text(s.source.clone()),
        set: |s, v| {
            if let Some(source) = text(v) {
                s.source = source.to_string();
            }
        },
    },
    Property {
        name: "resolution",
        kind: ValueKind::OptionalNumber,
        get: |s| PropertyValue::OptionalNumber(s.resolution),
        set: |s, v| {
            if let PropertyValue::OptionalNumber(resolution) = v {
                s.resolution = *resolution;
            }
        },
    },
    Property {
        name: "basepath",
        kind: ValueKind::Text,
        get: |s| PropertyValue::Text(s.basepath.display().to_string()),
        set: |s, v| {
            if let Some(basepath) = text(v) {
                s.basepath = PathBuf::from(basepath);
            }
        },
    },
];

pub fn sprite_property(name: &str) -> Option<&'static Property<Sprite>> {
    SPRITE_PROPERTIES.iter().find(|p| p.name == name)
}

pub fn spritesheet_property(name: &str) -> Option<&'static Property<Spritesheet>> {
    SPRITESHEET_PROPERTIES.iter().find(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_values() {
        assert_eq!(
            PropertyValue::parse(ValueKind::Integer, "12px"),
            Ok(PropertyValue::Integer(12))
        );
        assert_eq!(
            PropertyValue::parse(ValueKind::Integer, "-3"),
            Ok(PropertyValue::Integer(-3))
        );
        assert!(PropertyValue::parse(ValueKind::Integer, "1.5").is_err());
        assert_eq!(
            PropertyValue::parse(ValueKind::OptionalNumber, "2x"),
            Ok(PropertyValue::OptionalNumber(Some(2.0)))
        );
        assert_eq!(
            PropertyValue::parse(ValueKind::OptionalNumber, "none"),
            Ok(PropertyValue::OptionalNumber(None))
        );
        assert!(PropertyValue::parse(ValueKind::OptionalNumber, "big").is_err());
    }

    #[test]
    fn test_sprite_accessors() {
        let mut sprite = Sprite::new("a", 1, 2, 3, 4);
        let width = sprite_property("width").unwrap();

        assert_eq!((width.get)(&sprite), PropertyValue::Integer(3));
        (width.set)(&mut sprite, &PropertyValue::Integer(-3));
        assert_eq!(sprite.geometry(), (-2, 2, 3, 4));
        assert!(sprite.is_flipped_x());
    }

    #[test]
    fn test_spritesheet_accessors() {
        let mut sheet = Spritesheet::new("hud", "hud.png");
        let resolution = spritesheet_property("resolution").unwrap();

        (resolution.set)(&mut sheet, &PropertyValue::OptionalNumber(Some(2.0)));
        assert_eq!(sheet.resolution, Some(2.0));
        assert_eq!((resolution.get)(&sheet).to_string(), "2");

        assert!(spritesheet_property("color").is_none());
        assert!(sprite_property("src").is_none());
    }
}
