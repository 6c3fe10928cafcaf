//! The `@spritesheet` grammar extension
//!
//! ```text
//! @spritesheet hud {
//!     src: hud.png;
//!     resolution: 2x;
//!     cursor: 10px 20px 30px 40px;
//! }
//! ```
//!
//! Reserved metadata keys are looked up in [`RESERVED_PROPERTIES`]. Every other
//! declaration is a sprite rectangle. Sprite-level problems are recorded as
//! issues and the declaration is skipped, so one bad line never hides the rest
//! of the block.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use thiserror::Error;

use crate::ast::{AtRule, Declaration, Rule};
use crate::error::ParseError;
use crate::parser::{parse_declarations, parse_stylesheet};
use crate::tokenizer::{unescape, SpannedToken, Token};

pub const SPRITESHEET_KEYWORD: &str = "spritesheet";

/// Name given to a sheet whose head is not a single identifier
pub const UNNAMED: &str = "UNNAMED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// Concatenated token text
    Text,
    /// A positive number, unit ignored
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedProperty {
    pub name: &'static str,
    pub kind: PropertyKind,
    pub required: bool,
}

/// Keys with schema-defined meaning. Matched case-sensitively.
pub const RESERVED_PROPERTIES: &[ReservedProperty] = &[
    ReservedProperty {
        name: "src",
        kind: PropertyKind::Text,
        required: true,
    },
    ReservedProperty {
        name: "resolution",
        kind: PropertyKind::Number,
        required: false,
    },
];

pub fn reserved_property(name: &str) -> Option<&'static ReservedProperty> {
    RESERVED_PROPERTIES.iter().find(|p| p.name == name)
}

/// A declaration sorted by the schema table
#[derive(Debug, Clone, Copy)]
pub enum Classified<'a, 'src> {
    Reserved(&'static ReservedProperty, &'a [SpannedToken<'src>]),
    SpriteCandidate(&'src str, &'a [SpannedToken<'src>]),
}

pub fn classify<'a, 'src>(declaration: &'a Declaration<'src>) -> Classified<'a, 'src> {
    match reserved_property(declaration.name) {
        Some(property) => Classified::Reserved(property, &declaration.value),
        None => Classified::SpriteCandidate(declaration.name, &declaration.value),
    }
}

/// Typed value of a reserved property
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReservedValue {
    Text(String),
    Number(f64),
}

impl ReservedValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ReservedValue::Text(text) => Some(text),
            ReservedValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ReservedValue::Number(n) => Some(*n),
            ReservedValue::Text(_) => None,
        }
    }
}

/// A sprite rectangle exactly as declared. Width and height may be negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpriteDecl {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub line: usize,
}

/// Schema problem found inside a `@spritesheet` block
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpritesheetIssue {
    #[error("Sprite {name} has {count} props, expected 4")]
    SpriteArity {
        name: String,
        count: usize,
        line: usize,
    },

    #[error("Sprite {name} has an invalid value '{value}', expected an integer")]
    InvalidSpriteValue {
        name: String,
        value: String,
        line: usize,
    },

    #[error("Sprite {name} is already declared in this spritesheet")]
    DuplicateSprite { name: String, line: usize },

    #[error("Property {name} has an invalid value '{value}'")]
    InvalidProperty {
        name: &'static str,
        value: String,
        line: usize,
    },

    #[error("Missing required property '{name}'")]
    MissingProperty { name: &'static str },
}

impl SpritesheetIssue {
    /// Fatal issues abort a document load. The rest only skip one sprite.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SpritesheetIssue::InvalidProperty { .. } | SpritesheetIssue::MissingProperty { .. }
        )
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            SpritesheetIssue::SpriteArity { line, .. }
            | SpritesheetIssue::InvalidSpriteValue { line, .. }
            | SpritesheetIssue::DuplicateSprite { line, .. }
            | SpritesheetIssue::InvalidProperty { line, .. } => Some(*line),
            SpritesheetIssue::MissingProperty { .. } => None,
        }
    }
}

/// One recognized `@spritesheet` block
#[derive(Debug, Clone, PartialEq)]
pub struct SpritesheetRule {
    pub name: String,
    pub sprites: Vec<SpriteDecl>,
    pub properties: BTreeMap<&'static str, ReservedValue>,
    pub issues: Vec<SpritesheetIssue>,
    pub line: usize,
    pub column: usize,
    /// Line of the closing brace
    pub end_line: usize,
}

impl SpritesheetRule {
    pub fn source(&self) -> Option<&str> {
        self.properties.get("src").and_then(ReservedValue::as_text)
    }

    pub fn resolution(&self) -> Option<f64> {
        self.properties
            .get("resolution")
            .and_then(ReservedValue::as_number)
    }

    pub fn has_fatal_issues(&self) -> bool {
        self.issues.iter().any(SpritesheetIssue::is_fatal)
    }

    pub fn fatal_issues(&self) -> impl Iterator<Item = &SpritesheetIssue> {
        self.issues.iter().filter(|issue| issue.is_fatal())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &SpritesheetIssue> {
        self.issues.iter().filter(|issue| !issue.is_fatal())
    }
}

/// Interpret an at-rule as a `@spritesheet` block
///
/// Returns syntax errors when the body is missing or is not a declaration
/// list. Schema problems never fail here; they land in `issues`.
pub fn parse_spritesheet_rule(rule: &AtRule<'_>) -> Result<SpritesheetRule, Vec<ParseError>> {
    let Some(body) = &rule.body else {
        return Err(vec![ParseError::InvalidSyntax {
            span: rule.span,
            line: rule.line,
            column: rule.column,
            message: "@spritesheet requires a block".to_string(),
        }]);
    };

    let (declarations, errors) = parse_declarations(body);
    if !errors.is_empty() {
        return Err(errors);
    }

    let mut sheet = SpritesheetRule {
        name: sheet_name(&rule.head),
        sprites: Vec::new(),
        properties: BTreeMap::new(),
        issues: Vec::new(),
        line: rule.line,
        column: rule.column,
        end_line: rule.end_line,
    };
    let mut seen = HashSet::new();

    for declaration in &declarations {
        match classify(declaration) {
            Classified::Reserved(property, tokens) => {
                match reserved_value(property, tokens) {
                    Ok(value) => {
                        sheet.properties.insert(property.name, value);
                    }
                    Err(value) => sheet.issues.push(SpritesheetIssue::InvalidProperty {
                        name: property.name,
                        value,
                        line: declaration.line,
                    }),
                }
            }
            Classified::SpriteCandidate(name, tokens) => {
                match sprite_decl(name, tokens, declaration.line) {
                    Ok(_) if seen.contains(name) => {
                        sheet.issues.push(SpritesheetIssue::DuplicateSprite {
                            name: name.to_string(),
                            line: declaration.line,
                        })
                    }
                    Ok(sprite) => {
                        seen.insert(name);
                        sheet.sprites.push(sprite);
                    }
                    Err(issue) => sheet.issues.push(issue),
                }
            }
        }
    }

    for property in RESERVED_PROPERTIES.iter().filter(|p| p.required) {
        let invalid = sheet.issues.iter().any(|issue| {
            matches!(issue, SpritesheetIssue::InvalidProperty { name, .. } if *name == property.name)
        });
        if !sheet.properties.contains_key(property.name) && !invalid {
            sheet.issues.push(SpritesheetIssue::MissingProperty {
                name: property.name,
            });
        }
    }

    Ok(sheet)
}

fn sheet_name(head: &[SpannedToken<'_>]) -> String {
    let mut significant = head.iter().filter(|t| !t.is_whitespace());
    match (significant.next(), significant.next()) {
        (Some(SpannedToken {
            token: Token::Ident(name),
            ..
        }), None) => name.to_string(),
        _ => UNNAMED.to_string(),
    }
}

/// Typed value of a reserved property, or the offending text
fn reserved_value(property: &ReservedProperty, tokens: &[SpannedToken<'_>]) -> Result<ReservedValue, String> {
    let significant = tokens.iter().filter(|t| !t.is_whitespace());

    match property.kind {
        PropertyKind::Text => {
            let text: String = significant
                .map(|t| match t.token {
                    Token::String(s) => unescape(s),
                    _ => Cow::Borrowed(t.text),
                })
                .collect();
            if text.is_empty() {
                return Err(text);
            }
            Ok(ReservedValue::Text(text))
        }
        PropertyKind::Number => {
            let text: String = significant
                .map(|t| match t.token {
                    Token::Dimension(d) => d.number,
                    _ => t.text,
                })
                .collect();
            match text.parse::<f64>() {
                Ok(n) if n.is_finite() && n > 0.0 => Ok(ReservedValue::Number(n)),
                _ => Err(text),
            }
        }
    }
}

fn sprite_decl(name: &str, tokens: &[SpannedToken<'_>], line: usize) -> Result<SpriteDecl, SpritesheetIssue> {
    let values: Vec<&SpannedToken<'_>> = tokens.iter().filter(|t| !t.is_whitespace()).collect();
    if values.len() != 4 {
        return Err(SpritesheetIssue::SpriteArity {
            name: name.to_string(),
            count: values.len(),
            line,
        });
    }

    let mut numbers = [0i32; 4];
    for (slot, token) in numbers.iter_mut().zip(&values) {
        *slot = integral(token).ok_or_else(|| SpritesheetIssue::InvalidSpriteValue {
            name: name.to_string(),
            value: token.text.to_string(),
            line,
        })?;
    }

    let [x, y, width, height] = numbers;
    Ok(SpriteDecl {
        name: name.to_string(),
        x,
        y,
        width,
        height,
        line,
    })
}

fn integral(token: &SpannedToken<'_>) -> Option<i32> {
    let value = match token.token {
        Token::Number(n) => n,
        Token::Dimension(d) => d.value,
        _ => return None,
    };

    if value.fract() != 0.0 || value < i32::MIN as f64 || value > i32::MAX as f64 {
        return None;
    }
    Some(value as i32)
}

/// A top-level rule of an RCSS stylesheet
#[derive(Debug, Clone, PartialEq)]
pub enum RcssRule {
    Spritesheet(SpritesheetRule),
    /// Anything this crate does not interpret. Only its position is kept.
    Other { line: usize, end_line: usize },
}

#[derive(Debug, Clone, Default)]
pub struct RcssStylesheet {
    pub rules: Vec<RcssRule>,
    /// Syntax errors. Any entry here means the text must not be loaded.
    pub errors: Vec<ParseError>,
}

impl RcssStylesheet {
    pub fn spritesheets(&self) -> impl Iterator<Item = &SpritesheetRule> {
        self.rules.iter().filter_map(|rule| match rule {
            RcssRule::Spritesheet(sheet) => Some(sheet),
            RcssRule::Other { .. } => None,
        })
    }

    pub fn into_spritesheets(self) -> impl Iterator<Item = SpritesheetRule> {
        self.rules.into_iter().filter_map(|rule| match rule {
            RcssRule::Spritesheet(sheet) => Some(sheet),
            RcssRule::Other { .. } => None,
        })
    }
}

/// Parse RCSS text, recognizing every `@spritesheet` block
pub fn parse_rcss(source: &str) -> RcssStylesheet {
    let stylesheet = parse_stylesheet(source);
    let mut errors = stylesheet.errors;
    let mut rules = Vec::with_capacity(stylesheet.rules.len());

    for rule in &stylesheet.rules {
        match rule {
            Rule::At(at) if at.keyword == SPRITESHEET_KEYWORD => match parse_spritesheet_rule(at) {
                Ok(sheet) => rules.push(RcssRule::Spritesheet(sheet)),
                Err(block_errors) => errors.extend(block_errors),
            },
            other => rules.push(RcssRule::Other {
                line: other.line(),
                end_line: other.end_line(),
            }),
        }
    }

    RcssStylesheet { rules, errors }
}
