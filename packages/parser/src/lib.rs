//! RCSS parser
//!
//! A logos tokenizer and a general CSS grammar layer, extended with the
//! `@spritesheet` at-rule.

pub mod ast;
pub mod error;
pub mod parser;
pub mod spritesheet;
pub mod tokenizer;

pub use ast::{AtRule, Declaration, QualifiedRule, Rule, Stylesheet};
#[cfg(feature = "pretty-errors")]
pub use error::format_errors;
pub use error::{ParseError, ParseResult};
pub use parser::{parse_declarations, parse_stylesheet, Parser};
pub use spritesheet::{
    classify, parse_rcss, parse_spritesheet_rule, reserved_property, Classified, PropertyKind,
    RcssRule, RcssStylesheet, ReservedProperty, ReservedValue, SpriteDecl, SpritesheetIssue,
    SpritesheetRule, RESERVED_PROPERTIES, SPRITESHEET_KEYWORD, UNNAMED,
};
pub use tokenizer::{tokenize, unescape, LineIndex, SpannedToken, Token, TokenSpan};
