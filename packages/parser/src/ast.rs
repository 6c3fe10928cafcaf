use crate::error::ParseError;
use crate::tokenizer::{SpannedToken, TokenSpan};

/// Output of the general CSS grammar layer
#[derive(Debug, Clone, Default)]
pub struct Stylesheet<'src> {
    pub rules: Vec<Rule<'src>>,
    /// Syntax errors collected while parsing. Never thrown mid-stream.
    pub errors: Vec<ParseError>,
}

impl<'src> Stylesheet<'src> {
    pub fn at_rules<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a AtRule<'src>> + 'a {
        self.rules.iter().filter_map(move |rule| match rule {
            Rule::At(at) if at.keyword == keyword => Some(at),
            _ => None,
        })
    }
}

/// Top-level rule
#[derive(Debug, Clone, PartialEq)]
pub enum Rule<'src> {
    Qualified(QualifiedRule<'src>),
    At(AtRule<'src>),
}

impl<'src> Rule<'src> {
    pub fn line(&self) -> usize {
        match self {
            Rule::Qualified(rule) => rule.line,
            Rule::At(rule) => rule.line,
        }
    }

    pub fn end_line(&self) -> usize {
        match self {
            Rule::Qualified(rule) => rule.end_line,
            Rule::At(rule) => rule.end_line,
        }
    }
}

/// Ordinary rule: `prelude { body }`
#[derive(Debug, Clone, PartialEq)]
pub struct QualifiedRule<'src> {
    pub prelude: Vec<SpannedToken<'src>>,
    pub body: Vec<SpannedToken<'src>>,
    /// Span of the first prelude token
    pub span: TokenSpan,
    pub line: usize,
    pub column: usize,
    /// Line of the closing brace
    pub end_line: usize,
}

/// At-rule: `@keyword head { body }` or `@keyword head;`
#[derive(Debug, Clone, PartialEq)]
pub struct AtRule<'src> {
    /// Keyword without the leading '@'
    pub keyword: &'src str,
    pub head: Vec<SpannedToken<'src>>,
    /// Tokens between the braces, or `None` for a statement at-rule
    pub body: Option<Vec<SpannedToken<'src>>>,
    /// Span of the at-keyword
    pub span: TokenSpan,
    pub line: usize,
    pub column: usize,
    /// Line of the closing brace (or the terminating semicolon)
    pub end_line: usize,
}

/// `name: value` inside a declaration block
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration<'src> {
    pub name: &'src str,
    /// Value tokens, trimmed of surrounding whitespace
    pub value: Vec<SpannedToken<'src>>,
    pub line: usize,
    pub column: usize,
}

impl<'src> Declaration<'src> {
    /// Value tokens that are not whitespace
    pub fn significant_values(&self) -> impl Iterator<Item = &SpannedToken<'src>> {
        self.value.iter().filter(|t| !t.is_whitespace())
    }
}
