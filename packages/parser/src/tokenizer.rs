//! CSS tokenizer for RCSS sources using logos
//!
//! Whitespace is kept as a token because declaration values are consumed as
//! ordered token lists, and line provenance depends on where newlines fall.
//! Block comments are skipped entirely.

use logos::Logos;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

const BOM: char = '\u{FEFF}';

/// Token types for the CSS grammar layer
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
pub enum Token<'src> {
    #[regex(r"[ \t\r\n\f]+", |lex| lex.slice())]
    Whitespace(&'src str),

    // At-keywords, stored without the leading '@'
    #[regex(r"@-?[a-zA-Z_\x{80}-\x{10FFFF}][a-zA-Z0-9_\x{80}-\x{10FFFF}-]*", |lex| &lex.slice()[1..])]
    AtKeyword(&'src str),

    // Any non-ASCII code point is a name character
    #[regex(r"-?[a-zA-Z_\x{80}-\x{10FFFF}][a-zA-Z0-9_\x{80}-\x{10FFFF}-]*", |lex| lex.slice())]
    Ident(&'src str),

    // String literals, stored without quotes
    #[regex(r#""([^"\\\n]|\\.)*""#, unquote)]
    #[regex(r"'([^'\\\n]|\\.)*'", unquote)]
    String(&'src str),

    #[regex(r"[+-]?([0-9]+(\.[0-9]+)?|\.[0-9]+)", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    #[regex(r"[+-]?([0-9]+(\.[0-9]+)?|\.[0-9]+)%", percentage)]
    Percentage(f64),

    #[regex(r"[+-]?([0-9]+(\.[0-9]+)?|\.[0-9]+)[a-zA-Z_][a-zA-Z0-9_-]*", dimension)]
    Dimension(Dimension<'src>),

    #[regex(r"#[a-zA-Z0-9_\x{80}-\x{10FFFF}-]+", |lex| &lex.slice()[1..])]
    Hash(&'src str),

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    // Any other single punctuation character
    #[regex(r"[.>+~*/=!&|$?<^#%\\-]", |lex| lex.slice().chars().next())]
    Delim(char),
}

/// A number followed by a unit, e.g. `10px` or `2x`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimension<'src> {
    pub value: f64,
    /// The numeric part exactly as written
    pub number: &'src str,
    pub unit: &'src str,
}

fn unquote<'src>(lex: &mut logos::Lexer<'src, Token<'src>>) -> &'src str {
    let s = lex.slice();
    &s[1..s.len() - 1]
}

/// Resolve CSS escapes (`\"`, `\\`, `\26 `) in the contents of a string token
pub fn unescape(raw: &str) -> Cow<'_, str> {
    if !raw.contains('\\') {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let mut hex = String::new();
        while hex.len() < 6 {
            match chars.peek() {
                Some(h) if h.is_ascii_hexdigit() => {
                    hex.push(*h);
                    chars.next();
                }
                _ => break,
            }
        }

        if hex.is_empty() {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
            continue;
        }

        // One whitespace character terminates a hex escape
        if matches!(chars.peek(), Some(' ' | '\t' | '\n')) {
            chars.next();
        }
        let code = u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .filter(|c| *c != '\0')
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        out.push(code);
    }

    Cow::Owned(out)
}

fn percentage<'src>(lex: &mut logos::Lexer<'src, Token<'src>>) -> Option<f64> {
    let s = lex.slice();
    s[..s.len() - 1].parse().ok()
}

fn dimension<'src>(lex: &mut logos::Lexer<'src, Token<'src>>) -> Option<Dimension<'src>> {
    let slice = lex.slice();
    let split = slice.find(|c: char| c.is_ascii_alphabetic() || c == '_')?;
    let (number, unit) = slice.split_at(split);

    Some(Dimension {
        value: number.parse().ok()?,
        number,
        unit,
    })
}

impl<'src> Token<'src> {
    /// Short name of the token kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Token::Whitespace(_) => "whitespace",
            Token::AtKeyword(_) => "at-keyword",
            Token::Ident(_) => "identifier",
            Token::String(_) => "string",
            Token::Number(_) => "number",
            Token::Percentage(_) => "percentage",
            Token::Dimension(_) => "dimension",
            Token::Hash(_) => "hash",
            Token::LBrace => "'{'",
            Token::RBrace => "'}'",
            Token::LParen => "'('",
            Token::RParen => "')'",
            Token::LBracket => "'['",
            Token::RBracket => "']'",
            Token::Colon => "':'",
            Token::Semicolon => "';'",
            Token::Comma => "','",
            Token::Delim(_) => "delimiter",
        }
    }

    /// Numeric value of number-like tokens
    pub fn numeric_value(&self) -> Option<f64> {
        match self {
            Token::Number(n) | Token::Percentage(n) => Some(*n),
            Token::Dimension(d) => Some(d.value),
            _ => None,
        }
    }
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Whitespace(_) => write!(f, "whitespace"),
            Token::AtKeyword(k) => write!(f, "at-keyword '@{}'", k),
            Token::Ident(s) => write!(f, "identifier '{}'", s),
            Token::String(s) => write!(f, "string \"{}\"", s),
            Token::Number(n) => write!(f, "number {}", n),
            Token::Percentage(n) => write!(f, "percentage {}%", n),
            Token::Dimension(d) => write!(f, "dimension {}{}", d.number, d.unit),
            Token::Hash(h) => write!(f, "hash '#{}'", h),
            Token::LBrace => write!(f, "'{{'"),
            Token::RBrace => write!(f, "'}}'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::Colon => write!(f, "':'"),
            Token::Semicolon => write!(f, "';'"),
            Token::Comma => write!(f, "','"),
            Token::Delim(c) => write!(f, "'{}'", c),
        }
    }
}

/// Byte span of a token in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

/// A token with its source text and position
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken<'src> {
    pub token: Token<'src>,
    /// Exact source slice this token was lexed from
    pub text: &'src str,
    pub span: TokenSpan,
    /// 1-based line
    pub line: usize,
    /// 1-based column, in characters
    pub column: usize,
}

impl<'src> SpannedToken<'src> {
    pub fn is_whitespace(&self) -> bool {
        matches!(self.token, Token::Whitespace(_))
    }

    /// Whitespace that runs through a line break
    pub fn ends_line(&self) -> bool {
        matches!(self.token, Token::Whitespace(ws) if ws.contains('\n'))
    }

    /// Line the token's last character sits on
    pub fn end_line(&self) -> usize {
        self.line + self.text.matches('\n').count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub span: TokenSpan,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Maps byte offsets to 1-based line/column pairs
#[derive(Debug, Clone)]
pub struct LineIndex<'src> {
    source: &'src str,
    line_starts: Vec<usize>,
}

impl<'src> LineIndex<'src> {
    pub fn new(source: &'src str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Self {
            source,
            line_starts,
        }
    }

    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let column = self
            .source
            .get(line_start..offset)
            .map(|s| if line == 0 { s.strip_prefix(BOM).unwrap_or(s) } else { s })
            .map(|s| s.chars().count())
            .unwrap_or(0);

        (line + 1, column + 1)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Lex source code into positioned tokens. A leading byte order mark is
/// skipped; spans still count it.
pub fn lex(source: &str) -> impl Iterator<Item = Result<SpannedToken<'_>, LexError>> + '_ {
    let index = LineIndex::new(source);

    let mut lexer = Token::lexer(source);
    if source.starts_with(BOM) {
        lexer.bump(BOM.len_utf8());
    }

    lexer.spanned().map(move |(result, span)| {
        let (line, column) = index.line_col(span.start);
        let token_span = TokenSpan {
            start: span.start,
            end: span.end,
        };

        match result {
            Ok(token) => Ok(SpannedToken {
                token,
                text: &source[span.start..span.end],
                span: token_span,
                line,
                column,
            }),
            Err(_) => Err(LexError {
                span: token_span,
                line,
                column,
                message: format!("Unexpected input {:?}", &source[span.start..span.end]),
            }),
        }
    })
}

/// Tokenize a source string, separating tokens from lexer errors
pub fn tokenize(source: &str) -> (Vec<SpannedToken<'_>>, Vec<LexError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for result in lex(source) {
        match result {
            Ok(token) => tokens.push(token),
            Err(error) => errors.push(error),
        }
    }

    (tokens, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token<'_>> {
        let (tokens, errors) = tokenize(source);
        assert!(errors.is_empty(), "unexpected lex errors: {:?}", errors);
        tokens
            .into_iter()
            .filter(|t| !t.is_whitespace())
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_lex_at_rule_head() {
        let tokens = kinds("@spritesheet hud {");

        assert_eq!(tokens[0], Token::AtKeyword("spritesheet"));
        assert_eq!(tokens[1], Token::Ident("hud"));
        assert_eq!(tokens[2], Token::LBrace);
    }

    #[test]
    fn test_lex_dimensions() {
        let tokens = kinds("10px -20px 2x 1.5em");

        match tokens[0] {
            Token::Dimension(d) => {
                assert_eq!(d.value, 10.0);
                assert_eq!(d.unit, "px");
            }
            ref other => panic!("expected dimension, got {:?}", other),
        }
        match tokens[1] {
            Token::Dimension(d) => assert_eq!(d.value, -20.0),
            ref other => panic!("expected dimension, got {:?}", other),
        }
        match tokens[2] {
            Token::Dimension(d) => {
                assert_eq!(d.number, "2");
                assert_eq!(d.unit, "x");
            }
            ref other => panic!("expected dimension, got {:?}", other),
        }
    }

    #[test]
    fn test_lex_numbers_strings_and_delims() {
        let tokens = kinds(r#"42 'a b' "c.png" 50% hud.png"#);

        assert_eq!(tokens[0], Token::Number(42.0));
        assert_eq!(tokens[1], Token::String("a b"));
        assert_eq!(tokens[2], Token::String("c.png"));
        assert_eq!(tokens[3], Token::Percentage(50.0));
        assert_eq!(tokens[4], Token::Ident("hud"));
        assert_eq!(tokens[5], Token::Delim('.'));
        assert_eq!(tokens[6], Token::Ident("png"));
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = kinds("/* header */ a /* inline ** stars */ b");
        assert_eq!(tokens, vec![Token::Ident("a"), Token::Ident("b")]);
    }

    #[test]
    fn test_line_and_column_tracking() {
        let (tokens, _) = tokenize("a\n  b\n\nc");
        let idents: Vec<_> = tokens.iter().filter(|t| !t.is_whitespace()).collect();

        assert_eq!((idents[0].line, idents[0].column), (1, 1));
        assert_eq!((idents[1].line, idents[1].column), (2, 3));
        assert_eq!((idents[2].line, idents[2].column), (4, 1));
    }

    #[test]
    fn test_whitespace_end_line() {
        let (tokens, _) = tokenize("a\n\n  b");
        let ws = &tokens[1];

        assert!(ws.ends_line());
        assert_eq!(ws.line, 1);
        assert_eq!(ws.end_line(), 3);
    }

    #[test]
    fn test_non_ascii_names() {
        let tokens = kinds(".título #café @médias");

        assert_eq!(tokens[0], Token::Delim('.'));
        assert_eq!(tokens[1], Token::Ident("título"));
        assert_eq!(tokens[2], Token::Hash("café"));
        assert_eq!(tokens[3], Token::AtKeyword("médias"));
    }

    #[test]
    fn test_leading_bom_is_skipped() {
        let source = "\u{FEFF}a { }";
        let (tokens, errors) = tokenize(source);

        assert!(errors.is_empty(), "unexpected lex errors: {:?}", errors);
        assert_eq!(tokens[0].token, Token::Ident("a"));
        assert_eq!(tokens[0].span.start, 3);
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("plain.png"), "plain.png");
        assert_eq!(unescape(r#"it's \"x\".png"#), r#"it's "x".png"#);
        assert_eq!(unescape(r"back\\slash"), r"back\slash");
        assert_eq!(unescape(r"\26 b"), "&b");
        assert_eq!(unescape(r"\e9"), "é");
    }

    #[test]
    fn test_unterminated_string_is_lex_error() {
        let (_, errors) = tokenize("src: \"oops\n");
        assert!(!errors.is_empty());
        assert_eq!(errors[0].line, 1);
    }
}
