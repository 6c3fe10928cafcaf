//! General CSS grammar layer
//!
//! Splits a token stream into qualified rules and at-rules, and splits
//! declaration blocks into `name: value` pairs. Bodies are kept as token lists
//! so dialect extensions (like `@spritesheet`) can interpret them.

use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::spritesheet::SPRITESHEET_KEYWORD;
use crate::tokenizer::{tokenize, LineIndex, SpannedToken, Token, TokenSpan};

/// Parser for the CSS grammar layer
pub struct Parser<'src> {
    tokens: Vec<SpannedToken<'src>>,
    pos: usize,
    errors: Vec<ParseError>,
    eof_span: TokenSpan,
    eof_position: (usize, usize),
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        let (tokens, lex_errors) = tokenize(source);
        let index = LineIndex::new(source);

        Self {
            tokens,
            pos: 0,
            errors: lex_errors.into_iter().map(ParseError::from).collect(),
            eof_span: TokenSpan {
                start: source.len(),
                end: source.len(),
            },
            eof_position: index.line_col(source.len()),
        }
    }

    /// Parse every top-level rule, collecting syntax errors as it goes
    pub fn parse_stylesheet(mut self) -> Stylesheet<'src> {
        let mut rules = Vec::new();

        while let Some(token) = self.peek().cloned() {
            match token.token {
                Token::Whitespace(_) => {
                    self.advance();
                }
                Token::AtKeyword(keyword) => {
                    self.advance();
                    match self.parse_at_rule(keyword, &token) {
                        Ok(rule) => rules.push(Rule::At(rule)),
                        Err(err) => self.errors.push(err),
                    }
                }
                Token::RBrace | Token::Semicolon => {
                    self.advance();
                    self.errors
                        .push(ParseError::unexpected_token(&token, "a rule or at-rule"));
                }
                _ => match self.parse_qualified_rule(&token) {
                    Ok(rule) => rules.push(Rule::Qualified(rule)),
                    Err(err) => self.errors.push(err),
                },
            }
        }

        Stylesheet {
            rules,
            errors: self.errors,
        }
    }

    /// Parse an at-rule after its keyword has been consumed
    fn parse_at_rule(
        &mut self,
        keyword: &'src str,
        start: &SpannedToken<'src>,
    ) -> ParseResult<AtRule<'src>> {
        let mut head = Vec::new();

        loop {
            let Some(token) = self.advance().cloned() else {
                return Err(self.eof_error(format!("'{{' or ';' to finish @{}", keyword)));
            };

            match token.token {
                Token::Semicolon => {
                    return Ok(AtRule {
                        keyword,
                        head: trim_whitespace(head),
                        body: None,
                        span: start.span,
                        line: start.line,
                        column: start.column,
                        end_line: token.line,
                    });
                }
                Token::LBrace => {
                    let (body, close) = self.consume_block(&token)?;
                    return Ok(AtRule {
                        keyword,
                        head: trim_whitespace(head),
                        body: Some(body),
                        span: start.span,
                        line: start.line,
                        column: start.column,
                        end_line: close.line,
                    });
                }
                Token::RBrace => {
                    return Err(ParseError::unexpected_token(
                        &token,
                        format!("'{{' or ';' to finish @{}", keyword),
                    ));
                }
                _ => head.push(token),
            }
        }
    }

    /// Parse `prelude { body }`, starting at the first prelude token
    fn parse_qualified_rule(&mut self, start: &SpannedToken<'src>) -> ParseResult<QualifiedRule<'src>> {
        let mut prelude = Vec::new();

        loop {
            let Some(token) = self.advance().cloned() else {
                return Err(self.eof_error("'{' to open the rule body"));
            };

            match token.token {
                Token::LBrace => {
                    let (body, close) = self.consume_block(&token)?;
                    return Ok(QualifiedRule {
                        prelude: trim_whitespace(prelude),
                        body,
                        span: start.span,
                        line: start.line,
                        column: start.column,
                        end_line: close.line,
                    });
                }
                Token::RBrace | Token::Semicolon => {
                    return Err(ParseError::unexpected_token(&token, "'{' to open the rule body"));
                }
                _ => prelude.push(token),
            }
        }
    }

    /// Collect tokens up to the brace matching `open`, which is already consumed.
    /// Returns the body tokens and the closing brace.
    fn consume_block(
        &mut self,
        open: &SpannedToken<'src>,
    ) -> ParseResult<(Vec<SpannedToken<'src>>, SpannedToken<'src>)> {
        let mut body = Vec::new();
        let mut depth = 0usize;

        loop {
            let Some(token) = self.advance().cloned() else {
                return Err(self.eof_error(format!(
                    "'}}' to close the block opened at {}:{}",
                    open.line, open.column
                )));
            };

            match token.token {
                Token::LBrace => depth += 1,
                Token::RBrace if depth == 0 => return Ok((body, token)),
                Token::RBrace => depth -= 1,
                // Only top-level spritesheets are ever read
                Token::AtKeyword(SPRITESHEET_KEYWORD) => {
                    self.errors.push(ParseError::invalid_syntax(
                        &token,
                        format!("@{} is only allowed at the top level", SPRITESHEET_KEYWORD),
                    ));
                }
                _ => {}
            }

            body.push(token);
        }
    }

    fn eof_error(&self, expected: impl Into<String>) -> ParseError {
        ParseError::unexpected_eof(self.eof_span, self.eof_position, expected)
    }

    fn peek(&self) -> Option<&SpannedToken<'src>> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&SpannedToken<'src>> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }
}

/// Parse a complete stylesheet with the general CSS grammar
pub fn parse_stylesheet(source: &str) -> Stylesheet<'_> {
    Parser::new(source).parse_stylesheet()
}

/// Split a block body into declarations
///
/// Each `;`-separated chunk must be `ident ':' value`. Empty chunks are
/// allowed. Nested blocks and at-rules are syntax errors here.
pub fn parse_declarations<'src>(
    body: &[SpannedToken<'src>],
) -> (Vec<Declaration<'src>>, Vec<ParseError>) {
    let mut declarations = Vec::new();
    let mut errors = Vec::new();

    for chunk in split_top_level(body) {
        let chunk = trim_slice(chunk);
        if chunk.is_empty() {
            continue;
        }

        match parse_declaration(chunk) {
            Ok(declaration) => declarations.push(declaration),
            Err(err) => errors.push(err),
        }
    }

    (declarations, errors)
}

fn parse_declaration<'src>(chunk: &[SpannedToken<'src>]) -> ParseResult<Declaration<'src>> {
    let first = &chunk[0];
    let name = match first.token {
        Token::Ident(name) => name,
        Token::AtKeyword(keyword) => {
            return Err(ParseError::invalid_syntax(
                first,
                format!("@{} is not allowed inside a declaration block", keyword),
            ));
        }
        _ => return Err(ParseError::unexpected_token(first, "a property name")),
    };

    let mut rest = chunk[1..].iter().skip_while(|t| t.is_whitespace());
    match rest.next() {
        Some(token) if token.token == Token::Colon => {}
        Some(token) => return Err(ParseError::unexpected_token(token, "':'")),
        None => {
            return Err(ParseError::invalid_syntax(
                first,
                format!("Expected ':' after property '{}'", name),
            ));
        }
    }

    let value: Vec<SpannedToken<'src>> = rest.cloned().collect();
    if let Some(brace) = value
        .iter()
        .find(|t| matches!(t.token, Token::LBrace | Token::RBrace))
    {
        return Err(ParseError::invalid_syntax(
            brace,
            format!("Unexpected block in the value of '{}'", name),
        ));
    }

    Ok(Declaration {
        name,
        value: trim_whitespace(value),
        line: first.line,
        column: first.column,
    })
}

/// Split tokens on `;` outside of parentheses and brackets
fn split_top_level<'a, 'src>(tokens: &'a [SpannedToken<'src>]) -> Vec<&'a [SpannedToken<'src>]> {
    let mut chunks = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, token) in tokens.iter().enumerate() {
        match token.token {
            Token::LParen | Token::LBracket => depth += 1,
            Token::RParen | Token::RBracket => depth = depth.saturating_sub(1),
            Token::Semicolon if depth == 0 => {
                chunks.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    chunks.push(&tokens[start..]);

    chunks
}

fn trim_slice<'a, 'src>(tokens: &'a [SpannedToken<'src>]) -> &'a [SpannedToken<'src>] {
    let start = tokens
        .iter()
        .position(|t| !t.is_whitespace())
        .unwrap_or(tokens.len());
    let end = tokens
        .iter()
        .rposition(|t| !t.is_whitespace())
        .map(|i| i + 1)
        .unwrap_or(start);

    &tokens[start..end.max(start)]
}

fn trim_whitespace(tokens: Vec<SpannedToken<'_>>) -> Vec<SpannedToken<'_>> {
    trim_slice(&tokens).to_vec()
}
