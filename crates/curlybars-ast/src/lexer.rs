//! Lexer for Curlybars template source.
//!
//! The lexer is an iterator: it yields tokens lazily in source order, ends
//! with a single [`TokenKind::Eof`], and stops for good after the first
//! error. Block closers, `{{else}}` and partial references are complete
//! tokens, so the parser never needs more than one token of lookahead.

use std::sync::Arc;

use crate::token::{Token, TokenKind};
use crate::{CompileError, Position, Result};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const CLOSE_RAW: &str = "}}}";
const LONG_COMMENT_OPEN: &str = "!--";
const LONG_COMMENT_CLOSE: &str = "--}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Text,
    Tag { raw: bool },
}

/// Lexer for tokenizing Curlybars template source
pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    file: Arc<str>,
    mode: Mode,
    tag_start: Option<Position>,
    finished: bool,
}

/// Start lexing `source`; positions are tagged with `file`.
pub fn lex(source: &str, file: impl Into<Arc<str>>) -> Lexer {
    Lexer::new(source, file)
}

impl Lexer {
    pub fn new(source: &str, file: impl Into<Arc<str>>) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            file: file.into(),
            mode: Mode::Text,
            tag_start: None,
            finished: false,
        }
    }

    /// Drain the lexer into a vector, stopping at the first error.
    pub fn tokenize(self) -> Result<Vec<Token>> {
        self.collect()
    }

    fn next_token(&mut self) -> Result<Token> {
        match self.mode {
            Mode::Text => self.lex_text(),
            Mode::Tag { raw } => self.lex_inside_tag(raw),
        }
    }

    fn lex_text(&mut self) -> Result<Token> {
        let start = self.current_position();

        if self.eof() {
            return Ok(Token::new(TokenKind::Eof, start));
        }
        if self.match_str(OPEN) {
            return self.lex_open();
        }

        let mut text = String::new();
        while !self.eof() && !self.match_str(OPEN) {
            text.push(self.advance());
        }
        Ok(Token::new(TokenKind::Literal(text), start))
    }

    fn lex_open(&mut self) -> Result<Token> {
        let start = self.current_position();
        self.advance_n(OPEN.len());

        match self.current_char() {
            Some('{') => {
                self.advance();
                self.enter_tag(true, &start);
                Ok(Token::new(TokenKind::OpenRaw, start))
            }
            Some('!') => self.skip_comment(start),
            Some('#') => {
                self.advance();
                self.skip_whitespace();
                let name = self.read_name(&start, "block name")?;
                self.enter_tag(false, &start);
                Ok(Token::new(TokenKind::OpenBlock(name), start))
            }
            Some('/') => {
                self.advance();
                self.skip_whitespace();
                let name = self.read_name(&start, "block name")?;
                self.expect_close(&start)?;
                Ok(Token::new(TokenKind::CloseBlock(name), start))
            }
            Some('>') => {
                self.advance();
                self.skip_whitespace();
                let name = self.read_partial_name(&start)?;
                self.expect_close(&start)?;
                Ok(Token::new(TokenKind::OpenPartial(name), start))
            }
            _ => {
                if self.try_else() {
                    return Ok(Token::new(TokenKind::Else, start));
                }
                self.enter_tag(false, &start);
                Ok(Token::new(TokenKind::OpenPath, start))
            }
        }
    }

    /// Consume `else }}` if that is all the tag holds; otherwise leave the
    /// input untouched.
    fn try_else(&mut self) -> bool {
        let saved = (self.pos, self.line, self.column);

        self.skip_whitespace();
        let mut word = String::new();
        while let Some(c) = self.current_char() {
            if !Self::is_ident_char(c) {
                break;
            }
            word.push(self.advance());
        }
        self.skip_whitespace();

        if word == "else" && self.match_str(CLOSE) {
            self.advance_n(CLOSE.len());
            return true;
        }

        (self.pos, self.line, self.column) = saved;
        false
    }

    fn skip_comment(&mut self, start: Position) -> Result<Token> {
        let terminator = if self.match_str(LONG_COMMENT_OPEN) {
            self.advance_n(LONG_COMMENT_OPEN.len());
            LONG_COMMENT_CLOSE
        } else {
            self.advance(); // !
            CLOSE
        };

        while !self.eof() && !self.match_str(terminator) {
            self.advance();
        }

        if self.eof() {
            return Err(CompileError::invalid_token("unterminated comment", start));
        }

        self.advance_n(terminator.len());
        Ok(Token::new(TokenKind::Comment, start))
    }

    fn lex_inside_tag(&mut self, raw: bool) -> Result<Token> {
        self.skip_whitespace();
        let start = self.current_position();

        let Some(c) = self.current_char() else {
            let opened = self.tag_start.clone().unwrap_or(start);
            return Err(CompileError::invalid_token("unterminated `{{`", opened));
        };

        if raw && self.match_str(CLOSE_RAW) {
            self.advance_n(CLOSE_RAW.len());
            self.leave_tag();
            return Ok(Token::new(TokenKind::CloseRaw, start));
        }
        if self.match_str(CLOSE) {
            if raw {
                return Err(CompileError::invalid_token(
                    "expected `}}}` to close `{{{`",
                    start,
                ));
            }
            self.advance_n(CLOSE.len());
            self.leave_tag();
            return Ok(Token::new(TokenKind::Close, start));
        }

        match c {
            '"' | '\'' => self.lex_string(c, start),
            '-' if self.peek_char().map_or(false, |n| n.is_ascii_digit()) => {
                self.lex_integer(start)
            }
            c if c.is_ascii_digit() => self.lex_integer(start),
            c if Self::is_ident_start(c) => self.lex_word(start),
            c => Err(CompileError::invalid_token(
                format!("unexpected character `{c}`"),
                start,
            )),
        }
    }

    fn lex_string(&mut self, quote: char, start: Position) -> Result<Token> {
        self.advance(); // opening quote
        let mut value = String::new();

        loop {
            match self.current_char() {
                None => {
                    return Err(CompileError::invalid_token(
                        "unterminated string literal",
                        start,
                    ));
                }
                Some('\\') => {
                    self.advance();
                    let Some(escaped) = self.current_char() else {
                        continue;
                    };
                    self.advance();
                    value.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some(_) => value.push(self.advance()),
            }
        }

        Ok(Token::new(TokenKind::String(value), start))
    }

    fn lex_integer(&mut self, start: Position) -> Result<Token> {
        let mut digits = String::new();
        if self.current_char() == Some('-') {
            digits.push(self.advance());
        }
        while let Some(c) = self.current_char() {
            if !c.is_ascii_digit() {
                break;
            }
            digits.push(self.advance());
        }

        if self.current_char().map_or(false, Self::is_ident_char) {
            return Err(CompileError::invalid_token(
                format!("malformed number `{digits}`"),
                start,
            ));
        }

        let value = digits.parse::<i64>().map_err(|_| {
            CompileError::invalid_token(format!("integer out of range: {digits}"), start.clone())
        })?;
        Ok(Token::new(TokenKind::Integer(value), start))
    }

    fn lex_word(&mut self, start: Position) -> Result<Token> {
        let mut word = String::new();
        while let Some(c) = self.current_char() {
            if !Self::is_path_char(c) {
                break;
            }
            word.push(self.advance());
        }

        if self.current_char() == Some('=') {
            self.advance();
            return Ok(Token::new(TokenKind::Key(word), start));
        }

        let kind = match word.as_str() {
            "true" => TokenKind::Boolean(true),
            "false" => TokenKind::Boolean(false),
            _ => {
                Self::validate_path(&word, &start)?;
                TokenKind::Path(word)
            }
        };
        Ok(Token::new(kind, start))
    }

    fn read_name(&mut self, start: &Position, what: &str) -> Result<String> {
        let mut name = String::new();
        while let Some(c) = self.current_char() {
            if !Self::is_path_char(c) {
                break;
            }
            name.push(self.advance());
        }

        if name.is_empty() || !name.starts_with(Self::is_ident_start) {
            return Err(CompileError::invalid_token(
                format!("expected {what}"),
                start.clone(),
            ));
        }
        Self::validate_path(&name, start)?;
        Ok(name)
    }

    fn read_partial_name(&mut self, start: &Position) -> Result<String> {
        let mut name = String::new();
        while let Some(c) = self.current_char() {
            if !(Self::is_path_char(c) || c == '/' || c == '-') {
                break;
            }
            name.push(self.advance());
        }

        if name.is_empty() {
            return Err(CompileError::invalid_token(
                "expected partial name",
                start.clone(),
            ));
        }
        Ok(name)
    }

    fn expect_close(&mut self, start: &Position) -> Result<()> {
        self.skip_whitespace();
        if !self.match_str(CLOSE) {
            return Err(CompileError::invalid_token(
                "expected `}}`",
                if self.eof() {
                    start.clone()
                } else {
                    self.current_position()
                },
            ));
        }
        self.advance_n(CLOSE.len());
        Ok(())
    }

    fn validate_path(path: &str, start: &Position) -> Result<()> {
        let malformed = path.split('.').any(|segment| {
            segment.is_empty() || !segment.starts_with(Self::is_ident_start)
        });
        if malformed {
            return Err(CompileError::invalid_token(
                format!("malformed path `{path}`"),
                start.clone(),
            ));
        }
        Ok(())
    }

    fn enter_tag(&mut self, raw: bool, start: &Position) {
        self.mode = Mode::Tag { raw };
        self.tag_start = Some(start.clone());
    }

    fn leave_tag(&mut self) {
        self.mode = Mode::Text;
        self.tag_start = None;
    }

    fn current_position(&self) -> Position {
        Position {
            file: Arc::clone(&self.file),
            line: self.line,
            column: self.column,
        }
    }

    fn skip_whitespace(&mut self) {
        while self.current_char().map_or(false, char::is_whitespace) {
            self.advance();
        }
    }

    fn eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn current_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> char {
        let c = self.chars[self.pos];
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn match_str(&self, s: &str) -> bool {
        let remaining = &self.chars[self.pos..];
        let mut expected = s.chars();
        let mut actual = remaining.iter();
        loop {
            match (expected.next(), actual.next()) {
                (None, _) => return true,
                (Some(a), Some(b)) if a == *b => {}
                _ => return false,
            }
        }
    }

    fn is_ident_start(c: char) -> bool {
        c.is_ascii_alphabetic() || c == '_'
    }

    fn is_ident_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_'
    }

    fn is_path_char(c: char) -> bool {
        Self::is_ident_char(c) || c == '.'
    }
}

impl Iterator for Lexer {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = self.next_token();
        if matches!(
            result,
            Err(_)
                | Ok(Token {
                    kind: TokenKind::Eof,
                    ..
                })
        ) {
            self.finished = true;
        }
        Some(result)
    }
}
