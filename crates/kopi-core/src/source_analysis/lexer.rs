// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The lexical scanner.
//!
//! A hand-written, single-pass scanner over [`char_indices`]. It produces
//! [`Token`]s with attached trivia, never panics, and never stops early:
//! unrecognised or unterminated input becomes [`TokenKind::Error`] tokens
//! plus structured [`LexError`]s, and scanning resumes after them.
//!
//! Maximal munch applies everywhere: `++` before `+`, `===` before `==`,
//! `?:`/`?.` before `?`, and within an escape sequence's digit ceiling
//! (`\u{1F600}` consumes the whole brace group; `\101` consumes up to three
//! octal digits).
//!
//! One asymmetry is deliberate. A character literal's token covers the
//! opening quote and the content; the closing quote comes back as a
//! separate [`TokenKind::CharClose`] token, mirroring the grammar rule
//! that leaves the closing quote to the caller.
//!
//! [`char_indices`]: str::char_indices

#![expect(
    clippy::cast_possible_truncation,
    reason = "source files over 4 GiB are not supported"
)]

use std::iter::Peekable;
use std::str::CharIndices;

use ecow::EcoString;

use super::error::LexError;
use super::span::Span;
use super::token::{Keyword, Token, TokenKind, Trivia, TriviaKind};

/// Lexes `source`, excluding the final EOF token.
#[must_use]
pub fn lex(source: &str) -> Vec<Token> {
    Lexer::new(source).collect()
}

/// Lexes `source` and appends an EOF token carrying any trailing trivia.
#[must_use]
pub fn lex_with_eof(source: &str) -> Vec<Token> {
    let (tokens, _) = lex_full(source);
    tokens
}

/// Lexes `source`, returning the token stream (EOF included) and every
/// structured error encountered along the way.
#[must_use]
pub fn lex_full(source: &str) -> (Vec<Token>, Vec<LexError>) {
    let mut lexer = Lexer::new(source);
    let mut tokens: Vec<Token> = (&mut lexer).collect();
    tokens.push(lexer.eof_token());
    (tokens, lexer.into_errors())
}

/// The scanner. Also an [`Iterator`] over tokens (without EOF).
pub struct Lexer<'src> {
    source: &'src str,
    chars: Peekable<CharIndices<'src>>,
    /// Byte offset of the slice this lexer scans; spans are absolute.
    base: u32,
    /// Set after a character literal whose closing quote is still
    /// unconsumed; the next token is that quote, as [`TokenKind::CharClose`].
    char_close_pending: bool,
    /// Trivia after the last token, attached to the EOF token.
    eof_trivia: Vec<Trivia>,
    errors: Vec<LexError>,
}

impl<'src> Lexer<'src> {
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self::from_offset(source, 0)
    }

    /// Restarts scanning at `offset`, which must be a byte offset
    /// previously returned in a token span (or 0). Tokens produced from
    /// the same offset are always identical to the original scan, with
    /// one exclusion: the offset of a [`TokenKind::CharClose`] token.
    /// That token exists only as the pending half of the preceding
    /// [`TokenKind::Char`], so a restart there has no way to know it is
    /// inside a character literal and re-scans the closing quote as a
    /// fresh one.
    #[must_use]
    pub fn from_offset(source: &'src str, offset: u32) -> Self {
        Self {
            source,
            chars: source[offset as usize..].char_indices().peekable(),
            base: offset,
            char_close_pending: false,
            eof_trivia: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Errors recorded so far.
    #[must_use]
    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    #[must_use]
    pub fn into_errors(self) -> Vec<LexError> {
        self.errors
    }

    /// The EOF token, carrying trivia found after the last real token.
    /// Meaningful once the iterator is exhausted.
    #[must_use]
    pub fn eof_token(&mut self) -> Token {
        let end = self.source.len() as u32;
        Token::new(TokenKind::Eof, Span::empty(end))
            .with_leading_trivia(std::mem::take(&mut self.eof_trivia))
    }

    // --- character access ----------------------------------------------

    fn current_offset(&self) -> u32 {
        match self.chars.clone().next() {
            Some((i, _)) => self.base + i as u32,
            None => self.source.len() as u32,
        }
    }

    fn advance(&mut self) -> Option<(u32, char)> {
        self.chars.next().map(|(i, c)| (self.base + i as u32, c))
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n).map(|(_, c)| c)
    }

    fn text_from(&self, start: u32) -> EcoString {
        let end = self.current_offset();
        EcoString::from(&self.source[start as usize..end as usize])
    }

    fn span_from(&self, start: u32) -> Span {
        Span::new(start, self.current_offset())
    }

    // --- trivia --------------------------------------------------------

    /// Scans one trivia piece. With `stop_at_newline`, a whitespace run
    /// containing a line break is left unconsumed so it lands in the next
    /// token's leading trivia; that placement is what
    /// [`Token::has_leading_newline`] relies on.
    fn next_trivia_piece(&mut self, stop_at_newline: bool) -> Option<Trivia> {
        let start = self.current_offset();
        match self.peek_char()? {
            c if c.is_whitespace() => {
                let rest = &self.source[start as usize..];
                let run_len = rest
                    .char_indices()
                    .find(|(_, c)| !c.is_whitespace())
                    .map_or(rest.len(), |(i, _)| i);
                let run = &rest[..run_len];
                if stop_at_newline && run.contains('\n') {
                    return None;
                }
                let stop = start + run_len as u32;
                while self.current_offset() < stop {
                    self.advance();
                }
                Some(Trivia::new(
                    TriviaKind::Whitespace,
                    run,
                    Span::new(start, stop),
                ))
            }
            '/' if self.peek_nth(1) == Some('/') => {
                while let Some(c) = self.peek_char() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
                let text = self.text_from(start);
                let span = self.span_from(start);
                Some(Trivia::new(TriviaKind::LineComment, text, span))
            }
            '/' if self.peek_nth(1) == Some('*') => {
                self.advance();
                self.advance();
                let mut depth = 1u32;
                loop {
                    match self.advance() {
                        None => {
                            self.errors.push(LexError::UnterminatedLiteral {
                                what: "block comment",
                                span: self.span_from(start),
                            });
                            break;
                        }
                        Some((_, '*')) if self.peek_char() == Some('/') => {
                            self.advance();
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        Some((_, '/')) if self.peek_char() == Some('*') => {
                            self.advance();
                            depth += 1;
                        }
                        Some(_) => {}
                    }
                }
                let text = self.text_from(start);
                let span = self.span_from(start);
                Some(Trivia::new(TriviaKind::BlockComment, text, span))
            }
            _ => None,
        }
    }

    fn take_leading_trivia(&mut self) -> Vec<Trivia> {
        let mut out = Vec::new();
        while let Some(piece) = self.next_trivia_piece(false) {
            out.push(piece);
        }
        out
    }

    fn collect_trailing_trivia(&mut self) -> Vec<Trivia> {
        let mut out = Vec::new();
        while let Some(piece) = self.next_trivia_piece(true) {
            out.push(piece);
        }
        out
    }

    // --- token scanning ------------------------------------------------

    fn next_token(&mut self) -> Option<Token> {
        if self.char_close_pending {
            self.char_close_pending = false;
            if self.peek_char() == Some('\'') {
                if let Some((quote, _)) = self.advance() {
                    let trailing = self.collect_trailing_trivia();
                    return Some(
                        Token::new(TokenKind::CharClose, Span::new(quote, quote + 1))
                            .with_trailing_trivia(trailing),
                    );
                }
            }
        }
        let leading = self.take_leading_trivia();
        let Some((start, first)) = self.advance() else {
            self.eof_trivia.extend(leading);
            return None;
        };
        let kind = self.lex_token_kind(start, first);
        let span = self.span_from(start);
        let trailing = self.collect_trailing_trivia();
        Some(
            Token::new(kind, span)
                .with_leading_trivia(leading)
                .with_trailing_trivia(trailing),
        )
    }

    fn lex_token_kind(&mut self, start: u32, first: char) -> TokenKind {
        match first {
            'a'..='z' | 'A'..='Z' | '_' => self.lex_identifier(start),
            '`' => self.lex_backtick_identifier(start),
            '0'..='9' => self.lex_number(start, first),
            '"' => self.lex_string(start),
            '\'' => self.lex_character(start),
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '@' => TokenKind::At,
            ':' => {
                if self.peek_char() == Some(':') {
                    self.advance();
                    TokenKind::Operator("::".into())
                } else {
                    TokenKind::Colon
                }
            }
            '.' => {
                if self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                    self.lex_float_fraction(start)
                } else if self.peek_char() == Some('.') {
                    self.advance();
                    TokenKind::Operator("..".into())
                } else {
                    TokenKind::Operator(".".into())
                }
            }
            '#' => self.lex_shebang(start),
            '+' => self.lex_operator(&["++", "+="], "+"),
            '-' => self.lex_operator(&["--", "-=", "->"], "-"),
            '*' => self.lex_operator(&["*="], "*"),
            '/' => self.lex_operator(&["/="], "/"),
            '%' => self.lex_operator(&["%="], "%"),
            '=' => self.lex_operator(&["===", "=="], "="),
            '!' => self.lex_operator(&["!==", "!="], "!"),
            '<' => self.lex_operator(&["<="], "<"),
            '>' => self.lex_operator(&[">="], ">"),
            '&' => self.lex_operator(&["&&"], "&"),
            '|' => self.lex_operator(&["||"], "|"),
            '?' => self.lex_operator(&["?:", "?."], "?"),
            other => {
                self.errors.push(LexError::UnexpectedCharacter {
                    found: other,
                    span: self.span_from(start),
                });
                TokenKind::Error(self.text_from(start))
            }
        }
    }

    /// Maximal munch over candidate multi-character operators, longest
    /// candidates first. The first character is already consumed; each
    /// candidate lists its full text.
    fn lex_operator(&mut self, candidates: &[&str], single: &str) -> TokenKind {
        for full in candidates {
            let tail_len = full.chars().count() - 1;
            let matches = full
                .chars()
                .skip(1)
                .enumerate()
                .all(|(i, c)| self.peek_nth(i) == Some(c));
            if matches {
                for _ in 0..tail_len {
                    self.advance();
                }
                return TokenKind::Operator((*full).into());
            }
        }
        TokenKind::Operator(single.into())
    }

    fn lex_identifier(&mut self, start: u32) -> TokenKind {
        while self
            .peek_char()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }
        let text = self.text_from(start);
        match text.as_str() {
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            "null" => TokenKind::Null,
            word => match Keyword::from_str(word) {
                Some(keyword) => TokenKind::Keyword(keyword),
                None => TokenKind::Identifier(text),
            },
        }
    }

    fn lex_backtick_identifier(&mut self, start: u32) -> TokenKind {
        let name_start = self.current_offset();
        loop {
            match self.peek_char() {
                None | Some('\n' | '\r') => {
                    self.errors.push(LexError::UnterminatedLiteral {
                        what: "quoted identifier",
                        span: self.span_from(start),
                    });
                    return TokenKind::Error(self.text_from(start));
                }
                Some('`') => {
                    let name_end = self.current_offset();
                    let name =
                        EcoString::from(&self.source[name_start as usize..name_end as usize]);
                    self.advance();
                    if name.is_empty() {
                        self.errors.push(LexError::UnexpectedCharacter {
                            found: '`',
                            span: self.span_from(start),
                        });
                        return TokenKind::Error(self.text_from(start));
                    }
                    return TokenKind::Identifier(name);
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn lex_shebang(&mut self, start: u32) -> TokenKind {
        if start == 0 && self.peek_char() == Some('!') {
            while let Some(c) = self.peek_char() {
                if c == '\n' || c == '\r' {
                    break;
                }
                self.advance();
            }
            return TokenKind::Shebang(self.text_from(start));
        }
        self.errors.push(LexError::UnexpectedCharacter {
            found: '#',
            span: self.span_from(start),
        });
        TokenKind::Error(self.text_from(start))
    }

    // --- numbers -------------------------------------------------------

    fn lex_number(&mut self, start: u32, first: char) -> TokenKind {
        if first == '0' && matches!(self.peek_char(), Some('x' | 'X')) {
            self.advance();
            self.consume_digits(|c| c.is_ascii_hexdigit() || c == '_');
            self.consume_integer_suffix();
            return TokenKind::Int(self.text_from(start));
        }
        if first == '0' && matches!(self.peek_char(), Some('b' | 'B')) {
            self.advance();
            self.consume_digits(|c| matches!(c, '0' | '1' | '_'));
            self.consume_integer_suffix();
            return TokenKind::Int(self.text_from(start));
        }

        self.consume_digits(|c| c.is_ascii_digit() || c == '_');

        let mut is_float = false;
        if self.peek_char() == Some('.') && self.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            self.consume_digits(|c| c.is_ascii_digit() || c == '_');
            is_float = true;
        }
        if self.consume_exponent() {
            is_float = true;
        }
        if matches!(self.peek_char(), Some('f' | 'F')) {
            self.advance();
            is_float = true;
        } else if !is_float {
            self.consume_integer_suffix();
        }

        if is_float {
            TokenKind::Float(self.text_from(start))
        } else {
            TokenKind::Int(self.text_from(start))
        }
    }

    /// `.5`, `.5e3`, `.5f` — the leading dot is already consumed.
    fn lex_float_fraction(&mut self, start: u32) -> TokenKind {
        self.consume_digits(|c| c.is_ascii_digit() || c == '_');
        self.consume_exponent();
        if matches!(self.peek_char(), Some('f' | 'F')) {
            self.advance();
        }
        TokenKind::Float(self.text_from(start))
    }

    fn consume_digits(&mut self, accept: impl Fn(char) -> bool) {
        while self.peek_char().is_some_and(&accept) {
            self.advance();
        }
    }

    fn consume_exponent(&mut self) -> bool {
        if !matches!(self.peek_char(), Some('e' | 'E')) {
            return false;
        }
        let after_sign = if matches!(self.peek_nth(1), Some('+' | '-')) { 2 } else { 1 };
        if !self.peek_nth(after_sign).is_some_and(|c| c.is_ascii_digit()) {
            // `1e` is an int followed by an identifier, not a malformed float.
            return false;
        }
        for _ in 0..after_sign {
            self.advance();
        }
        self.consume_digits(|c| c.is_ascii_digit() || c == '_');
        true
    }

    fn consume_integer_suffix(&mut self) {
        match self.peek_char() {
            Some('u' | 'U') => {
                self.advance();
                if matches!(self.peek_char(), Some('l' | 'L')) {
                    self.advance();
                }
            }
            Some('l' | 'L') => {
                self.advance();
            }
            _ => {}
        }
    }

    // --- strings and characters ----------------------------------------

    fn lex_string(&mut self, start: u32) -> TokenKind {
        if self.peek_char() == Some('"') && self.peek_nth(1) == Some('"') {
            self.advance();
            self.advance();
            return self.lex_multiline_string(start);
        }
        let content_start = self.current_offset();
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    self.errors.push(LexError::UnterminatedLiteral {
                        what: "string literal",
                        span: self.span_from(start),
                    });
                    return TokenKind::Error(self.text_from(start));
                }
                Some('"') => {
                    let content_end = self.current_offset();
                    let content = EcoString::from(
                        &self.source[content_start as usize..content_end as usize],
                    );
                    self.advance();
                    return TokenKind::String(content);
                }
                Some('\\') => self.scan_escape(),
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn lex_multiline_string(&mut self, start: u32) -> TokenKind {
        let content_start = self.current_offset();
        loop {
            match self.peek_char() {
                None => {
                    self.errors.push(LexError::UnterminatedLiteral {
                        what: "multiline string literal",
                        span: self.span_from(start),
                    });
                    return TokenKind::Error(self.text_from(start));
                }
                Some('"') => {
                    let mut run = 1;
                    while self.peek_nth(run) == Some('"') {
                        run += 1;
                    }
                    if run < 3 {
                        // A lone `"` or `""` inside the literal is content.
                        for _ in 0..run {
                            self.advance();
                        }
                        continue;
                    }
                    // The last three quotes close; anything before them is
                    // content.
                    for _ in 0..run - 3 {
                        self.advance();
                    }
                    let content_end = self.current_offset();
                    let content = EcoString::from(
                        &self.source[content_start as usize..content_end as usize],
                    );
                    for _ in 0..3 {
                        self.advance();
                    }
                    return TokenKind::MultilineString(content);
                }
                Some('\\') => self.scan_escape(),
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn lex_character(&mut self, start: u32) -> TokenKind {
        let value = match self.peek_char() {
            None | Some('\n') => {
                self.errors.push(LexError::UnterminatedLiteral {
                    what: "character literal",
                    span: self.span_from(start),
                });
                return TokenKind::Error(self.text_from(start));
            }
            Some('\'') => {
                // Empty literal: report, and let the quote start whatever
                // comes next.
                self.errors.push(LexError::UnexpectedCharacter {
                    found: '\'',
                    span: self.span_from(start),
                });
                return TokenKind::Error(self.text_from(start));
            }
            Some('\\') => {
                let escape_start = self.current_offset();
                self.scan_escape();
                let escape_end = self.current_offset();
                let raw = &self.source[escape_start as usize..escape_end as usize];
                decode_escapes(raw)
                    .ok()
                    .and_then(|s| s.chars().next())
                    .unwrap_or('\u{FFFD}')
            }
            Some(c) => {
                self.advance();
                c
            }
        };
        if self.peek_char() == Some('\'') {
            self.char_close_pending = true;
            TokenKind::Char(value)
        } else {
            self.errors.push(LexError::UnterminatedLiteral {
                what: "character literal",
                span: self.span_from(start),
            });
            TokenKind::Error(self.text_from(start))
        }
    }

    /// Consumes one escape sequence; the next char must be `\`. Records
    /// [`LexError::InvalidEscapeSequence`] for malformed `\x`/`\u` forms.
    fn scan_escape(&mut self) {
        let Some((backslash, _)) = self.advance() else {
            return;
        };
        match self.peek_char() {
            None => {
                self.errors.push(LexError::InvalidEscapeSequence {
                    span: self.span_from(backslash),
                });
            }
            Some('0'..='7') => {
                // Up to three octal digits, maximal munch.
                for _ in 0..3 {
                    if !matches!(self.peek_char(), Some('0'..='7')) {
                        break;
                    }
                    self.advance();
                }
            }
            Some('x') => {
                self.advance();
                self.expect_hex_digits(backslash, 2);
            }
            Some('u') => {
                self.advance();
                if self.peek_char() == Some('{') {
                    self.advance();
                    let mut digits = 0;
                    while self.peek_char().is_some_and(|c| c.is_ascii_hexdigit()) {
                        self.advance();
                        digits += 1;
                    }
                    if digits == 0 || self.peek_char() != Some('}') {
                        self.errors.push(LexError::InvalidEscapeSequence {
                            span: self.span_from(backslash),
                        });
                    } else {
                        self.advance();
                    }
                } else {
                    self.expect_hex_digits(backslash, 4);
                }
            }
            Some('U') => {
                // `\U` needs exactly eight hex digits; otherwise it is the
                // plain two-character escape `\U`.
                let eight_hex = (1..=8).all(|i| self.peek_nth(i).is_some_and(|c| c.is_ascii_hexdigit()));
                self.advance();
                if eight_hex {
                    for _ in 0..8 {
                        self.advance();
                    }
                }
            }
            Some(_) => {
                // Named or raw two-character escape; always valid.
                self.advance();
            }
        }
    }

    fn expect_hex_digits(&mut self, escape_start: u32, count: usize) {
        for _ in 0..count {
            if self.peek_char().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.advance();
            } else {
                self.errors.push(LexError::InvalidEscapeSequence {
                    span: self.span_from(escape_start),
                });
                return;
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.next_token()
    }
}

/// Byte offset, within the raw content passed to [`decode_escapes`], of an
/// escape that does not decode to a code point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscapeDecodeError {
    pub offset: usize,
}

/// Decodes the escape sequences in raw string/character content.
///
/// Named escapes map to their usual control characters; any other
/// two-character escape decodes to its second character. `\101` and
/// `A` and `\x41` all decode to `A`.
pub fn decode_escapes(raw: &str) -> Result<String, EscapeDecodeError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.char_indices().peekable();
    while let Some((offset, c)) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let err = EscapeDecodeError { offset };
        match chars.next() {
            None => return Err(err),
            Some((_, d @ '0'..='7')) => {
                let mut value = d as u32 - '0' as u32;
                for _ in 0..2 {
                    match chars.peek() {
                        Some((_, o @ '0'..='7')) => {
                            value = value * 8 + (*o as u32 - '0' as u32);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                out.push(char::from_u32(value).ok_or(err)?);
            }
            Some((_, 'x')) => {
                let value = take_hex(&mut chars, 2).ok_or(err)?;
                out.push(char::from_u32(value).ok_or(err)?);
            }
            Some((_, 'u')) => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    let mut value: u32 = 0;
                    let mut digits = 0;
                    loop {
                        match chars.next() {
                            Some((_, '}')) => break,
                            Some((_, h)) if h.is_ascii_hexdigit() => {
                                value = value
                                    .checked_mul(16)
                                    .and_then(|v| v.checked_add(h.to_digit(16)?))
                                    .ok_or(err)?;
                                digits += 1;
                            }
                            _ => return Err(err),
                        }
                    }
                    if digits == 0 {
                        return Err(err);
                    }
                    out.push(char::from_u32(value).ok_or(err)?);
                } else {
                    let value = take_hex(&mut chars, 4).ok_or(err)?;
                    out.push(char::from_u32(value).ok_or(err)?);
                }
            }
            Some((_, 'U')) => {
                let value = take_hex(&mut chars, 8).ok_or(err)?;
                out.push(char::from_u32(value).ok_or(err)?);
            }
            Some((_, named)) => out.push(match named {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                'b' => '\u{8}',
                'f' => '\u{c}',
                'v' => '\u{b}',
                'a' => '\u{7}',
                other => other,
            }),
        }
    }
    Ok(out)
}

fn take_hex(chars: &mut Peekable<std::str::CharIndices<'_>>, count: usize) -> Option<u32> {
    let mut value: u32 = 0;
    for _ in 0..count {
        let (_, c) = chars.next()?;
        value = value.checked_mul(16)?.checked_add(c.to_digit(16)?)?;
    }
    Some(value)
}
