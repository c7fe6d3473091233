// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The parser.
//!
//! A recursive-descent statement/declaration assembler over an immutable
//! token buffer, with a precedence-climbing expression engine
//! ([`expressions`]) and the grammar's declaration rules ([`declarations`]).
//! The parser is total: it always yields a [`SourceFile`] plus a list of
//! [`Diagnostic`]s, inserting [`Expression::Error`] recovery nodes where
//! the input defeats it, and it never panics on any token stream.
//!
//! Speculative parsing copies the cursor (`self.current` is a plain index
//! into the shared buffer) and restores it on failure; no token is ever
//! mutated or consumed destructively, so backtracking is O(1).
//!
//! [`Expression::Error`]: crate::ast::Expression::Error

pub mod declarations;
pub mod expressions;

#[cfg(test)]
mod property_tests;

use ecow::EcoString;

use crate::ast::SourceFile;

use super::error::ParseError;
use super::span::Span;
use super::terminator::{begins_continuation, is_terminator_at, TerminatorContext};
use super::token::{Keyword, Token, TokenKind};

/// Maximum expression nesting before the parser refuses to recurse
/// further. Combined with `stacker::maybe_grow` this keeps deeply nested
/// input from overflowing the stack.
const MAX_NESTING_DEPTH: u32 = 64;

/// Grammar conflicts where two rules match the same text, listed in
/// declaration order. Resolution always favours the earliest alternative
/// that context does not rule out.
const AMBIGUITIES: &[&[&str]] = &[&["class_body", "enum_class_body"]];

/// Resolves the empty-`{}` body conflict: `class_body` wins unless the
/// `enum` modifier forces `enum_class_body`.
#[must_use]
pub(crate) fn resolve_body_conflict(has_enum_modifier: bool) -> &'static str {
    let alternatives = AMBIGUITIES[0];
    if has_enum_modifier {
        alternatives[1]
    } else {
        alternatives[0]
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A single parser complaint, tied to a source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    #[must_use]
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            span,
        }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            span,
        }
    }
}

/// Left/right binding powers for an infix operator.
///
/// For left-associative operators the right power is one above the left,
/// so the recursive call refuses an operator of the same level and the
/// loop picks it up instead: `a - b - c` is `(a - b) - c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingPower {
    pub left: u8,
    pub right: u8,
}

impl BindingPower {
    #[must_use]
    pub const fn left_assoc(level: u8) -> Self {
        Self {
            left: level,
            right: level + 1,
        }
    }

    #[must_use]
    pub const fn right_assoc(level: u8) -> Self {
        Self {
            left: level + 1,
            right: level,
        }
    }
}

/// Binding power of the named-check level (`in`, `!in`, `is`, `!is`).
pub(crate) const NAMED_CHECK_BP: BindingPower = BindingPower::left_assoc(50);
/// Binding power of a named function used in infix position.
pub(crate) const INFIX_CALL_BP: BindingPower = BindingPower::left_assoc(70);
/// Binding power of `as` / `as?` casts.
pub(crate) const CAST_BP: BindingPower = BindingPower::left_assoc(110);

/// Binding power for a plain binary operator token, by its text.
///
/// Levels are spaced by ten so a level slots between two others without
/// renumbering. Everything here is left-associative, the elvis operator
/// included.
#[must_use]
pub(crate) fn binary_binding_power(op: &str) -> Option<BindingPower> {
    let level = match op {
        "||" => 10,
        "&&" => 20,
        "==" | "!=" | "===" | "!==" => 30,
        "<" | ">" | "<=" | ">=" => 40,
        "?:" => 60,
        ".." => 80,
        "+" | "-" => 90,
        "*" | "/" | "%" => 100,
        _ => return None,
    };
    Some(BindingPower::left_assoc(level))
}

/// Parses a whole file. Total: always returns a tree and whatever
/// diagnostics accumulated along the way.
#[must_use]
pub fn parse(tokens: Vec<Token>) -> (SourceFile, Vec<Diagnostic>) {
    let mut parser = Parser::new(tokens);
    let file = parser.parse_source_file();
    (file, parser.diagnostics)
}

/// Parses a single expression starting at token index `start`.
///
/// On success returns the expression and the index of the first token
/// after it. On failure the [`ParseError`] carries the furthest offset the
/// engine reached and the token set expected there.
pub fn parse_expression(
    tokens: &[Token],
    start: usize,
) -> Result<(crate::ast::Expression, usize), ParseError> {
    let mut parser = Parser::new(tokens.to_vec());
    parser.current = start.min(parser.tokens.len() - 1);
    let expression = parser.parse_expression();
    let failed = expression.is_error()
        || parser
            .diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error);
    if failed {
        Err(parser.into_parse_error())
    } else {
        Ok((expression, parser.current))
    }
}

/// Parser state over an immutable token buffer.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    diagnostics: Vec<Diagnostic>,
    nesting_depth: u32,
    /// Open `(`/`[` groups, fed to the terminator resolver.
    group_depth: u32,
    /// Furthest byte offset where an expectation failed, with the token
    /// descriptions that were acceptable there.
    furthest_offset: u32,
    furthest_span: Span,
    furthest_found: EcoString,
    expected_at_furthest: Vec<EcoString>,
}

impl Parser {
    #[must_use]
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(|t| t.kind().is_eof()) {
            let end = tokens.last().map_or(0, |t| t.span().end());
            tokens.push(Token::new(TokenKind::Eof, Span::empty(end)));
        }
        Self {
            tokens,
            current: 0,
            diagnostics: Vec::new(),
            nesting_depth: 0,
            group_depth: 0,
            furthest_offset: 0,
            furthest_span: Span::empty(0),
            furthest_found: EcoString::new(),
            expected_at_furthest: Vec::new(),
        }
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    // --- token access --------------------------------------------------

    pub(crate) fn peek(&self) -> &Token {
        let index = self.current.min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        self.peek().kind()
    }

    pub(crate) fn peek_nth(&self, n: usize) -> &Token {
        let index = (self.current + n).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    pub(crate) fn previous(&self) -> Option<&Token> {
        self.current.checked_sub(1).map(|i| &self.tokens[i])
    }

    pub(crate) fn at_end(&self) -> bool {
        self.peek().kind().is_eof()
    }

    /// Consumes and returns the current token. At EOF, returns the EOF
    /// token without moving.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.at_end() {
            self.current += 1;
        }
        token
    }

    /// Current cursor position, for speculative save/restore.
    pub(crate) fn checkpoint(&self) -> usize {
        self.current
    }

    pub(crate) fn restore(&mut self, checkpoint: usize) {
        self.current = checkpoint;
    }

    pub(crate) fn at_operator(&self, op: &str) -> bool {
        self.peek_kind().is_operator(op)
    }

    pub(crate) fn at_keyword(&self, keyword: Keyword) -> bool {
        self.peek_kind().is_keyword(keyword)
    }

    /// Consumes the current token if it is the given operator.
    pub(crate) fn eat_operator(&mut self, op: &str) -> Option<Token> {
        if self.at_operator(op) {
            Some(self.advance())
        } else {
            None
        }
    }

    pub(crate) fn eat_keyword(&mut self, keyword: Keyword) -> Option<Token> {
        if self.at_keyword(keyword) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consumes the current token if `matches` accepts its kind.
    pub(crate) fn eat_if(&mut self, matches: impl Fn(&TokenKind) -> bool) -> Option<Token> {
        if matches(self.peek_kind()) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consumes a token of the expected shape or records a diagnostic and
    /// returns `None` without advancing.
    pub(crate) fn expect(
        &mut self,
        matches: impl Fn(&TokenKind) -> bool,
        description: &str,
    ) -> Option<Token> {
        if matches(self.peek_kind()) {
            return Some(self.advance());
        }
        self.note_expected(description);
        let found = self.peek_kind().describe();
        let span = self.peek().span();
        self.error(format!("expected {description}, found {found}"), span);
        None
    }

    /// Consumes an identifier token, soft keywords included.
    pub(crate) fn expect_identifier(&mut self, description: &str) -> Option<crate::ast::Identifier> {
        let token = self.expect(|k| matches!(k, TokenKind::Identifier(_)), description)?;
        let TokenKind::Identifier(name) = token.kind() else {
            return None;
        };
        Some(crate::ast::Identifier {
            name: name.clone(),
            span: token.span(),
        })
    }

    // --- diagnostics ----------------------------------------------------

    pub(crate) fn error(&mut self, message: impl Into<String>, span: Span) {
        self.diagnostics.push(Diagnostic::error(message, span));
    }

    pub(crate) fn warning(&mut self, message: impl Into<String>, span: Span) {
        self.diagnostics.push(Diagnostic::warning(message, span));
    }

    /// Records that `what` would have been acceptable at the current
    /// position. The expected set is kept only for the furthest offset
    /// reached, so a failed parse reports where the engine got stuck, not
    /// where it first complained.
    pub(crate) fn note_expected(&mut self, what: &str) {
        let span = self.peek().span();
        let offset = span.start();
        if offset > self.furthest_offset || self.expected_at_furthest.is_empty() {
            self.furthest_offset = offset;
            self.furthest_span = span;
            self.furthest_found = self.peek().kind().describe().into();
            self.expected_at_furthest.clear();
        } else if offset < self.furthest_offset {
            return;
        }
        let what: EcoString = what.into();
        if !self.expected_at_furthest.contains(&what) {
            self.expected_at_furthest.push(what);
        }
    }

    fn into_parse_error(self) -> ParseError {
        let mut expected = self.expected_at_furthest;
        expected.sort_unstable();
        ParseError::UnexpectedToken {
            expected,
            found: if self.furthest_found.is_empty() {
                self.tokens[self.current.min(self.tokens.len() - 1)]
                    .kind()
                    .describe()
                    .into()
            } else {
                self.furthest_found
            },
            offset: self.furthest_offset,
            span: self.furthest_span,
        }
    }

    // --- nesting and grouping -------------------------------------------

    /// Runs `f` one nesting level deeper, growing the stack if needed.
    /// Past [`MAX_NESTING_DEPTH`] it records a diagnostic and produces
    /// `fallback` instead of recursing.
    pub(crate) fn with_nesting<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> T,
        fallback: impl FnOnce(&mut Self) -> T,
    ) -> T {
        if self.nesting_depth >= MAX_NESTING_DEPTH {
            let span = self.peek().span();
            self.error("expression nesting too deep", span);
            return fallback(self);
        }
        self.nesting_depth += 1;
        let result = stacker::maybe_grow(64 * 1024, 1024 * 1024, || f(self));
        self.nesting_depth -= 1;
        result
    }

    /// Runs `f` inside an open `(`/`[` group; newlines do not terminate
    /// statements while the group is open.
    pub(crate) fn in_group<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.group_depth += 1;
        let result = f(self);
        self.group_depth -= 1;
        result
    }

    // --- statement boundaries -------------------------------------------

    /// Consults the terminator resolver at the current position.
    #[must_use]
    pub(crate) fn at_statement_terminator(&self) -> bool {
        let ctx = TerminatorContext {
            group_depth: self.group_depth,
            after_open_brace: self
                .previous()
                .is_some_and(|t| matches!(t.kind(), TokenKind::LeftBrace)),
        };
        is_terminator_at(self.previous(), self.peek(), &ctx)
    }

    /// Requires a statement boundary here; consumes an explicit `;`.
    pub(crate) fn expect_statement_terminator(&mut self) {
        if self.at_statement_terminator() {
            if matches!(self.peek_kind(), TokenKind::Semicolon) {
                self.advance();
            }
            return;
        }
        self.note_expected("`;` or a new line");
        let found = self.peek_kind().describe();
        let span = self.peek().span();
        self.error(format!("expected `;` or a new line, found {found}"), span);
    }

    /// Like [`Self::expect_statement_terminator`], but decided on
    /// lookahead alone. For boundaries where the grammar already knows
    /// the statement is over regardless of what its last lexeme was: a
    /// wildcard import ends in `*`, which the resolver's
    /// can-end-statement table would otherwise reject.
    pub(crate) fn expect_terminator_lookahead_only(&mut self) {
        if matches!(self.peek_kind(), TokenKind::Semicolon) {
            self.advance();
            return;
        }
        let next = self.peek();
        if next.kind().is_eof()
            || matches!(next.kind(), TokenKind::RightBrace)
            || (next.has_leading_newline() && !begins_continuation(next.kind()))
        {
            return;
        }
        self.note_expected("`;` or a new line");
        let found = self.peek_kind().describe();
        let span = self.peek().span();
        self.error(format!("expected `;` or a new line, found {found}"), span);
    }

    /// Panic-mode recovery: skips tokens until a plausible statement
    /// start. Guaranteed to make progress.
    pub(crate) fn synchronize(&mut self) {
        if self.at_end() {
            return;
        }
        self.advance();
        while !self.at_end() {
            if matches!(self.previous().map(Token::kind), Some(TokenKind::Semicolon)) {
                return;
            }
            match self.peek_kind() {
                TokenKind::Keyword(
                    Keyword::Class
                    | Keyword::Interface
                    | Keyword::Fun
                    | Keyword::Object
                    | Keyword::Val
                    | Keyword::Var
                    | Keyword::TypeAlias
                    | Keyword::Import
                    | Keyword::Package
                    | Keyword::Return
                    | Keyword::If
                    | Keyword::When
                    | Keyword::Try,
                )
                | TokenKind::RightBrace => return,
                _ => {}
            }
            if self.at_statement_terminator() {
                return;
            }
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::lexer::lex_with_eof;

    #[test]
    fn left_assoc_binding_power_spreads() {
        let bp = BindingPower::left_assoc(90);
        assert_eq!(bp.left, 90);
        assert_eq!(bp.right, 91);
        let bp = BindingPower::right_assoc(90);
        assert_eq!(bp.left, 91);
        assert_eq!(bp.right, 90);
    }

    #[test]
    fn precedence_table_ordering() {
        let or = binary_binding_power("||").expect("||");
        let and = binary_binding_power("&&").expect("&&");
        let eq = binary_binding_power("==").expect("==");
        let cmp = binary_binding_power("<").expect("<");
        let elvis = binary_binding_power("?:").expect("?:");
        let range = binary_binding_power("..").expect("..");
        let add = binary_binding_power("+").expect("+");
        let mul = binary_binding_power("*").expect("*");
        let declared = [or, and, eq, cmp, elvis, range, add, mul].map(|b| b.left);
        let mut sorted = declared;
        sorted.sort_unstable();
        assert_eq!(declared, sorted, "levels must already be ascending");
        assert!(NAMED_CHECK_BP.left > cmp.left && NAMED_CHECK_BP.left < elvis.left);
        assert!(INFIX_CALL_BP.left > elvis.left && INFIX_CALL_BP.left < range.left);
        assert!(CAST_BP.left > mul.left);
    }

    #[test]
    fn unknown_operator_has_no_binding_power() {
        assert_eq!(binary_binding_power("->"), None);
        assert_eq!(binary_binding_power("="), None);
        assert_eq!(binary_binding_power("++"), None);
    }

    #[test]
    fn parser_appends_missing_eof() {
        let tokens = lex_with_eof("1 + 2");
        let without_eof: Vec<Token> = tokens[..tokens.len() - 1].to_vec();
        let parser = Parser::new(without_eof);
        assert!(parser.tokens.last().is_some_and(|t| t.kind().is_eof()));
    }

    #[test]
    fn expected_set_tracks_furthest_offset() {
        let tokens = lex_with_eof("a + ;");
        let error = parse_expression(&tokens, 0).expect_err("must fail");
        // The engine got past `a +` before failing, so the offset is the
        // `;`, not the start of the expression.
        assert_eq!(error.offset(), 4);
    }

    #[test]
    fn body_conflict_resolves_first_declared() {
        assert_eq!(resolve_body_conflict(false), "class_body");
        assert_eq!(resolve_body_conflict(true), "enum_class_body");
    }

    #[test]
    fn checkpoint_restore_is_pure() {
        let tokens = lex_with_eof("a.b.c");
        let mut parser = Parser::new(tokens);
        let checkpoint = parser.checkpoint();
        let _ = parser.parse_expression();
        parser.restore(checkpoint);
        assert_eq!(parser.checkpoint(), checkpoint);
        // Re-parsing from the checkpoint yields the same shape.
        let first = parser.parse_expression();
        parser.restore(checkpoint);
        let second = parser.parse_expression();
        assert_eq!(first, second);
    }
}
