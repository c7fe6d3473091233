// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Statement-terminator resolution.
//!
//! The language has optional semicolons: a statement boundary exists at an
//! explicit `;`, and otherwise at certain newlines. Whether a newline
//! counts is decided here, by [`is_terminator_at`] — a pure function of the
//! previous significant token, the next token, and a small amount of
//! grouping context supplied by the caller. The parser consults it at
//! every inter-statement position; nothing in this module holds state, so
//! the answer for a given position never changes however often it is asked.
//!
//! The rules, in priority order:
//!
//! 1. An explicit `;` is always a terminator.
//! 2. No terminator at the start of the file or immediately after `{`.
//! 3. End of input and a closing `}` terminate the last statement even
//!    without a newline.
//! 4. Inside an unclosed `(` or `[` group, newlines never terminate.
//! 5. Otherwise a crossed newline terminates iff the previous token can
//!    end a statement and the next token does not begin a continuation.
//!
//! The continuation set is operator-shaped: a line starting with a binary
//! or member operator, `,`, `:`, an opening `(`/`[`, or an infix keyword
//! (`in`/`is`/`as`) continues the previous statement. Prefix-only `++`,
//! `--`, and `!` are the exceptions: they can only start a new statement,
//! so a newline before them terminates. `!=`/`!==`/`!in`/`!is` are single
//! operator tokens (or operator-keyword pairs starting with a binary
//! operator) and stay continuations.

use super::token::{Keyword, Token, TokenKind};

/// Grouping context at the position being queried.
///
/// The resolver itself is stateless; the caller tracks how many `(`/`[`
/// groups are open and whether the previous token was `{`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TerminatorContext {
    /// Number of unclosed `(` and `[` groups surrounding the position.
    pub group_depth: u32,
    /// Whether the token immediately before the position is `{`.
    pub after_open_brace: bool,
}

impl TerminatorContext {
    #[must_use]
    pub fn top_level() -> Self {
        Self::default()
    }
}

/// Decides whether a statement boundary exists between `prev` and `next`.
///
/// `prev` is the last significant token before the position (`None` at the
/// start of the file); `next` is the token that would begin the following
/// statement. Pure and idempotent.
#[must_use]
pub fn is_terminator_at(prev: Option<&Token>, next: &Token, ctx: &TerminatorContext) -> bool {
    if matches!(next.kind(), TokenKind::Semicolon) {
        return true;
    }
    let Some(prev) = prev else {
        return false;
    };
    if ctx.after_open_brace {
        return false;
    }
    if matches!(next.kind(), TokenKind::Eof | TokenKind::RightBrace) {
        return can_end_statement(prev.kind());
    }
    if ctx.group_depth > 0 {
        return false;
    }
    if !next.has_leading_newline() {
        return false;
    }
    can_end_statement(prev.kind()) && !begins_continuation(next.kind())
}

/// Whether a token can be the last lexeme of a statement.
#[must_use]
pub fn can_end_statement(kind: &TokenKind) -> bool {
    match kind {
        TokenKind::Identifier(_)
        | TokenKind::Int(_)
        | TokenKind::Float(_)
        | TokenKind::Bool(_)
        | TokenKind::Null
        | TokenKind::CharClose
        | TokenKind::String(_)
        | TokenKind::MultilineString(_)
        | TokenKind::RightParen
        | TokenKind::RightBrace
        | TokenKind::RightBracket
        | TokenKind::Shebang(_)
        | TokenKind::Error(_) => true,
        // `return`, `break`, `continue` may stand alone; `this`/`super`
        // are complete expressions.
        TokenKind::Keyword(
            Keyword::Return | Keyword::Break | Keyword::Continue | Keyword::This | Keyword::Super,
        ) => true,
        // Postfix operators close an expression.
        TokenKind::Operator(op) => matches!(op.as_str(), "++" | "--" | "?"),
        _ => false,
    }
}

/// Whether a token at the start of a line continues the previous statement.
#[must_use]
pub fn begins_continuation(kind: &TokenKind) -> bool {
    match kind {
        TokenKind::Operator(op) => !matches!(op.as_str(), "++" | "--" | "!"),
        TokenKind::Comma | TokenKind::Colon | TokenKind::Semicolon => true,
        TokenKind::LeftParen | TokenKind::LeftBracket => true,
        TokenKind::Keyword(Keyword::In | Keyword::Is | Keyword::As) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_analysis::lexer::lex_with_eof;

    /// Runs the resolver at the boundary before `tokens[index]` with the
    /// given context, using the real lexer for inputs.
    fn terminator_before(source: &str, index: usize, ctx: &TerminatorContext) -> bool {
        let tokens = lex_with_eof(source);
        let prev = index.checked_sub(1).map(|i| &tokens[i]);
        is_terminator_at(prev, &tokens[index], ctx)
    }

    #[test]
    fn explicit_semicolon_always_terminates() {
        assert!(terminator_before("a; b", 1, &TerminatorContext::top_level()));
        // Even inside an open group.
        let ctx = TerminatorContext {
            group_depth: 1,
            ..TerminatorContext::default()
        };
        assert!(terminator_before("(a; b", 2, &ctx));
    }

    #[test]
    fn newline_between_complete_statements_terminates() {
        // val x = 1 \n val y = 2 — boundary before the second `val`.
        let source = "val x = 1\nval y = 2";
        assert!(terminator_before(source, 4, &TerminatorContext::top_level()));
    }

    #[test]
    fn trailing_binary_operator_defers_termination() {
        // 1 + \n 2 — the newline crosses after `+`, which cannot end a
        // statement.
        let source = "1 +\n2";
        assert!(!terminator_before(source, 2, &TerminatorContext::top_level()));
    }

    #[test]
    fn leading_binary_operator_continues() {
        // a \n + b — `+` begins a continuation line.
        let source = "a\n+ b";
        assert!(!terminator_before(source, 1, &TerminatorContext::top_level()));
    }

    #[test]
    fn leading_increment_starts_new_statement() {
        // a \n ++b — `++` is prefix-only, so the newline terminates.
        let source = "a\n++b";
        assert!(terminator_before(source, 1, &TerminatorContext::top_level()));
    }

    #[test]
    fn leading_bang_starts_new_statement_but_bang_eq_continues() {
        assert!(terminator_before("a\n!b", 1, &TerminatorContext::top_level()));
        assert!(!terminator_before("a\n!= b", 1, &TerminatorContext::top_level()));
    }

    #[test]
    fn infix_keyword_continues() {
        assert!(!terminator_before("x\nin list", 1, &TerminatorContext::top_level()));
        assert!(!terminator_before("x\nis Int", 1, &TerminatorContext::top_level()));
        assert!(!terminator_before("x\nas Int", 1, &TerminatorContext::top_level()));
    }

    #[test]
    fn open_group_absorbs_newlines() {
        let ctx = TerminatorContext {
            group_depth: 1,
            ..TerminatorContext::default()
        };
        // f(a \n b — no boundary before `b` while the paren is open.
        assert!(!terminator_before("f(a\nb", 3, &ctx));
    }

    #[test]
    fn no_terminator_at_file_start() {
        let tokens = lex_with_eof("\n\nval");
        assert!(!is_terminator_at(None, &tokens[0], &TerminatorContext::top_level()));
    }

    #[test]
    fn no_terminator_right_after_open_brace() {
        let ctx = TerminatorContext {
            after_open_brace: true,
            ..TerminatorContext::default()
        };
        assert!(!terminator_before("{\nx", 1, &ctx));
    }

    #[test]
    fn eof_terminates_without_newline() {
        let tokens = lex_with_eof("val x = 1");
        let eof = tokens.last().expect("eof");
        assert!(is_terminator_at(
            Some(&tokens[tokens.len() - 2]),
            eof,
            &TerminatorContext::top_level(),
        ));
    }

    #[test]
    fn closing_brace_terminates_without_newline() {
        // { x } — boundary before `}` even though no newline was crossed.
        let tokens = lex_with_eof("{ x }");
        assert!(is_terminator_at(
            Some(&tokens[1]),
            &tokens[2],
            &TerminatorContext::top_level(),
        ));
    }

    #[test]
    fn comment_only_line_does_not_block_termination() {
        // A newline plus a comment line still carries the line break in
        // the next token's leading trivia.
        let source = "val x = 1\n// note\nval y = 2";
        assert!(terminator_before(source, 4, &TerminatorContext::top_level()));
    }

    #[test]
    fn resolver_is_idempotent() {
        let tokens = lex_with_eof("a\nb");
        let ctx = TerminatorContext::top_level();
        let first = is_terminator_at(Some(&tokens[0]), &tokens[1], &ctx);
        for _ in 0..10 {
            assert_eq!(is_terminator_at(Some(&tokens[0]), &tokens[1], &ctx), first);
        }
    }
}
