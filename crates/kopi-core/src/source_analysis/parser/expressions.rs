// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Expression parsing: precedence climbing over the binary operator
//! table, with prefix, postfix, and primary layers.
//!
//! The binary loop is a Pratt parser driven by [`binary_binding_power`];
//! `in`/`!in`/`is`/`!is`, `as`/`as?`, and named infix calls slot into the
//! same loop at their own levels. Assignment sits above the loop: it
//! consumes the rest of the expression, so chained assignment nests to the
//! right even though every table operator is left-associative.
//!
//! `*` never reaches the binary table in spread position: call arguments
//! and collection elements check for a leading `*` before handing the rest
//! to the expression engine.

use ecow::EcoString;

use crate::ast::{
    CallArgument, CatchClause, CollectionElement, ControlBody, Expression, Identifier,
    LambdaParameter, LiteralValue, Statement, VariableBinding, WhenEntry, WhenSubject,
};

use super::super::token::{Keyword, TokenKind};
use super::{binary_binding_power, BindingPower, Parser, CAST_BP, INFIX_CALL_BP, NAMED_CHECK_BP};

/// Whether a token can begin an expression. Used to decide if an
/// identifier in operand position is an infix call, and whether a jump
/// keyword has an operand.
pub(crate) fn token_starts_expression(kind: &TokenKind) -> bool {
    match kind {
        TokenKind::Identifier(_)
        | TokenKind::Int(_)
        | TokenKind::Float(_)
        | TokenKind::Bool(_)
        | TokenKind::Null
        | TokenKind::Char(_)
        | TokenKind::String(_)
        | TokenKind::MultilineString(_)
        | TokenKind::LeftParen
        | TokenKind::LeftBracket
        | TokenKind::LeftBrace => true,
        TokenKind::Keyword(
            Keyword::This
            | Keyword::Super
            | Keyword::If
            | Keyword::When
            | Keyword::Try
            | Keyword::Object
            | Keyword::Fun
            | Keyword::Return
            | Keyword::Throw
            | Keyword::Break
            | Keyword::Continue,
        ) => true,
        TokenKind::Operator(op) => matches!(op.as_str(), "+" | "-" | "!" | "++" | "--"),
        _ => false,
    }
}

/// What the binary loop found in infix position.
enum InfixOp {
    Binary(EcoString, BindingPower),
    /// `in` / `!in` / `is` / `!is`; `is` variants take a type RHS.
    NamedCheck { negated: bool, is_type: bool },
    /// `as` / `as?`.
    Cast,
    /// A named function in infix position.
    InfixCall,
}

impl Parser {
    /// Parses one expression. Total: on garbage it records diagnostics and
    /// returns an [`Expression::Error`] node.
    pub(crate) fn parse_expression(&mut self) -> Expression {
        self.with_nesting(Self::parse_assignment, |p| {
            let span = p.peek().span();
            if !p.at_end() {
                p.advance();
            }
            Expression::Error { span }
        })
    }

    fn parse_assignment(&mut self) -> Expression {
        let target = self.parse_binary(0);
        let op = match self.peek_kind() {
            TokenKind::Operator(op)
                if matches!(op.as_str(), "=" | "+=" | "-=" | "*=" | "/=" | "%=") =>
            {
                op.clone()
            }
            _ => return target,
        };
        let op_token = self.advance();
        if op != "=" && !target.is_assignable_chain() {
            self.error(
                format!("the target of `{op}` must be a primary expression"),
                op_token.span(),
            );
        }
        // The value takes everything to the right, so `a = b = c` nests
        // as `a = (b = c)`.
        let value = self.parse_expression();
        let span = target.span().merge(value.span());
        Expression::Assignment {
            op,
            target: Box::new(target),
            value: Box::new(value),
            span,
        }
    }

    fn parse_binary(&mut self, min_bp: u8) -> Expression {
        let mut left = self.parse_prefix();
        loop {
            let Some((op, bp)) = self.classify_infix(min_bp) else {
                break;
            };
            match op {
                InfixOp::Binary(op, _) => {
                    self.advance();
                    let right = self.parse_binary(bp.right);
                    let span = left.span().merge(right.span());
                    left = Expression::Binary {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                        span,
                    };
                }
                InfixOp::NamedCheck { negated, is_type } => {
                    if negated {
                        self.advance(); // `!`
                    }
                    self.advance(); // `in` / `is`
                    if is_type {
                        let span_end = self.peek().span();
                        let Some(ty) = self.parse_type() else {
                            return Expression::Error {
                                span: left.span().merge(span_end),
                            };
                        };
                        let span = left.span().merge(ty.span);
                        left = Expression::TypeCheck {
                            negated,
                            value: Box::new(left),
                            ty,
                            span,
                        };
                    } else {
                        let right = self.parse_binary(bp.right);
                        let span = left.span().merge(right.span());
                        let op: EcoString = if negated { "!in".into() } else { "in".into() };
                        left = Expression::Binary {
                            op,
                            left: Box::new(left),
                            right: Box::new(right),
                            span,
                        };
                    }
                }
                InfixOp::Cast => {
                    self.advance(); // `as`
                    let safe = self.eat_operator("?").is_some();
                    let span_end = self.peek().span();
                    let Some(ty) = self.parse_type() else {
                        return Expression::Error {
                            span: left.span().merge(span_end),
                        };
                    };
                    let span = left.span().merge(ty.span);
                    left = Expression::Cast {
                        safe,
                        value: Box::new(left),
                        ty,
                        span,
                    };
                }
                InfixOp::InfixCall => {
                    let token = self.advance();
                    let TokenKind::Identifier(name) = token.kind() else {
                        break;
                    };
                    let function = Identifier {
                        name: name.clone(),
                        span: token.span(),
                    };
                    let right = self.parse_binary(bp.right);
                    let span = left.span().merge(right.span());
                    left = Expression::InfixCall {
                        function,
                        left: Box::new(left),
                        right: Box::new(right),
                        span,
                    };
                }
            }
        }
        left
    }

    /// Classifies the token at the cursor as an infix operator binding at
    /// least `min_bp`, without consuming anything.
    fn classify_infix(&self, min_bp: u8) -> Option<(InfixOp, BindingPower)> {
        match self.peek_kind() {
            TokenKind::Operator(op) => {
                if op == "!"
                    && matches!(
                        self.peek_nth(1).kind(),
                        TokenKind::Keyword(Keyword::In | Keyword::Is)
                    )
                {
                    if NAMED_CHECK_BP.left < min_bp {
                        return None;
                    }
                    let is_type = self.peek_nth(1).kind().is_keyword(Keyword::Is);
                    return Some((
                        InfixOp::NamedCheck {
                            negated: true,
                            is_type,
                        },
                        NAMED_CHECK_BP,
                    ));
                }
                let bp = binary_binding_power(op)?;
                if bp.left < min_bp {
                    return None;
                }
                Some((InfixOp::Binary(op.clone(), bp), bp))
            }
            TokenKind::Keyword(Keyword::In | Keyword::Is) => {
                if NAMED_CHECK_BP.left < min_bp {
                    return None;
                }
                let is_type = self.peek_kind().is_keyword(Keyword::Is);
                Some((
                    InfixOp::NamedCheck {
                        negated: false,
                        is_type,
                    },
                    NAMED_CHECK_BP,
                ))
            }
            TokenKind::Keyword(Keyword::As) => {
                if CAST_BP.left < min_bp {
                    return None;
                }
                Some((InfixOp::Cast, CAST_BP))
            }
            TokenKind::Identifier(_) => {
                if INFIX_CALL_BP.left < min_bp {
                    return None;
                }
                // An infix call needs its name and its argument on the
                // same line as the left operand; anything else is the next
                // statement.
                if self.peek().has_leading_newline() {
                    return None;
                }
                let argument = self.peek_nth(1);
                if argument.has_leading_newline() || !token_starts_expression(argument.kind()) {
                    return None;
                }
                Some((InfixOp::InfixCall, INFIX_CALL_BP))
            }
            _ => None,
        }
    }

    fn parse_prefix(&mut self) -> Expression {
        match self.peek_kind() {
            TokenKind::Operator(op) if matches!(op.as_str(), "+" | "-" | "++" | "--" | "!") => {
                let op = op.clone();
                let token = self.advance();
                let operand = self.with_nesting(Self::parse_prefix, |p| Expression::Error {
                    span: p.peek().span(),
                });
                let span = token.span().merge(operand.span());
                Expression::Unary {
                    op,
                    prefix: true,
                    operand: Box::new(operand),
                    span,
                }
            }
            // `label@ expr`
            TokenKind::Identifier(_)
                if matches!(self.peek_nth(1).kind(), TokenKind::At)
                    && token_starts_expression(self.peek_nth(2).kind()) =>
            {
                let token = self.advance();
                let TokenKind::Identifier(name) = token.kind() else {
                    return Expression::Error { span: token.span() };
                };
                let label = Identifier {
                    name: name.clone(),
                    span: token.span(),
                };
                self.advance(); // `@`
                let body = self.with_nesting(Self::parse_prefix, |p| Expression::Error {
                    span: p.peek().span(),
                });
                let span = label.span.merge(body.span());
                Expression::Labeled {
                    label,
                    body: Box::new(body),
                    span,
                }
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Expression {
        let mut expr = self.parse_primary();
        loop {
            match self.peek_kind() {
                // `?` is in the resolver's continuation set, so it reaches
                // back across a newline; `++`/`--` are not (a line-leading
                // one is a prefix), so those stay same-line.
                TokenKind::Operator(op)
                    if op.as_str() == "?"
                        || (matches!(op.as_str(), "++" | "--")
                            && !self.peek().has_leading_newline()) =>
                {
                    let op = op.clone();
                    let token = self.advance();
                    let span = expr.span().merge(token.span());
                    expr = Expression::Unary {
                        op,
                        prefix: false,
                        operand: Box::new(expr),
                        span,
                    };
                }
                TokenKind::Operator(op) if matches!(op.as_str(), "." | "?.") => {
                    let safe = op == "?.";
                    self.advance();
                    let Some(name) = self.expect_identifier("a member name") else {
                        return Expression::Error {
                            span: expr.span().merge(self.peek().span()),
                        };
                    };
                    let span = expr.span().merge(name.span);
                    expr = Expression::Member {
                        receiver: Box::new(expr),
                        safe,
                        name,
                        span,
                    };
                }
                TokenKind::LeftParen => {
                    expr = self.parse_call(expr);
                }
                // A line-leading `[` continues the statement, same as the
                // resolver's continuation set says.
                TokenKind::LeftBracket => {
                    expr = self.parse_index(expr);
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_call(&mut self, callee: Expression) -> Expression {
        self.advance(); // `(`
        let arguments = self.parse_value_arguments();
        let end = self
            .expect(|k| matches!(k, TokenKind::RightParen), "`)`")
            .map_or_else(|| self.peek().span(), |t| t.span());
        let span = callee.span().merge(end);
        Expression::Call {
            callee: Box::new(callee),
            arguments,
            span,
        }
    }

    /// Parses a `(`-delimited argument list; the caller has consumed the
    /// `(` and closes the `)` itself. Shared with constructor delegation,
    /// enum entries, and annotations.
    pub(crate) fn parse_value_arguments(&mut self) -> Vec<CallArgument> {
        self.in_group(|p| {
            let mut arguments = Vec::new();
            while !matches!(p.peek_kind(), TokenKind::RightParen) && !p.at_end() {
                arguments.push(p.parse_call_argument());
                if p.eat_if(|k| matches!(k, TokenKind::Comma)).is_none() {
                    break;
                }
            }
            arguments
        })
    }

    fn parse_call_argument(&mut self) -> CallArgument {
        let start = self.peek().span();
        let name = if matches!(self.peek_kind(), TokenKind::Identifier(_))
            && self.peek_nth(1).kind().is_operator("=")
        {
            let token = self.advance();
            self.advance(); // `=`
            match token.kind() {
                TokenKind::Identifier(name) => Some(Identifier {
                    name: name.clone(),
                    span: token.span(),
                }),
                _ => None,
            }
        } else {
            None
        };
        // Leading `*` in argument position is always spread, never
        // multiplication: there is no left operand for it to bind to.
        let spread = self.eat_operator("*").is_some();
        let value = self.parse_expression();
        let span = start.merge(value.span());
        CallArgument {
            name,
            spread,
            value,
            span,
        }
    }

    fn parse_index(&mut self, receiver: Expression) -> Expression {
        self.advance(); // `[`
        let arguments = self.in_group(|p| {
            let mut arguments = Vec::new();
            while !matches!(p.peek_kind(), TokenKind::RightBracket) && !p.at_end() {
                arguments.push(p.parse_expression());
                if p.eat_if(|k| matches!(k, TokenKind::Comma)).is_none() {
                    break;
                }
            }
            arguments
        });
        let end = self
            .expect(|k| matches!(k, TokenKind::RightBracket), "`]`")
            .map_or_else(|| self.peek().span(), |t| t.span());
        let span = receiver.span().merge(end);
        Expression::Index {
            receiver: Box::new(receiver),
            arguments,
            span,
        }
    }

    fn parse_primary(&mut self) -> Expression {
        match self.peek_kind().clone() {
            TokenKind::Int(text) => {
                let token = self.advance();
                Expression::Literal {
                    value: LiteralValue::Int(text),
                    span: token.span(),
                }
            }
            TokenKind::Float(text) => {
                let token = self.advance();
                Expression::Literal {
                    value: LiteralValue::Float(text),
                    span: token.span(),
                }
            }
            TokenKind::Bool(value) => {
                let token = self.advance();
                Expression::Literal {
                    value: LiteralValue::Bool(value),
                    span: token.span(),
                }
            }
            TokenKind::Null => {
                let token = self.advance();
                Expression::Literal {
                    value: LiteralValue::Null,
                    span: token.span(),
                }
            }
            TokenKind::String(text) => {
                let token = self.advance();
                Expression::Literal {
                    value: LiteralValue::String(text),
                    span: token.span(),
                }
            }
            TokenKind::MultilineString(text) => {
                let token = self.advance();
                Expression::Literal {
                    value: LiteralValue::MultilineString(text),
                    span: token.span(),
                }
            }
            TokenKind::Char(value) => {
                let token = self.advance();
                // The closing quote is its own token, consumed here.
                let close = self.expect(|k| matches!(k, TokenKind::CharClose), "`'`");
                let span = close.map_or(token.span(), |c| token.span().merge(c.span()));
                Expression::Literal {
                    value: LiteralValue::Char(value),
                    span,
                }
            }
            TokenKind::Identifier(name) => {
                let token = self.advance();
                Expression::Identifier(Identifier {
                    name,
                    span: token.span(),
                })
            }
            TokenKind::LeftParen => {
                let open = self.advance();
                let inner = self.in_group(Self::parse_expression);
                let end = self
                    .expect(|k| matches!(k, TokenKind::RightParen), "`)`")
                    .map_or_else(|| inner.span(), |t| t.span());
                Expression::Parenthesized {
                    inner: Box::new(inner),
                    span: open.span().merge(end),
                }
            }
            TokenKind::LeftBracket => self.parse_collection_literal(),
            TokenKind::LeftBrace => self.parse_lambda(),
            TokenKind::Keyword(Keyword::Object) => self.parse_object_literal(),
            TokenKind::Keyword(Keyword::Fun) => self.parse_anonymous_function(),
            TokenKind::Keyword(Keyword::This) => {
                let token = self.advance();
                let label = self.parse_jump_label();
                let span = label
                    .as_ref()
                    .map_or(token.span(), |l| token.span().merge(l.span));
                Expression::This { label, span }
            }
            TokenKind::Keyword(Keyword::Super) => self.parse_super(),
            TokenKind::Keyword(Keyword::If) => self.parse_if(),
            TokenKind::Keyword(Keyword::When) => self.parse_when(),
            TokenKind::Keyword(Keyword::Try) => self.parse_try(),
            TokenKind::Keyword(Keyword::Return) => {
                let token = self.advance();
                let label = self.parse_jump_label();
                let value = if !self.at_statement_terminator()
                    && token_starts_expression(self.peek_kind())
                {
                    Some(Box::new(self.parse_expression()))
                } else {
                    None
                };
                let mut span = token.span();
                if let Some(label) = &label {
                    span = span.merge(label.span);
                }
                if let Some(value) = &value {
                    span = span.merge(value.span());
                }
                Expression::Return { label, value, span }
            }
            TokenKind::Keyword(Keyword::Throw) => {
                let token = self.advance();
                let value = self.parse_expression();
                let span = token.span().merge(value.span());
                Expression::Throw {
                    value: Box::new(value),
                    span,
                }
            }
            TokenKind::Keyword(Keyword::Break) => {
                let token = self.advance();
                let label = self.parse_jump_label();
                let span = label
                    .as_ref()
                    .map_or(token.span(), |l| token.span().merge(l.span));
                Expression::Break { label, span }
            }
            TokenKind::Keyword(Keyword::Continue) => {
                let token = self.advance();
                let label = self.parse_jump_label();
                let span = label
                    .as_ref()
                    .map_or(token.span(), |l| token.span().merge(l.span));
                Expression::Continue { label, span }
            }
            _ => {
                self.note_expected("an expression");
                let found = self.peek_kind().describe();
                let span = self.peek().span();
                self.error(format!("expected an expression, found {found}"), span);
                Expression::Error { span }
            }
        }
    }

    /// `@label` directly after `this`/`super`/`return`/`break`/`continue`.
    fn parse_jump_label(&mut self) -> Option<Identifier> {
        if !matches!(self.peek_kind(), TokenKind::At) || self.peek().has_leading_newline() {
            return None;
        }
        self.advance();
        self.expect_identifier("a label name")
    }

    fn parse_collection_literal(&mut self) -> Expression {
        let open = self.advance(); // `[`
        let elements = self.in_group(|p| {
            let mut elements = Vec::new();
            while !matches!(p.peek_kind(), TokenKind::RightBracket) && !p.at_end() {
                let start = p.peek().span();
                // Leading `*` spreads the element, as in argument lists.
                let spread = p.eat_operator("*").is_some();
                let value = p.parse_expression();
                let span = start.merge(value.span());
                elements.push(CollectionElement {
                    spread,
                    value,
                    span,
                });
                if p.eat_if(|k| matches!(k, TokenKind::Comma)).is_none() {
                    break;
                }
            }
            elements
        });
        let end = self
            .expect(|k| matches!(k, TokenKind::RightBracket), "`]`")
            .map_or_else(|| self.peek().span(), |t| t.span());
        Expression::CollectionLiteral {
            elements,
            span: open.span().merge(end),
        }
    }

    fn parse_object_literal(&mut self) -> Expression {
        let token = self.advance(); // `object`
        let body = if matches!(self.peek_kind(), TokenKind::LeftBrace) {
            Some(self.parse_class_body(false))
        } else {
            None
        };
        let span = body
            .as_ref()
            .map_or(token.span(), |b| token.span().merge(b.span));
        Expression::ObjectLiteral { body, span }
    }

    fn parse_anonymous_function(&mut self) -> Expression {
        let token = self.advance(); // `fun`
        // `fun Receiver.` — speculative, since a bare `fun` body follows
        // immediately otherwise.
        let checkpoint = self.checkpoint();
        let receiver = match self.try_parse_type() {
            Some(ty) if self.eat_operator(".").is_some() => Some(ty),
            _ => {
                self.restore(checkpoint);
                None
            }
        };
        let return_type = if self.eat_if(|k| matches!(k, TokenKind::Colon)).is_some() {
            self.parse_type()
        } else {
            None
        };
        let body = self.parse_optional_function_body();
        let mut span = token.span();
        if let Some(body) = &body {
            span = span.merge(match body {
                crate::ast::FunctionBody::Block(block) => block.span,
                crate::ast::FunctionBody::Expression(expr) => expr.span(),
            });
        } else if let Some(ty) = &return_type {
            span = span.merge(ty.span);
        }
        Expression::AnonymousFunction {
            receiver,
            return_type,
            body,
            span,
        }
    }

    fn parse_super(&mut self) -> Expression {
        let token = self.advance();
        let type_argument = if self.at_operator("<") {
            self.advance();
            let ty = self.parse_type();
            self.expect(|k| k.is_operator(">"), "`>`");
            ty
        } else {
            None
        };
        let label = self.parse_jump_label();
        let mut span = token.span();
        if let Some(ty) = &type_argument {
            span = span.merge(ty.span);
        }
        if let Some(label) = &label {
            span = span.merge(label.span);
        }
        Expression::Super {
            type_argument,
            label,
            span,
        }
    }

    fn parse_if(&mut self) -> Expression {
        let token = self.advance(); // `if`
        self.expect(|k| matches!(k, TokenKind::LeftParen), "`(`");
        let condition = self.in_group(Self::parse_expression);
        self.expect(|k| matches!(k, TokenKind::RightParen), "`)`");

        let mut then_branch = None;
        let mut else_branch = None;
        let mut end = condition.span();

        if self.eat_if(|k| matches!(k, TokenKind::Semicolon)).is_some() {
            // `if (c);` — empty body.
        } else if !self.at_keyword(Keyword::Else) {
            let body = self.parse_control_body();
            end = body.span();
            then_branch = Some(body);
            // An explicit `;` may separate the branch from `else`.
            if self.at_keyword(Keyword::Else) {
                // nothing to consume
            } else if matches!(self.peek_kind(), TokenKind::Semicolon)
                && self.peek_nth(1).kind().is_keyword(Keyword::Else)
            {
                self.advance();
            }
        }
        if self.eat_keyword(Keyword::Else).is_some() {
            if self.eat_if(|k| matches!(k, TokenKind::Semicolon)).is_some() {
                // `else;` — empty branch.
            } else {
                let body = self.parse_control_body();
                end = body.span();
                else_branch = Some(body);
            }
        }
        Expression::If {
            condition: Box::new(condition),
            then_branch,
            else_branch,
            span: token.span().merge(end),
        }
    }

    fn parse_when(&mut self) -> Expression {
        let token = self.advance(); // `when`
        let subject = if matches!(self.peek_kind(), TokenKind::LeftParen) {
            Some(self.parse_when_subject())
        } else {
            None
        };
        self.expect(|k| matches!(k, TokenKind::LeftBrace), "`{`");
        let mut entries = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RightBrace) && !self.at_end() {
            let before = self.checkpoint();
            entries.push(self.parse_when_entry());
            if self.checkpoint() == before {
                // The entry parser could not make progress; skip the
                // offending token rather than loop forever.
                self.advance();
            }
        }
        let end = self
            .expect(|k| matches!(k, TokenKind::RightBrace), "`}`")
            .map_or_else(|| self.peek().span(), |t| t.span());
        Expression::When {
            subject,
            entries,
            span: token.span().merge(end),
        }
    }

    fn parse_when_subject(&mut self) -> WhenSubject {
        let open = self.advance(); // `(`
        let (binding, expression) = self.in_group(|p| {
            let binding = if p.at_keyword(Keyword::Val) {
                p.advance();
                let name = p.expect_identifier("a binding name");
                let ty = if p.eat_if(|k| matches!(k, TokenKind::Colon)).is_some() {
                    p.parse_type()
                } else {
                    None
                };
                p.expect(|k| k.is_operator("="), "`=`");
                name.map(|name| {
                    let mut span = name.span;
                    if let Some(ty) = &ty {
                        span = span.merge(ty.span);
                    }
                    VariableBinding { name, ty, span }
                })
            } else {
                None
            };
            (binding, p.parse_expression())
        });
        let end = self
            .expect(|k| matches!(k, TokenKind::RightParen), "`)`")
            .map_or_else(|| expression.span(), |t| t.span());
        WhenSubject {
            binding,
            expression: Box::new(expression),
            span: open.span().merge(end),
        }
    }

    fn parse_when_entry(&mut self) -> WhenEntry {
        let start = self.peek().span();
        let conditions = if self.eat_keyword(Keyword::Else).is_some() {
            Vec::new()
        } else {
            let mut conditions = vec![self.parse_expression()];
            while self.eat_if(|k| matches!(k, TokenKind::Comma)).is_some() {
                if self.at_operator("->") {
                    break; // trailing comma
                }
                conditions.push(self.parse_expression());
            }
            conditions
        };
        self.expect(|k| k.is_operator("->"), "`->`");
        let body = self.parse_control_body();
        if matches!(self.peek_kind(), TokenKind::Semicolon) {
            self.advance();
        }
        let span = start.merge(body.span());
        WhenEntry {
            conditions,
            body,
            span,
        }
    }

    fn parse_try(&mut self) -> Expression {
        let token = self.advance(); // `try`
        let body = self.parse_block();
        let mut catches = Vec::new();
        while self.at_keyword(Keyword::Catch) {
            catches.push(self.parse_catch_clause());
        }
        let finally = if self.eat_keyword(Keyword::Finally).is_some() {
            Some(self.parse_block())
        } else {
            None
        };
        if catches.is_empty() && finally.is_none() {
            self.error(
                "`try` needs at least one `catch` or a `finally`",
                token.span().merge(body.span),
            );
        }
        let end = finally
            .as_ref()
            .map(|b| b.span)
            .or_else(|| catches.last().map(|c| c.span))
            .unwrap_or(body.span);
        Expression::Try {
            body,
            catches,
            finally,
            span: token.span().merge(end),
        }
    }

    fn parse_catch_clause(&mut self) -> CatchClause {
        let token = self.advance(); // `catch`
        self.expect(|k| matches!(k, TokenKind::LeftParen), "`(`");
        let (binding, ty) = self.in_group(|p| {
            let binding = p.expect_identifier("a binding name");
            p.expect(|k| matches!(k, TokenKind::Colon), "`:`");
            let ty = p.parse_type();
            p.eat_if(|k| matches!(k, TokenKind::Comma)); // trailing comma
            (binding, ty)
        });
        self.expect(|k| matches!(k, TokenKind::RightParen), "`)`");
        let body = self.parse_block();
        let span = token.span().merge(body.span);
        let fallback_span = token.span();
        CatchClause {
            binding: binding.unwrap_or(Identifier {
                name: "".into(),
                span: fallback_span,
            }),
            ty: ty.unwrap_or(crate::ast::Type {
                suspend: false,
                kind: crate::ast::TypeKind::User(Vec::new()),
                span: fallback_span,
            }),
            body,
            span,
        }
    }

    pub(crate) fn parse_control_body(&mut self) -> ControlBody {
        if matches!(self.peek_kind(), TokenKind::LeftBrace) {
            ControlBody::Block(self.parse_block())
        } else {
            let before = self.checkpoint();
            let statement = match self.parse_statement() {
                Some(statement) => statement,
                None => {
                    self.note_expected("a statement");
                    let span = self.peek().span();
                    let found = self.peek_kind().describe();
                    self.error(format!("expected a statement, found {found}"), span);
                    if self.checkpoint() == before && !self.at_end() {
                        self.advance();
                    }
                    Statement::Expression(Expression::Error { span })
                }
            };
            ControlBody::Statement(Box::new(statement))
        }
    }

    fn parse_lambda(&mut self) -> Expression {
        let open = self.advance(); // `{`
        let parameters = self.try_parse_lambda_parameters().unwrap_or_default();
        let body = self.parse_statement_list(|k| matches!(k, TokenKind::RightBrace));
        let end = self
            .expect(|k| matches!(k, TokenKind::RightBrace), "`}`")
            .map_or_else(|| self.peek().span(), |t| t.span());
        Expression::Lambda {
            parameters,
            body,
            span: open.span().merge(end),
        }
    }

    /// Attempts `params ->` at the head of a lambda. Speculative: consumes
    /// nothing and emits no diagnostics unless the arrow is actually
    /// there.
    fn try_parse_lambda_parameters(&mut self) -> Option<Vec<LambdaParameter>> {
        let checkpoint = self.checkpoint();
        let mut parameters = Vec::new();
        loop {
            if self.eat_operator("->").is_some() {
                return Some(parameters);
            }
            let Some(parameter) = self.try_parse_lambda_parameter() else {
                self.restore(checkpoint);
                return None;
            };
            parameters.push(parameter);
            if self.eat_if(|k| matches!(k, TokenKind::Comma)).is_none() {
                if self.eat_operator("->").is_some() {
                    return Some(parameters);
                }
                self.restore(checkpoint);
                return None;
            }
        }
    }

    fn try_parse_lambda_parameter(&mut self) -> Option<LambdaParameter> {
        match self.peek_kind() {
            TokenKind::Identifier(_) => {
                let token = self.advance();
                let TokenKind::Identifier(name) = token.kind() else {
                    return None;
                };
                let name = Identifier {
                    name: name.clone(),
                    span: token.span(),
                };
                let ty = if matches!(self.peek_kind(), TokenKind::Colon) {
                    self.advance();
                    Some(self.try_parse_type()?)
                } else {
                    None
                };
                let mut span = name.span;
                if let Some(ty) = &ty {
                    span = span.merge(ty.span);
                }
                Some(LambdaParameter {
                    bindings: vec![VariableBinding {
                        name,
                        ty: ty.clone(),
                        span,
                    }],
                    destructured: false,
                    ty,
                    span,
                })
            }
            TokenKind::LeftParen => {
                let open = self.advance();
                let mut bindings = Vec::new();
                loop {
                    match self.peek_kind() {
                        TokenKind::Identifier(_) => {
                            let token = self.advance();
                            let TokenKind::Identifier(name) = token.kind() else {
                                return None;
                            };
                            let name = Identifier {
                                name: name.clone(),
                                span: token.span(),
                            };
                            let ty = if matches!(self.peek_kind(), TokenKind::Colon) {
                                self.advance();
                                Some(self.try_parse_type()?)
                            } else {
                                None
                            };
                            let mut span = name.span;
                            if let Some(ty) = &ty {
                                span = span.merge(ty.span);
                            }
                            bindings.push(VariableBinding { name, ty, span });
                        }
                        _ => return None,
                    }
                    match self.peek_kind() {
                        TokenKind::Comma => {
                            self.advance();
                            if matches!(self.peek_kind(), TokenKind::RightParen) {
                                break; // trailing comma
                            }
                        }
                        TokenKind::RightParen => break,
                        _ => return None,
                    }
                }
                if bindings.is_empty() {
                    return None;
                }
                let close = self.advance(); // `)`
                let ty = if matches!(self.peek_kind(), TokenKind::Colon) {
                    self.advance();
                    Some(self.try_parse_type()?)
                } else {
                    None
                };
                let mut span = open.span().merge(close.span());
                if let Some(ty) = &ty {
                    span = span.merge(ty.span);
                }
                Some(LambdaParameter {
                    bindings,
                    destructured: true,
                    ty,
                    span,
                })
            }
            _ => None,
        }
    }
}
