// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the parser.
//!
//! These tests use `proptest` to verify parser invariants over generated inputs:
//!
//! 1. **Parser never panics** — arbitrary string input always returns a result
//! 2. **Diagnostic spans within input** — all spans have `end <= input.len()`
//! 3. **Error nodes produce diagnostics** — `Expression::Error` ⟹ non-empty diagnostics
//! 4. **Error messages are user-facing** — no internal type names in diagnostics
//! 5. **Valid fragments parse cleanly** — the seed corpus produces no diagnostics

use proptest::prelude::*;

use crate::ast::{
    ClassBody, ClassBodyKind, ClassMember, ControlBody, Declaration, Expression, FunctionBody,
    PropertyInitializer, SourceFile, Statement,
};
use crate::source_analysis::{lex_with_eof, parse};

// ============================================================================
// Near-valid generators
// ============================================================================

/// Source fragments for composing near-valid inputs. All of them are valid;
/// the mutation strategies below break them in targeted ways.
const FRAGMENTS: &[&str] = &[
    "42",
    "3.14",
    "\"hello\"",
    "true",
    "null",
    "x",
    "x + y * z",
    "a ?: b ?: c",
    "a?.b.c[0]",
    "f(x, label = y, *rest)",
    "[1, *xs, 3]",
    "x in 1..10",
    "v is Int",
    "v as? Text",
    "a shl b",
    "{ x, y: Int -> x }",
    "if (a) b else c",
    "when (x) { 1, 2 -> a\nelse -> b }",
    "try { a } catch (e: Error) { b } finally { c }",
    "return@loop x",
    "val x = 1",
    "var y: Int = 2",
    "val (a, b) = pair",
    "val v by lazy(this)",
    "fun add(a: Int, b: Int = 0): Int = a + b",
    "fun main() {\n    val x = 1\n    x\n}",
    "class Point(val x: Int, var y: Int)",
    "data class Box(val v: Int)",
    "enum class Color { RED, GREEN, BLUE }",
    "interface Shape",
    "object Registry { }",
    "typealias Label = kopi.text.Text",
    "package kopi.demo\nimport kopi.io.*\nval x = 1",
];

fn valid_fragment() -> impl Strategy<Value = String> {
    prop::sample::select(FRAGMENTS).prop_map(std::string::ToString::to_string)
}

/// Generates a truncated valid fragment (cut at a random point).
fn truncated_fragment() -> impl Strategy<Value = String> {
    valid_fragment().prop_flat_map(|s| {
        let len = s.len();
        if len <= 1 {
            Just(s).boxed()
        } else {
            (1..len)
                .prop_map(move |cut| {
                    let safe_cut = s.floor_char_boundary(cut);
                    if safe_cut == 0 {
                        s.clone()
                    } else {
                        s[..safe_cut].to_string()
                    }
                })
                .boxed()
        }
    })
}

/// Generates input with mismatched brackets via single-pass char mapping.
fn mismatched_brackets() -> impl Strategy<Value = String> {
    valid_fragment().prop_map(|s| {
        let mut result = String::with_capacity(s.len());
        for ch in s.chars() {
            let mapped = match ch {
                '(' => '[',
                '[' => '{',
                '}' => ')',
                _ => ch,
            };
            result.push(mapped);
        }
        result
    })
}

/// Generates input with duplicated operators.
fn duplicated_operators() -> impl Strategy<Value = String> {
    valid_fragment().prop_map(|s| s.replace('+', "+ +").replace('*', "* *"))
}

fn near_valid_source() -> impl Strategy<Value = String> {
    prop_oneof![
        valid_fragment(),
        truncated_fragment(),
        mismatched_brackets(),
        duplicated_operators(),
    ]
}

// ============================================================================
// AST helpers
// ============================================================================

fn expression_has_error(expr: &Expression) -> bool {
    match expr {
        Expression::Error { .. } => true,
        Expression::Literal { .. }
        | Expression::Identifier(_)
        | Expression::This { .. }
        | Expression::Super { .. }
        | Expression::Break { .. }
        | Expression::Continue { .. } => false,
        Expression::Unary { operand, .. } => expression_has_error(operand),
        Expression::Binary { left, right, .. } | Expression::InfixCall { left, right, .. } => {
            expression_has_error(left) || expression_has_error(right)
        }
        Expression::TypeCheck { value, .. }
        | Expression::Cast { value, .. }
        | Expression::Throw { value, .. } => expression_has_error(value),
        Expression::Assignment { target, value, .. } => {
            expression_has_error(target) || expression_has_error(value)
        }
        Expression::Member { receiver, .. } => expression_has_error(receiver),
        Expression::Index {
            receiver,
            arguments,
            ..
        } => expression_has_error(receiver) || arguments.iter().any(expression_has_error),
        Expression::Call {
            callee, arguments, ..
        } => {
            expression_has_error(callee)
                || arguments.iter().any(|a| expression_has_error(&a.value))
        }
        Expression::Parenthesized { inner, .. } => expression_has_error(inner),
        Expression::CollectionLiteral { elements, .. } => {
            elements.iter().any(|e| expression_has_error(&e.value))
        }
        Expression::Lambda { body, .. } => body.iter().any(statement_has_error),
        Expression::AnonymousFunction { body, .. } => {
            body.as_ref().is_some_and(function_body_has_error)
        }
        Expression::ObjectLiteral { body, .. } => body.as_ref().is_some_and(class_body_has_error),
        Expression::If {
            condition,
            then_branch,
            else_branch,
            ..
        } => {
            expression_has_error(condition)
                || then_branch.as_ref().is_some_and(control_body_has_error)
                || else_branch.as_ref().is_some_and(control_body_has_error)
        }
        Expression::When {
            subject, entries, ..
        } => {
            subject
                .as_ref()
                .is_some_and(|s| expression_has_error(&s.expression))
                || entries.iter().any(|e| {
                    e.conditions.iter().any(expression_has_error)
                        || control_body_has_error(&e.body)
                })
        }
        Expression::Try {
            body,
            catches,
            finally,
            ..
        } => {
            body.statements.iter().any(statement_has_error)
                || catches
                    .iter()
                    .any(|c| c.body.statements.iter().any(statement_has_error))
                || finally
                    .as_ref()
                    .is_some_and(|b| b.statements.iter().any(statement_has_error))
        }
        Expression::Return { value, .. } => {
            value.as_deref().is_some_and(expression_has_error)
        }
        Expression::Labeled { body, .. } => expression_has_error(body),
    }
}

fn control_body_has_error(body: &ControlBody) -> bool {
    match body {
        ControlBody::Block(block) => block.statements.iter().any(statement_has_error),
        ControlBody::Statement(statement) => statement_has_error(statement),
    }
}

fn function_body_has_error(body: &FunctionBody) -> bool {
    match body {
        FunctionBody::Block(block) => block.statements.iter().any(statement_has_error),
        FunctionBody::Expression(expr) => expression_has_error(expr),
    }
}

fn class_body_has_error(body: &ClassBody) -> bool {
    match &body.kind {
        ClassBodyKind::Members(members) => members.iter().any(class_member_has_error),
        ClassBodyKind::Enum { entries, members } => {
            entries.iter().any(|e| {
                e.arguments.iter().any(|a| expression_has_error(&a.value))
                    || e.body.as_ref().is_some_and(class_body_has_error)
            }) || members.iter().any(class_member_has_error)
        }
    }
}

fn class_member_has_error(member: &ClassMember) -> bool {
    match member {
        ClassMember::Declaration(declaration) => declaration_has_error(declaration),
        ClassMember::CompanionObject(companion) => {
            companion.body.as_ref().is_some_and(class_body_has_error)
        }
        ClassMember::Initializer(init) => {
            init.body.statements.iter().any(statement_has_error)
        }
        ClassMember::SecondaryConstructor(ctor) => {
            ctor.parameters
                .iter()
                .any(|p| p.default.as_ref().is_some_and(expression_has_error))
                || ctor.delegation.as_ref().is_some_and(|d| {
                    d.arguments.iter().any(|a| expression_has_error(&a.value))
                })
                || ctor
                    .body
                    .as_ref()
                    .is_some_and(|b| b.statements.iter().any(statement_has_error))
        }
    }
}

fn declaration_has_error(declaration: &Declaration) -> bool {
    match declaration {
        Declaration::Class(class) => {
            class.primary_constructor.as_ref().is_some_and(|ctor| {
                ctor.parameters
                    .iter()
                    .any(|p| p.default.as_ref().is_some_and(expression_has_error))
            }) || class.body.as_ref().is_some_and(class_body_has_error)
        }
        Declaration::Object(object) => object.body.as_ref().is_some_and(class_body_has_error),
        Declaration::Function(function) => {
            function
                .parameters
                .iter()
                .any(|p| p.default.as_ref().is_some_and(expression_has_error))
                || function.body.as_ref().is_some_and(function_body_has_error)
        }
        Declaration::Property(property) => {
            let initializer_broken = match &property.initializer {
                Some(
                    PropertyInitializer::Value(expr) | PropertyInitializer::Delegate(expr),
                ) => expression_has_error(expr),
                None => false,
            };
            initializer_broken
                || property
                    .accessors
                    .iter()
                    .any(|a| a.body.as_ref().is_some_and(function_body_has_error))
        }
        Declaration::TypeAlias(_) => false,
    }
}

fn statement_has_error(statement: &Statement) -> bool {
    match statement {
        Statement::Expression(expr) => expression_has_error(expr),
        Statement::Declaration(declaration) => declaration_has_error(declaration),
    }
}

fn file_has_error_nodes(file: &SourceFile) -> bool {
    file.statements.iter().any(statement_has_error)
        || file.annotations.iter().any(|fa| {
            fa.annotations
                .iter()
                .any(|a| a.arguments.iter().any(|arg| expression_has_error(&arg.value)))
        })
}

/// Internal type names that should never appear in user-facing diagnostics.
const INTERNAL_NAMES: &[&str] = &[
    "TokenKind",
    "unwrap()",
    "panic!",
    "unreachable!",
    "Expression::",
    "LiteralValue::",
    "ParseError::",
    "internal error",
];

// ============================================================================
// Property tests
// ============================================================================

/// Default is 512 cases for standard CI; override via `PROPTEST_CASES` env var
/// for nightly extended runs.
fn proptest_config() -> ProptestConfig {
    let default = ProptestConfig::default();
    ProptestConfig {
        cases: default.cases.max(512),
        ..default
    }
}

proptest! {
    #![proptest_config(proptest_config())]

    /// Property 1: Parser never panics on arbitrary string input.
    #[test]
    fn parser_never_panics(input in "\\PC{0,500}") {
        let tokens = lex_with_eof(&input);
        let (_file, _diagnostics) = parse(tokens);
    }

    /// Property 1b: Parser never panics on near-valid structured input.
    #[test]
    fn parser_never_panics_near_valid(input in near_valid_source()) {
        let tokens = lex_with_eof(&input);
        let (_file, _diagnostics) = parse(tokens);
    }

    /// Property 2: All diagnostic spans are within the input bounds.
    #[test]
    fn diagnostic_spans_within_input(input in "\\PC{0,500}") {
        let tokens = lex_with_eof(&input);
        let (_file, diagnostics) = parse(tokens);
        let input_len = u32::try_from(input.len()).unwrap_or(u32::MAX);
        for diag in &diagnostics {
            prop_assert!(
                diag.span.end() <= input_len,
                "Diagnostic span end {} exceeds input length {} for input {:?}: {}",
                diag.span.end(),
                input_len,
                input,
                diag.message,
            );
            prop_assert!(
                diag.span.start() <= diag.span.end(),
                "Diagnostic span start {} > end {} for input {:?}: {}",
                diag.span.start(),
                diag.span.end(),
                input,
                diag.message,
            );
        }
    }

    /// Property 3: Error AST nodes always produce diagnostics.
    #[test]
    fn error_nodes_produce_diagnostics(input in near_valid_source()) {
        let tokens = lex_with_eof(&input);
        let (file, diagnostics) = parse(tokens);
        if file_has_error_nodes(&file) {
            prop_assert!(
                !diagnostics.is_empty(),
                "AST contains Error node(s) but diagnostics is empty for input: {:?}",
                input,
            );
        }
    }

    /// Property 4: Error messages are user-facing (no internal type names).
    #[test]
    fn error_messages_are_user_facing(input in near_valid_source()) {
        let tokens = lex_with_eof(&input);
        let (_file, diagnostics) = parse(tokens);
        for diag in &diagnostics {
            for internal in INTERNAL_NAMES {
                prop_assert!(
                    !diag.message.contains(internal),
                    "Diagnostic message contains internal name {:?}: {:?} (input: {:?})",
                    internal,
                    diag.message,
                    input,
                );
            }
        }
    }

    /// Property 5: The seed corpus parses without diagnostics.
    #[test]
    fn valid_fragments_parse_cleanly(input in valid_fragment()) {
        let tokens = lex_with_eof(&input);
        let (_file, diagnostics) = parse(tokens);
        prop_assert!(
            diagnostics.is_empty(),
            "Valid fragment {:?} produced diagnostics: {:?}",
            input,
            diagnostics,
        );
    }
}
