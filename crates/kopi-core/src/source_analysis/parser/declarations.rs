// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Declaration and statement parsing.
//!
//! Covers the file skeleton (shebang, `@file:` annotations, package
//! header, imports) and every declaration form: classes and interfaces
//! with primary constructors, enum bodies, objects and companions,
//! functions, properties with accessors, and type aliases.
//!
//! Modifiers are soft words: `data`, `private`, `vararg` and the rest are
//! ordinary identifiers in the token stream, promoted to modifiers only
//! when a declaration keyword follows. Whether a statement is a
//! declaration at all is decided speculatively by [`Parser::parse_statement`]
//! via a checkpointed modifier skip, so `data + 1` stays an expression
//! while `data class D` does not.

use ecow::EcoString;

use crate::ast::{
    AccessorKind, Annotation, Block, ClassBody, ClassBodyKind, ClassDeclaration, ClassKind,
    ClassMember, ClassParameter, CompanionObject, ConstructorDelegation, Declaration,
    DelegationTarget, EnumEntry, FileAnnotation, FunctionBody, FunctionDeclaration,
    FunctionParameter, Identifier, Import, InitializerBlock, Modifier, ObjectDeclaration,
    PackageHeader, PrimaryConstructor, PropertyAccessor, PropertyDeclaration, PropertyInitializer,
    PropertyKind, SecondaryConstructor, SourceFile, Statement, Type, TypeAlias, TypeConstraint,
    TypeKind, TypeParameter, VariableBinding,
};

use super::super::span::Span;
use super::super::token::{Keyword, TokenKind};
use super::expressions::token_starts_expression;
use super::{resolve_body_conflict, Parser};

/// The soft modifier words. All of them lex as identifiers; membership
/// here plus a following declaration makes them modifiers.
pub(crate) fn is_modifier_word(name: &str) -> bool {
    matches!(
        name,
        "public"
            | "private"
            | "internal"
            | "protected"
            | "abstract"
            | "final"
            | "open"
            | "sealed"
            | "enum"
            | "annotation"
            | "data"
            | "inner"
            | "value"
            | "override"
            | "lateinit"
            | "const"
            | "tailrec"
            | "operator"
            | "infix"
            | "inline"
            | "external"
            | "suspend"
            | "vararg"
            | "noinline"
            | "crossinline"
            | "reified"
            | "expect"
            | "actual"
    )
}

/// Placeholder type for positions where a type was required but absent.
fn error_type(span: Span) -> Type {
    Type {
        suspend: false,
        kind: TypeKind::User(Vec::new()),
        span,
    }
}

fn placeholder_name(span: Span) -> Identifier {
    Identifier {
        name: EcoString::new(),
        span,
    }
}

impl Parser {
    pub(crate) fn parse_source_file(&mut self) -> SourceFile {
        let start = self.peek().span();
        let shebang = if let TokenKind::Shebang(text) = self.peek_kind() {
            let text = text.clone();
            self.advance();
            Some(text)
        } else {
            None
        };
        let annotations = self.parse_file_annotations();
        let package = if self.at_keyword(Keyword::Package) {
            Some(self.parse_package_header())
        } else {
            None
        };
        let mut imports = Vec::new();
        loop {
            if matches!(self.peek_kind(), TokenKind::Semicolon) {
                self.advance();
                continue;
            }
            if !self.at_keyword(Keyword::Import) {
                break;
            }
            imports.push(self.parse_import());
        }
        let statements = self.parse_statement_list(TokenKind::is_eof);
        let end = self.peek().span();
        SourceFile {
            shebang,
            annotations,
            package,
            imports,
            statements,
            span: start.merge(end),
        }
    }

    // --- file skeleton --------------------------------------------------

    fn parse_file_annotations(&mut self) -> Vec<FileAnnotation> {
        let mut result = Vec::new();
        while matches!(self.peek_kind(), TokenKind::At)
            && self.peek_nth(1).kind().identifier().is_some_and(|n| n == "file")
            && matches!(self.peek_nth(2).kind(), TokenKind::Colon)
        {
            let at = self.advance();
            self.advance(); // `file`
            self.advance(); // `:`
            let mut annotations = Vec::new();
            let end;
            if self.eat_if(|k| matches!(k, TokenKind::LeftBracket)).is_some() {
                self.in_group(|p| {
                    while !matches!(p.peek_kind(), TokenKind::RightBracket) && !p.at_end() {
                        let before = p.checkpoint();
                        annotations.push(p.parse_annotation());
                        if p.checkpoint() == before {
                            p.advance();
                        }
                    }
                });
                end = self
                    .expect(|k| matches!(k, TokenKind::RightBracket), "`]`")
                    .map_or_else(|| self.peek().span(), |t| t.span());
            } else {
                let annotation = self.parse_annotation();
                end = annotation.span;
                annotations.push(annotation);
            }
            result.push(FileAnnotation {
                annotations,
                span: at.span().merge(end),
            });
        }
        result
    }

    fn parse_annotation(&mut self) -> Annotation {
        let start = self.peek().span();
        let mut path = Vec::new();
        if let Some(first) = self.expect_identifier("an annotation name") {
            path.push(first);
            while self.at_operator(".")
                && matches!(self.peek_nth(1).kind(), TokenKind::Identifier(_))
            {
                self.advance();
                if let Some(segment) = self.expect_identifier("an annotation path segment") {
                    path.push(segment);
                }
            }
        }
        let mut end = path.last().map_or(start, |i| i.span);
        let arguments = if matches!(self.peek_kind(), TokenKind::LeftParen)
            && !self.peek().has_leading_newline()
        {
            self.advance();
            let arguments = self.parse_value_arguments();
            end = self
                .expect(|k| matches!(k, TokenKind::RightParen), "`)`")
                .map_or(end, |t| t.span());
            arguments
        } else {
            Vec::new()
        };
        Annotation {
            path,
            arguments,
            span: start.merge(end),
        }
    }

    fn parse_package_header(&mut self) -> PackageHeader {
        let token = self.advance(); // `package`
        let mut path = Vec::new();
        if let Some(first) = self.expect_identifier("a package name") {
            path.push(first);
            while self.eat_operator(".").is_some() {
                let Some(segment) = self.expect_identifier("a package segment") else {
                    break;
                };
                path.push(segment);
            }
        }
        let end = path.last().map_or(token.span(), |i| i.span);
        self.expect_statement_terminator();
        PackageHeader {
            path,
            span: token.span().merge(end),
        }
    }

    fn parse_import(&mut self) -> Import {
        let token = self.advance(); // `import`
        let mut path = Vec::new();
        let mut wildcard = false;
        let mut end = token.span();
        if let Some(first) = self.expect_identifier("an import path") {
            end = first.span;
            path.push(first);
            while self.eat_operator(".").is_some() {
                if let Some(star) = self.eat_operator("*") {
                    wildcard = true;
                    end = star.span();
                    break;
                }
                let Some(segment) = self.expect_identifier("an import segment") else {
                    break;
                };
                end = segment.span;
                path.push(segment);
            }
        }
        let alias = if self.eat_keyword(Keyword::As).is_some() {
            let alias = self.expect_identifier("an import alias");
            if let Some(alias) = &alias {
                end = alias.span;
            }
            alias
        } else {
            None
        };
        if wildcard {
            // The import's last lexeme is `*`, which cannot end an
            // expression statement; the boundary is decided on lookahead.
            self.expect_terminator_lookahead_only();
        } else {
            self.expect_statement_terminator();
        }
        Import {
            path,
            wildcard,
            alias,
            span: token.span().merge(end),
        }
    }

    // --- statements -----------------------------------------------------

    /// Parses statements until `stop` accepts the current token kind,
    /// requiring a terminator between consecutive statements and
    /// recovering via [`Parser::synchronize`] on anything unparseable.
    pub(crate) fn parse_statement_list(
        &mut self,
        stop: impl Fn(&TokenKind) -> bool,
    ) -> Vec<Statement> {
        let mut statements = Vec::new();
        while !stop(self.peek_kind()) && !self.at_end() {
            if matches!(self.peek_kind(), TokenKind::Semicolon) {
                self.advance();
                continue;
            }
            let before = self.checkpoint();
            if let Some(statement) = self.parse_statement() {
                statements.push(statement);
                if !stop(self.peek_kind()) && !self.at_end() {
                    self.expect_statement_terminator();
                }
            } else {
                self.note_expected("a statement");
                let found = self.peek_kind().describe();
                let span = self.peek().span();
                self.error(format!("expected a statement, found {found}"), span);
            }
            if self.checkpoint() == before {
                self.synchronize();
            }
        }
        statements
    }

    /// Parses one statement, or `None` if the current token cannot start
    /// one. Declarations win over expressions where both could apply.
    pub(crate) fn parse_statement(&mut self) -> Option<Statement> {
        if self.is_at_declaration() {
            let declaration = self.parse_declaration()?;
            return Some(Statement::Declaration(declaration));
        }
        if token_starts_expression(self.peek_kind()) {
            return Some(Statement::Expression(self.parse_expression()));
        }
        None
    }

    pub(crate) fn parse_block(&mut self) -> Block {
        let start = self
            .expect(|k| matches!(k, TokenKind::LeftBrace), "`{`")
            .map_or_else(|| self.peek().span(), |t| t.span());
        let statements = self.parse_statement_list(|k| matches!(k, TokenKind::RightBrace));
        let end = self
            .expect(|k| matches!(k, TokenKind::RightBrace), "`}`")
            .map_or_else(|| self.peek().span(), |t| t.span());
        Block {
            statements,
            span: start.merge(end),
        }
    }

    /// Looks ahead (without consuming) for a declaration: optional
    /// modifier words, then a declaration keyword.
    fn is_at_declaration(&mut self) -> bool {
        let checkpoint = self.checkpoint();
        let _ = self.parse_modifiers();
        let result = match self.peek_kind() {
            TokenKind::Keyword(
                Keyword::Val
                | Keyword::Var
                | Keyword::Class
                | Keyword::Interface
                | Keyword::TypeAlias,
            ) => true,
            // `fun` alone may open an anonymous function expression; only
            // a name, type parameters, or `interface` makes it a
            // declaration.
            TokenKind::Keyword(Keyword::Fun) => {
                matches!(self.peek_nth(1).kind(), TokenKind::Identifier(_))
                    || self.peek_nth(1).kind().is_keyword(Keyword::Interface)
                    || self.peek_nth(1).kind().is_operator("<")
            }
            // Unnamed `object` is an object literal expression.
            TokenKind::Keyword(Keyword::Object) => {
                matches!(self.peek_nth(1).kind(), TokenKind::Identifier(_))
            }
            _ => false,
        };
        self.restore(checkpoint);
        result
    }

    // --- declarations ---------------------------------------------------

    pub(crate) fn parse_declaration(&mut self) -> Option<Declaration> {
        let start = self.peek().span();
        let modifiers = self.parse_modifiers();
        self.parse_declaration_after_modifiers(start, modifiers)
    }

    fn parse_declaration_after_modifiers(
        &mut self,
        start: Span,
        modifiers: Vec<Modifier>,
    ) -> Option<Declaration> {
        match self.peek_kind() {
            TokenKind::Keyword(Keyword::Class | Keyword::Interface) => Some(Declaration::Class(
                self.parse_class_declaration(start, modifiers),
            )),
            TokenKind::Keyword(Keyword::Fun)
                if self.peek_nth(1).kind().is_keyword(Keyword::Interface) =>
            {
                Some(Declaration::Class(
                    self.parse_class_declaration(start, modifiers),
                ))
            }
            TokenKind::Keyword(Keyword::Fun) => Some(Declaration::Function(
                self.parse_function_declaration(start, modifiers),
            )),
            TokenKind::Keyword(Keyword::Object) => Some(Declaration::Object(
                self.parse_object_declaration(start, modifiers),
            )),
            TokenKind::Keyword(Keyword::Val | Keyword::Var) => Some(Declaration::Property(
                self.parse_property_declaration(start, modifiers),
            )),
            TokenKind::Keyword(Keyword::TypeAlias) => Some(Declaration::TypeAlias(
                self.parse_type_alias(start, modifiers),
            )),
            _ => {
                if !modifiers.is_empty() {
                    let found = self.peek_kind().describe();
                    let span = self.peek().span();
                    self.error(
                        format!("expected a declaration after modifiers, found {found}"),
                        span,
                    );
                }
                None
            }
        }
    }

    /// Consumes leading modifier words. A word only counts when another
    /// identifier or a declaration keyword follows, so a property named
    /// `data` or a setter parameter named `value` stays a name.
    pub(crate) fn parse_modifiers(&mut self) -> Vec<Modifier> {
        let mut modifiers = Vec::new();
        while let TokenKind::Identifier(name) = self.peek_kind() {
            if !is_modifier_word(name) {
                break;
            }
            let next = self.peek_nth(1).kind();
            let followed = matches!(next, TokenKind::Identifier(_))
                || matches!(
                    next,
                    TokenKind::Keyword(
                        Keyword::Val
                            | Keyword::Var
                            | Keyword::Fun
                            | Keyword::Class
                            | Keyword::Interface
                            | Keyword::Object
                            | Keyword::Constructor
                            | Keyword::TypeAlias,
                    )
                );
            if !followed {
                break;
            }
            let token = self.advance();
            let TokenKind::Identifier(name) = token.kind() else {
                break;
            };
            modifiers.push(Modifier {
                name: name.clone(),
                span: token.span(),
            });
        }
        modifiers
    }

    // --- classes --------------------------------------------------------

    fn parse_class_declaration(
        &mut self,
        start: Span,
        modifiers: Vec<Modifier>,
    ) -> ClassDeclaration {
        let kind = if self.eat_keyword(Keyword::Fun).is_some() {
            self.expect(|k| k.is_keyword(Keyword::Interface), "`interface`");
            ClassKind::FunInterface
        } else if self.eat_keyword(Keyword::Class).is_some() {
            ClassKind::Class
        } else {
            self.eat_keyword(Keyword::Interface);
            ClassKind::Interface
        };
        let name = self
            .expect_identifier("a class name")
            .unwrap_or_else(|| placeholder_name(self.peek().span()));
        let mut end = name.span;
        let type_parameters = self.parse_type_parameters();
        if let Some(last) = type_parameters.last() {
            end = last.span;
        }
        let primary_constructor = self.try_parse_primary_constructor();
        if let Some(ctor) = &primary_constructor {
            end = ctor.span;
        }
        let constraints = self.parse_type_constraints();
        if let Some(last) = constraints.last() {
            end = last.span;
        }
        let has_enum = modifiers.iter().any(|m| m.name == "enum");
        let body = if matches!(self.peek_kind(), TokenKind::LeftBrace) {
            let body = self.parse_class_body(has_enum);
            end = body.span;
            Some(body)
        } else {
            None
        };
        ClassDeclaration {
            modifiers,
            kind,
            name,
            type_parameters,
            primary_constructor,
            constraints,
            body,
            span: start.merge(end),
        }
    }

    fn parse_type_parameters(&mut self) -> Vec<TypeParameter> {
        if !self.at_operator("<") {
            return Vec::new();
        }
        self.advance();
        let mut parameters = Vec::new();
        while !self.at_operator(">") && !self.at_end() {
            let start = self.peek().span();
            let mut modifiers = Vec::new();
            loop {
                if let Some(token) = self.eat_keyword(Keyword::In) {
                    modifiers.push(Modifier {
                        name: "in".into(),
                        span: token.span(),
                    });
                } else if self
                    .peek_kind()
                    .identifier()
                    .is_some_and(|n| matches!(n.as_str(), "out" | "reified"))
                    && matches!(self.peek_nth(1).kind(), TokenKind::Identifier(_))
                {
                    let token = self.advance();
                    let TokenKind::Identifier(name) = token.kind() else {
                        break;
                    };
                    modifiers.push(Modifier {
                        name: name.clone(),
                        span: token.span(),
                    });
                } else {
                    break;
                }
            }
            let Some(name) = self.expect_identifier("a type parameter name") else {
                break;
            };
            let bound = if self.eat_if(|k| matches!(k, TokenKind::Colon)).is_some() {
                self.parse_type()
            } else {
                None
            };
            let mut span = start.merge(name.span);
            if let Some(bound) = &bound {
                span = span.merge(bound.span);
            }
            parameters.push(TypeParameter {
                modifiers,
                name,
                bound,
                span,
            });
            if self.eat_if(|k| matches!(k, TokenKind::Comma)).is_none() {
                break;
            }
        }
        self.expect(|k| k.is_operator(">"), "`>`");
        parameters
    }

    fn parse_type_constraints(&mut self) -> Vec<TypeConstraint> {
        if !self.peek_kind().identifier().is_some_and(|n| n == "where")
            || !matches!(self.peek_nth(1).kind(), TokenKind::Identifier(_))
        {
            return Vec::new();
        }
        self.advance(); // `where`
        let mut constraints = Vec::new();
        loop {
            let Some(name) = self.expect_identifier("a constrained type parameter") else {
                break;
            };
            self.expect(|k| matches!(k, TokenKind::Colon), "`:`");
            let Some(ty) = self.parse_type() else {
                break;
            };
            let span = name.span.merge(ty.span);
            constraints.push(TypeConstraint { name, ty, span });
            if self.eat_if(|k| matches!(k, TokenKind::Comma)).is_none() {
                break;
            }
        }
        constraints
    }

    /// `[modifiers] [constructor] ( parameters )` after a class name.
    /// Speculative: without the parameter list there is no primary
    /// constructor and nothing is consumed.
    fn try_parse_primary_constructor(&mut self) -> Option<PrimaryConstructor> {
        let checkpoint = self.checkpoint();
        let start = self.peek().span();
        let modifiers = self.parse_modifiers();
        let explicit_keyword = self.eat_keyword(Keyword::Constructor).is_some();
        if !matches!(self.peek_kind(), TokenKind::LeftParen) {
            self.restore(checkpoint);
            return None;
        }
        self.advance();
        let parameters = self.in_group(|p| {
            let mut parameters = Vec::new();
            while !matches!(p.peek_kind(), TokenKind::RightParen) && !p.at_end() {
                parameters.push(p.parse_class_parameter());
                if p.eat_if(|k| matches!(k, TokenKind::Comma)).is_none() {
                    break;
                }
            }
            parameters
        });
        let end = self
            .expect(|k| matches!(k, TokenKind::RightParen), "`)`")
            .map_or_else(|| self.peek().span(), |t| t.span());
        Some(PrimaryConstructor {
            modifiers,
            explicit_keyword,
            parameters,
            span: start.merge(end),
        })
    }

    fn parse_class_parameter(&mut self) -> ClassParameter {
        let start = self.peek().span();
        let modifiers = self.parse_modifiers();
        let binding = if self.eat_keyword(Keyword::Val).is_some() {
            Some(PropertyKind::Val)
        } else if self.eat_keyword(Keyword::Var).is_some() {
            Some(PropertyKind::Var)
        } else {
            None
        };
        let name = self
            .expect_identifier("a parameter name")
            .unwrap_or_else(|| placeholder_name(self.peek().span()));
        self.expect(|k| matches!(k, TokenKind::Colon), "`:`");
        let ty = self
            .parse_type()
            .unwrap_or_else(|| error_type(self.peek().span()));
        let mut end = ty.span;
        let default = if self.eat_operator("=").is_some() {
            let value = self.parse_expression();
            end = value.span();
            Some(value)
        } else {
            None
        };
        ClassParameter {
            modifiers,
            binding,
            name,
            ty,
            default,
            span: start.merge(end),
        }
    }

    pub(crate) fn parse_class_body(&mut self, has_enum_modifier: bool) -> ClassBody {
        let start = self
            .expect(|k| matches!(k, TokenKind::LeftBrace), "`{`")
            .map_or_else(|| self.peek().span(), |t| t.span());
        let kind = if resolve_body_conflict(has_enum_modifier) == "enum_class_body" {
            let mut entries = Vec::new();
            while !matches!(
                self.peek_kind(),
                TokenKind::RightBrace | TokenKind::Semicolon
            ) && !self.at_end()
            {
                let before = self.checkpoint();
                entries.push(self.parse_enum_entry());
                if self.eat_if(|k| matches!(k, TokenKind::Comma)).is_none() {
                    break;
                }
                if self.checkpoint() == before {
                    break;
                }
            }
            let members = if self.eat_if(|k| matches!(k, TokenKind::Semicolon)).is_some() {
                self.parse_class_members()
            } else {
                Vec::new()
            };
            ClassBodyKind::Enum { entries, members }
        } else {
            ClassBodyKind::Members(self.parse_class_members())
        };
        let end = self
            .expect(|k| matches!(k, TokenKind::RightBrace), "`}`")
            .map_or_else(|| self.peek().span(), |t| t.span());
        ClassBody {
            kind,
            span: start.merge(end),
        }
    }

    fn parse_enum_entry(&mut self) -> EnumEntry {
        let start = self.peek().span();
        let modifiers = self.parse_modifiers();
        let name = self
            .expect_identifier("an enum entry name")
            .unwrap_or_else(|| placeholder_name(self.peek().span()));
        let mut end = name.span;
        let arguments = if matches!(self.peek_kind(), TokenKind::LeftParen) {
            self.advance();
            let arguments = self.parse_value_arguments();
            end = self
                .expect(|k| matches!(k, TokenKind::RightParen), "`)`")
                .map_or(end, |t| t.span());
            arguments
        } else {
            Vec::new()
        };
        let body = if matches!(self.peek_kind(), TokenKind::LeftBrace) {
            let body = self.parse_class_body(false);
            end = body.span;
            Some(body)
        } else {
            None
        };
        EnumEntry {
            modifiers,
            name,
            arguments,
            body,
            span: start.merge(end),
        }
    }

    fn parse_class_members(&mut self) -> Vec<ClassMember> {
        let mut members = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RightBrace) && !self.at_end() {
            if matches!(self.peek_kind(), TokenKind::Semicolon) {
                self.advance();
                continue;
            }
            let before = self.checkpoint();
            if let Some(member) = self.parse_class_member() {
                members.push(member);
                if !matches!(self.peek_kind(), TokenKind::RightBrace) && !self.at_end() {
                    self.expect_statement_terminator();
                }
            } else {
                self.note_expected("a class member");
                let found = self.peek_kind().describe();
                let span = self.peek().span();
                self.error(format!("expected a class member, found {found}"), span);
            }
            if self.checkpoint() == before {
                self.synchronize();
            }
        }
        members
    }

    fn parse_class_member(&mut self) -> Option<ClassMember> {
        if self.at_keyword(Keyword::Init) {
            let token = self.advance();
            let body = self.parse_block();
            return Some(ClassMember::Initializer(InitializerBlock {
                span: token.span().merge(body.span),
                body,
            }));
        }
        let checkpoint = self.checkpoint();
        let start = self.peek().span();
        let modifiers = self.parse_modifiers();
        if self
            .peek_kind()
            .identifier()
            .is_some_and(|n| n == "companion")
            && self.peek_nth(1).kind().is_keyword(Keyword::Object)
        {
            return Some(ClassMember::CompanionObject(
                self.parse_companion_object(start, modifiers),
            ));
        }
        if self.at_keyword(Keyword::Constructor) {
            return Some(ClassMember::SecondaryConstructor(
                self.parse_secondary_constructor(start, modifiers),
            ));
        }
        if let Some(declaration) = self.parse_declaration_after_modifiers(start, modifiers) {
            return Some(ClassMember::Declaration(declaration));
        }
        self.restore(checkpoint);
        None
    }

    fn parse_companion_object(&mut self, start: Span, modifiers: Vec<Modifier>) -> CompanionObject {
        self.advance(); // `companion`
        let object = self.advance(); // `object`
        let mut end = object.span();
        let name = if matches!(self.peek_kind(), TokenKind::Identifier(_)) {
            let name = self.expect_identifier("a companion object name");
            if let Some(name) = &name {
                end = name.span;
            }
            name
        } else {
            None
        };
        let body = if matches!(self.peek_kind(), TokenKind::LeftBrace) {
            let body = self.parse_class_body(false);
            end = body.span;
            Some(body)
        } else {
            None
        };
        CompanionObject {
            modifiers,
            name,
            body,
            span: start.merge(end),
        }
    }

    fn parse_secondary_constructor(
        &mut self,
        start: Span,
        modifiers: Vec<Modifier>,
    ) -> SecondaryConstructor {
        let token = self.advance(); // `constructor`
        let mut end = token.span();
        self.expect(|k| matches!(k, TokenKind::LeftParen), "`(`");
        let parameters = self.parse_function_parameters();
        if let Some(close) = self.expect(|k| matches!(k, TokenKind::RightParen), "`)`") {
            end = close.span();
        }
        let delegation = if self.eat_if(|k| matches!(k, TokenKind::Colon)).is_some() {
            let target_start = self.peek().span();
            let target = if self.eat_keyword(Keyword::This).is_some() {
                Some(DelegationTarget::This)
            } else if self.eat_keyword(Keyword::Super).is_some() {
                Some(DelegationTarget::Super)
            } else {
                self.note_expected("`this` or `super`");
                let found = self.peek_kind().describe();
                self.error(
                    format!("expected `this` or `super`, found {found}"),
                    target_start,
                );
                None
            };
            target.map(|target| {
                self.expect(|k| matches!(k, TokenKind::LeftParen), "`(`");
                let arguments = self.parse_value_arguments();
                let close = self
                    .expect(|k| matches!(k, TokenKind::RightParen), "`)`")
                    .map_or(target_start, |t| t.span());
                end = close;
                ConstructorDelegation {
                    target,
                    arguments,
                    span: target_start.merge(close),
                }
            })
        } else {
            None
        };
        let body = if matches!(self.peek_kind(), TokenKind::LeftBrace) {
            let body = self.parse_block();
            end = body.span;
            Some(body)
        } else {
            None
        };
        SecondaryConstructor {
            modifiers,
            parameters,
            delegation,
            body,
            span: start.merge(end),
        }
    }

    fn parse_object_declaration(
        &mut self,
        start: Span,
        modifiers: Vec<Modifier>,
    ) -> ObjectDeclaration {
        self.advance(); // `object`
        let name = self
            .expect_identifier("an object name")
            .unwrap_or_else(|| placeholder_name(self.peek().span()));
        let mut end = name.span;
        let body = if matches!(self.peek_kind(), TokenKind::LeftBrace) {
            let body = self.parse_class_body(false);
            end = body.span;
            Some(body)
        } else {
            None
        };
        ObjectDeclaration {
            modifiers,
            name,
            body,
            span: start.merge(end),
        }
    }

    // --- functions ------------------------------------------------------

    fn parse_function_declaration(
        &mut self,
        start: Span,
        modifiers: Vec<Modifier>,
    ) -> FunctionDeclaration {
        self.advance(); // `fun`
        let type_parameters = self.parse_type_parameters();
        let name = self
            .expect_identifier("a function name")
            .unwrap_or_else(|| placeholder_name(self.peek().span()));
        let mut end = name.span;
        self.expect(|k| matches!(k, TokenKind::LeftParen), "`(`");
        let parameters = self.parse_function_parameters();
        if let Some(close) = self.expect(|k| matches!(k, TokenKind::RightParen), "`)`") {
            end = close.span();
        }
        let return_type = if self.eat_if(|k| matches!(k, TokenKind::Colon)).is_some() {
            let ty = self.parse_type();
            if let Some(ty) = &ty {
                end = ty.span;
            }
            ty
        } else {
            None
        };
        let constraints = self.parse_type_constraints();
        if let Some(last) = constraints.last() {
            end = last.span;
        }
        let body = self.parse_optional_function_body();
        if let Some(body) = &body {
            end = match body {
                FunctionBody::Block(block) => block.span,
                FunctionBody::Expression(expr) => expr.span(),
            };
        }
        FunctionDeclaration {
            modifiers,
            type_parameters,
            name,
            parameters,
            return_type,
            constraints,
            body,
            span: start.merge(end),
        }
    }

    /// Parameter list body; the caller consumes both parentheses.
    fn parse_function_parameters(&mut self) -> Vec<FunctionParameter> {
        self.in_group(|p| {
            let mut parameters = Vec::new();
            while !matches!(p.peek_kind(), TokenKind::RightParen) && !p.at_end() {
                let start = p.peek().span();
                let modifiers = p.parse_modifiers();
                let Some(name) = p.expect_identifier("a parameter name") else {
                    break;
                };
                p.expect(|k| matches!(k, TokenKind::Colon), "`:`");
                let ty = p
                    .parse_type()
                    .unwrap_or_else(|| error_type(p.peek().span()));
                let mut end = ty.span;
                let default = if p.eat_operator("=").is_some() {
                    let value = p.parse_expression();
                    end = value.span();
                    Some(value)
                } else {
                    None
                };
                parameters.push(FunctionParameter {
                    modifiers,
                    name,
                    ty,
                    default,
                    span: start.merge(end),
                });
                if p.eat_if(|k| matches!(k, TokenKind::Comma)).is_none() {
                    break;
                }
            }
            parameters
        })
    }

    /// `{ block }`, `= expression`, or nothing (abstract / interface
    /// members).
    pub(crate) fn parse_optional_function_body(&mut self) -> Option<FunctionBody> {
        if matches!(self.peek_kind(), TokenKind::LeftBrace) {
            Some(FunctionBody::Block(self.parse_block()))
        } else if self.eat_operator("=").is_some() {
            Some(FunctionBody::Expression(Box::new(self.parse_expression())))
        } else {
            None
        }
    }

    // --- properties -----------------------------------------------------

    fn parse_property_declaration(
        &mut self,
        start: Span,
        modifiers: Vec<Modifier>,
    ) -> PropertyDeclaration {
        let kind = if self.eat_keyword(Keyword::Val).is_some() {
            PropertyKind::Val
        } else {
            self.eat_keyword(Keyword::Var);
            PropertyKind::Var
        };
        let type_parameters = self.parse_type_parameters();
        let mut end = start;
        let (bindings, destructured) = if self.eat_if(|k| matches!(k, TokenKind::LeftParen)).is_some()
        {
            let bindings = self.in_group(|p| {
                let mut bindings = Vec::new();
                while !matches!(p.peek_kind(), TokenKind::RightParen) && !p.at_end() {
                    let Some(binding) = p.parse_variable_binding() else {
                        break;
                    };
                    bindings.push(binding);
                    if p.eat_if(|k| matches!(k, TokenKind::Comma)).is_none() {
                        break;
                    }
                }
                bindings
            });
            if let Some(close) = self.expect(|k| matches!(k, TokenKind::RightParen), "`)`") {
                end = close.span();
            }
            (bindings, true)
        } else {
            let binding = self
                .parse_variable_binding()
                .unwrap_or_else(|| VariableBinding {
                    name: placeholder_name(self.peek().span()),
                    ty: None,
                    span: self.peek().span(),
                });
            end = binding.span;
            (vec![binding], false)
        };
        let constraints = self.parse_type_constraints();
        if let Some(last) = constraints.last() {
            end = last.span;
        }
        let initializer = if self.eat_operator("=").is_some() {
            let value = self.parse_expression();
            end = value.span();
            Some(PropertyInitializer::Value(value))
        } else if self.peek_kind().identifier().is_some_and(|n| n == "by") {
            self.advance();
            let value = self.parse_expression();
            end = value.span();
            Some(PropertyInitializer::Delegate(value))
        } else {
            None
        };
        let accessors = self.parse_property_accessors();
        if let Some(last) = accessors.last() {
            end = last.span;
        }
        PropertyDeclaration {
            modifiers,
            kind,
            type_parameters,
            bindings,
            destructured,
            constraints,
            initializer,
            accessors,
            span: start.merge(end),
        }
    }

    fn parse_variable_binding(&mut self) -> Option<VariableBinding> {
        let name = self.expect_identifier("a property name")?;
        let ty = if self.eat_if(|k| matches!(k, TokenKind::Colon)).is_some() {
            self.parse_type()
        } else {
            None
        };
        let mut span = name.span;
        if let Some(ty) = &ty {
            span = span.merge(ty.span);
        }
        Some(VariableBinding { name, ty, span })
    }

    fn parse_property_accessors(&mut self) -> Vec<PropertyAccessor> {
        let mut accessors = Vec::new();
        loop {
            let checkpoint = self.checkpoint();
            let start = self.peek().span();
            let modifiers = self.parse_modifiers();
            let word = self
                .peek_kind()
                .identifier()
                .filter(|n| matches!(n.as_str(), "get" | "set"))
                .cloned();
            let Some(word) = word else {
                self.restore(checkpoint);
                break;
            };
            // A bare `get`/`set` could just as well start the next
            // statement; only modifiers or a parameter list commit it as
            // an accessor.
            if modifiers.is_empty() && !matches!(self.peek_nth(1).kind(), TokenKind::LeftParen) {
                self.restore(checkpoint);
                break;
            }
            let token = self.advance();
            let kind = if word == "get" {
                AccessorKind::Get
            } else {
                AccessorKind::Set
            };
            let mut end = token.span();
            if self.eat_if(|k| matches!(k, TokenKind::LeftParen)).is_some() {
                // Setter parameter name, optionally typed. Not retained.
                self.in_group(|p| {
                    if matches!(p.peek_kind(), TokenKind::Identifier(_)) {
                        let _ = p.expect_identifier("a parameter name");
                        if p.eat_if(|k| matches!(k, TokenKind::Colon)).is_some() {
                            let _ = p.parse_type();
                        }
                        p.eat_if(|k| matches!(k, TokenKind::Comma));
                    }
                });
                if let Some(close) = self.expect(|k| matches!(k, TokenKind::RightParen), "`)`") {
                    end = close.span();
                }
            }
            let return_type = if self.eat_if(|k| matches!(k, TokenKind::Colon)).is_some() {
                let ty = self.parse_type();
                if let Some(ty) = &ty {
                    end = ty.span;
                }
                ty
            } else {
                None
            };
            let body = self.parse_optional_function_body();
            if let Some(body) = &body {
                end = match body {
                    FunctionBody::Block(block) => block.span,
                    FunctionBody::Expression(expr) => expr.span(),
                };
            }
            accessors.push(PropertyAccessor {
                modifiers,
                kind,
                return_type,
                body,
                span: start.merge(end),
            });
        }
        accessors
    }

    fn parse_type_alias(&mut self, start: Span, modifiers: Vec<Modifier>) -> TypeAlias {
        self.advance(); // `typealias`
        let name = self
            .expect_identifier("a type alias name")
            .unwrap_or_else(|| placeholder_name(self.peek().span()));
        let type_parameters = self.parse_type_parameters();
        self.expect(|k| k.is_operator("="), "`=`");
        let ty = self
            .parse_type()
            .unwrap_or_else(|| error_type(self.peek().span()));
        let span = start.merge(ty.span);
        TypeAlias {
            modifiers,
            name,
            type_parameters,
            ty,
            span,
        }
    }

    // --- types ----------------------------------------------------------

    /// Parses a type or records a diagnostic at the current position.
    pub(crate) fn parse_type(&mut self) -> Option<Type> {
        if let Some(ty) = self.try_parse_type() {
            return Some(ty);
        }
        self.note_expected("a type");
        let found = self.peek_kind().describe();
        let span = self.peek().span();
        self.error(format!("expected a type, found {found}"), span);
        None
    }

    /// Silent, speculative type parse: consumes nothing and records
    /// nothing on failure. Used wherever a type may or may not follow
    /// (lambda parameters, anonymous function receivers).
    pub(crate) fn try_parse_type(&mut self) -> Option<Type> {
        let checkpoint = self.checkpoint();
        let start = self.peek().span();
        let suspend = if self.peek_kind().identifier().is_some_and(|n| n == "suspend")
            && matches!(
                self.peek_nth(1).kind(),
                TokenKind::Identifier(_) | TokenKind::LeftParen
            ) {
            self.advance();
            true
        } else {
            false
        };
        let mut ty = match self.peek_kind() {
            TokenKind::LeftParen => {
                self.advance();
                let inner = self.with_nesting(Self::try_parse_type, |_| None);
                let Some(inner) = inner else {
                    self.restore(checkpoint);
                    return None;
                };
                let Some(close) = self.eat_if(|k| matches!(k, TokenKind::RightParen)) else {
                    self.restore(checkpoint);
                    return None;
                };
                Type {
                    suspend,
                    kind: TypeKind::Parenthesized(Box::new(inner)),
                    span: start.merge(close.span()),
                }
            }
            TokenKind::Identifier(_) => {
                let mut path = Vec::new();
                let token = self.advance();
                let TokenKind::Identifier(name) = token.kind() else {
                    self.restore(checkpoint);
                    return None;
                };
                path.push(Identifier {
                    name: name.clone(),
                    span: token.span(),
                });
                while self.at_operator(".")
                    && matches!(self.peek_nth(1).kind(), TokenKind::Identifier(_))
                {
                    self.advance();
                    let token = self.advance();
                    let TokenKind::Identifier(name) = token.kind() else {
                        break;
                    };
                    path.push(Identifier {
                        name: name.clone(),
                        span: token.span(),
                    });
                }
                let end = path.last().map_or(start, |i| i.span);
                let kind = if path.len() == 1 && path[0].name == "dynamic" {
                    TypeKind::Dynamic
                } else {
                    TypeKind::User(path)
                };
                Type {
                    suspend,
                    kind,
                    span: start.merge(end),
                }
            }
            _ => {
                self.restore(checkpoint);
                return None;
            }
        };
        loop {
            if self.at_operator("?") {
                let token = self.advance();
                let span = ty.span.merge(token.span());
                ty = Type {
                    suspend: false,
                    kind: TypeKind::Nullable(Box::new(ty)),
                    span,
                };
            } else if self.at_operator("&") {
                self.advance();
                let Some(right) = self.with_nesting(Self::try_parse_type, |_| None) else {
                    self.restore(checkpoint);
                    return None;
                };
                let span = ty.span.merge(right.span);
                ty = Type {
                    suspend: false,
                    kind: TypeKind::NonNullable {
                        left: Box::new(ty),
                        right: Box::new(right),
                    },
                    span,
                };
            } else {
                break;
            }
        }
        Some(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Declaration, Expression};
    use crate::source_analysis::lexer::lex_with_eof;
    use crate::source_analysis::parser::parse;

    fn parse_clean(source: &str) -> SourceFile {
        let (file, diagnostics) = parse(lex_with_eof(source));
        assert!(
            diagnostics.is_empty(),
            "unexpected diagnostics for {source:?}: {diagnostics:?}"
        );
        file
    }

    fn only_declaration(file: &SourceFile) -> &Declaration {
        assert_eq!(file.statements.len(), 1, "want one statement: {file:?}");
        match &file.statements[0] {
            Statement::Declaration(declaration) => declaration,
            other => panic!("expected a declaration, got {other:?}"),
        }
    }

    #[test]
    fn package_and_imports() {
        let file = parse_clean(
            "package kopi.demo\nimport kopi.text\nimport kopi.io.*\nimport kopi.net as web\nval x = 1",
        );
        let package = file.package.as_ref().expect("package");
        assert_eq!(package.path.len(), 2);
        assert_eq!(package.path[1].name, "demo");
        assert_eq!(file.imports.len(), 3);
        assert!(!file.imports[0].wildcard);
        assert!(file.imports[1].wildcard);
        assert_eq!(
            file.imports[2].alias.as_ref().map(|a| a.name.as_str()),
            Some("web")
        );
        assert_eq!(file.statements.len(), 1);
    }

    #[test]
    fn wildcard_import_ends_at_the_newline() {
        // `*` cannot end an ordinary statement, but it does end a
        // wildcard import; the next line must not be swallowed.
        let file = parse_clean("import kopi.io.*\nval x = 1");
        assert_eq!(file.imports.len(), 1);
        assert!(file.imports[0].wildcard);
        assert_eq!(file.statements.len(), 1);
    }

    #[test]
    fn shebang_is_recorded() {
        let file = parse_clean("#!/usr/bin/env kopi\nval x = 1");
        assert!(file.shebang.is_some());
        assert_eq!(file.statements.len(), 1);
    }

    #[test]
    fn file_annotation_with_arguments() {
        let file = parse_clean("@file:Suppress(\"unused\")\nval y = 1");
        assert_eq!(file.annotations.len(), 1);
        let annotation = &file.annotations[0].annotations[0];
        assert_eq!(annotation.path[0].name, "Suppress");
        assert_eq!(annotation.arguments.len(), 1);
    }

    #[test]
    fn file_annotation_group() {
        let file = parse_clean("@file:[Alpha Beta]\nval y = 1");
        assert_eq!(file.annotations[0].annotations.len(), 2);
    }

    #[test]
    fn simple_properties() {
        let file = parse_clean("val x = 1");
        let Declaration::Property(property) = only_declaration(&file) else {
            panic!("expected property");
        };
        assert_eq!(property.kind, PropertyKind::Val);
        assert_eq!(property.bindings[0].name.name, "x");
        assert!(matches!(
            property.initializer,
            Some(PropertyInitializer::Value(_))
        ));

        let file = parse_clean("var y: Int = 2");
        let Declaration::Property(property) = only_declaration(&file) else {
            panic!("expected property");
        };
        assert_eq!(property.kind, PropertyKind::Var);
        assert!(property.bindings[0].ty.is_some());
    }

    #[test]
    fn destructured_property() {
        let file = parse_clean("val (a, b) = pair");
        let Declaration::Property(property) = only_declaration(&file) else {
            panic!("expected property");
        };
        assert!(property.destructured);
        assert_eq!(property.bindings.len(), 2);
        assert_eq!(property.bindings[1].name.name, "b");
    }

    #[test]
    fn property_with_getter() {
        let file = parse_clean("val x: Int\n    get() = 1");
        let Declaration::Property(property) = only_declaration(&file) else {
            panic!("expected property");
        };
        assert_eq!(property.accessors.len(), 1);
        assert_eq!(property.accessors[0].kind, AccessorKind::Get);
        assert!(matches!(
            property.accessors[0].body,
            Some(FunctionBody::Expression(_))
        ));
    }

    #[test]
    fn property_with_modifier_only_setter() {
        let file = parse_clean("var y = 0\n    private set");
        let Declaration::Property(property) = only_declaration(&file) else {
            panic!("expected property");
        };
        assert_eq!(property.accessors.len(), 1);
        assert_eq!(property.accessors[0].kind, AccessorKind::Set);
        assert_eq!(property.accessors[0].modifiers[0].name, "private");
        assert!(property.accessors[0].body.is_none());
    }

    #[test]
    fn property_delegate() {
        let file = parse_clean("val v by lazy(loader)");
        let Declaration::Property(property) = only_declaration(&file) else {
            panic!("expected property");
        };
        assert!(matches!(
            property.initializer,
            Some(PropertyInitializer::Delegate(_))
        ));
    }

    #[test]
    fn function_with_defaults_and_expression_body() {
        let file = parse_clean("fun add(a: Int, b: Int = 0): Int = a + b");
        let Declaration::Function(function) = only_declaration(&file) else {
            panic!("expected function");
        };
        assert_eq!(function.name.name, "add");
        assert_eq!(function.parameters.len(), 2);
        assert!(function.parameters[0].default.is_none());
        assert!(function.parameters[1].default.is_some());
        assert!(function.return_type.is_some());
        assert!(matches!(function.body, Some(FunctionBody::Expression(_))));
    }

    #[test]
    fn function_with_block_body() {
        let file = parse_clean("fun main() {\n    val x = 1\n    x\n}");
        let Declaration::Function(function) = only_declaration(&file) else {
            panic!("expected function");
        };
        let Some(FunctionBody::Block(block)) = &function.body else {
            panic!("expected block body");
        };
        assert_eq!(block.statements.len(), 2);
    }

    #[test]
    fn generic_function_with_constraints() {
        let file = parse_clean("fun <T> id(x: T): T where T: Any = x");
        let Declaration::Function(function) = only_declaration(&file) else {
            panic!("expected function");
        };
        assert_eq!(function.type_parameters.len(), 1);
        assert_eq!(function.constraints.len(), 1);
        assert_eq!(function.constraints[0].name.name, "T");
    }

    #[test]
    fn vararg_parameter_modifier() {
        let file = parse_clean("fun all(vararg xs: Int) { }");
        let Declaration::Function(function) = only_declaration(&file) else {
            panic!("expected function");
        };
        assert_eq!(function.parameters[0].modifiers[0].name, "vararg");
        assert_eq!(function.parameters[0].name.name, "xs");
    }

    #[test]
    fn class_with_primary_constructor_properties() {
        let file = parse_clean("class Point(val x: Int, var y: Int)");
        let Declaration::Class(class) = only_declaration(&file) else {
            panic!("expected class");
        };
        assert_eq!(class.kind, ClassKind::Class);
        let ctor = class.primary_constructor.as_ref().expect("ctor");
        assert!(!ctor.explicit_keyword);
        assert_eq!(ctor.parameters.len(), 2);
        assert_eq!(ctor.parameters[0].binding, Some(PropertyKind::Val));
        assert_eq!(ctor.parameters[1].binding, Some(PropertyKind::Var));
    }

    #[test]
    fn class_with_explicit_constructor_keyword() {
        let file = parse_clean("class Widget private constructor(id: Int)");
        let Declaration::Class(class) = only_declaration(&file) else {
            panic!("expected class");
        };
        let ctor = class.primary_constructor.as_ref().expect("ctor");
        assert!(ctor.explicit_keyword);
        assert_eq!(ctor.modifiers[0].name, "private");
        assert_eq!(ctor.parameters[0].binding, None);
    }

    #[test]
    fn data_class_with_member() {
        let file = parse_clean("data class Box(val v: Int) {\n    fun get(): Int = v\n}");
        let Declaration::Class(class) = only_declaration(&file) else {
            panic!("expected class");
        };
        assert_eq!(class.modifiers[0].name, "data");
        let body = class.body.as_ref().expect("body");
        let ClassBodyKind::Members(members) = &body.kind else {
            panic!("expected plain members");
        };
        assert_eq!(members.len(), 1);
    }

    #[test]
    fn fun_interface() {
        let file = parse_clean("fun interface Runnable {\n    fun run()\n}");
        let Declaration::Class(class) = only_declaration(&file) else {
            panic!("expected class");
        };
        assert_eq!(class.kind, ClassKind::FunInterface);
    }

    #[test]
    fn interface_without_body() {
        let file = parse_clean("interface Shape");
        let Declaration::Class(class) = only_declaration(&file) else {
            panic!("expected class");
        };
        assert_eq!(class.kind, ClassKind::Interface);
        assert!(class.body.is_none());
    }

    #[test]
    fn enum_class_entries_and_members() {
        let file = parse_clean("enum class Color {\n    RED, GREEN(1), BLUE;\n    fun hex(): Int = 0\n}");
        let Declaration::Class(class) = only_declaration(&file) else {
            panic!("expected class");
        };
        assert_eq!(class.modifiers[0].name, "enum");
        let body = class.body.as_ref().expect("body");
        let ClassBodyKind::Enum { entries, members } = &body.kind else {
            panic!("expected enum body");
        };
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].arguments.len(), 1);
        assert_eq!(members.len(), 1);
    }

    #[test]
    fn empty_enum_body() {
        let file = parse_clean("enum class Empty { }");
        let Declaration::Class(class) = only_declaration(&file) else {
            panic!("expected class");
        };
        let body = class.body.as_ref().expect("body");
        assert!(matches!(
            &body.kind,
            ClassBodyKind::Enum { entries, members } if entries.is_empty() && members.is_empty()
        ));
    }

    #[test]
    fn companion_init_and_secondary_constructor() {
        let source = "class A {\n    companion object Factory\n    init { ready() }\n    constructor(x: Int) : this() { }\n}";
        let file = parse_clean(source);
        let Declaration::Class(class) = only_declaration(&file) else {
            panic!("expected class");
        };
        let ClassBodyKind::Members(members) = &class.body.as_ref().expect("body").kind else {
            panic!("expected members");
        };
        assert_eq!(members.len(), 3);
        let ClassMember::CompanionObject(companion) = &members[0] else {
            panic!("expected companion");
        };
        assert_eq!(companion.name.as_ref().map(|n| n.name.as_str()), Some("Factory"));
        assert!(matches!(&members[1], ClassMember::Initializer(_)));
        let ClassMember::SecondaryConstructor(ctor) = &members[2] else {
            panic!("expected secondary constructor");
        };
        let delegation = ctor.delegation.as_ref().expect("delegation");
        assert_eq!(delegation.target, DelegationTarget::This);
        assert!(ctor.body.is_some());
    }

    #[test]
    fn object_declaration() {
        let file = parse_clean("object Registry {\n    val items = [1]\n}");
        let Declaration::Object(object) = only_declaration(&file) else {
            panic!("expected object");
        };
        assert_eq!(object.name.name, "Registry");
        assert!(object.body.is_some());
    }

    #[test]
    fn type_alias() {
        let file = parse_clean("typealias Label = kopi.text.Text");
        let Declaration::TypeAlias(alias) = only_declaration(&file) else {
            panic!("expected typealias");
        };
        assert_eq!(alias.name.name, "Label");
        let TypeKind::User(path) = &alias.ty.kind else {
            panic!("expected user type");
        };
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn type_parameter_variance() {
        let file = parse_clean("class Wrap<out T, in U>(val v: T)");
        let Declaration::Class(class) = only_declaration(&file) else {
            panic!("expected class");
        };
        assert_eq!(class.type_parameters.len(), 2);
        assert_eq!(class.type_parameters[0].modifiers[0].name, "out");
        assert_eq!(class.type_parameters[1].modifiers[0].name, "in");
    }

    #[test]
    fn type_forms() {
        fn property_type(source: &str) -> Type {
            let file = parse_clean(source);
            let Declaration::Property(property) = only_declaration(&file) else {
                panic!("expected property");
            };
            property.bindings[0].ty.clone().expect("type")
        }

        let ty = property_type("val a: Int? = null");
        assert!(matches!(ty.kind, TypeKind::Nullable(_)));

        let ty = property_type("val b: dynamic = x");
        assert!(matches!(ty.kind, TypeKind::Dynamic));

        let ty = property_type("val c: (Text) = y");
        assert!(matches!(ty.kind, TypeKind::Parenthesized(_)));

        let ty = property_type("val d: A & B = z");
        assert!(matches!(ty.kind, TypeKind::NonNullable { .. }));

        let ty = property_type("val e: suspend Handler = h");
        assert!(ty.suspend);
    }

    #[test]
    fn statements_split_by_newline_or_semicolon() {
        let file = parse_clean("val a = 1; val b = 2");
        assert_eq!(file.statements.len(), 2);

        let file = parse_clean("val a = 1\nval b = 2");
        assert_eq!(file.statements.len(), 2);
    }

    #[test]
    fn dangling_operator_joins_the_next_line() {
        // `1 +` cannot end a statement, so the newline does not
        // terminate: one declaration whose initializer is the whole sum.
        let file = parse_clean("val x = 1 +\n2");
        let Declaration::Property(property) = only_declaration(&file) else {
            panic!("expected property");
        };
        let Some(PropertyInitializer::Value(value)) = &property.initializer else {
            panic!("expected value initializer");
        };
        let Expression::Binary { op, .. } = value else {
            panic!("expected binary initializer, got {value:?}");
        };
        assert_eq!(op, "+");
    }

    #[test]
    fn missing_terminator_is_reported() {
        let (file, diagnostics) = parse(lex_with_eof("val a = 1 val b = 2"));
        assert!(diagnostics
            .iter()
            .any(|d| d.message.contains("expected `;` or a new line")));
        assert_eq!(file.statements.len(), 2);
    }

    #[test]
    fn expression_statements_at_top_level() {
        let file = parse_clean("print(1)\nx + 2");
        assert_eq!(file.statements.len(), 2);
        assert!(file
            .statements
            .iter()
            .all(|s| matches!(s, Statement::Expression(_))));
    }

    #[test]
    fn modifier_word_as_plain_name() {
        let file = parse_clean("val data = 1");
        let Declaration::Property(property) = only_declaration(&file) else {
            panic!("expected property");
        };
        assert_eq!(property.bindings[0].name.name, "data");

        // And as a bare expression.
        let file = parse_clean("data + 1");
        assert!(matches!(&file.statements[0], Statement::Expression(_)));
    }

    #[test]
    fn recovery_resumes_at_next_declaration() {
        let (file, diagnostics) = parse(lex_with_eof("val a = 1\n)))\nval b = 2"));
        assert!(!diagnostics.is_empty());
        let names: Vec<_> = file
            .statements
            .iter()
            .filter_map(|s| match s {
                Statement::Declaration(Declaration::Property(p)) => {
                    Some(p.bindings[0].name.name.clone())
                }
                Statement::Expression(_) => None,
                Statement::Declaration(_) => None,
            })
            .collect();
        assert!(names.contains(&"a".into()));
        assert!(names.contains(&"b".into()));
    }

    #[test]
    fn object_literal_statement_stays_expression() {
        let file = parse_clean("object { }");
        assert!(matches!(
            &file.statements[0],
            Statement::Expression(Expression::ObjectLiteral { .. })
        ));
    }

    #[test]
    fn parse_is_total_on_garbage() {
        let (_, diagnostics) = parse(lex_with_eof("} ) ] , : @@@"));
        assert!(!diagnostics.is_empty());
    }
}
