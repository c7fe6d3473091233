// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Abstract syntax tree.
//!
//! Every node carries the byte [`Span`] of the source it covers, so
//! diagnostics and tooling can point back into the file. Nodes own their
//! text as [`EcoString`]s; cloning a subtree is cheap.
//!
//! The tree is tolerant by construction: [`Expression::Error`] is a real
//! node the parser inserts where it had to give up, which keeps every
//! other node fully typed without optional fields for the broken cases.

use ecow::EcoString;

use crate::source_analysis::Span;

/// A name with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: EcoString,
    pub span: Span,
}

/// A soft modifier word (`public`, `data`, `enum`, `vararg`, ...).
///
/// Modifiers are identifiers in the token stream; which words count is
/// decided by the parser's modifier table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier {
    pub name: EcoString,
    pub span: Span,
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Integer text as written, suffixes and underscores included.
    Int(EcoString),
    Float(EcoString),
    Bool(bool),
    Char(char),
    /// Raw single-line string content, escapes undecoded.
    String(EcoString),
    /// Raw multiline string content.
    MultilineString(EcoString),
    Null,
}

/// One argument in a call's argument list.
#[derive(Debug, Clone, PartialEq)]
pub struct CallArgument {
    pub name: Option<Identifier>,
    /// `*` in the argument's leading position.
    pub spread: bool,
    pub value: Expression,
    pub span: Span,
}

/// One element of a collection literal.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionElement {
    /// `*` in the element's leading position.
    pub spread: bool,
    pub value: Expression,
    pub span: Span,
}

/// The body of an `if`/`when` arm: a block or a single statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlBody {
    Block(Block),
    Statement(Box<Statement>),
}

impl ControlBody {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Block(block) => block.span,
            Self::Statement(statement) => statement.span(),
        }
    }
}

/// The `(subject)` of a `when`, optionally binding `val name =`.
#[derive(Debug, Clone, PartialEq)]
pub struct WhenSubject {
    pub binding: Option<VariableBinding>,
    pub expression: Box<Expression>,
    pub span: Span,
}

/// One `conditions -> body` arm; an empty condition list is `else`.
#[derive(Debug, Clone, PartialEq)]
pub struct WhenEntry {
    pub conditions: Vec<Expression>,
    pub body: ControlBody,
    pub span: Span,
}

impl WhenEntry {
    #[must_use]
    pub fn is_else(&self) -> bool {
        self.conditions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub binding: Identifier,
    pub ty: Type,
    pub body: Block,
    pub span: Span,
}

/// A lambda parameter: `x`, `x: T`, or a destructuring `(a, b): T`.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaParameter {
    pub bindings: Vec<VariableBinding>,
    pub destructured: bool,
    pub ty: Option<Type>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal {
        value: LiteralValue,
        span: Span,
    },
    Identifier(Identifier),
    /// Prefix (`-x`, `++x`, `!x`) or postfix (`x++`, `x--`, `x?`) unary.
    Unary {
        op: EcoString,
        prefix: bool,
        operand: Box<Expression>,
        span: Span,
    },
    /// Any binary operator whose right-hand side is an expression,
    /// `in`/`!in` included.
    Binary {
        op: EcoString,
        left: Box<Expression>,
        right: Box<Expression>,
        span: Span,
    },
    /// `is` / `!is` with a type right-hand side.
    TypeCheck {
        negated: bool,
        value: Box<Expression>,
        ty: Type,
        span: Span,
    },
    /// `as` / `as?` cast.
    Cast {
        safe: bool,
        value: Box<Expression>,
        ty: Type,
        span: Span,
    },
    /// `a shl b` — a named function used in infix position.
    InfixCall {
        function: Identifier,
        left: Box<Expression>,
        right: Box<Expression>,
        span: Span,
    },
    /// `=` or a compound assignment operator.
    Assignment {
        op: EcoString,
        target: Box<Expression>,
        value: Box<Expression>,
        span: Span,
    },
    Member {
        receiver: Box<Expression>,
        /// `?.` instead of `.`.
        safe: bool,
        name: Identifier,
        span: Span,
    },
    Index {
        receiver: Box<Expression>,
        arguments: Vec<Expression>,
        span: Span,
    },
    Call {
        callee: Box<Expression>,
        arguments: Vec<CallArgument>,
        span: Span,
    },
    Parenthesized {
        inner: Box<Expression>,
        span: Span,
    },
    CollectionLiteral {
        elements: Vec<CollectionElement>,
        span: Span,
    },
    Lambda {
        parameters: Vec<LambdaParameter>,
        body: Vec<Statement>,
        span: Span,
    },
    /// `fun [Receiver.] [: Return] [body]` in expression position.
    AnonymousFunction {
        receiver: Option<Type>,
        return_type: Option<Type>,
        body: Option<FunctionBody>,
        span: Span,
    },
    ObjectLiteral {
        body: Option<ClassBody>,
        span: Span,
    },
    This {
        label: Option<Identifier>,
        span: Span,
    },
    Super {
        type_argument: Option<Type>,
        label: Option<Identifier>,
        span: Span,
    },
    If {
        condition: Box<Expression>,
        then_branch: Option<ControlBody>,
        else_branch: Option<ControlBody>,
        span: Span,
    },
    When {
        subject: Option<WhenSubject>,
        entries: Vec<WhenEntry>,
        span: Span,
    },
    Try {
        body: Block,
        catches: Vec<CatchClause>,
        finally: Option<Block>,
        span: Span,
    },
    Return {
        label: Option<Identifier>,
        value: Option<Box<Expression>>,
        span: Span,
    },
    Throw {
        value: Box<Expression>,
        span: Span,
    },
    Break {
        label: Option<Identifier>,
        span: Span,
    },
    Continue {
        label: Option<Identifier>,
        span: Span,
    },
    /// `label@ expr`.
    Labeled {
        label: Identifier,
        body: Box<Expression>,
        span: Span,
    },
    /// Recovery node: something unparseable was here.
    Error {
        span: Span,
    },
}

impl Expression {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Literal { span, .. }
            | Self::Unary { span, .. }
            | Self::Binary { span, .. }
            | Self::TypeCheck { span, .. }
            | Self::Cast { span, .. }
            | Self::InfixCall { span, .. }
            | Self::Assignment { span, .. }
            | Self::Member { span, .. }
            | Self::Index { span, .. }
            | Self::Call { span, .. }
            | Self::Parenthesized { span, .. }
            | Self::CollectionLiteral { span, .. }
            | Self::Lambda { span, .. }
            | Self::AnonymousFunction { span, .. }
            | Self::ObjectLiteral { span, .. }
            | Self::This { span, .. }
            | Self::Super { span, .. }
            | Self::If { span, .. }
            | Self::When { span, .. }
            | Self::Try { span, .. }
            | Self::Return { span, .. }
            | Self::Throw { span, .. }
            | Self::Break { span, .. }
            | Self::Continue { span, .. }
            | Self::Labeled { span, .. }
            | Self::Error { span } => *span,
            Self::Identifier(identifier) => identifier.span,
        }
    }

    /// Whether this node is a primary expression or a postfix chain over
    /// one — the shapes allowed on the left of a compound assignment.
    #[must_use]
    pub fn is_assignable_chain(&self) -> bool {
        matches!(
            self,
            Self::Identifier(_)
                | Self::Member { .. }
                | Self::Index { .. }
                | Self::Call { .. }
                | Self::Parenthesized { .. }
                | Self::This { .. }
                | Self::Super { .. }
        )
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

// ---------------------------------------------------------------------------
// Statements and blocks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Declaration(Declaration),
    Expression(Expression),
}

impl Statement {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Declaration(declaration) => declaration.span(),
            Self::Expression(expression) => expression.span(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    /// Leading `suspend` modifier.
    pub suspend: bool,
    pub kind: TypeKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// Dotted user type: `kopi.collections.List`.
    User(Vec<Identifier>),
    Dynamic,
    /// `T?` (one node per `?`).
    Nullable(Box<Type>),
    Parenthesized(Box<Type>),
    /// `A & B` definitely-non-nullable intersection.
    NonNullable {
        left: Box<Type>,
        right: Box<Type>,
    },
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Class(ClassDeclaration),
    Object(ObjectDeclaration),
    Function(FunctionDeclaration),
    Property(PropertyDeclaration),
    TypeAlias(TypeAlias),
}

impl Declaration {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Class(d) => d.span,
            Self::Object(d) => d.span,
            Self::Function(d) => d.span,
            Self::Property(d) => d.span,
            Self::TypeAlias(d) => d.span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    /// `fun interface`.
    FunInterface,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDeclaration {
    pub modifiers: Vec<Modifier>,
    pub kind: ClassKind,
    pub name: Identifier,
    pub type_parameters: Vec<TypeParameter>,
    pub primary_constructor: Option<PrimaryConstructor>,
    pub constraints: Vec<TypeConstraint>,
    pub body: Option<ClassBody>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryConstructor {
    pub modifiers: Vec<Modifier>,
    /// Whether the `constructor` keyword was written.
    pub explicit_keyword: bool,
    pub parameters: Vec<ClassParameter>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassParameter {
    pub modifiers: Vec<Modifier>,
    /// `val`/`var` turning the parameter into a property.
    pub binding: Option<PropertyKind>,
    pub name: Identifier,
    pub ty: Type,
    pub default: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassBody {
    pub kind: ClassBodyKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassBodyKind {
    /// Ordinary `{ members }`.
    Members(Vec<ClassMember>),
    /// Enum body: entries, then optional `;`-separated members.
    Enum {
        entries: Vec<EnumEntry>,
        members: Vec<ClassMember>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassMember {
    Declaration(Declaration),
    CompanionObject(CompanionObject),
    Initializer(InitializerBlock),
    SecondaryConstructor(SecondaryConstructor),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanionObject {
    pub modifiers: Vec<Modifier>,
    pub name: Option<Identifier>,
    pub body: Option<ClassBody>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitializerBlock {
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryConstructor {
    pub modifiers: Vec<Modifier>,
    pub parameters: Vec<FunctionParameter>,
    pub delegation: Option<ConstructorDelegation>,
    pub body: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegationTarget {
    This,
    Super,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDelegation {
    pub target: DelegationTarget,
    pub arguments: Vec<CallArgument>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumEntry {
    pub modifiers: Vec<Modifier>,
    pub name: Identifier,
    pub arguments: Vec<CallArgument>,
    pub body: Option<ClassBody>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDeclaration {
    pub modifiers: Vec<Modifier>,
    pub name: Identifier,
    pub body: Option<ClassBody>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub modifiers: Vec<Modifier>,
    pub type_parameters: Vec<TypeParameter>,
    pub name: Identifier,
    pub parameters: Vec<FunctionParameter>,
    pub return_type: Option<Type>,
    pub constraints: Vec<TypeConstraint>,
    pub body: Option<FunctionBody>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionParameter {
    pub modifiers: Vec<Modifier>,
    pub name: Identifier,
    pub ty: Type,
    pub default: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Block(Block),
    /// `= expression`. Boxed: [`Expression::AnonymousFunction`] holds a
    /// `FunctionBody`, so the indirection has to live on this side.
    Expression(Box<Expression>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Val,
    Var,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableBinding {
    pub name: Identifier,
    pub ty: Option<Type>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyInitializer {
    /// `= expression`.
    Value(Expression),
    /// `by expression`.
    Delegate(Expression),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Get,
    Set,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAccessor {
    pub modifiers: Vec<Modifier>,
    pub kind: AccessorKind,
    pub return_type: Option<Type>,
    pub body: Option<FunctionBody>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDeclaration {
    pub modifiers: Vec<Modifier>,
    pub kind: PropertyKind,
    pub type_parameters: Vec<TypeParameter>,
    pub bindings: Vec<VariableBinding>,
    /// `(a, b)` destructuring rather than a single name.
    pub destructured: bool,
    pub constraints: Vec<TypeConstraint>,
    pub initializer: Option<PropertyInitializer>,
    pub accessors: Vec<PropertyAccessor>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAlias {
    pub modifiers: Vec<Modifier>,
    pub name: Identifier,
    pub type_parameters: Vec<TypeParameter>,
    pub ty: Type,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParameter {
    /// `reified`, `in`, `out`.
    pub modifiers: Vec<Modifier>,
    pub name: Identifier,
    pub bound: Option<Type>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeConstraint {
    pub name: Identifier,
    pub ty: Type,
    pub span: Span,
}

// ---------------------------------------------------------------------------
// File structure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PackageHeader {
    pub path: Vec<Identifier>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub path: Vec<Identifier>,
    /// Trailing `.*`.
    pub wildcard: bool,
    /// `as name`.
    pub alias: Option<Identifier>,
    pub span: Span,
}

/// `@file:` annotation, single or `[...]` group.
#[derive(Debug, Clone, PartialEq)]
pub struct FileAnnotation {
    pub annotations: Vec<Annotation>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub path: Vec<Identifier>,
    pub arguments: Vec<CallArgument>,
    pub span: Span,
}

/// A parsed source file. Always produced, however broken the input; the
/// diagnostics accompanying it say what went wrong.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub shebang: Option<EcoString>,
    pub annotations: Vec<FileAnnotation>,
    pub package: Option<PackageHeader>,
    pub imports: Vec<Import>,
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str, start: u32) -> Identifier {
        let end = start + name.len() as u32;
        Identifier {
            name: name.into(),
            span: Span::new(start, end),
        }
    }

    #[test]
    fn expression_span_reaches_through_variants() {
        let expr = Expression::Binary {
            op: "+".into(),
            left: Box::new(Expression::Identifier(ident("a", 0))),
            right: Box::new(Expression::Identifier(ident("b", 4))),
            span: Span::new(0, 5),
        };
        assert_eq!(expr.span(), Span::new(0, 5));
    }

    #[test]
    fn assignable_chain_classification() {
        let member = Expression::Member {
            receiver: Box::new(Expression::Identifier(ident("a", 0))),
            safe: false,
            name: ident("b", 2),
            span: Span::new(0, 3),
        };
        assert!(member.is_assignable_chain());

        let sum = Expression::Binary {
            op: "+".into(),
            left: Box::new(Expression::Identifier(ident("a", 0))),
            right: Box::new(Expression::Identifier(ident("b", 4))),
            span: Span::new(0, 5),
        };
        assert!(!sum.is_assignable_chain());
    }

    #[test]
    fn when_entry_else_detection() {
        let entry = WhenEntry {
            conditions: vec![],
            body: ControlBody::Statement(Box::new(Statement::Expression(Expression::Error {
                span: Span::empty(0),
            }))),
            span: Span::empty(0),
        };
        assert!(entry.is_else());
    }
}
