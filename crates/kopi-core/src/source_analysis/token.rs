// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Tokens produced by the lexical scanner.
//!
//! Each [`Token`] carries its [`TokenKind`], a byte [`Span`] into the source,
//! and any surrounding trivia (whitespace and comments). Trivia is attached
//! to tokens rather than emitted as separate tokens: everything up to and
//! including the end of a token's line is *trailing* trivia of that token;
//! everything else is *leading* trivia of the next token. Concatenating
//! leading trivia, token text, and trailing trivia in order reconstructs the
//! source byte-for-byte.
//!
//! Only hard keywords get a [`Keyword`] kind. Modifier words (`enum`,
//! `data`, `infix`, `public`, ...) and soft keywords (`companion`, `get`,
//! `set`, `by`, `where`, `dynamic`, `file`) stay [`TokenKind::Identifier`]
//! and are recognised contextually by the parser, so they remain usable as
//! ordinary names.

use ecow::EcoString;

use super::span::Span;

/// Trivia classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriviaKind {
    /// Spaces, tabs, newlines.
    Whitespace,
    /// `// ...` to end of line.
    LineComment,
    /// `/* ... */`, possibly nested.
    BlockComment,
}

/// A piece of non-semantic source text attached to a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trivia {
    kind: TriviaKind,
    text: EcoString,
    span: Span,
}

impl Trivia {
    #[must_use]
    pub fn new(kind: TriviaKind, text: impl Into<EcoString>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    #[must_use]
    pub fn kind(&self) -> TriviaKind {
        self.kind
    }

    #[must_use]
    pub fn text(&self) -> &EcoString {
        &self.text
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Whether this trivia contains a line break.
    ///
    /// Line comments never include their terminating newline; the newline
    /// is whitespace trivia of its own.
    #[must_use]
    pub fn has_newline(&self) -> bool {
        self.kind == TriviaKind::Whitespace && self.text.contains('\n')
    }
}

/// Hard keywords.
///
/// `true`, `false`, and `null` are lexed as literal kinds, not keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    As,
    Break,
    Catch,
    Class,
    Constructor,
    Continue,
    Else,
    Finally,
    Fun,
    If,
    Import,
    In,
    Init,
    Interface,
    Is,
    Object,
    Package,
    Return,
    Super,
    This,
    Throw,
    Try,
    TypeAlias,
    Val,
    Var,
    When,
}

impl Keyword {
    /// Looks up an identifier-shaped word in the keyword table.
    #[must_use]
    pub fn from_str(word: &str) -> Option<Self> {
        let keyword = match word {
            "as" => Self::As,
            "break" => Self::Break,
            "catch" => Self::Catch,
            "class" => Self::Class,
            "constructor" => Self::Constructor,
            "continue" => Self::Continue,
            "else" => Self::Else,
            "finally" => Self::Finally,
            "fun" => Self::Fun,
            "if" => Self::If,
            "import" => Self::Import,
            "in" => Self::In,
            "init" => Self::Init,
            "interface" => Self::Interface,
            "is" => Self::Is,
            "object" => Self::Object,
            "package" => Self::Package,
            "return" => Self::Return,
            "super" => Self::Super,
            "this" => Self::This,
            "throw" => Self::Throw,
            "try" => Self::Try,
            "typealias" => Self::TypeAlias,
            "val" => Self::Val,
            "var" => Self::Var,
            "when" => Self::When,
            _ => return None,
        };
        Some(keyword)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::As => "as",
            Self::Break => "break",
            Self::Catch => "catch",
            Self::Class => "class",
            Self::Constructor => "constructor",
            Self::Continue => "continue",
            Self::Else => "else",
            Self::Finally => "finally",
            Self::Fun => "fun",
            Self::If => "if",
            Self::Import => "import",
            Self::In => "in",
            Self::Init => "init",
            Self::Interface => "interface",
            Self::Is => "is",
            Self::Object => "object",
            Self::Package => "package",
            Self::Return => "return",
            Self::Super => "super",
            Self::This => "this",
            Self::Throw => "throw",
            Self::Try => "try",
            Self::TypeAlias => "typealias",
            Self::Val => "val",
            Self::Var => "var",
            Self::When => "when",
        }
    }
}

/// Lexeme classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Plain or backtick-quoted identifier. The payload is the name without
    /// backticks; the span covers the written form.
    Identifier(EcoString),
    Keyword(Keyword),
    /// Integer literal text as written (digits, underscores, base prefix,
    /// `u`/`U`/`l`/`L` suffixes).
    Int(EcoString),
    /// Float literal text as written.
    Float(EcoString),
    Bool(bool),
    Null,
    /// Opening quote plus one (possibly escaped) code point, decoded. The
    /// closing quote is the following [`TokenKind::CharClose`] token; the
    /// grammar keeps the closing quote out of the character rule, and the
    /// token stream mirrors that.
    Char(char),
    /// The closing `'` of a character literal.
    CharClose,
    /// Single-line string content between the quotes, escapes left as
    /// written. Decode with [`super::lexer::decode_escapes`].
    String(EcoString),
    /// Multiline string content between the `"""` delimiters.
    MultilineString(EcoString),
    /// Any multi-purpose operator: `+ - * / % = == != === !== < > <= >=
    /// && || ! ++ -- ?: ?. ? .. . :: -> += -= *= /= %=`.
    Operator(EcoString),
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,
    Colon,
    At,
    /// `#!...` on the first line of the file.
    Shebang(EcoString),
    /// End of input; zero-length span.
    Eof,
    /// Unrecognised or unterminated source text, kept verbatim so the scan
    /// can continue past it.
    Error(EcoString),
}

impl TokenKind {
    #[must_use]
    pub fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    #[must_use]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self, Self::Keyword(k) if *k == keyword)
    }

    #[must_use]
    pub fn is_operator(&self, op: &str) -> bool {
        matches!(self, Self::Operator(text) if text == op)
    }

    /// The identifier name, if this token is an identifier.
    #[must_use]
    pub fn identifier(&self) -> Option<&EcoString> {
        match self {
            Self::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Short human-readable description for diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Identifier(name) => format!("identifier `{name}`"),
            Self::Keyword(keyword) => format!("`{}`", keyword.as_str()),
            Self::Int(_) => "integer literal".into(),
            Self::Float(_) => "float literal".into(),
            Self::Bool(_) => "boolean literal".into(),
            Self::Null => "`null`".into(),
            Self::Char(_) => "character literal".into(),
            Self::CharClose => "`'`".into(),
            Self::String(_) => "string literal".into(),
            Self::MultilineString(_) => "multiline string literal".into(),
            Self::Operator(op) => format!("`{op}`"),
            Self::LeftParen => "`(`".into(),
            Self::RightParen => "`)`".into(),
            Self::LeftBrace => "`{`".into(),
            Self::RightBrace => "`}`".into(),
            Self::LeftBracket => "`[`".into(),
            Self::RightBracket => "`]`".into(),
            Self::Comma => "`,`".into(),
            Self::Semicolon => "`;`".into(),
            Self::Colon => "`:`".into(),
            Self::At => "`@`".into(),
            Self::Shebang(_) => "shebang line".into(),
            Self::Eof => "end of input".into(),
            Self::Error(text) => format!("unexpected `{text}`"),
        }
    }
}

/// A lexeme with its location and surrounding trivia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: TokenKind,
    span: Span,
    leading_trivia: Vec<Trivia>,
    trailing_trivia: Vec<Trivia>,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            leading_trivia: Vec::new(),
            trailing_trivia: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_leading_trivia(mut self, trivia: Vec<Trivia>) -> Self {
        self.leading_trivia = trivia;
        self
    }

    #[must_use]
    pub fn with_trailing_trivia(mut self, trivia: Vec<Trivia>) -> Self {
        self.trailing_trivia = trivia;
        self
    }

    #[must_use]
    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    #[must_use]
    pub fn leading_trivia(&self) -> &[Trivia] {
        &self.leading_trivia
    }

    #[must_use]
    pub fn trailing_trivia(&self) -> &[Trivia] {
        &self.trailing_trivia
    }

    /// Whether a line break occurs in this token's leading trivia.
    ///
    /// The terminator resolver uses this as the "newline crossed" signal:
    /// a newline after token N lands in the *leading* trivia of token N+1
    /// when anything else (even a comment) starts the next line.
    #[must_use]
    pub fn has_leading_newline(&self) -> bool {
        self.leading_trivia.iter().any(Trivia::has_newline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_table_round_trips() {
        for word in [
            "as", "break", "class", "continue", "else", "fun", "if", "import", "in",
            "interface", "is", "object", "package", "return", "super", "this", "throw",
            "try", "typealias", "val", "var", "when",
        ] {
            let keyword = Keyword::from_str(word).expect("hard keyword");
            assert_eq!(keyword.as_str(), word);
        }
    }

    #[test]
    fn soft_words_are_not_keywords() {
        for word in [
            "enum", "data", "companion", "get", "set", "by", "where", "dynamic",
            "file", "public", "vararg", "suspend", "it",
        ] {
            assert_eq!(Keyword::from_str(word), None, "{word} must stay an identifier");
        }
    }

    #[test]
    fn literals_are_not_keywords() {
        assert_eq!(Keyword::from_str("true"), None);
        assert_eq!(Keyword::from_str("null"), None);
    }

    #[test]
    fn leading_newline_detection() {
        let newline = Trivia::new(TriviaKind::Whitespace, "\n  ", Span::new(3, 6));
        let comment = Trivia::new(TriviaKind::LineComment, "// note", Span::new(6, 13));
        let token = Token::new(TokenKind::Null, Span::new(13, 17))
            .with_leading_trivia(vec![newline, comment]);
        assert!(token.has_leading_newline());

        let token = Token::new(TokenKind::Null, Span::new(0, 4)).with_leading_trivia(vec![
            Trivia::new(TriviaKind::Whitespace, "  ", Span::new(0, 2)),
        ]);
        assert!(!token.has_leading_newline());
    }
}
