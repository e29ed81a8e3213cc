use crate::span::Span;

/// A language token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    /// The token's type.
    pub tag: TokenKind,
    /// The text of the token as it appears in the source.
    pub lexeme: &'src str,
    /// The span of the token in the text.
    pub span: Span,
    /// The 1-based source line the token starts on.
    pub line: u32,
}

impl<'src> Token<'src> {
    /// Create an EOF token.
    #[must_use]
    pub const fn eof(offset: usize, line: u32) -> Self {
        Self {
            tag: TokenKind::Eof,
            lexeme: "",
            span: Span {
                start: offset,
                length: 0,
            },
            line,
        }
    }

    /// Check if the token is EOF.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.tag, TokenKind::Eof)
    }

    /// Check if the token is an error.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.tag.is_error()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Parentheses
    /// Left parenthesis `(`.
    LeftParenthesis,
    /// Right parenthesis `)`.
    RightParenthesis,

    // Braces
    /// Left curly brace `{`.
    LeftBrace,
    /// Right curly brace `}`.
    RightBrace,

    // Miscellaneous
    /// Comma `,`.
    Comma,
    /// Minus `-`.
    Minus,
    /// Plus `+`.
    Plus,
    /// Semicolon `;`.
    Semicolon,
    /// Forward slash `/`.
    Slash,
    /// Asterisk `*`.
    Star,
    /// Equals sign `=`.
    Equal,

    // Literals
    /// Identifiers.
    Ident,
    /// Numeric literals.
    NumericLiteral,
    /// String literals including their quotes.
    StringLiteral,

    // Keywords
    /// The `false` keyword.
    KeywordFalse,
    /// The `fn` keyword.
    KeywordFn,
    /// The `let` keyword.
    KeywordLet,
    /// The `nil` keyword.
    KeywordNil,
    /// The `return` keyword.
    KeywordReturn,
    /// The `true` keyword.
    KeywordTrue,

    /// End of file.
    Eof,

    // Error tokens.
    /// A string that reached the end of the source before its closing quote.
    ErrorUnterminatedString,
    /// A character that does not start any token.
    ErrorUnknownChar,
}

impl TokenKind {
    /// Check if the kind is one of the error kinds.
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::ErrorUnterminatedString | Self::ErrorUnknownChar)
    }

    /// Return a human readable name for diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::LeftParenthesis => "`(`",
            Self::RightParenthesis => "`)`",
            Self::LeftBrace => "`{`",
            Self::RightBrace => "`}`",
            Self::Comma => "`,`",
            Self::Minus => "`-`",
            Self::Plus => "`+`",
            Self::Semicolon => "`;`",
            Self::Slash => "`/`",
            Self::Star => "`*`",
            Self::Equal => "`=`",
            Self::Ident => "identifier",
            Self::NumericLiteral => "number",
            Self::StringLiteral => "string",
            Self::KeywordFalse => "`false`",
            Self::KeywordFn => "`fn`",
            Self::KeywordLet => "`let`",
            Self::KeywordNil => "`nil`",
            Self::KeywordReturn => "`return`",
            Self::KeywordTrue => "`true`",
            Self::Eof => "end of file",
            Self::ErrorUnterminatedString | Self::ErrorUnknownChar => "error",
        }
    }

    /// Return the token's CC format representation.
    #[must_use]
    pub const fn format_cc(self) -> &'static str {
        match self {
            Self::LeftParenthesis => "LEFT_PAREN",
            Self::RightParenthesis => "RIGHT_PAREN",
            Self::LeftBrace => "LEFT_BRACE",
            Self::RightBrace => "RIGHT_BRACE",
            Self::Comma => "COMMA",
            Self::Minus => "MINUS",
            Self::Plus => "PLUS",
            Self::Semicolon => "SEMICOLON",
            Self::Slash => "SLASH",
            Self::Star => "STAR",
            Self::Equal => "EQUAL",
            Self::Ident => "IDENTIFIER",
            Self::NumericLiteral => "NUMBER",
            Self::StringLiteral => "STRING",
            Self::KeywordFalse => "FALSE",
            Self::KeywordFn => "FN",
            Self::KeywordLet => "LET",
            Self::KeywordNil => "NIL",
            Self::KeywordReturn => "RETURN",
            Self::KeywordTrue => "TRUE",
            Self::Eof => "EOF",
            Self::ErrorUnterminatedString => "ERROR_UNTERMINATED_STRING",
            Self::ErrorUnknownChar => "ERROR_UNKNOWN_CHAR",
        }
    }
}
