use compact_str::CompactString;
use core::fmt;
use tadpole_heap::HeapError;
use tadpole_lexer::Span;

/// A compile error.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    /// The type of compile error.
    pub kind: CompileErrorKind,
    /// The source line of the offending token.
    pub line: u32,
    /// The span of the offending token.
    pub span: Span,
    /// Where the error was reported.
    pub location: ErrorLocation,
}

/// The token an error was reported at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLocation {
    /// At a token with the given text.
    At(CompactString),
    /// At the end of the source.
    AtEnd,
    /// At a lexical error token, whose text is not worth repeating.
    Lexical,
}

/// The kinds of compile error.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileErrorKind {
    /// A specific token was expected.
    Expected(&'static str),
    /// The token can not start an expression.
    ExpectedExpression,
    /// The left hand side of `=` is not a variable.
    InvalidAssignmentTarget,
    /// A numeric literal could not be parsed.
    InvalidNumber,
    /// A string literal has no closing quote.
    UnterminatedString,
    /// A character that does not start any token.
    UnexpectedCharacter,
    /// A local variable is declared twice in the same scope.
    Redeclaration(CompactString),
    /// A local variable is read in its own initializer.
    SelfReferentialInitializer,
    /// The constant pool is full.
    TooManyConstants,
    /// The function has too many locals.
    TooManyLocals,
    /// The function closes over too many variables.
    TooManyUpvalues,
    /// The function has more than 255 parameters.
    TooManyParameters,
    /// The call has more than 255 arguments.
    TooManyArguments,
    /// `return` outside of a function.
    TopLevelReturn,
    /// A collection during compilation hit a stale handle.
    Heap(HeapError),
}

impl fmt::Display for CompileErrorKind {
    #[expect(
        clippy::min_ident_chars,
        reason = "keep consistent with trait definition."
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            CompileErrorKind::Expected(message) => write!(f, "{message}"),
            CompileErrorKind::ExpectedExpression => write!(f, "expect expression"),
            CompileErrorKind::InvalidAssignmentTarget => write!(f, "invalid assignment target"),
            CompileErrorKind::InvalidNumber => write!(f, "invalid number literal"),
            CompileErrorKind::UnterminatedString => write!(f, "unterminated string"),
            CompileErrorKind::UnexpectedCharacter => write!(f, "unexpected character"),
            CompileErrorKind::Redeclaration(ref name) => {
                write!(f, "variable `{name}` is already declared in this scope")
            }
            CompileErrorKind::SelfReferentialInitializer => {
                write!(f, "cannot read local variable in its own initializer")
            }
            CompileErrorKind::TooManyConstants => write!(f, "too many constants in one chunk"),
            CompileErrorKind::TooManyLocals => write!(f, "too many local variables in function"),
            CompileErrorKind::TooManyUpvalues => {
                write!(f, "too many closure variables in function")
            }
            CompileErrorKind::TooManyParameters => {
                write!(f, "cannot have more than 255 parameters")
            }
            CompileErrorKind::TooManyArguments => {
                write!(f, "cannot have more than 255 arguments")
            }
            CompileErrorKind::TopLevelReturn => write!(f, "cannot return from top-level code"),
            CompileErrorKind::Heap(ref error) => {
                write!(f, "garbage collection failed: {error}")
            }
        }
    }
}

impl fmt::Display for CompileError {
    #[expect(
        clippy::min_ident_chars,
        reason = "keep consistent with trait definition."
    )]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error", self.line)?;
        match self.location {
            ErrorLocation::At(ref lexeme) => write!(f, " at `{lexeme}`")?,
            ErrorLocation::AtEnd => write!(f, " at end")?,
            ErrorLocation::Lexical => {}
        }
        write!(f, ": {}", self.kind)
    }
}
