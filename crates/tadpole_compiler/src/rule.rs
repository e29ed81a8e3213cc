use tadpole_lexer::TokenKind;

/// Operator precedence from loosest to tightest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Precedence {
    None,
    Assignment,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    /// The next tighter precedence, used for left associative operators.
    pub(crate) const fn next(self) -> Self {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call | Precedence::Primary => Precedence::Primary,
        }
    }
}

/// How a token starts an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Prefix {
    Grouping,
    Unary,
    Number,
    String,
    Literal,
    Variable,
}

/// How a token continues an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Infix {
    Binary,
    Call,
}

/// An entry of the Pratt parsing table.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ParseRule {
    pub(crate) prefix: Option<Prefix>,
    pub(crate) infix: Option<Infix>,
    pub(crate) precedence: Precedence,
}

impl ParseRule {
    const fn new(prefix: Option<Prefix>, infix: Option<Infix>, precedence: Precedence) -> Self {
        Self {
            prefix,
            infix,
            precedence,
        }
    }
}

/// Look up the parse rule of a token kind.
pub(crate) const fn rule(kind: TokenKind) -> ParseRule {
    match kind {
        TokenKind::LeftParenthesis => {
            ParseRule::new(Some(Prefix::Grouping), Some(Infix::Call), Precedence::Call)
        }
        TokenKind::Minus => {
            ParseRule::new(Some(Prefix::Unary), Some(Infix::Binary), Precedence::Term)
        }
        TokenKind::Plus => ParseRule::new(None, Some(Infix::Binary), Precedence::Term),
        TokenKind::Slash | TokenKind::Star => {
            ParseRule::new(None, Some(Infix::Binary), Precedence::Factor)
        }
        TokenKind::NumericLiteral => ParseRule::new(Some(Prefix::Number), None, Precedence::None),
        TokenKind::StringLiteral => ParseRule::new(Some(Prefix::String), None, Precedence::None),
        TokenKind::Ident => ParseRule::new(Some(Prefix::Variable), None, Precedence::None),
        TokenKind::KeywordFalse | TokenKind::KeywordTrue | TokenKind::KeywordNil => {
            ParseRule::new(Some(Prefix::Literal), None, Precedence::None)
        }
        _ => ParseRule::new(None, None, Precedence::None),
    }
}
