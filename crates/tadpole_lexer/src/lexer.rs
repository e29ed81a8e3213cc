use crate::source::{SourceChar, SourceLookup};
use crate::span::Span;
use crate::token::{Token, TokenKind};
use core::fmt;
use core::iter;

/// Map an identifier onto its keyword kind if it is one.
fn keyword(text: &str) -> Option<TokenKind> {
    match text {
        "false" => Some(TokenKind::KeywordFalse),
        "fn" => Some(TokenKind::KeywordFn),
        "let" => Some(TokenKind::KeywordLet),
        "nil" => Some(TokenKind::KeywordNil),
        "return" => Some(TokenKind::KeywordReturn),
        "true" => Some(TokenKind::KeywordTrue),
        _ => None,
    }
}

const fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

const fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// A forward-only lexer. Whitespace and comments are skipped, so every token it yields
/// is significant. The stream always ends with exactly one EOF token.
pub struct Lexer<'src> {
    /// The source text.
    source: SourceLookup<'src>,
    /// Whether the EOF token has been handed out.
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Create a lexer.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source: SourceLookup::new(source),
            finished: false,
        }
    }

    /// Lex the next token. Once the source is exhausted this keeps returning EOF.
    pub fn next_token(&mut self) -> Token<'src> {
        self.skip_trivia();
        let line = self.source.line();
        let Some(first) = self.source.next_char() else {
            self.finished = true;
            return Token::eof(self.source.text().len(), line);
        };

        let tag = match first.value {
            '(' => TokenKind::LeftParenthesis,
            ')' => TokenKind::RightParenthesis,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            ',' => TokenKind::Comma,
            '-' => TokenKind::Minus,
            '+' => TokenKind::Plus,
            ';' => TokenKind::Semicolon,
            '/' => TokenKind::Slash,
            '*' => TokenKind::Star,
            '=' => TokenKind::Equal,
            '"' => return self.lex_string(first, line),
            '0'..='9' => return self.lex_number(first, line),
            ch if is_ident_start(ch) => return self.lex_ident(first, line),
            _ => TokenKind::ErrorUnknownChar,
        };
        self.make_token(tag, first.offset, first.next_offset(), line)
    }

    /// Skip whitespace and line comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.source.peek_char() {
                Some(' ' | '\t' | '\r' | '\n' | '\x0C') => {
                    self.source.next_char();
                }
                Some('/') if self.source.peek_second() == Some('/') => {
                    while let Some(ch) = self.source.peek_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.source.next_char();
                    }
                }
                _ => return,
            }
        }
    }

    fn lex_string(&mut self, quote: SourceChar, line: u32) -> Token<'src> {
        while let Some(next) = self.source.next_char() {
            if next.value == '"' {
                return self.make_token(
                    TokenKind::StringLiteral,
                    quote.offset,
                    next.next_offset(),
                    line,
                );
            }
        }
        let end = self.source.text().len();
        self.make_token(TokenKind::ErrorUnterminatedString, quote.offset, end, line)
    }

    fn lex_number(&mut self, first: SourceChar, line: u32) -> Token<'src> {
        let mut end = self
            .source
            .eat_while(first.next_offset(), |ch| ch.is_ascii_digit());
        let has_fraction = self.source.peek_char() == Some('.')
            && self
                .source
                .peek_second()
                .is_some_and(|ch| ch.is_ascii_digit());
        if has_fraction {
            if let Some(period) = self.source.next_char() {
                end = self
                    .source
                    .eat_while(period.next_offset(), |ch| ch.is_ascii_digit());
            }
        }
        self.make_token(TokenKind::NumericLiteral, first.offset, end, line)
    }

    fn lex_ident(&mut self, first: SourceChar, line: u32) -> Token<'src> {
        let end = self.source.eat_while(first.next_offset(), is_ident_continue);
        let text = &self.source.text()[first.offset..end];
        let tag = keyword(text).unwrap_or(TokenKind::Ident);
        self.make_token(tag, first.offset, end, line)
    }

    fn make_token(&self, tag: TokenKind, start: usize, end: usize, line: u32) -> Token<'src> {
        Token {
            tag,
            lexeme: &self.source.text()[start..end],
            span: Span {
                start,
                length: end - start,
            },
            line,
        }
    }

    /// Dump a token in CC format.
    ///
    /// # Errors
    /// This function will only error if writes into the buffer error.
    pub fn dump_token_cc(buffer: &mut impl fmt::Write, token: &Token<'_>) -> fmt::Result {
        let line = token.line;
        match token.tag {
            TokenKind::ErrorUnterminatedString => {
                write!(buffer, "[line {line}] Error: Unterminated string.")
            }
            TokenKind::ErrorUnknownChar => write!(
                buffer,
                "[line {line}] Error: Unexpected character: {}",
                token.lexeme
            ),
            TokenKind::NumericLiteral => {
                let value = token.lexeme.parse::<f64>().map_err(|_err| fmt::Error)?;
                write!(buffer, "{} {} {value:?}", token.tag.format_cc(), token.lexeme)
            }
            TokenKind::StringLiteral => {
                let value = &token.lexeme[1..token.lexeme.len() - 1];
                write!(buffer, "{} {} {value}", token.tag.format_cc(), token.lexeme)
            }
            tag => write!(buffer, "{} {} null", tag.format_cc(), token.lexeme),
        }
    }
}

impl<'src> iter::Iterator for Lexer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        Some(self.next_token())
    }
}

/// Lex the whole source into a token vector ending with EOF.
#[must_use]
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    Lexer::new(source).collect()
}

#[cfg(test)]
mod test {
    use super::tokenize;
    use crate::token::TokenKind;

    fn tags(source: &str) -> Vec<TokenKind> {
        tokenize(source).iter().map(|token| token.tag).collect()
    }

    #[test]
    fn lexes_function_declaration() {
        assert_eq!(
            tags("fn inc(n) { return n + 1; }"),
            vec![
                TokenKind::KeywordFn,
                TokenKind::Ident,
                TokenKind::LeftParenthesis,
                TokenKind::Ident,
                TokenKind::RightParenthesis,
                TokenKind::LeftBrace,
                TokenKind::KeywordReturn,
                TokenKind::Ident,
                TokenKind::Plus,
                TokenKind::NumericLiteral,
                TokenKind::Semicolon,
                TokenKind::RightBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tracks_lines_and_skips_comments() {
        let tokens = tokenize("let a = 1; // one\n\nlet b = \"two\nlines\";\nb");
        let lines: Vec<u32> = tokens.iter().map(|token| token.line).collect();
        assert_eq!(lines, vec![1, 1, 1, 1, 1, 3, 3, 3, 3, 4, 5, 5]);
        assert_eq!(tokens[8].lexeme, "\"two\nlines\"");
    }

    #[test]
    fn numbers_need_digits_after_the_period() {
        let tokens = tokenize("3.25 7.");
        assert_eq!(tokens[0].lexeme, "3.25");
        assert_eq!(tokens[1].lexeme, "7");
        assert_eq!(tokens[2].tag, TokenKind::ErrorUnknownChar);
    }

    #[test]
    fn reports_errors_as_tokens() {
        let tokens = tokenize("@ \"open");
        assert!(tokens[0].is_error());
        assert_eq!(tokens[0].lexeme, "@");
        assert_eq!(tokens[1].tag, TokenKind::ErrorUnterminatedString);
        assert!(tokens[2].is_eof());
    }
}
