use core::iter::Peekable;
use core::str::CharIndices;

/// Represents a source character.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SourceChar {
    /// The character itself.
    pub(crate) value: char,
    /// The byte offset of the character in the source.
    pub(crate) offset: usize,
}

impl SourceChar {
    /// Calculates the offset of the next character in the source assuming UTF-8 encoding.
    #[inline]
    pub(crate) const fn next_offset(&self) -> usize {
        self.offset + self.value.len_utf8()
    }
}

/// A cursor over a source text that tracks the current line.
pub(crate) struct SourceLookup<'src> {
    /// The source text.
    text: &'src str,
    /// An iterator over the characters.
    chars: Peekable<CharIndices<'src>>,
    /// The 1-based line of the next character.
    line: u32,
}

impl<'src> SourceLookup<'src> {
    /// Create from a source string.
    pub(crate) fn new(source: &'src str) -> Self {
        Self {
            text: source,
            chars: source.char_indices().peekable(),
            line: 1,
        }
    }

    /// Return the next character, advancing the line counter past newlines.
    pub(crate) fn next_char(&mut self) -> Option<SourceChar> {
        let (offset, value) = self.chars.next()?;
        if value == '\n' {
            self.line += 1;
        }
        Some(SourceChar { value, offset })
    }

    /// Return the next character without consuming it.
    pub(crate) fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, value)| value)
    }

    /// Return the character after the next one without consuming anything.
    pub(crate) fn peek_second(&self) -> Option<char> {
        let mut lookahead = self.chars.clone();
        lookahead.next();
        lookahead.next().map(|(_, value)| value)
    }

    /// Consume characters while the predicate holds, returning the offset just past the last one.
    pub(crate) fn eat_while(&mut self, start: usize, predicate: impl Fn(char) -> bool) -> usize {
        let mut end = start;
        while let Some(ch) = self.peek_char() {
            if !predicate(ch) {
                break;
            }
            if let Some(next) = self.next_char() {
                end = next.next_offset();
            }
        }
        end
    }

    /// Return the current line.
    pub(crate) const fn line(&self) -> u32 {
        self.line
    }

    /// Return the source.
    pub(crate) const fn text(&self) -> &'src str {
        self.text
    }
}
