use scrap_common::span::SourceLocation;

/// Character-level source iterator with location tracking.
///
/// Each consumed character advances the byte offset by its UTF-8 length
/// and the column by one; a newline bumps the line and resets the column.
pub struct Cursor<'src> {
    chars: std::str::Chars<'src>,
    loc: SourceLocation,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            chars: source.chars(),
            loc: SourceLocation::origin(),
        }
    }

    /// Look at the current character without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    /// Consume the current character, advancing the location.
    pub fn advance(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.loc.line += 1;
            self.loc.col = 1;
        } else {
            self.loc.col += 1;
        }
        self.loc.byte += c.len_utf8() as u32;
        Some(c)
    }

    /// The location of the next character to be consumed.
    pub fn loc(&self) -> SourceLocation {
        self.loc
    }

    pub fn is_eof(&self) -> bool {
        self.peek().is_none()
    }
}
