use std::{
    fmt::{Display, Formatter},
    str::Chars,
};

mod source_range;
pub use source_range::*;

/// Char iterator over a source string that keeps track of the line it is on.
#[derive(Clone)]
pub struct Cursor<'a> {
    source: &'a str,
    chars: Chars<'a>,
    line: Line,
}

impl<'a> std::fmt::Debug for Cursor<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // The full source is too verbose for debug output
        f.debug_struct("Cursor")
            .field("line", &self.line)
            .field("offset", &self.offset())
            .finish()
    }
}

impl<'a> PartialEq for Cursor<'a> {
    fn eq(&self, other: &Self) -> bool {
        (self.source, self.chars.as_str()) == (other.source, other.chars.as_str())
    }
}

/// 1-based source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line(pub usize);

impl Display for Line {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, chars: source.chars(), line: Line(1) }
    }

    pub fn line(&self) -> Line {
        self.line
    }

    /// Byte offset of the cursor into the source.
    pub fn offset(&self) -> usize {
        self.source.len() - self.chars.as_str().len()
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.clone().next()
    }

    pub fn peek_next(&self) -> Option<char> {
        self.chars.clone().nth(1)
    }

    pub fn slice_until(&self, end: &Cursor<'a>) -> &'a str {
        assert!(self.source == end.source);
        &self.source[self.offset()..end.offset()]
    }
}

impl<'a> From<&'a str> for Cursor<'a> {
    fn from(source: &'a str) -> Self {
        Self::new(source)
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = char;

    fn next(&mut self) -> Option<Self::Item> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line.0 += 1;
        }
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_lines() {
        let mut cursor = Cursor::new("a\nbc\n");

        assert_eq!(cursor.line(), Line(1));
        assert_eq!(cursor.next(), Some('a'));
        assert_eq!(cursor.line(), Line(1));
        assert_eq!(cursor.next(), Some('\n'));
        assert_eq!(cursor.line(), Line(2));

        assert_eq!(cursor.next(), Some('b'));
        assert_eq!(cursor.next(), Some('c'));
        assert_eq!(cursor.next(), Some('\n'));
        assert_eq!(cursor.line(), Line(3));

        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.line(), Line(3));
    }

    #[test]
    fn peeking_does_not_advance() {
        let mut cursor = Cursor::new("xy");

        assert_eq!(cursor.peek(), Some('x'));
        assert_eq!(cursor.peek_next(), Some('y'));
        assert_eq!(cursor.offset(), 0);

        assert_eq!(cursor.next(), Some('x'));
        assert_eq!(cursor.peek(), Some('y'));
        assert_eq!(cursor.peek_next(), None);
    }

    #[test]
    fn slice_until_yields_the_consumed_region() {
        let mut cursor = Cursor::new("let x = 1;");
        cursor.next();

        let start = cursor.clone();
        cursor.next(); // 'e'
        cursor.next(); // 't'

        assert_eq!(start.slice_until(&cursor), "et");
        assert_eq!(start.slice_until(&start), "");
    }

    #[test]
    fn empty_source() {
        let mut cursor = Cursor::new("");
        assert_eq!(cursor.peek(), None);
        assert_eq!(cursor.peek_next(), None);
        assert_eq!(cursor.next(), None);
        assert_eq!((cursor.line(), cursor.offset()), (Line(1), 0));
    }
}
