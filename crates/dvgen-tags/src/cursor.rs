//! Byte-position cursor over a tag line.

/// Forward-only scanner. Positions are byte offsets into the input.
#[derive(Debug, Clone)]
pub(crate) struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn input(&self) -> &'a str {
        self.input
    }

    /// Unconsumed input.
    pub(crate) fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consume `expected` if it is next.
    pub(crate) fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    pub(crate) fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    /// Consume the longest prefix whose characters satisfy `pred`.
    pub(crate) fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.input[start..self.pos]
    }

    /// Consume everything that remains.
    pub(crate) fn take_rest(&mut self) -> &'a str {
        let rest = self.rest();
        self.pos = self.input.len();
        rest
    }

    /// The token starting at the current position, for diagnostics.
    pub(crate) fn token(&self) -> String {
        let rest = self.rest();
        match rest.chars().next() {
            None => "<end of input>".to_string(),
            Some(c) if c.is_alphanumeric() => rest
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
                .collect(),
            Some(c) => c.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_while_and_eat() {
        let mut c = Cursor::new("abc(1)");
        assert_eq!(c.take_while(char::is_alphanumeric), "abc");
        assert!(c.eat('('));
        assert!(!c.eat(')'));
        assert_eq!(c.token(), "1");
        assert_eq!(c.position(), 4);
    }

    #[test]
    fn token_at_end() {
        let mut c = Cursor::new("x");
        c.bump();
        assert!(c.is_eof());
        assert_eq!(c.token(), "<end of input>");
    }
}
