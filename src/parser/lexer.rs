use std::iter::{Fuse, FusedIterator};

use super::{CompileErrorType, Result};

pub const NEWLINE: char = '\n';

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0b' | '\r' | NEWLINE)
}

// Codepoint reader with room for a single pushed-back codepoint
pub struct RuneSource<I: Iterator<Item = char>> {
    chars: Fuse<I>,
    pushed_back: Option<char>,
}

impl<I: Iterator<Item = char>> RuneSource<I> {
    pub fn new(chars: I) -> Self {
        RuneSource {
            chars: chars.fuse(),
            pushed_back: None,
        }
    }

    /// Returns `c` to the source. Only one codepoint may be pending at a time.
    pub fn pushback(&mut self, c: char) {
        assert!(self.pushed_back.is_none(), "RuneSource: second pushback before a read");
        self.pushed_back = Some(c);
    }
}

impl<I: Iterator<Item = char>> Iterator for RuneSource<I> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        self.pushed_back.take().or_else(|| self.chars.next())
    }
}

impl<I: Iterator<Item = char>> FusedIterator for RuneSource<I> {}

/// One lexical unit. The buffer is cleared and refilled for every token.
#[derive(Debug, Default, PartialEq)]
pub struct Token {
    text: String,
    line: usize,
}

impl Token {
    pub fn push(&mut self, c: char) {
        self.text.push(c);
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Line on which the token starts
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn first_char(&self) -> char {
        self.text.chars().next().unwrap_or('\0')
    }

    pub fn last_char(&self) -> char {
        self.text.chars().next_back().unwrap_or('\0')
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.text.capacity()
    }

    pub fn is(&self, c: char) -> bool {
        let mut chars = self.text.chars();
        chars.next() == Some(c) && chars.next().is_none()
    }

    /// Text without the first `front` and last `back` codepoints.
    pub fn trimmed(&self, front: usize, back: usize) -> String {
        let count = self.char_count();
        self.text
            .chars()
            .skip(front)
            .take(count.saturating_sub(front + back))
            .collect()
    }
}

pub struct Tokenizer<I: Iterator<Item = char>> {
    source: RuneSource<I>,
    token: Token,
    line: usize,
}

impl<I: Iterator<Item = char>> Tokenizer<I> {
    pub fn new(chars: I) -> Self {
        Tokenizer {
            source: RuneSource::new(chars),
            token: Token::default(),
            line: 1,
        }
    }

    /// Current line of the reader
    pub fn line(&self) -> usize {
        self.line
    }

    /// Line on which the most recent token (or failed construct) started
    pub fn start_line(&self) -> usize {
        self.token.line
    }

    /// Reads the next token, or `None` once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Option<&Token>> {
        self.token.clear();

        while let Some(c) = self.source.next() {
            if c == NEWLINE {
                self.line += 1;
                continue;
            }
            if is_space(c) {
                continue;
            }

            self.token.line = self.line;

            if c == '/' {
                match self.source.next() {
                    Some(opener @ ('/' | '*')) => {
                        self.skip_comment(opener, false)?;
                        continue;
                    }
                    Some(other) => self.source.pushback(other),
                    None => {}
                }
            }

            self.token.push(c);
            match c {
                '\'' | '"' => self.read_quoted(c)?,
                '<' => self.read_tag()?,
                '{' => self.read_code()?,
                c if c.is_alphanumeric() || c == '_' => self.read_word(),
                _ => {}
            }
            return Ok(Some(&self.token));
        }

        Ok(None)
    }

    /// Drains everything left in the input, untouched.
    pub fn take_rest(&mut self) -> String {
        let rest: String = self.source.by_ref().collect();
        self.line += rest.matches(NEWLINE).count();
        rest
    }

    // Called with the codepoint after the opening `/`. When `copy` is set the
    // comment text is kept in the current token.
    fn skip_comment(&mut self, opener: char, copy: bool) -> Result<()> {
        if opener == '/' {
            for c in self.source.by_ref() {
                if copy {
                    self.token.push(c);
                }
                if c == NEWLINE {
                    self.line += 1;
                    return Ok(());
                }
            }
            return Ok(());
        }

        let mut prev = None;
        while let Some(c) = self.source.next() {
            if copy {
                self.token.push(c);
            }
            if c == NEWLINE {
                self.line += 1;
            }
            if prev == Some('*') && c == '/' {
                return Ok(());
            }
            prev = Some(c);
        }
        Err(CompileErrorType::UnterminatedComment)
    }

    // Reads up to and including the closing `quote`; a backslash escapes it
    fn read_quoted(&mut self, quote: char) -> Result<()> {
        let mut escaped = false;
        while let Some(c) = self.source.next() {
            self.token.push(c);
            if c == NEWLINE {
                self.line += 1;
            }
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                return Ok(());
            }
        }
        Err(CompileErrorType::UnterminatedString)
    }

    fn read_tag(&mut self) -> Result<()> {
        while let Some(c) = self.source.next() {
            self.token.push(c);
            if c == NEWLINE {
                self.line += 1;
            }
            if c == '>' {
                return Ok(());
            }
        }
        Err(CompileErrorType::UnterminatedTag)
    }

    // Brace-balanced code; quotes and comments inside do not count braces
    fn read_code(&mut self) -> Result<()> {
        let mut level = 1usize;
        while let Some(c) = self.source.next() {
            self.token.push(c);
            match c {
                NEWLINE => self.line += 1,
                '{' => level += 1,
                '}' => {
                    level -= 1;
                    if level == 0 {
                        return Ok(());
                    }
                }
                '/' => match self.source.next() {
                    Some(opener @ ('/' | '*')) => {
                        self.token.push(opener);
                        self.skip_comment(opener, true)?;
                    }
                    Some(other) => self.source.pushback(other),
                    None => break,
                },
                '\'' | '"' => {
                    if self.read_quoted(c).is_err() {
                        break;
                    }
                }
                _ => {}
            }
        }
        Err(CompileErrorType::UnterminatedCode)
    }

    fn read_word(&mut self) {
        while let Some(c) = self.source.next() {
            if c.is_alphanumeric() || c == '_' {
                self.token.push(c);
            } else {
                self.source.pushback(c);
                break;
            }
        }
    }
}
