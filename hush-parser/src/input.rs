//! Pull-based character sources for the parser.

use std::collections::VecDeque;
use std::io::BufRead;

use utf8_chars::BufReadCharsExt;

use crate::error::ParseError;

/// Which prompt an interactive source should display before reading a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptKind {
    /// The primary prompt, shown at the start of a statement (`PS1`).
    Primary,
    /// The continuation prompt, shown while a statement is incomplete (`PS2`).
    Continuation,
}

/// A source of whole lines that prompts before each read, such as a terminal.
pub trait LineReader {
    /// Displays the prompt selected by `kind` and reads one line, including its
    /// trailing newline if there was one. Returns `None` at end of input.
    fn read_line(&mut self, kind: PromptKind) -> std::io::Result<Option<String>>;
}

enum Source<'a> {
    String(std::str::Chars<'a>),
    Reader(Box<dyn BufRead + 'a>),
    Interactive {
        reader: Box<dyn LineReader + 'a>,
        line: VecDeque<char>,
        exhausted: bool,
    },
}

/// A character stream with one character of lookahead.
pub struct InputStream<'a> {
    source: Source<'a>,
    peeked: Option<Option<char>>,
    at_statement_start: bool,
    last_was_newline: bool,
}

impl<'a> InputStream<'a> {
    /// Creates a stream over a string.
    pub fn from_string(s: &'a str) -> Self {
        Self::new(Source::String(s.chars()))
    }

    /// Creates a stream over a buffered reader, such as an open file or a pipe.
    pub fn from_reader(reader: impl BufRead + 'a) -> Self {
        Self::new(Source::Reader(Box::new(reader)))
    }

    /// Creates a stream that pulls whole lines from a prompting line reader.
    pub fn interactive(reader: impl LineReader + 'a) -> Self {
        Self::new(Source::Interactive {
            reader: Box::new(reader),
            line: VecDeque::new(),
            exhausted: false,
        })
    }

    fn new(source: Source<'a>) -> Self {
        Self {
            source,
            peeked: None,
            at_statement_start: true,
            last_was_newline: true,
        }
    }

    /// Marks the start of a new statement, so the next line read from an
    /// interactive source is preceded by the primary prompt.
    pub fn start_statement(&mut self) {
        self.at_statement_start = true;
    }

    /// Consumes and returns the next character, or `None` at end of input.
    pub fn next_char(&mut self) -> Result<Option<char>, ParseError> {
        let c = match self.peeked.take() {
            Some(c) => c,
            None => self.fetch()?,
        };

        if let Some(c) = c {
            self.last_was_newline = c == '\n';
        }

        Ok(c)
    }

    /// Returns the next character without consuming it.
    pub fn peek_char(&mut self) -> Result<Option<char>, ParseError> {
        if let Some(c) = self.peeked {
            return Ok(c);
        }

        let c = self.fetch()?;
        self.peeked = Some(c);
        Ok(c)
    }

    /// Skips the remainder of the current line, e.g. after a syntax error.
    /// Does nothing if the last character consumed was a newline.
    pub fn discard_line(&mut self) -> Result<(), ParseError> {
        if self.last_was_newline {
            return Ok(());
        }

        while let Some(c) = self.next_char()? {
            if c == '\n' {
                break;
            }
        }

        Ok(())
    }

    fn fetch(&mut self) -> Result<Option<char>, ParseError> {
        match &mut self.source {
            Source::String(chars) => Ok(chars.next()),
            Source::Reader(reader) => Ok(reader.read_char()?),
            Source::Interactive {
                reader,
                line,
                exhausted,
            } => {
                if line.is_empty() && !*exhausted {
                    let kind = if std::mem::take(&mut self.at_statement_start) {
                        PromptKind::Primary
                    } else {
                        PromptKind::Continuation
                    };

                    match reader.read_line(kind)? {
                        Some(text) => line.extend(text.chars()),
                        None => *exhausted = true,
                    }
                }

                Ok(line.pop_front())
            }
        }
    }
}
