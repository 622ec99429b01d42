//! Words and the token buffer that accumulates them.
//!
//! A word is kept as a sequence of typed pieces rather than flat text: literal
//! text (tagged with whether it was quoted) and the substitutions that are
//! resolved only when the word is expanded for a command.

use std::fmt::{Display, Write};

use crate::ast::CommandList;

/// A special parameter that may follow `$`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialParameter {
    /// `$$`: the shell's process id.
    ShellPid,
    /// `$?`: the status of the last pipe.
    LastStatus,
    /// `$!`: the process id of the last background job.
    LastBackgroundPid,
    /// `$#`: the number of positional parameters.
    PositionalCount,
    /// `$*`: all positional parameters, joined by the first IFS character.
    AllPositional,
}

impl SpecialParameter {
    /// Returns the character naming the parameter.
    pub const fn as_char(self) -> char {
        match self {
            Self::ShellPid => '$',
            Self::LastStatus => '?',
            Self::LastBackgroundPid => '!',
            Self::PositionalCount => '#',
            Self::AllPositional => '*',
        }
    }
}

/// A piece of a word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WordPiece {
    /// Literal text, with quotes and escapes already removed.
    Text {
        /// The text.
        value: String,
        /// Whether the text was quoted or escaped, and so is exempt from globbing.
        quoted: bool,
    },
    /// `$name` or `${name}`.
    Variable {
        /// The variable name.
        name: String,
        /// Whether the reference appeared inside double quotes.
        quoted: bool,
    },
    /// `$0` through `$9`.
    Positional {
        /// The parameter index.
        index: usize,
        /// Whether the reference appeared inside double quotes.
        quoted: bool,
    },
    /// A special parameter such as `$?`.
    Special {
        /// The parameter.
        param: SpecialParameter,
        /// Whether the reference appeared inside double quotes.
        quoted: bool,
    },
    /// `$( ... )` or `` `...` ``.
    CommandSubstitution {
        /// The parsed command list to run.
        list: CommandList,
        /// Whether the substitution appeared inside double quotes.
        quoted: bool,
    },
}

impl WordPiece {
    /// Returns whether the piece is exempt from field splitting and globbing.
    pub const fn is_quoted(&self) -> bool {
        match self {
            Self::Text { quoted, .. }
            | Self::Variable { quoted, .. }
            | Self::Positional { quoted, .. }
            | Self::Special { quoted, .. }
            | Self::CommandSubstitution { quoted, .. } => *quoted,
        }
    }
}

/// A completed word.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Word {
    /// The pieces making up the word.
    pub pieces: Vec<WordPiece>,
    /// Set when the word contained quotes, so that it expands to an empty
    /// argument rather than to nothing.
    pub nonnull: bool,
}

impl Word {
    /// Constructs a word consisting of unquoted literal text.
    pub fn from_text(s: impl Into<String>) -> Self {
        Self {
            pieces: vec![WordPiece::Text {
                value: s.into(),
                quoted: false,
            }],
            nonnull: false,
        }
    }

    /// Returns the word's text if it is a single run of unquoted literal text.
    /// Reserved words, descriptor numbers and loop variables must be plain.
    pub fn as_plain_text(&self) -> Option<&str> {
        if self.nonnull {
            return None;
        }
        match self.pieces.as_slice() {
            [WordPiece::Text {
                value,
                quoted: false,
            }] => Some(value.as_str()),
            _ => None,
        }
    }

    /// If the word has the form `NAME=value` with an unquoted `NAME=` prefix,
    /// splits it into the name and the word holding the value.
    pub fn split_assignment(&self) -> Option<(&str, Self)> {
        let Some(WordPiece::Text {
            value,
            quoted: false,
        }) = self.pieces.first()
        else {
            return None;
        };

        let (name, rest) = value.split_once('=')?;
        if !is_valid_name(name) {
            return None;
        }

        let mut pieces = Vec::with_capacity(self.pieces.len());
        if !rest.is_empty() {
            pieces.push(WordPiece::Text {
                value: rest.to_owned(),
                quoted: false,
            });
        }
        pieces.extend(self.pieces.iter().skip(1).cloned());

        Some((
            name,
            Self {
                pieces,
                nonnull: self.nonnull,
            },
        ))
    }
}

impl Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for piece in &self.pieces {
            match piece {
                WordPiece::Text { value, quoted } => {
                    if *quoted {
                        f.write_char('\'')?;
                        f.write_str(value)?;
                        f.write_char('\'')?;
                    } else {
                        f.write_str(value)?;
                    }
                }
                WordPiece::Variable { name, .. } => write!(f, "${{{name}}}")?,
                WordPiece::Positional { index, .. } => write!(f, "${index}")?,
                WordPiece::Special { param, .. } => write!(f, "${}", param.as_char())?,
                WordPiece::CommandSubstitution { list, .. } => write!(f, "$({list})")?,
            }
        }
        if self.pieces.is_empty() && self.nonnull {
            f.write_str("''")?;
        }
        Ok(())
    }
}

/// Returns whether `s` is a valid variable name.
pub fn is_valid_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Accumulates the pieces of the word currently being parsed.
#[derive(Debug, Default)]
pub struct TokenBuffer {
    pieces: Vec<WordPiece>,
    /// Whether the parser is inside double quotes.
    pub(crate) in_double_quotes: bool,
    /// Whether the word must produce an argument even if empty.
    pub(crate) nonnull: bool,
}

impl TokenBuffer {
    /// Returns whether nothing at all has been collected, quotes included.
    pub fn is_null(&self) -> bool {
        self.pieces.is_empty() && !self.nonnull
    }

    /// Returns whether no pieces have been collected.
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Appends a literal character.
    pub fn push_char(&mut self, c: char, quoted: bool) {
        if let Some(WordPiece::Text {
            value,
            quoted: last_quoted,
        }) = self.pieces.last_mut()
        {
            if *last_quoted == quoted {
                value.push(c);
                return;
            }
        }

        self.pieces.push(WordPiece::Text {
            value: c.to_string(),
            quoted,
        });
    }

    /// Appends a substitution or other non-text piece.
    pub fn push_piece(&mut self, piece: WordPiece) {
        self.pieces.push(piece);
    }

    /// Returns the collected text if it consists solely of unquoted ASCII digits.
    pub(crate) fn as_fd_number(&self) -> Option<i32> {
        match self.pieces.as_slice() {
            [WordPiece::Text {
                value,
                quoted: false,
            }] if !self.nonnull && value.chars().all(|c| c.is_ascii_digit()) => {
                value.parse().ok()
            }
            _ => None,
        }
    }

    /// Takes the completed word, leaving the buffer ready for the next one.
    /// The double-quote state is left untouched.
    pub fn take_word(&mut self) -> Word {
        let nonnull = std::mem::take(&mut self.nonnull);
        Word {
            pieces: std::mem::take(&mut self.pieces),
            nonnull,
        }
    }

    /// Discards everything collected so far, including quote state.
    pub fn reset(&mut self) {
        self.pieces.clear();
        self.nonnull = false;
        self.in_double_quotes = false;
    }
}
