//! Defines the pipeline tree produced by the parser. A parsed statement is a
//! [`CommandList`]: a sequence of [`Pipe`]s, each tagged with the operator that
//! connects it to the next one and with the reserved-word role it plays in an
//! enclosing control-flow construct.

use std::fmt::{Display, Write};

use crate::word::Word;

/// A sequence of pipes, executed in order subject to control-flow roles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandList {
    /// The pipes in this list, in source order.
    pub pipes: Vec<Pipe>,
}

impl CommandList {
    /// Returns whether the list contains no commands at all.
    pub fn is_empty(&self) -> bool {
        self.pipes.iter().all(|p| p.commands.is_empty())
    }
}

impl Display for CommandList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for pipe in self.pipes.iter().filter(|p| !p.commands.is_empty()) {
            if !first {
                f.write_char(' ')?;
            }
            first = false;
            write!(f, "{pipe}")?;
        }
        Ok(())
    }
}

/// How a pipe is connected to the pipe that follows it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Followup {
    /// `;` or newline: run the next pipe unconditionally.
    #[default]
    Sequence,
    /// `&&`: run the next pipe only if this one succeeded.
    And,
    /// `||`: run the next pipe only if this one failed.
    Or,
    /// `&`: run this pipe in the background.
    Background,
}

impl Display for Followup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequence => f.write_char(';'),
            Self::And => f.write_str("&&"),
            Self::Or => f.write_str("||"),
            Self::Background => f.write_char('&'),
        }
    }
}

/// A reserved word, as it appears as the role of a pipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReservedWord {
    /// `if`
    If,
    /// `then`
    Then,
    /// `elif`
    Elif,
    /// `else`
    Else,
    /// `fi`
    Fi,
    /// `for`
    For,
    /// `while`
    While,
    /// `until`
    Until,
    /// `do`
    Do,
    /// `done`
    Done,
    /// `in`
    In,
}

impl ReservedWord {
    /// Looks up the reserved word spelled by `s`, if any.
    pub fn from_word(s: &str) -> Option<Self> {
        let word = match s {
            "if" => Self::If,
            "then" => Self::Then,
            "elif" => Self::Elif,
            "else" => Self::Else,
            "fi" => Self::Fi,
            "for" => Self::For,
            "while" => Self::While,
            "until" => Self::Until,
            "do" => Self::Do,
            "done" => Self::Done,
            "in" => Self::In,
            _ => return None,
        };
        Some(word)
    }

    /// Returns the source spelling of the reserved word.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::If => "if",
            Self::Then => "then",
            Self::Elif => "elif",
            Self::Else => "else",
            Self::Fi => "fi",
            Self::For => "for",
            Self::While => "while",
            Self::Until => "until",
            Self::Do => "do",
            Self::Done => "done",
            Self::In => "in",
        }
    }
}

impl Display for ReservedWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One or more commands whose standard streams are chained together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pipe {
    /// The stages of the pipe; stdout of stage `i` feeds stdin of stage `i + 1`.
    pub commands: Vec<Command>,
    /// The operator following this pipe.
    pub followup: Followup,
    /// The reserved-word role that was active when this pipe was closed.
    pub role: Option<ReservedWord>,
}

impl Display for Pipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, command) in self.commands.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{command}")?;
        }
        Ok(())
    }
}

/// The body of a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandKind {
    /// A command word followed by arguments (possibly preceded by assignments).
    Simple(Vec<Word>),
    /// A `( ... )` or `{ ... }` group, or the body of a compound statement.
    Group {
        /// The nested list.
        list: CommandList,
        /// Whether the group must run in a forked subshell.
        subshell: bool,
    },
}

/// A single stage of a pipe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    /// What the command runs.
    pub kind: CommandKind,
    /// Redirections applied to the command, in source order.
    pub redirects: Vec<Redirect>,
}

impl Command {
    /// Returns the words of a simple command; empty for groups.
    pub fn words(&self) -> &[Word] {
        match &self.kind {
            CommandKind::Simple(words) => words,
            CommandKind::Group { .. } => &[],
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            CommandKind::Simple(words) => {
                for (i, word) in words.iter().enumerate() {
                    if i > 0 {
                        f.write_char(' ')?;
                    }
                    write!(f, "{word}")?;
                }
            }
            CommandKind::Group { list, subshell } => {
                if *subshell {
                    write!(f, "( {list} )")?;
                } else {
                    write!(f, "{{ {list} }}")?;
                }
            }
        }
        for redirect in &self.redirects {
            write!(f, " {redirect}")?;
        }
        Ok(())
    }
}

/// The operator of a redirection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedirectKind {
    /// `<`
    Input,
    /// `>`
    Overwrite,
    /// `>>`
    Append,
    /// `<<`
    HereDocument,
    /// `<>`
    ReadWrite,
}

impl RedirectKind {
    /// The descriptor redirected when the source doesn't name one.
    pub const fn default_fd(self) -> i32 {
        match self {
            Self::Input | Self::HereDocument => 0,
            Self::Overwrite | Self::Append | Self::ReadWrite => 1,
        }
    }

    /// Returns the source spelling of the operator.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "<",
            Self::Overwrite => ">",
            Self::Append => ">>",
            Self::HereDocument => "<<",
            Self::ReadWrite => "<>",
        }
    }
}

impl Display for RedirectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a redirection points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RedirectTarget {
    /// Open the file named by the (expanded) word.
    Path(Word),
    /// Duplicate the given descriptor, as in `2>&1`.
    Duplicate(i32),
    /// Close the descriptor, as in `>&-`.
    Close,
}

/// A redirection attached to a command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redirect {
    /// The operator.
    pub kind: RedirectKind,
    /// The descriptor being redirected.
    pub fd: i32,
    /// The redirection target.
    pub target: RedirectTarget,
}

impl Display for Redirect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.fd != self.kind.default_fd() {
            write!(f, "{}", self.fd)?;
        }
        f.write_str(self.kind.as_str())?;
        match &self.target {
            RedirectTarget::Path(word) => write!(f, "{word}"),
            RedirectTarget::Duplicate(fd) => write!(f, "&{fd}"),
            RedirectTarget::Close => f.write_str("&-"),
        }
    }
}
