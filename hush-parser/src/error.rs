/// Represents an error that occurred while parsing shell input.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The input ended right after a backslash.
    #[error("backslash at end of input")]
    TrailingBackslash,

    /// A quoted string was still open at the end of the input.
    #[error("unterminated {0} quote")]
    UnterminatedQuote(char),

    /// A `${` expansion had no closing brace.
    #[error("unterminated ${{...}} expansion")]
    UnterminatedBraceExpansion,

    /// A command substitution was still open at the end of the input.
    #[error("unterminated command substitution")]
    UnterminatedCommandSubstitution,

    /// A group was still open at the end of the input.
    #[error("missing '{0}'")]
    UnterminatedGroup(char),

    /// A compound statement was still open at the end of the input.
    #[error("unexpected end of input in '{0}' statement")]
    UnterminatedStatement(crate::ast::ReservedWord),

    /// A `$` form that isn't supported.
    #[error("unhandled syntax: ${0}")]
    UnsupportedParameter(char),

    /// Process substitution, as in `<(cmd)`.
    #[error("process substitution is not supported")]
    UnsupportedProcessSubstitution,

    /// A `&` in a redirection wasn't followed by a descriptor or `-`.
    #[error("ambiguous redirect")]
    AmbiguousRedirect,

    /// A redirection operator wasn't followed by a target.
    #[error("missing target for '{0}' redirection")]
    MissingRedirectTarget(crate::ast::RedirectKind),

    /// A character that is only valid as a terminator appeared elsewhere.
    #[error("unexpected '{0}'")]
    UnexpectedChar(char),

    /// A group and command words were mixed in one command.
    #[error("groups and command words can't be mixed")]
    GroupWithArguments,

    /// A reserved word appeared where it isn't allowed.
    #[error("unexpected '{0}'")]
    UnexpectedReservedWord(crate::ast::ReservedWord),

    /// A `for` statement wasn't of the form `for NAME in WORDS; do ...; done`.
    #[error("malformed 'for' statement")]
    MalformedForLoop,

    /// The input stream couldn't be read.
    #[error("failed to read input")]
    ReadError(#[from] std::io::Error),
}

impl ParseError {
    /// Returns whether the error was caused by running out of input.
    pub const fn is_end_of_input(&self) -> bool {
        matches!(
            self,
            Self::TrailingBackslash
                | Self::UnterminatedQuote(_)
                | Self::UnterminatedBraceExpansion
                | Self::UnterminatedCommandSubstitution
                | Self::UnterminatedGroup(_)
                | Self::UnterminatedStatement(_)
        )
    }
}
