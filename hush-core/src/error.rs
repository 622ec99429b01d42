use std::path::PathBuf;

/// Monolithic error type for the shell
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An attempt was made to modify or unset a readonly variable.
    #[error("{0}: readonly variable")]
    ReadonlyVariable(String),

    /// A job specification could not be parsed.
    #[error("bad argument '{0}'")]
    BadJobSpec(String),

    /// The referenced job does not exist.
    #[error("{0}: no such job")]
    NoSuchJob(usize),

    /// A job-control command was used with no job to act on.
    #[error("no current job")]
    NoCurrentJob,

    /// Job control was requested in a shell that isn't interactive.
    #[error("job control is not enabled")]
    NotInteractive,

    /// A redirection target didn't expand to exactly one word.
    #[error("ambiguous redirect")]
    AmbiguousRedirect,

    /// A here-document redirection was used.
    #[error("here-documents are not supported")]
    HereDocumentsUnsupported,

    /// A file named in a redirection could not be opened.
    #[error("{0}: {1}")]
    RedirectionFailure(String, nix::errno::Errno),

    /// A file to be sourced could not be opened.
    #[error("cannot open '{}'", .0.display())]
    FailedSourcingFile(PathBuf),

    /// Command was not found.
    #[error("command not found: {0}")]
    CommandNotFound(String),

    /// A file descriptor number was out of range or not open.
    #[error("bad file descriptor: {0}")]
    BadFileDescriptor(i32),

    /// The requested functionality has not yet been implemented in this shell.
    #[error("not implemented")]
    Unimplemented(&'static str),

    /// Invalid arguments were provided to a builtin.
    #[error("invalid arguments")]
    InvalidArguments,

    /// An invalid umask was provided.
    #[error("invalid umask value")]
    InvalidUmask,

    /// A pipe between two stages of a pipeline couldn't be created.
    #[error("failed to create pipe: {0}")]
    PipeCreationFailed(std::io::Error),

    /// The input couldn't be parsed.
    #[error("syntax error: {0}")]
    ParseError(#[from] hush_parser::ParseError),

    /// An I/O error occurred.
    #[error("i/o error: {0}")]
    IoError(#[from] std::io::Error),

    /// A system error occurred.
    #[error("system error: {0}")]
    ErrnoError(#[from] nix::errno::Errno),

    /// A string argument contained an interior nul byte.
    #[error("argument contains a nul byte")]
    NulError(#[from] std::ffi::NulError),
}

impl Error {
    /// Returns the exit status a command reports when it fails with this error.
    pub const fn exit_status(&self) -> u8 {
        match self {
            Self::CommandNotFound(_) => 127,
            _ => 1,
        }
    }

    /// Returns whether the error leaves the shell unable to continue.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::PipeCreationFailed(_))
    }
}

/// Convenience function for returning an error for unimplemented functionality.
///
/// # Arguments
///
/// * `msg` - The message to include in the error
pub(crate) const fn unimp<T>(msg: &'static str) -> Result<T, Error> {
    Err(Error::Unimplemented(msg))
}
