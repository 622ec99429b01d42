//! Core implementation of the hush shell. Implements the shell's abstraction, its interpreter, and
//! various facilities used internally by the shell.

pub mod builtins;
mod commands;
pub mod env;
mod error;
mod expansion;
mod interp;
mod jobs;
mod openfiles;
mod pathsearch;
mod patterns;
mod prompt;
mod shell;
mod sys;
mod terminal;
mod trace_categories;
pub mod variables;

pub use commands::ExecutionContext;
pub use error::Error;
pub use jobs::{Job, JobManager, JobState};
pub use prompt::InteractivePrompt;
pub use shell::{CreateOptions, Shell};
pub use terminal::TerminalControl;
pub use variables::ShellVariable;
