//! Trace utilities

/// Trace category for command execution.
pub const COMMANDS: &str = "commands";
/// Trace category for word expansion.
pub const EXPANSION: &str = "expand";
/// Trace category for job control.
pub const JOBS: &str = "jobs";
/// Trace category for terminal ownership.
pub const TERMINAL: &str = "terminal";
