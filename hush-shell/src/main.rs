//! Implements the command-line interface for the `hush` shell.

#![deny(missing_docs)]

/// Main entry point for the `hush` shell.
fn main() {
    hush_shell::entry::run();
}
