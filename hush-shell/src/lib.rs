//! Command-line front end for hush, a small POSIX-like shell with job control.

pub mod args;
pub mod config;
pub mod entry;
pub mod events;
pub mod productinfo;
