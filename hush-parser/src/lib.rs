//! Implements an incremental parser for the hush shell's command language.
//!
//! The parser pulls characters from an [`InputStream`] one statement at a time,
//! producing a [`ast::CommandList`] for each. Words keep their substitutions
//! unevaluated; expansion is left to the executor.

pub mod ast;
pub mod charclass;
pub mod word;

mod error;
mod input;
mod parser;

pub use error::ParseError;
pub use input::{InputStream, LineReader, PromptKind};
pub use parser::{Parser, parse_str};
