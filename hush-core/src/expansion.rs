//! Word expansion utilities.

use std::io::Read;
use std::os::fd::AsRawFd;

use hush_parser::ast::CommandList;
use hush_parser::word::{SpecialParameter, Word, WordPiece};
use itertools::Itertools;

use crate::interp;
use crate::patterns::Pattern;
use crate::shell::Shell;
use crate::{error, sys, trace_categories};

/// Expands a word into the fields it produces: substitutions are resolved,
/// unquoted substitution results are split on IFS, and each field
/// containing unquoted wildcards undergoes pathname expansion.
pub(crate) fn expand_word(shell: &mut Shell, word: &Word) -> Result<Vec<String>, error::Error> {
    let mut expander = WordExpander::new(shell);
    expander.expand(word)?;

    let fields = expander.finish(word.nonnull);
    let expanded: Vec<String> = fields.iter().flat_map(Pattern::expand_pathnames).collect();

    tracing::debug!(target: trace_categories::EXPANSION, "expanded '{word}' => {expanded:?}");

    Ok(expanded)
}

/// Expands each of the given words, concatenating the resulting fields.
pub(crate) fn expand_words(shell: &mut Shell, words: &[Word]) -> Result<Vec<String>, error::Error> {
    let mut fields = vec![];
    for word in words {
        fields.extend(expand_word(shell, word)?);
    }
    Ok(fields)
}

/// Expands a word into a single string, without field splitting or
/// pathname expansion; used for the values of assignments.
pub(crate) fn expand_to_string(shell: &mut Shell, word: &Word) -> Result<String, error::Error> {
    let mut value = String::new();
    for piece in &word.pieces {
        match piece {
            WordPiece::Text { value: text, .. } => value.push_str(text),
            _ => value.push_str(&expand_parameter_piece(shell, piece)?),
        }
    }
    Ok(value)
}

/// Splits `value` on any of the characters in `ifs`, dropping empty fields.
pub(crate) fn split_fields(value: &str, ifs: &str) -> Vec<String> {
    value
        .split(|c| ifs.contains(c))
        .filter(|field| !field.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

struct WordExpander<'a> {
    shell: &'a mut Shell,
    ifs: String,
    fields: Vec<Pattern>,
    current: Option<Pattern>,
}

impl<'a> WordExpander<'a> {
    fn new(shell: &'a mut Shell) -> Self {
        let ifs = shell.ifs().into_owned();
        Self {
            shell,
            ifs,
            fields: vec![],
            current: None,
        }
    }

    fn expand(&mut self, word: &Word) -> Result<(), error::Error> {
        for piece in &word.pieces {
            match piece {
                WordPiece::Text { value, quoted } => {
                    self.current.get_or_insert_default().push(value, *quoted);
                }
                _ => {
                    let value = expand_parameter_piece(self.shell, piece)?;
                    if piece.is_quoted() {
                        self.current.get_or_insert_default().push(&value, true);
                    } else {
                        self.push_unquoted(&value);
                    }
                }
            }
        }
        Ok(())
    }

    /// Appends the result of an unquoted substitution, splitting it on IFS.
    fn push_unquoted(&mut self, value: &str) {
        for c in value.chars() {
            if self.ifs.contains(c) {
                self.end_field();
            } else {
                self.current.get_or_insert_default().push_char(c, false);
            }
        }
    }

    fn end_field(&mut self) {
        if let Some(field) = self.current.take() {
            if !field.is_empty() {
                self.fields.push(field);
            }
        }
    }

    fn finish(mut self, nonnull: bool) -> Vec<Pattern> {
        // A field that only ever saw quoted text survives even when empty.
        match self.current.take() {
            Some(field) if !field.is_empty() || nonnull => self.fields.push(field),
            _ => (),
        }

        if self.fields.is_empty() && nonnull {
            self.fields.push(Pattern::default());
        }

        self.fields
    }
}

/// Returns the text a substitution piece stands for.
fn expand_parameter_piece(shell: &mut Shell, piece: &WordPiece) -> Result<String, error::Error> {
    let value = match piece {
        WordPiece::Text { value, .. } => value.clone(),
        WordPiece::Variable { name, .. } => shell.env.get_str(name).unwrap_or_default().to_owned(),
        WordPiece::Positional { index, .. } => shell.positional_parameter(*index).unwrap_or_default().to_owned(),
        WordPiece::Special { param, .. } => expand_special_parameter(shell, *param),
        WordPiece::CommandSubstitution { list, .. } => run_command_substitution(shell, list)?,
    };
    Ok(value)
}

fn expand_special_parameter(shell: &Shell, param: SpecialParameter) -> String {
    match param {
        SpecialParameter::ShellPid => shell.pid().to_string(),
        SpecialParameter::LastStatus => shell.last_exit_status.to_string(),
        SpecialParameter::LastBackgroundPid => shell
            .last_bg_pid
            .map_or_else(|| "0".to_owned(), |pid| pid.to_string()),
        SpecialParameter::PositionalCount => shell.positional_parameters.len().to_string(),
        SpecialParameter::AllPositional => {
            let separator = shell.ifs().chars().next().map(String::from).unwrap_or_default();
            shell.positional_parameters.iter().join(&separator)
        }
    }
}

/// Runs `list` in a forked child and returns everything it wrote to its
/// standard output. A trailing newline is kept.
fn run_command_substitution(shell: &mut Shell, list: &CommandList) -> Result<String, error::Error> {
    let (mut reader, writer) = os_pipe::pipe()?;

    match sys::process::fork()? {
        sys::process::Forked::Child => {
            drop(reader);
            shell.enter_subshell();

            let status = match sys::fd::duplicate_onto(writer.as_raw_fd(), 1) {
                Ok(()) => {
                    drop(writer);
                    interp::run_list(shell, list).unwrap_or_else(|e| shell.report_error(&e))
                }
                Err(e) => shell.report_error(&e),
            };
            sys::process::exit_child(status)
        }
        sys::process::Forked::Parent(pid) => {
            drop(writer);

            let mut output = vec![];
            let read_result = reader.read_to_end(&mut output);
            drop(reader);

            shell.wait_for_child(pid)?;
            read_result?;

            tracing::debug!(
                target: trace_categories::EXPANSION,
                "command substitution produced {} bytes",
                output.len()
            );

            Ok(String::from_utf8_lossy(&output).into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    fn test_shell() -> Result<Shell> {
        let mut shell = Shell::new(crate::CreateOptions::default())?;
        shell.env.set("IFS", " \t\n", false)?;
        Ok(shell)
    }

    fn text(value: &str, quoted: bool) -> WordPiece {
        WordPiece::Text {
            value: value.into(),
            quoted,
        }
    }

    fn var(name: &str, quoted: bool) -> WordPiece {
        WordPiece::Variable {
            name: name.into(),
            quoted,
        }
    }

    fn word(pieces: Vec<WordPiece>) -> Word {
        Word {
            pieces,
            nonnull: false,
        }
    }

    #[test]
    fn unquoted_variables_are_split() -> Result<()> {
        let mut shell = test_shell()?;
        shell.env.set("X", "  a b  c ", false)?;

        let fields = expand_word(&mut shell, &word(vec![text("<", false), var("X", false), text(">", false)]))?;
        assert_eq!(fields, vec!["<", "a", "b", "c", ">"]);

        let fields = expand_word(&mut shell, &word(vec![text("<", false), var("X", true), text(">", false)]))?;
        assert_eq!(fields, vec!["<  a b  c >"]);
        Ok(())
    }

    #[test]
    fn empty_expansions() -> Result<()> {
        let mut shell = test_shell()?;

        assert!(expand_word(&mut shell, &word(vec![var("UNSET", false)]))?.is_empty());

        let quoted = Word {
            pieces: vec![var("UNSET", true)],
            nonnull: true,
        };
        assert_eq!(expand_word(&mut shell, &quoted)?, vec![String::new()]);

        let empty_quotes = Word {
            pieces: vec![],
            nonnull: true,
        };
        assert_eq!(expand_word(&mut shell, &empty_quotes)?, vec![String::new()]);
        Ok(())
    }

    #[test]
    fn special_parameters() -> Result<()> {
        let mut shell = test_shell()?;
        shell.positional_parameters = vec!["one".into(), "two".into()];
        shell.last_exit_status = 3;

        let special = |param| {
            word(vec![WordPiece::Special {
                param,
                quoted: true,
            }])
        };

        assert_eq!(expand_word(&mut shell, &special(SpecialParameter::PositionalCount))?, vec!["2"]);
        assert_eq!(expand_word(&mut shell, &special(SpecialParameter::LastStatus))?, vec!["3"]);
        assert_eq!(expand_word(&mut shell, &special(SpecialParameter::LastBackgroundPid))?, vec!["0"]);
        assert_eq!(expand_word(&mut shell, &special(SpecialParameter::AllPositional))?, vec!["one two"]);

        shell.env.set("IFS", ":", false)?;
        assert_eq!(expand_word(&mut shell, &special(SpecialParameter::AllPositional))?, vec!["one:two"]);

        let positional = |index| {
            word(vec![WordPiece::Positional {
                index,
                quoted: false,
            }])
        };
        assert_eq!(expand_word(&mut shell, &positional(2))?, vec!["two"]);
        assert!(expand_word(&mut shell, &positional(9))?.is_empty());
        Ok(())
    }

    #[test]
    fn quoted_wildcards_are_literal() -> Result<()> {
        let mut shell = test_shell()?;
        let fields = expand_word(&mut shell, &word(vec![text("/nonexistent-dir/*", true)]))?;
        assert_eq!(fields, vec!["/nonexistent-dir/*"]);
        Ok(())
    }

    #[test]
    fn assignment_values_are_not_split() -> Result<()> {
        let mut shell = test_shell()?;
        shell.env.set("X", "a  b", false)?;
        let value = expand_to_string(&mut shell, &word(vec![text("*", false), var("X", false)]))?;
        assert_eq!(value, "*a  b");
        Ok(())
    }

    #[test]
    fn field_splitting() {
        assert_eq!(split_fields("a:b::c", ":"), vec!["a", "b", "c"]);
        assert_eq!(split_fields(" a\tb\n", " \t\n"), vec!["a", "b"]);
        assert!(split_fields("", " ").is_empty());
    }
}
