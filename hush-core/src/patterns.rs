//! Shell patterns

use crate::trace_categories;

/// Represents a piece of a shell pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PatternPiece {
    /// Text whose `*`, `?` and `[` act as wildcards.
    Pattern(String),
    /// A literal string that should be matched exactly.
    Literal(String),
}

impl PatternPiece {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pattern(s) | Self::Literal(s) => s,
        }
    }
}

/// Encapsulates one field of an expanded word, which may be subject to
/// pathname expansion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pattern {
    pieces: Vec<PatternPiece>,
}

impl Pattern {
    /// Appends text, either as wildcard-capable pattern text or as literal text.
    pub fn push(&mut self, s: &str, literal: bool) {
        match (self.pieces.last_mut(), literal) {
            (Some(PatternPiece::Literal(last)), true) | (Some(PatternPiece::Pattern(last)), false) => {
                last.push_str(s);
            }
            (_, true) => self.pieces.push(PatternPiece::Literal(s.to_owned())),
            (_, false) => self.pieces.push(PatternPiece::Pattern(s.to_owned())),
        }
    }

    /// Appends a single character.
    pub fn push_char(&mut self, c: char, literal: bool) {
        let mut buf = [0u8; 4];
        self.push(c.encode_utf8(&mut buf), literal);
    }

    /// Returns whether the pattern holds no text.
    pub fn is_empty(&self) -> bool {
        self.pieces.iter().all(|p| p.as_str().is_empty())
    }

    /// Returns whether any unquoted wildcard character is present.
    pub fn has_wildcards(&self) -> bool {
        self.pieces.iter().any(|piece| match piece {
            PatternPiece::Pattern(s) => s.contains(['*', '?', '[']),
            PatternPiece::Literal(_) => false,
        })
    }

    /// Returns the text of the pattern with every wildcard taken literally.
    pub fn to_literal(&self) -> String {
        self.pieces.iter().map(PatternPiece::as_str).collect()
    }

    fn to_glob_pattern(&self) -> String {
        self.pieces
            .iter()
            .map(|piece| match piece {
                PatternPiece::Pattern(s) => s.clone(),
                PatternPiece::Literal(s) => glob::Pattern::escape(s),
            })
            .collect()
    }

    /// Expands the pattern against the filesystem, relative to the current
    /// directory. A pattern without wildcards, or one that matches nothing,
    /// expands to its literal text.
    pub fn expand_pathnames(&self) -> Vec<String> {
        if !self.has_wildcards() {
            return vec![self.to_literal()];
        }

        let options = glob::MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        };

        let pattern = self.to_glob_pattern();
        let matches: Vec<String> = match glob::glob_with(&pattern, options) {
            Ok(paths) => paths
                .filter_map(Result::ok)
                .map(|path| path.to_string_lossy().into_owned())
                .collect(),
            Err(e) => {
                tracing::debug!(target: trace_categories::EXPANSION, "invalid pattern '{pattern}': {e}");
                vec![]
            }
        };

        if matches.is_empty() {
            vec![self.to_literal()]
        } else {
            matches
        }
    }
}
