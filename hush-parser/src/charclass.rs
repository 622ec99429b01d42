//! Classification of input characters, derived from the current IFS value.

/// The IFS value used when the variable is unset.
pub const DEFAULT_IFS: &str = " \t\n";

/// How the parser treats a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharClass {
    /// Always copied into the current word.
    Literal,
    /// Punctuation that is special only when unquoted: `<>;&|(){}#`.
    Special,
    /// An IFS character; ends the current word when unquoted.
    FieldSeparator,
    /// Never copied literally: `\`, `$`, `'`, `"`, and backquote.
    Quoting,
}

/// A lookup table mapping characters to their [`CharClass`].
#[derive(Clone, Debug)]
pub struct CharClassTable {
    ascii: [CharClass; 128],
    ifs: String,
}

impl CharClassTable {
    /// Builds the table for the given IFS value (or the default if `None`).
    pub fn new(ifs: Option<&str>) -> Self {
        let ifs = ifs.unwrap_or(DEFAULT_IFS);
        let mut ascii = [CharClass::Literal; 128];

        let mut set = |chars: &str, class: CharClass| {
            for c in chars.chars().filter(char::is_ascii) {
                ascii[c as usize] = class;
            }
        };

        set("\\$'\"`", CharClass::Quoting);
        set("<>;&|(){}#", CharClass::Special);
        set(ifs, CharClass::FieldSeparator);
        // Newline always separates, even when IFS omits it.
        set("\n", CharClass::FieldSeparator);

        Self {
            ascii,
            ifs: ifs.to_owned(),
        }
    }

    /// Returns the class of `c`.
    pub fn classify(&self, c: char) -> CharClass {
        if c.is_ascii() {
            self.ascii[c as usize]
        } else if self.ifs.contains(c) {
            CharClass::FieldSeparator
        } else {
            CharClass::Literal
        }
    }

    /// Returns the IFS value the table was built from.
    pub fn ifs(&self) -> &str {
        &self.ifs
    }
}

impl Default for CharClassTable {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_classes() -> Result<()> {
        let table = CharClassTable::default();
        assert_eq!(table.classify('a'), CharClass::Literal);
        assert_eq!(table.classify(' '), CharClass::FieldSeparator);
        assert_eq!(table.classify('\n'), CharClass::FieldSeparator);
        assert_eq!(table.classify(';'), CharClass::Special);
        assert_eq!(table.classify('$'), CharClass::Quoting);
        assert_eq!(table.classify('é'), CharClass::Literal);
        Ok(())
    }

    #[test]
    fn custom_ifs_overrides_special() -> Result<()> {
        let table = CharClassTable::new(Some(":\n"));
        assert_eq!(table.classify(':'), CharClass::FieldSeparator);
        assert_eq!(table.classify(' '), CharClass::Literal);

        let table = CharClassTable::new(Some(":"));
        assert_eq!(table.classify('\n'), CharClass::FieldSeparator);
        Ok(())
    }
}
