use std::io::{BufRead, Write};

use hush_parser::{LineReader, PromptKind};

/// Continuation prompt, shown while a statement is incomplete.
const CONTINUATION_PROMPT: &str = "> ";

/// Reads lines from standard input, prompting on standard output first.
#[derive(Clone, Debug, Default)]
pub struct InteractivePrompt {
    primary_override: Option<String>,
}

impl InteractivePrompt {
    /// Returns a new prompting reader. The primary prompt is `override_prompt`
    /// if given; otherwise it's the working directory followed by `$ `, or
    /// `# ` for the superuser.
    pub const fn new(override_prompt: Option<String>) -> Self {
        Self {
            primary_override: override_prompt,
        }
    }

    fn primary_prompt(&self) -> String {
        if let Some(prompt) = &self.primary_override {
            return prompt.clone();
        }

        let cwd = std::env::current_dir()
            .map_or_else(|_| "(unknown)".to_owned(), |cwd| cwd.to_string_lossy().into_owned());
        let marker = if nix::unistd::geteuid().is_root() { "# " } else { "$ " };

        format!("{cwd} {marker}")
    }
}

impl LineReader for InteractivePrompt {
    fn read_line(&mut self, kind: PromptKind) -> std::io::Result<Option<String>> {
        let prompt = match kind {
            PromptKind::Primary => self.primary_prompt(),
            PromptKind::Continuation => CONTINUATION_PROMPT.to_owned(),
        };

        let mut stdout = std::io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line)? == 0 {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;

    #[test]
    fn primary_prompt_shows_directory() -> Result<()> {
        let prompt = InteractivePrompt::default().primary_prompt();
        let cwd = std::env::current_dir()?;

        assert!(prompt.starts_with(cwd.to_string_lossy().as_ref()));
        assert!(prompt.ends_with("$ ") || prompt.ends_with("# "));
        Ok(())
    }

    #[test]
    fn prompt_override() {
        let prompt = InteractivePrompt::new(Some("hush> ".into())).primary_prompt();
        assert_eq!(prompt, "hush> ");
    }
}
