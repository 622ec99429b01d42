//! Configuration file support for the hush shell.
//!
//! The configuration is a small TOML file. Unknown fields are ignored, and a
//! file that can't be read or parsed falls back to the defaults unless it was
//! named explicitly with `--config`.

use std::path::{Path, PathBuf};

use etcetera::BaseStrategy;

/// Profile sourced by login shells when the configuration doesn't name one.
const DEFAULT_LOGIN_PROFILE: &str = "/etc/profile";

/// Root configuration structure for the hush shell.
#[derive(Debug, Default, Clone, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// User interface configuration options.
    pub ui: UiConfig,

    /// Interpreter configuration options.
    pub shell: ShellConfig,
}

/// User interface configuration options.
#[derive(Debug, Default, Clone, serde::Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Whether to print the startup banner in interactive mode.
    pub banner: Option<bool>,

    /// Primary prompt to show instead of the working directory.
    pub prompt: Option<String>,
}

/// Interpreter configuration options.
#[derive(Debug, Default, Clone, serde::Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Profile sourced by login shells.
    pub login_profile: Option<PathBuf>,
}

impl Config {
    /// Returns whether the interactive banner should be shown.
    pub fn show_banner(&self) -> bool {
        self.ui.banner.unwrap_or(true)
    }

    /// Returns the profile a login shell should source.
    pub fn login_profile(&self) -> PathBuf {
        self.shell
            .login_profile
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOGIN_PROFILE))
    }
}

/// Result of attempting to load a configuration file.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration, or default if loading failed.
    pub config: Config,

    /// The path that was used (or attempted) for loading.
    pub path: Option<PathBuf>,

    /// Any error that occurred during loading.
    pub error: Option<ConfigLoadError>,

    /// Whether the path was explicitly provided by the user (via `--config`).
    /// If true and there's an error, the shell should fail rather than continue.
    pub explicit_path: bool,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the TOML content.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Returns the default configuration file path, following the platform's
/// conventions for configuration directories.
///
/// Returns `None` if the platform's config directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    let strategy = etcetera::choose_base_strategy().ok()?;
    Some(strategy.config_dir().join("hush").join("config.toml"))
}

/// Loads configuration from the specified path.
pub fn load_from_path(path: &Path) -> ConfigLoadResult {
    let loaded = std::fs::read_to_string(path)
        .map_err(ConfigLoadError::from)
        .and_then(|content| toml::from_str(&content).map_err(ConfigLoadError::from));

    let (config, error) = match loaded {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    ConfigLoadResult {
        config,
        path: Some(path.to_path_buf()),
        error,
        explicit_path: false,
    }
}

/// Loads configuration based on the provided options.
///
/// # Arguments
///
/// * `disabled` - If true, skip loading and return defaults
/// * `explicit_path` - If provided, use this path instead of the default
pub fn load_config(disabled: bool, explicit_path: Option<&Path>) -> ConfigLoadResult {
    let defaults = |path| ConfigLoadResult {
        config: Config::default(),
        path,
        error: None,
        explicit_path: false,
    };

    if disabled {
        return defaults(None);
    }

    let Some(path) = explicit_path
        .map(Path::to_path_buf)
        .or_else(default_config_path)
    else {
        return defaults(None);
    };

    // A missing file at the default location isn't an error.
    if explicit_path.is_none() && !path.exists() {
        return defaults(Some(path));
    }

    let mut result = load_from_path(&path);
    result.explicit_path = explicit_path.is_some();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn empty_config() -> Result<()> {
        let config: Config = toml::from_str("")?;
        assert!(config.show_banner());
        assert!(config.ui.prompt.is_none());
        assert_eq!(config.login_profile(), PathBuf::from("/etc/profile"));
        Ok(())
    }

    #[test]
    fn full_config() -> Result<()> {
        let config: Config = toml::from_str(
            r#"
            [ui]
            banner = false
            prompt = "hush> "

            [shell]
            login_profile = "/opt/profile"
        "#,
        )?;
        assert!(!config.show_banner());
        assert_eq!(config.ui.prompt.as_deref(), Some("hush> "));
        assert_eq!(config.login_profile(), PathBuf::from("/opt/profile"));
        Ok(())
    }

    #[test]
    fn unknown_fields_ignored() -> Result<()> {
        let config: Config = toml::from_str(
            r"
            [ui]
            banner = true
            colors = 256

            [future]
            thing = 1
        ",
        )?;
        assert!(config.show_banner());
        Ok(())
    }

    #[test]
    fn load_config_disabled() {
        let result = load_config(true, Some(Path::new("/nonexistent/config.toml")));
        assert!(result.path.is_none());
        assert!(result.error.is_none());
    }

    #[test]
    fn load_config_nonexistent_explicit() {
        let result = load_config(false, Some(Path::new("/nonexistent/config.toml")));
        assert!(result.explicit_path);
        assert!(matches!(result.error, Some(ConfigLoadError::Io(_))));
    }

    #[test]
    fn load_config_bad_toml() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "[ui\nbanner = ")?;

        let result = load_config(false, Some(file.path()));
        assert!(matches!(result.error, Some(ConfigLoadError::Parse(_))));
        assert!(result.config.show_banner());
        Ok(())
    }
}
