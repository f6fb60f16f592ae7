//! Configuration management for mdview.
//!
//! Parses `mdview.toml` with serde and auto-discovers it in the current
//! directory or its parents. CLI flags are applied on top via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! These string values support `${VAR}` and `${VAR:-default}`:
//! - `diagrams.kroki_url`
//! - `cache.dir`

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdview.toml";

/// Themes understood by the mermaid diagram engine.
const DIAGRAM_THEMES: &[&str] = &["default", "base", "dark", "forest", "neutral"];

/// Upper bound for the diagram engine timeout.
const MAX_TIMEOUT_SECS: u64 = 300;

/// CLI settings that override configuration file values.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override Kroki URL (enables server-side diagram activation).
    pub kroki_url: Option<String>,
    /// Override cache enabled flag.
    pub cache_enabled: Option<bool>,
    /// Override diagram theme.
    pub theme: Option<String>,
    /// Override raw HTML pass-through.
    pub allow_raw_html: Option<bool>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Markdown dialect and output options.
    pub render: RenderConfig,
    /// Diagram block and engine options.
    pub diagrams: DiagramsConfig,
    /// Cache section as written in TOML (path relative to the config file).
    cache: CacheConfigRaw,

    /// Resolved cache configuration (set after loading).
    #[serde(skip)]
    pub cache_resolved: CacheConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Markdown rendering options.
#[derive(Debug, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct RenderConfig {
    /// Enable GFM tables, strikethrough, task lists and bare-URL autolinks.
    pub gfm: bool,
    /// Render line breaks inside paragraphs as `<br>`.
    pub hard_breaks: bool,
    /// Pass raw HTML through; when false it is escaped.
    pub allow_raw_html: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            gfm: true,
            hard_breaks: true,
            allow_raw_html: true,
        }
    }
}

/// Diagram options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DiagramsConfig {
    /// Fence language reserved for diagrams.
    pub language: String,
    /// Engine theme.
    pub theme: String,
    /// Kroki server URL. When unset, diagram containers are left for a
    /// client-side engine.
    pub kroki_url: Option<String>,
    /// Engine request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DiagramsConfig {
    fn default() -> Self {
        Self {
            language: "mermaid".to_owned(),
            theme: "default".to_owned(),
            kroki_url: None,
            timeout_secs: 30,
        }
    }
}

impl DiagramsConfig {
    /// Engine request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Raw cache configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct CacheConfigRaw {
    enabled: Option<bool>,
    dir: Option<String>,
}

/// Resolved cache configuration with an absolute directory.
#[derive(Debug, Default)]
pub struct CacheConfig {
    /// Whether caching is enabled.
    pub enabled: bool,
    /// Cache root directory.
    pub dir: PathBuf,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`diagrams.kroki_url`").
        field: String,
        /// Error message (e.g., "${`KROKI_URL`} not set").
        message: String,
    },
}

fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `mdview.toml` in the current directory and its parents, falling
    /// back to defaults. CLI settings win over file values.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit `config_path` doesn't exist, or if
    /// parsing, expansion or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(kroki_url) = &settings.kroki_url {
            self.diagrams.kroki_url = Some(kroki_url.clone());
        }
        if let Some(cache_enabled) = settings.cache_enabled {
            self.cache_resolved.enabled = cache_enabled;
        }
        if let Some(theme) = &settings.theme {
            self.diagrams.theme.clone_from(theme);
        }
        if let Some(allow_raw_html) = settings.allow_raw_html {
            self.render.allow_raw_html = allow_raw_html;
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` describing the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let diagrams = &self.diagrams;

        require_non_empty(&diagrams.language, "diagrams.language")?;
        if diagrams.language.contains(char::is_whitespace) {
            return Err(ConfigError::Validation(
                "diagrams.language must be a single fence word".to_owned(),
            ));
        }

        if !DIAGRAM_THEMES.contains(&diagrams.theme.as_str()) {
            return Err(ConfigError::Validation(format!(
                "diagrams.theme must be one of: {}",
                DIAGRAM_THEMES.join(", ")
            )));
        }

        if let Some(ref kroki_url) = diagrams.kroki_url {
            require_non_empty(kroki_url, "diagrams.kroki_url")?;
            require_http_url(kroki_url, "diagrams.kroki_url")?;
        }

        if diagrams.timeout_secs == 0 || diagrams.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::Validation(format!(
                "diagrams.timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}"
            )));
        }

        Ok(())
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        Self {
            render: RenderConfig::default(),
            diagrams: DiagramsConfig::default(),
            cache: CacheConfigRaw::default(),
            cache_resolved: CacheConfig {
                enabled: true,
                dir: base.join(".mdview").join("cache"),
            },
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content, path.parent().unwrap_or(Path::new(".")))
            .map(|config| Self {
                config_path: Some(path.to_path_buf()),
                ..config
            })
    }

    /// Parse, expand, resolve and validate a TOML document.
    fn from_toml_str(content: &str, config_dir: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        config.resolve_paths(config_dir);
        config.validate()?;
        Ok(config)
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.diagrams.kroki_url {
            self.diagrams.kroki_url = Some(expand::expand_env(url, "diagrams.kroki_url")?);
        }
        if let Some(ref dir) = self.cache.dir {
            self.cache.dir = Some(expand::expand_env(dir, "cache.dir")?);
        }
        Ok(())
    }

    /// Resolve the cache directory against the config file's directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let dir = match self.cache.dir.as_deref() {
            Some(dir) => config_dir.join(dir),
            None => config_dir.join(".mdview").join("cache"),
        };
        self.cache_resolved = CacheConfig {
            enabled: self.cache.enabled.unwrap_or(true),
            dir,
        };
    }
}
