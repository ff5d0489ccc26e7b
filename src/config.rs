//! Redirection configuration.
//!
//! ```toml
//! redirected_schema = "redirected"
//! base_schema_alias = "base"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{RedirectError, RedirectResult};

/// Directory under the platform config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "redirect-layer";

/// Schema names used when generating redirection layers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RedirectConfig {
    /// Schema holding the `<Table>_REDIRECTED` shadow tables.
    pub redirected_schema: String,

    /// Schema the generated views live in.
    pub base_schema_alias: String,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            redirected_schema: "redirected".to_string(),
            base_schema_alias: "base".to_string(),
        }
    }
}

impl RedirectConfig {
    /// Create a new configuration builder
    pub fn builder() -> RedirectConfigBuilder {
        RedirectConfigBuilder::default()
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(text: &str) -> RedirectResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| RedirectError::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> RedirectResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Default location: `<config dir>/redirect-layer/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR).join("config.toml"))
    }

    /// Load from `path` if given, else from the default location if it
    /// exists, else fall back to defaults.
    pub fn load(path: Option<&Path>) -> RedirectResult<Self> {
        if let Some(path) = path {
            debug!(path = %path.display(), "loading config");
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                debug!(path = %path.display(), "loading config");
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    fn check(&self) -> RedirectResult<()> {
        for (key, value) in [
            ("redirected_schema", &self.redirected_schema),
            ("base_schema_alias", &self.base_schema_alias),
        ] {
            if value.trim().is_empty() {
                return Err(RedirectError::Config(format!("{} must not be empty", key)));
            }
        }
        if self.redirected_schema.eq_ignore_ascii_case(&self.base_schema_alias) {
            return Err(RedirectError::Config(
                "redirected_schema and base_schema_alias must differ".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for RedirectConfig
#[derive(Debug, Default)]
pub struct RedirectConfigBuilder {
    config: RedirectConfig,
}

impl RedirectConfigBuilder {
    /// Start from an existing configuration
    pub fn starting_from(config: RedirectConfig) -> Self {
        Self { config }
    }

    pub fn redirected_schema(mut self, name: impl Into<String>) -> Self {
        self.config.redirected_schema = name.into();
        self
    }

    pub fn base_schema_alias(mut self, name: impl Into<String>) -> Self {
        self.config.base_schema_alias = name.into();
        self
    }

    /// Build and check the configuration
    pub fn build(self) -> RedirectResult<RedirectConfig> {
        self.config.check()?;
        Ok(self.config)
    }
}
