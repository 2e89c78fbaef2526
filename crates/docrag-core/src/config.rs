//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g. `APP_DATA__INDEX_DIR`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against the directory the config was loaded from.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::canonical::DEFAULT_DOMAIN;
use crate::error::Error;
use crate::retrieve::{Strategy, DEFAULT_PREVIEW_CHARS};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub canonical: CanonicalSettings,
    pub search: SearchSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Crawl directory or `.wacz` archive holding the page records.
    pub source: Option<String>,
    pub index_dir: String,
    pub typedoc_dir: Option<String>,
}

impl Default for DataSettings {
    fn default() -> Self { Self { source: None, index_dir: "build/index".to_string(), typedoc_dir: None } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalSettings {
    pub domain: String,
}

impl Default for CanonicalSettings {
    fn default() -> Self { Self { domain: DEFAULT_DOMAIN.to_string() } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub strategy: Strategy,
    pub preview_chars: usize,
    pub k_components: i64,
    pub k_patterns: i64,
    pub k_typedoc: i64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { strategy: Strategy::Exact, preview_chars: DEFAULT_PREVIEW_CHARS, k_components: 1, k_patterns: 5, k_typedoc: 3 }
    }
}

pub struct Config {
    figment: Figment,
    base: PathBuf,
}

impl Config {
    /// Loads from the current directory, picking the environment from `RUST_ENV`.
    pub fn load() -> anyhow::Result<Self> { Self::load_from(Path::new(".")) }

    pub fn load_from(base: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(base, &env_name)
    }

    pub fn load_for_env(base: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file(base.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(base.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, base: base.to_path_buf() };
        config.validate()?;
        Ok(config)
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()).into())
    }

    /// Expands and resolves a configured path against the config directory.
    pub fn resolve(&self, p: &str) -> PathBuf { resolve_with_base(&self.base, p) }

    fn validate(&self) -> anyhow::Result<()> {
        let s = self.settings()?;
        if s.canonical.domain.trim().is_empty() {
            return Err(Error::InvalidConfig("canonical.domain must not be empty".into()).into());
        }
        if s.search.preview_chars == 0 {
            return Err(Error::InvalidConfig("search.preview_chars must be positive".into()).into());
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
