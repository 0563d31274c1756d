//! Layered configuration for shoebox.
//!
//! Layers, lowest priority first:
//! 1. built-in defaults ([`Config::default`]),
//! 2. a config file: `config.toml`, `config.yaml`/`config.yml` or
//!    `config.json` in the platform config directory, or one explicit file,
//! 3. environment variables prefixed with `SHOEBOX_` (nested keys are
//!    separated with `__`, e.g. `SHOEBOX_LOG__LEVEL=debug`),
//! 4. command-line [`Overrides`].

pub mod error;

use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::{ErrorKind, Result};

pub const ENV_PREFIX: &str = "SHOEBOX_";
const APPLICATION: &str = "shoebox";
const DEFAULT_CATALOG_FILE: &str = "catalog.db";
const DEFAULT_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "heic", "mov", "avi"];
const DEFAULT_PROGRESS_EVERY: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the date-organised archive; also where the catalog lives.
    pub archive: Option<PathBuf>,
    /// Catalog database file name, inside the archive.
    pub catalog_file: String,
    /// File extensions (without the dot) considered for ingestion.
    pub extensions: Vec<String>,
    /// Log a progress report every this many copied files.
    pub progress_every: u64,
    pub log: LogConfig,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            archive: None,
            catalog_file: DEFAULT_CATALOG_FILE.to_string(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            progress_every: DEFAULT_PROGRESS_EVERY,
            log: LogConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default `tracing` filter directive, e.g. `info` or `shoebox_library=debug`.
    pub level: String,
}
impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// Values given on the command line; they win over every other layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_file: Option<PathBuf>,
    pub archive: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Config {
    /// Load and validate the configuration from every layer.
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let files = match &overrides.config_file {
            Some(path) => explicit_file(path)?,
            None => default_files(),
        };
        Self::from_figment(layered(files, overrides))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.catalog_file.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid {
                field: "catalog_file",
                reason: "must not be empty".to_string(),
            });
        }
        if self.catalog_file.contains(['/', '\\']) {
            exn::bail!(ErrorKind::Invalid {
                field: "catalog_file",
                reason: format!("'{}' must be a file name, not a path", self.catalog_file),
            });
        }
        if self.extension_set().is_empty() {
            exn::bail!(ErrorKind::Invalid {
                field: "extensions",
                reason: "at least one extension is required".to_string(),
            });
        }
        if self.progress_every == 0 {
            exn::bail!(ErrorKind::Invalid {
                field: "progress_every",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// The configured archive root, or [`ErrorKind::MissingArchive`].
    pub fn archive(&self) -> Result<&Path> {
        self.archive.as_deref().ok_or_raise(|| ErrorKind::MissingArchive)
    }

    /// Where the catalog database lives.
    pub fn catalog_path(&self) -> Result<PathBuf> {
        Ok(self.archive()?.join(&self.catalog_file))
    }

    /// Extensions normalised to lowercase without a leading dot.
    pub fn extension_set(&self) -> BTreeSet<String> {
        self.extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }
}

fn layered(files: Figment, overrides: &Overrides) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(files)
        .merge(Env::prefixed(ENV_PREFIX).split("__"));
    if let Some(archive) = &overrides.archive {
        figment = figment.merge(Serialized::default("archive", archive));
    }
    if let Some(level) = &overrides.log_level {
        figment = figment.merge(Serialized::default("log.level", level));
    }
    figment
}

fn explicit_file(path: &Path) -> Result<Figment> {
    if !path.is_file() {
        exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
    }
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_lowercase);
    let figment = match extension.as_deref() {
        Some("toml") => Figment::from(Toml::file(path)),
        Some("yaml" | "yml") => Figment::from(Yaml::file(path)),
        Some("json") => Figment::from(Json::file(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    };
    Ok(figment)
}

/// Every supported file name in the platform config directory; missing files
/// contribute nothing.
fn default_files() -> Figment {
    let Some(dirs) = ProjectDirs::from("", "", APPLICATION) else {
        tracing::debug!("No home directory; skipping config files");
        return Figment::new();
    };
    let dir = dirs.config_dir();
    tracing::debug!(dir = %dir.display(), "Looking for config files");
    Figment::new()
        .merge(Toml::file(dir.join("config.toml")))
        .merge(Yaml::file(dir.join("config.yaml")))
        .merge(Yaml::file(dir.join("config.yml")))
        .merge(Json::file(dir.join("config.json")))
}
