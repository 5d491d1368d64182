//! Configuration for soundscout.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (SOUNDSCOUT_URL, SOUNDSCOUT_WATCH_DIR)
//! 2. Config file (.soundscout/config.yaml)
//! 3. Defaults (http://localhost:8000, ~/.soundscout/clips)
//!
//! Command-line flags override all of these at the call site.
//!
//! Config file discovery:
//! - Searches current directory and parents for .soundscout/config.yaml
//! - Paths in config file are relative to the project root (parent of .soundscout/)

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::ingest::WatcherConfig;

/// Default matching service base URL
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8000";

const ENV_SERVICE_URL: &str = "SOUNDSCOUT_URL";
const ENV_WATCH_DIR: &str = "SOUNDSCOUT_WATCH_DIR";

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the matching service
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchConfig {
    /// Clip directory (relative to the project root)
    pub path: Option<String>,
    pub stability_delay_secs: Option<u64>,
    pub extensions: Option<Vec<String>>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Matching service base URL
    pub service_url: String,
    /// Clip watcher settings
    pub watch: WatcherConfig,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".soundscout").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Merge environment, an optional parsed config file and defaults
fn resolve(
    file: Option<(&Path, ConfigFile)>,
    env_url: Option<String>,
    env_watch_dir: Option<String>,
) -> ResolvedConfig {
    let defaults = WatcherConfig::default();

    let (config_file, file_service, file_watch) = match file {
        Some((path, parsed)) => (Some(path.to_path_buf()), parsed.service, parsed.watch),
        None => (None, ServiceConfig::default(), WatchConfig::default()),
    };

    // Base directory is the parent of .soundscout/ (i.e., grandparent of config.yaml)
    let base_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .and_then(Path::parent)
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let service_url = env_url
        .or(file_service.url)
        .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());

    let watch_path = if let Some(dir) = env_watch_dir {
        PathBuf::from(dir)
    } else if let Some(ref dir) = file_watch.path {
        resolve_path(&base_dir, dir)
    } else {
        defaults.watch_path
    };

    ResolvedConfig {
        service_url,
        watch: WatcherConfig {
            watch_path,
            stability_delay_secs: file_watch
                .stability_delay_secs
                .unwrap_or(defaults.stability_delay_secs),
            extensions: file_watch.extensions.unwrap_or(defaults.extensions),
        },
        config_file,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let config_file = find_config_file();
    let parsed = match config_file {
        Some(ref path) => Some((path.as_path(), load_config_file(path)?)),
        None => None,
    };

    Ok(resolve(
        parsed,
        std::env::var(ENV_SERVICE_URL).ok(),
        std::env::var(ENV_WATCH_DIR).ok(),
    ))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
