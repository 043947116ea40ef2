use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, info, warn},
};

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::TalapkerConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "talapker.toml",
    "talapker.yaml",
    "talapker.yml",
    "talapker.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<TalapkerConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations, then apply env overrides.
///
/// Search order:
/// 1. `./talapker.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/talapker/talapker.{toml,yaml,yml,json}` (user-global)
///
/// Falls back to `TalapkerConfig::default()` if no file is found or it fails
/// to parse; the deployment can still be driven purely by env variables.
pub fn discover_and_load() -> TalapkerConfig {
    let mut config = match find_config_file() {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            match load_config(&path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
                    TalapkerConfig::default()
                },
            }
        },
        None => {
            debug!("no config file found, using defaults");
            TalapkerConfig::default()
        },
    };
    apply_env_overrides(&mut config);
    config
}

/// Resolve the config file to use: the explicit path if given, otherwise the
/// first file found in the standard locations.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => find_config_file().context("no talapker config file in ./ or the user config dir"),
    }
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/talapker/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "talapker").map(|d| d.config_dir().to_path_buf())
}

/// Apply the deployment environment variables on top of file config.
///
/// `TELEGRAM_TOKEN`, `CONTENT_API_URL` and `NLP_API_URL` win over file values
/// when set and non-empty.
pub fn apply_env_overrides(config: &mut TalapkerConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut TalapkerConfig, lookup: impl Fn(&str) -> Option<String>) {
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(token) = get("TELEGRAM_TOKEN") {
        config.telegram.token = Secret::new(token);
        info!("telegram token taken from TELEGRAM_TOKEN");
    }
    if let Some(url) = get("CONTENT_API_URL") {
        debug!(url = %url, "content api url from CONTENT_API_URL");
        config.content_api.url = url;
    }
    if let Some(url) = get("NLP_API_URL") {
        debug!(url = %url, "advisor url from NLP_API_URL");
        config.advisor.url = Some(url);
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<TalapkerConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(Error::UnsupportedFormat {
            extension: other.to_string(),
        }),
    }
}
