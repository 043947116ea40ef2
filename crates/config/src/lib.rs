//! Configuration loading, validation and env substitution.
//!
//! Config files: `talapker.toml`, `talapker.yaml`, or `talapker.json`
//! Searched in `./` then `~/.config/talapker/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in the raw
//! file, and the legacy `TELEGRAM_TOKEN` / `CONTENT_API_URL` / `NLP_API_URL`
//! environment overrides.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        apply_env_overrides, config_dir, discover_and_load, load_config, resolve_config_path,
    },
    schema::{AdvisorConfig, ContentApiConfig, RoutingConfig, TalapkerConfig, TelegramConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
