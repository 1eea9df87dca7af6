//! Configuration loading for the command-line front end
//!
//! Sources are layered: command-line flags win over environment variables,
//! which win over the optional TOML file, which wins over built-in defaults.

use bridge::{BridgeConfig, EmptyOutputPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const TOKEN_VAR: &str = "ABSTRACT_TOKEN";
pub const CLI_PATH_VAR: &str = "ABSTRACT_CLI_PATH";
pub const API_URL_VAR: &str = "ABSTRACT_API_URL";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid config file '{path}': {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("No access token. Set {TOKEN_VAR}, pass --token, or add user-token to the config file.")]
    MissingToken,
}

/// Contents of the optional TOML config file.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct FileSettings {
    pub cwd: Option<PathBuf>,
    pub user_token: Option<String>,
    pub api_url: Option<String>,
    pub cli_path: Option<Vec<PathBuf>>,
    pub timeout_ms: Option<u64>,
    pub empty_output: Option<EmptyOutputPolicy>,
}

/// Values given on the command line.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub cwd: Option<PathBuf>,
    pub token: Option<String>,
    pub api_url: Option<String>,
    pub cli_path: Option<String>,
    pub timeout_ms: Option<u64>,
    pub empty_output: Option<EmptyOutputPolicy>,
}

pub fn load_file(path: &Path) -> Result<FileSettings, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| SettingsError::Parse {
        path: path.display().to_string(),
        source,
    })
}

pub fn build_config<F>(
    file: FileSettings,
    env: F,
    overrides: &Overrides,
) -> Result<BridgeConfig, SettingsError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = BridgeConfig::default();

    if let Some(cwd) = overrides.cwd.clone().or(file.cwd) {
        config = config.with_cwd(cwd);
    }

    let token = overrides
        .token
        .clone()
        .or_else(|| env(TOKEN_VAR))
        .or(file.user_token)
        .filter(|token| !token.is_empty())
        .ok_or(SettingsError::MissingToken)?;
    config = config.with_user_token(token);

    if let Some(api_url) = overrides
        .api_url
        .clone()
        .or_else(|| env(API_URL_VAR))
        .or(file.api_url)
    {
        config = config.with_api_url(api_url);
    }

    let cli_path = match overrides.cli_path.clone().or_else(|| env(CLI_PATH_VAR)) {
        Some(list) => {
            Some(BridgeConfig::parse_search_path(&list)).filter(|paths| !paths.is_empty())
        }
        None => file.cli_path,
    };
    if let Some(cli_path) = cli_path {
        config = config.with_cli_path(cli_path);
    }

    if let Some(timeout_ms) = overrides.timeout_ms.or(file.timeout_ms) {
        config = config.with_timeout(Duration::from_millis(timeout_ms));
    }

    if let Some(policy) = overrides.empty_output.or(file.empty_output) {
        config = config.with_empty_output(policy);
    }

    Ok(config)
}
