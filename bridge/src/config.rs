use crate::error::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.goabstract.com";

const MACOS_APP_CLI: &str = "/Applications/Abstract.app/Contents/Resources/app.asar.unpacked/node_modules/@elasticprojects/abstract-cli";

/// What to do when the tool exits successfully without printing any JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyOutputPolicy {
    /// Fail the invocation with `BridgeError::EmptyOutput`.
    #[default]
    Fail,
    /// Succeed with `null`.
    Null,
    /// Keep waiting until the deadline or cancellation settles the call.
    Wait,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub cwd: PathBuf,
    #[serde(default, skip_serializing)]
    pub user_token: String,
    pub api_url: String,
    pub cli_path: Vec<PathBuf>,
    pub timeout: Option<Duration>,
    pub empty_output: EmptyOutputPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            cli_path: Self::default_search_path(&cwd),
            cwd,
            user_token: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            timeout: None,
            empty_output: EmptyOutputPolicy::default(),
        }
    }
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("cwd", &self.cwd)
            .field("user_token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("cli_path", &self.cli_path)
            .field("timeout", &self.timeout)
            .field("empty_output", &self.empty_output)
            .finish()
    }
}

impl BridgeConfig {
    pub fn new(user_token: impl Into<String>) -> Self {
        Self {
            user_token: user_token.into(),
            ..Self::default()
        }
    }

    /// Candidate executable locations relative to a working directory.
    pub fn default_search_path(cwd: &Path) -> Vec<PathBuf> {
        vec![
            cwd.join("abstract-cli"),
            cwd.join("node_modules/@elasticprojects/abstract-cli/bin/abstract-cli"),
            PathBuf::from(MACOS_APP_CLI),
        ]
    }

    /// Splits a platform path list (`:` on unix, `;` on windows).
    pub fn parse_search_path(input: &str) -> Vec<PathBuf> {
        if input.is_empty() {
            return Vec::new();
        }
        std::env::split_paths(input).collect()
    }

    /// Changes the working directory. The search path is re-derived if it was
    /// still the default for the previous directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        let cwd = cwd.into();
        if self.cli_path == Self::default_search_path(&self.cwd) {
            self.cli_path = Self::default_search_path(&cwd);
        }
        self.cwd = cwd;
        self
    }

    pub fn with_user_token(mut self, user_token: impl Into<String>) -> Self {
        self.user_token = user_token.into();
        self
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_cli_path(mut self, cli_path: Vec<PathBuf>) -> Self {
        self.cli_path = cli_path;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_empty_output(mut self, policy: EmptyOutputPolicy) -> Self {
        self.empty_output = policy;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.user_token.is_empty() {
            return Err("User token cannot be empty".to_string());
        }

        if self.api_url.is_empty() {
            return Err("API URL cannot be empty".to_string());
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err("API URL must start with http:// or https://".to_string());
        }

        if self.cli_path.is_empty() {
            return Err("Executable search path cannot be empty".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err("Timeout must be greater than 0".to_string());
            }
        }

        Ok(())
    }

    /// First existing file on the search path. Relative entries are taken
    /// relative to `cwd`.
    pub fn locate_executable(&self) -> BridgeResult<PathBuf> {
        self.cli_path
            .iter()
            .map(|candidate| self.cwd.join(candidate))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| BridgeError::ExecutableNotFound {
                searched: self
                    .cli_path
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect::<Vec<_>>()
                    .join(":"),
            })
    }
}
