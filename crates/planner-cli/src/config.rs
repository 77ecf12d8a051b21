//! Configuration file management for planner.
//!
//! Provides an optional TOML config file at `~/.config/planner/config.toml`
//! and a resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use planner_core::llm::OpenAiConfig;
use planner_core::plan::PlanOptions;

/// Port used when neither `--port`, `PORT`, nor the config file set one.
pub const DEFAULT_PORT: u16 = 8787;

/// Bind address used when nothing else sets one.
pub const DEFAULT_BIND: &str = "0.0.0.0";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub openai: OpenAiSection,
    #[serde(default)]
    pub plan: PlanSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OpenAiSection {
    /// Used only when `OPENAI_API_KEY` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Per-request timeout. Unset keeps the HTTP client's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Retries on transient upstream failures. Unset means none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PlanSection {
    #[serde(default)]
    pub strict_horizon: bool,
    #[serde(default)]
    pub validate_output: bool,
}

impl ConfigFile {
    /// The file `planner init` writes: every default spelled out.
    pub fn with_defaults(api_key: Option<String>) -> Self {
        Self {
            server: ServerSection {
                bind: Some(DEFAULT_BIND.to_string()),
                port: Some(DEFAULT_PORT),
            },
            openai: OpenAiSection {
                api_key,
                model: Some(OpenAiConfig::DEFAULT_MODEL.to_string()),
                base_url: Some(OpenAiConfig::DEFAULT_BASE_URL.to_string()),
                timeout_secs: None,
                max_retries: Some(0),
            },
            plan: PlanSection::default(),
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the planner config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/planner` or `~/.config/planner`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("planner");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("planner")
}

/// Return the path to the planner config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load the config file if it exists.
///
/// A missing file is not an error; an unreadable or malformed one is.
pub fn load_config() -> Result<Option<ConfigFile>> {
    let path = config_path();
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(Some(config))
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix since the file may hold an API key.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(path)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line. `None` defers to the rest of the chain.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub model: Option<String>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct PlannerConfig {
    pub bind: String,
    pub port: u16,
    pub openai: OpenAiConfig,
    pub plan: PlanOptions,
}

impl PlannerConfig {
    /// Resolve from the process environment and the config file on disk.
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let file = load_config()?;
        Self::resolve_from(cli, file.as_ref(), |key| std::env::var(key).ok())
    }

    /// Resolve using the chain: CLI flag > env var > config file > default.
    ///
    /// - bind: `--bind` > `PLANNER_BIND` > `server.bind` > `0.0.0.0`
    /// - port: `--port` > `PORT` > `server.port` > `8787`
    /// - API key: `OPENAI_API_KEY` > `openai.api_key` > error
    /// - model: `--model` > `PLANNER_MODEL` > `openai.model` > `gpt-4o`
    /// - base URL: `OPENAI_BASE_URL` > `openai.base_url` > `https://api.openai.com`
    ///
    /// Empty env values count as unset.
    pub fn resolve_from(
        cli: &CliOverrides,
        file: Option<&ConfigFile>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let env = |key: &str| env(key).filter(|v| !v.is_empty());

        let bind = cli
            .bind
            .clone()
            .or_else(|| env("PLANNER_BIND"))
            .or_else(|| file.and_then(|f| f.server.bind.clone()))
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        let port = match (cli.port, env("PORT")) {
            (Some(port), _) => port,
            (None, Some(raw)) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT env var is not a valid port: {raw:?}"))?,
            (None, None) => file
                .and_then(|f| f.server.port)
                .unwrap_or(DEFAULT_PORT),
        };

        let api_key = match env("OPENAI_API_KEY")
            .or_else(|| file.and_then(|f| f.openai.api_key.clone()).filter(|k| !k.is_empty()))
        {
            Some(key) => key,
            None => bail!(
                "OpenAI API key not found; set OPENAI_API_KEY or add openai.api_key to {}",
                config_path().display()
            ),
        };

        let model = cli
            .model
            .clone()
            .or_else(|| env("PLANNER_MODEL"))
            .or_else(|| file.and_then(|f| f.openai.model.clone()))
            .unwrap_or_else(|| OpenAiConfig::DEFAULT_MODEL.to_string());

        let base_url = env("OPENAI_BASE_URL")
            .or_else(|| file.and_then(|f| f.openai.base_url.clone()))
            .unwrap_or_else(|| OpenAiConfig::DEFAULT_BASE_URL.to_string());

        let openai = OpenAiConfig {
            api_key,
            model,
            base_url,
            timeout: file
                .and_then(|f| f.openai.timeout_secs)
                .map(Duration::from_secs),
            max_retries: file.and_then(|f| f.openai.max_retries).unwrap_or(0),
        };

        let plan = file
            .map(|f| PlanOptions {
                strict_horizon: f.plan.strict_horizon,
                validate_output: f.plan.validate_output,
            })
            .unwrap_or_default();

        Ok(Self {
            bind,
            port,
            openai,
            plan,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
