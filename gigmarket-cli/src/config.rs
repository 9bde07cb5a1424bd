//! Configuration management for the gigm CLI.

use anyhow::{Context, Result};
use clap::Args;
use gigmarket::client::DEFAULT_BASE_URL;
use gigmarket::MarketClient;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// API base URL; the library default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Authentication credentials.
    pub auth: Option<AuthConfig>,
}

/// Authentication configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Bearer token.
    pub token: String,
    /// User ID.
    pub user_id: String,
}

/// Per-invocation settings that win over the config file.
#[derive(Debug, Default, Clone, Args)]
pub struct Overrides {
    /// API base URL
    #[arg(long, global = true, env = "GIGM_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token
    #[arg(long = "auth-token", global = true, env = "GIGM_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// User ID for the bearer token
    #[arg(long = "auth-user", global = true, env = "GIGM_USER_ID")]
    pub user_id: Option<String>,
}

impl Config {
    /// Apply command-line and environment overrides.
    ///
    /// A token override replaces the stored credentials entirely; the user ID
    /// override alone only relabels stored credentials.
    pub fn with_overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(url) = &overrides.api_url {
            self.base_url = Some(url.clone());
        }

        if let Some(token) = &overrides.token {
            self.auth = Some(AuthConfig {
                token: token.clone(),
                user_id: overrides.user_id.clone().unwrap_or_default(),
            });
        } else if let (Some(auth), Some(user_id)) = (self.auth.as_mut(), &overrides.user_id) {
            auth.user_id = user_id.clone();
        }
        self
    }

    /// The effective API base URL.
    pub fn api_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }
}

/// Get the configuration file path.
pub fn config_path() -> Result<PathBuf> {
    let exe_path = env::current_exe().context("Could not determine executable path")?;
    let exe_dir = exe_path
        .parent()
        .context("Could not determine executable directory")?;

    Ok(exe_dir.join("gigm.toml"))
}

/// Load configuration from file.
pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

/// Save configuration to file.
pub fn save_config(config: &Config) -> Result<()> {
    save_config_to(&config_path()?, config)
}

fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path).context("Failed to read config file")?;

    toml::from_str(&content).context("Failed to parse config file")
}

fn save_config_to(path: &Path, config: &Config) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(path, content).context("Failed to write config file")?;

    Ok(())
}

fn client_from(config: Config) -> Result<MarketClient> {
    let mut builder = MarketClient::builder()
        .base_url(config.api_url())
        .on_unauthorized(|| {
            tracing::warn!("The server rejected the token. Run 'gigm auth login' again.");
        });

    if let Some(auth) = config.auth {
        builder = builder.auth(auth.token, auth.user_id);
    }

    builder.build().context("Failed to build marketplace client")
}

/// Build a client from the current configuration.
pub fn build_client(overrides: &Overrides) -> Result<MarketClient> {
    client_from(load_config()?.with_overrides(overrides))
}

/// Build a client that requires authentication.
pub fn build_authed_client(overrides: &Overrides) -> Result<MarketClient> {
    let config = load_config()?.with_overrides(overrides);

    if config.auth.is_none() {
        anyhow::bail!("Authentication required. Run 'gigm auth login' first.");
    }

    client_from(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stored() -> Config {
        Config {
            base_url: Some("https://api.example.com/api/".into()),
            auth: Some(AuthConfig {
                token: "tok".into(),
                user_id: "u1".into(),
            }),
        }
    }

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gigm.toml");

        save_config_to(&path, &stored()).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), stored());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.api_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_token_override_replaces_stored_auth() {
        let overrides = Overrides {
            api_url: Some("http://127.0.0.1:9/api/".into()),
            token: Some("env-token".into()),
            user_id: Some("u9".into()),
        };
        let config = stored().with_overrides(&overrides);

        assert_eq!(config.api_url(), "http://127.0.0.1:9/api/");
        assert_eq!(
            config.auth,
            Some(AuthConfig {
                token: "env-token".into(),
                user_id: "u9".into(),
            })
        );
    }

    #[test]
    fn test_user_override_keeps_stored_token() {
        let overrides = Overrides {
            user_id: Some("u2".into()),
            ..Default::default()
        };
        let config = stored().with_overrides(&overrides);
        let auth = config.auth.unwrap();

        assert_eq!(auth.token, "tok");
        assert_eq!(auth.user_id, "u2");
    }

    #[test]
    fn test_token_override_alone_authenticates() {
        let config = Config::default().with_overrides(&Overrides {
            token: Some("tok".into()),
            ..Default::default()
        });
        let client = client_from(config).unwrap();
        assert!(client.is_authenticated());
    }
}
