use crate::catalog::client::{DEFAULT_API_URL, DEFAULT_TOKEN_URL};
use crate::catalog::{Credentials, Endpoints};
use crate::markers::TrimPolicy;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CLIENT_ID_VAR: &str = "CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "CLIENT_SECRET";

/// Application configuration loaded from ~/.config/chapterize/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub ffmpeg: FfmpegConfig,
    #[serde(default)]
    pub chapters: ChaptersConfig,
}

/// Catalog API access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Overridden by the CLIENT_ID environment variable
    pub client_id: Option<String>,
    /// Overridden by the CLIENT_SECRET environment variable
    pub client_secret: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Market (ISO country code) sent with search and chapter requests
    pub market: Option<String>,
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_search_limit() -> u32 {
    1
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            api_url: default_api_url(),
            token_url: default_token_url(),
            market: None,
            search_limit: default_search_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FfmpegConfig {
    /// ffmpeg executable, looked up on PATH unless absolute
    #[serde(default = "default_ffmpeg")]
    pub path: PathBuf,
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            path: default_ffmpeg(),
        }
    }
}

/// How catalog chapters are turned into markers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChaptersConfig {
    #[serde(default)]
    pub trim_last: TrimMode,
    /// Used by `trim_last = "shorter-than"`
    #[serde(default = "default_trim_threshold")]
    pub trim_threshold_ms: u64,
    /// Keep chapters already in the file instead of replacing them
    #[serde(default)]
    pub keep_existing: bool,
}

fn default_trim_threshold() -> u64 {
    5000
}

impl Default for ChaptersConfig {
    fn default() -> Self {
        Self {
            trim_last: TrimMode::default(),
            trim_threshold_ms: default_trim_threshold(),
            keep_existing: false,
        }
    }
}

/// Trailing chapter handling as named in config and on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TrimMode {
    /// Drop the last chapter when there is more than one
    #[default]
    Always,
    /// Keep every chapter
    Never,
    /// Drop the last chapter only when it is shorter than the threshold
    ShorterThan,
}

impl Config {
    /// Load configuration from the default path (~/.config/chapterize/config.toml)
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;

        toml::from_str(&content).with_context(|| format!("Failed to parse {:?}", path))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("chapterize").join("config.toml"))
    }

    /// Client credentials, with environment variables taking precedence
    pub fn credentials(&self) -> Result<Credentials> {
        self.credentials_with(|name| std::env::var(name).ok())
    }

    fn credentials_with<F>(&self, env: F) -> Result<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |var: &str, configured: &Option<String>| {
            env(var)
                .or_else(|| configured.clone())
                .filter(|v| !v.trim().is_empty())
        };

        match (
            pick(CLIENT_ID_VAR, &self.catalog.client_id),
            pick(CLIENT_SECRET_VAR, &self.catalog.client_secret),
        ) {
            (Some(client_id), Some(client_secret)) => Ok(Credentials {
                client_id,
                client_secret,
            }),
            _ => bail!(
                "{} and {} must be set in the environment or under [catalog] in the config file",
                CLIENT_ID_VAR,
                CLIENT_SECRET_VAR
            ),
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            api_url: self.catalog.api_url.trim_end_matches('/').to_string(),
            token_url: self.catalog.token_url.clone(),
            market: self.catalog.market.clone(),
        }
    }

    /// Get the trim policy, with CLI overrides taking precedence
    pub fn trim_policy(&self, mode: Option<TrimMode>, threshold_ms: Option<u64>) -> TrimPolicy {
        match mode.unwrap_or(self.chapters.trim_last) {
            TrimMode::Always => TrimPolicy::Always,
            TrimMode::Never => TrimPolicy::Never,
            TrimMode::ShorterThan => TrimPolicy::ShorterThan(
                threshold_ms.unwrap_or(self.chapters.trim_threshold_ms),
            ),
        }
    }

    /// Get the ffmpeg executable, with CLI override taking precedence
    pub fn ffmpeg(&self, cli_override: Option<&PathBuf>) -> PathBuf {
        cli_override
            .cloned()
            .unwrap_or_else(|| self.ffmpeg.path.clone())
    }

    /// Whether to keep existing chapters; either the flag or config can enable it
    pub fn keep_chapters(&self, cli_flag: bool) -> bool {
        cli_flag || self.chapters.keep_existing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(config.catalog.client_id.is_none());
        assert_eq!(config.catalog.api_url, "https://api.spotify.com/v1");
        assert_eq!(config.catalog.search_limit, 1);
        assert_eq!(config.ffmpeg.path, PathBuf::from("ffmpeg"));
        assert_eq!(config.chapters.trim_last, TrimMode::Always);
    }

    #[test]
    fn test_load_valid_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[catalog]
client_id = "abc"
client_secret = "xyz"
market = "US"

[ffmpeg]
path = "/opt/ffmpeg/bin/ffmpeg"

[chapters]
trim_last = "shorter-than"
trim_threshold_ms = 8000
keep_existing = true
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.catalog.client_id, Some("abc".to_string()));
        assert_eq!(config.catalog.market, Some("US".to_string()));
        assert_eq!(config.catalog.token_url, "https://accounts.spotify.com/api/token");
        assert_eq!(config.ffmpeg.path, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(config.trim_policy(None, None), TrimPolicy::ShorterThan(8000));
        assert!(config.keep_chapters(false));
    }

    #[test]
    fn test_invalid_config_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[chapters]\ntrim_last = \"sometimes\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_cli_override() {
        let config = Config::default();

        assert_eq!(config.trim_policy(None, None), TrimPolicy::Always);
        assert_eq!(
            config.trim_policy(Some(TrimMode::Never), None),
            TrimPolicy::Never
        );
        assert_eq!(
            config.trim_policy(Some(TrimMode::ShorterThan), Some(1234)),
            TrimPolicy::ShorterThan(1234)
        );
        assert_eq!(
            config.ffmpeg(Some(&PathBuf::from("/cli/ffmpeg"))),
            PathBuf::from("/cli/ffmpeg")
        );
        assert_eq!(config.ffmpeg(None), PathBuf::from("ffmpeg"));
        assert!(config.keep_chapters(true));
        assert!(!config.keep_chapters(false));
    }

    #[test]
    fn test_environment_credentials_take_precedence() {
        let mut config = Config::default();
        config.catalog.client_id = Some("file-id".to_string());
        config.catalog.client_secret = Some("file-secret".to_string());

        let creds = config
            .credentials_with(|name| (name == CLIENT_ID_VAR).then(|| "env-id".to_string()))
            .unwrap();
        assert_eq!(creds.client_id, "env-id");
        assert_eq!(creds.client_secret, "file-secret");
    }

    #[test]
    fn test_missing_credentials() {
        let mut config = Config::default();
        config.catalog.client_id = Some("only-id".to_string());

        let err = config.credentials_with(|_| None).unwrap_err();
        assert!(err.to_string().contains("CLIENT_SECRET"));
    }

    #[test]
    fn test_endpoints_strip_trailing_slash() {
        let mut config = Config::default();
        config.catalog.api_url = "http://localhost:8080/v1/".to_string();
        assert_eq!(config.endpoints().api_url, "http://localhost:8080/v1");
    }
}
