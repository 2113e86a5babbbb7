use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::core::lookback::DEFAULT_HORIZON_DAYS;

pub const LEDGER_FILE: &str = "price_history.csv";
pub const NORMALIZED_LEDGER_FILE: &str = "price_history_normalized.csv";

const DEFAULT_DATASET_URL: &str = "http://datos.energia.gob.ar/dataset/1c181390-5045-475e-94dc-410429be4b17/resource/80ac25de-a44a-4445-9215-090cf55cfda5/download/precios-en-surtidor-resolucin-3142016.csv";
const DEFAULT_TELEGRAM_URL: &str = "https://api.telegram.org";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SourceConfig {
    pub url: String,
    pub product: String,
    pub company: String,
    /// Label used in reports, defaults to `product`.
    pub label: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            url: DEFAULT_DATASET_URL.to_string(),
            product: "Nafta (súper) entre 92 y 95 Ron".to_string(),
            company: "YPF".to_string(),
            label: None,
        }
    }
}

impl SourceConfig {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.product)
    }
}

/// One entry of the exchange-rate priority list.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RateProviderConfig {
    Http { url: String },
    File { path: String },
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub base_url: Option<String>,
}

/// Telegram settings with every field resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub chat_id: String,
    pub base_url: String,
}

impl TelegramConfig {
    /// Resolves credentials from the file, falling back to
    /// `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`.
    pub fn resolve(&self) -> Option<TelegramSettings> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    fn resolve_with<F: Fn(&str) -> Option<String>>(&self, env: F) -> Option<TelegramSettings> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let bot_token = non_empty(self.bot_token.clone()).or_else(|| non_empty(env("TELEGRAM_BOT_TOKEN")))?;
        let chat_id = non_empty(self.chat_id.clone()).or_else(|| non_empty(env("TELEGRAM_CHAT_ID")))?;
        Some(TelegramSettings {
            bot_token,
            chat_id,
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_TELEGRAM_URL.to_string()),
        })
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct NotifiersConfig {
    pub telegram: Option<TelegramConfig>,
}

fn default_lookback_days() -> i64 {
    DEFAULT_HORIZON_DAYS
}

fn default_http_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    pub data_path: Option<String>,
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    #[serde(default)]
    pub rates: Vec<RateProviderConfig>,
    #[serde(default)]
    pub notifiers: NotifiersConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            source: SourceConfig::default(),
            data_path: None,
            lookback_days: default_lookback_days(),
            http_timeout_secs: default_http_timeout_secs(),
            rates: Vec::new(),
            notifiers: NotifiersConfig::default(),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("ar", "fuelwatch", "fuelwatch")
        .context("Could not determine project directories")
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        Ok(project_dirs()?.data_dir().to_path_buf())
    }

    pub fn ledger_path(&self) -> Result<PathBuf> {
        Ok(self.default_data_path()?.join(LEDGER_FILE))
    }

    pub fn normalized_ledger_path(&self) -> Result<PathBuf> {
        Ok(self.default_data_path()?.join(NORMALIZED_LEDGER_FILE))
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        if config.lookback_days <= 0 {
            anyhow::bail!("lookback_days must be positive, got {}", config.lookback_days);
        }
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
source:
  url: "http://example.com/precios.csv"
  product: "Nafta (premium) de más de 95 Ron"
  company: "SHELL"
  label: "Premium"
data_path: "/tmp/fuelwatch"
lookback_days: 45
http_timeout_secs: 10
rates:
  - kind: http
    url: "http://example.com/rates.csv"
  - kind: file
    path: "/var/lib/rates.csv"
notifiers:
  telegram:
    bot_token: "123:abc"
    chat_id: "-100"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.source.company, "SHELL");
        assert_eq!(config.source.display_label(), "Premium");
        assert_eq!(config.lookback_days, 45);
        assert_eq!(config.http_timeout_secs, 10);
        assert_eq!(
            config.rates,
            vec![
                RateProviderConfig::Http {
                    url: "http://example.com/rates.csv".to_string()
                },
                RateProviderConfig::File {
                    path: "/var/lib/rates.csv".to_string()
                },
            ]
        );
        assert_eq!(
            config.ledger_path().unwrap(),
            PathBuf::from("/tmp/fuelwatch").join(LEDGER_FILE)
        );

        let telegram = config.notifiers.telegram.unwrap().resolve_with(|_| None).unwrap();
        assert_eq!(telegram.bot_token, "123:abc");
        assert_eq!(telegram.base_url, DEFAULT_TELEGRAM_URL);
    }

    #[test]
    fn test_defaults_for_empty_sections() {
        let config: AppConfig = serde_yaml::from_str("data_path: /tmp/x\n").unwrap();
        assert_eq!(config.lookback_days, 30);
        assert_eq!(config.http_timeout_secs, 30);
        assert!(config.rates.is_empty());
        assert!(config.notifiers.telegram.is_none());
        assert_eq!(config.source, SourceConfig::default());
        assert_eq!(config.source.display_label(), config.source.product);
    }

    #[test]
    fn test_telegram_env_fallback() {
        let telegram = TelegramConfig::default();
        assert_eq!(telegram.resolve_with(|_| None), None);

        let resolved = telegram
            .resolve_with(|key| match key {
                "TELEGRAM_BOT_TOKEN" => Some("env-token".to_string()),
                "TELEGRAM_CHAT_ID" => Some("42".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(resolved.bot_token, "env-token");
        assert_eq!(resolved.chat_id, "42");

        // A blank value in the file does not mask the environment
        let blank = TelegramConfig {
            bot_token: Some(" ".to_string()),
            chat_id: Some("7".to_string()),
            base_url: Some("http://localhost".to_string()),
        };
        let resolved = blank
            .resolve_with(|key| (key == "TELEGRAM_BOT_TOKEN").then(|| "env-token".to_string()))
            .unwrap();
        assert_eq!(resolved.bot_token, "env-token");
        assert_eq!(resolved.chat_id, "7");
        assert_eq!(resolved.base_url, "http://localhost");
    }

    #[test]
    fn test_rejects_non_positive_lookback() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "lookback_days: 0\n").unwrap();

        let err = AppConfig::load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains("lookback_days"));
    }
}
