use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub server: ServerConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Chat that receives submissions and may use the review commands.
    pub manager_chat_id: i64,
    /// Public URL Telegram should deliver updates to. Registered at startup when set.
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub webhook_path: String,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
}

// ── Raw TOML parse structs (loose: every field optional, env fills the gaps) ──

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    telegram: RawTelegram,
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    store: RawStore,
}

#[derive(Debug, Deserialize, Default)]
struct RawTelegram {
    bot_token: Option<String>,
    manager_chat_id: Option<i64>,
    webhook_url: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawServer {
    bind_address: Option<String>,
    webhook_path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawStore {
    path: Option<PathBuf>,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_webhook_path() -> String {
    "/api/telegram".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("submissions.json")
}

impl Config {
    /// Load configuration from an optional TOML file, then the process environment.
    /// A missing file is fine; a missing bot token or manager chat id is not.
    pub fn load(path: &Path) -> Result<Self> {
        let file = if path.exists() {
            Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?,
            )
        } else {
            None
        };

        Self::from_sources(file.as_deref(), |key| std::env::var(key).ok())
    }

    /// Build a config from TOML text and an environment lookup. Environment wins.
    pub fn from_sources<F>(file: Option<&str>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw: RawConfig = match file {
            Some(content) => toml::from_str(content).context("Failed to parse config file")?,
            None => RawConfig::default(),
        };

        let env = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = env("TELEGRAM_BOT_TOKEN")
            .or(raw.telegram.bot_token)
            .filter(|t| !t.trim().is_empty());
        let Some(bot_token) = bot_token else {
            bail!("Bot token not provided (set TELEGRAM_BOT_TOKEN or [telegram] bot_token)");
        };

        let manager_chat_id = match env("MANAGER_CHAT_ID") {
            Some(value) => value
                .parse::<i64>()
                .with_context(|| format!("MANAGER_CHAT_ID is not a number: {value}"))?,
            None => match raw.telegram.manager_chat_id {
                Some(id) => id,
                None => bail!(
                    "Manager chat id not provided (set MANAGER_CHAT_ID or [telegram] manager_chat_id)"
                ),
            },
        };

        let webhook_url = env("WEBHOOK_URL").or(raw.telegram.webhook_url);

        let bind_address = env("BIND_ADDRESS")
            .or_else(|| env("PORT").map(|port| format!("0.0.0.0:{port}")))
            .or(raw.server.bind_address)
            .unwrap_or_else(default_bind_address);

        let mut webhook_path = env("WEBHOOK_PATH")
            .or(raw.server.webhook_path)
            .unwrap_or_else(default_webhook_path);
        if !webhook_path.starts_with('/') {
            webhook_path.insert(0, '/');
        }

        let store_path = env("STORE_PATH")
            .map(PathBuf::from)
            .or(raw.store.path)
            .unwrap_or_else(default_store_path);

        Ok(Config {
            telegram: TelegramConfig {
                bot_token,
                manager_chat_id,
                webhook_url,
            },
            server: ServerConfig {
                bind_address,
                webhook_path,
            },
            store: StoreConfig { path: store_path },
        })
    }
}
