use crate::registry::DEFAULT_TEMPERATURE;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file picked up from the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "mychatgpt.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Conversation to open (a new one is created when omitted)
    #[arg(long)]
    pub chat: Option<String>,

    /// Base URL of the completion server
    #[arg(long, env = "MYCHATGPT_BASE_URL")]
    pub base_url: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Directory holding stored conversations
    #[arg(long)]
    pub storage_dir: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub chat: ChatConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub clipboard: ClipboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Request timeout; requests wait indefinitely when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    pub temperature: f32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageProvider {
    File,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub provider: StorageProvider,
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ClipboardConfig {
    /// Program that receives exported text on stdin.
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

impl AppConfig {
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::from_cli(&cli)
    }

    /// Layer defaults, config file, `MYCHATGPT_` environment and CLI flags.
    ///
    /// Priority: CLI flag > environment > config file > defaults.
    pub fn from_cli(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder()
            .set_default("api.base_url", "http://127.0.0.1:3000")?
            .set_default("chat.temperature", f64::from(DEFAULT_TEMPERATURE))?
            .set_default("storage.provider", "file")?
            .set_default("storage.dir", ".mychatgpt/chats")?;

        // Explicit file must exist; the cwd fallback is optional.
        match &cli.config {
            Some(path) => builder = builder.add_source(File::with_name(path).required(true)),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false));
            }
            None => {}
        }

        // E.g. MYCHATGPT_CHAT__TEMPERATURE=0.2
        builder = builder.add_source(
            Environment::with_prefix("MYCHATGPT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(url) = &cli.base_url {
            builder = builder.set_override("api.base_url", url.as_str())?;
        }
        if let Some(temperature) = cli.temperature {
            builder = builder.set_override("chat.temperature", f64::from(temperature))?;
        }
        if let Some(dir) = &cli.storage_dir {
            builder = builder.set_override("storage.dir", dir.as_str())?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}
