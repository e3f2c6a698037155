use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::mode::{ChatMode, UploadMode};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const BACKEND_URL_ENV: &str = "BACKEND_URL";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub backend_url: Option<String>,
    pub upload_mode: Option<String>,
    pub chat_mode: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Backend origin: explicit flag, then environment, then config file, then default.
    pub fn resolve_backend_url(&self, flag: Option<String>, env: Option<String>) -> String {
        flag.or(env)
            .or_else(|| self.backend_url.clone())
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
    }

    pub fn backend_url_from_env() -> Option<String> {
        std::env::var(BACKEND_URL_ENV).ok()
    }

    pub fn upload_mode(&self) -> UploadMode {
        self.upload_mode
            .as_deref()
            .and_then(UploadMode::from_str)
            .unwrap_or_default()
    }

    pub fn chat_mode(&self) -> ChatMode {
        self.chat_mode
            .as_deref()
            .and_then(ChatMode::from_str)
            .unwrap_or_default()
    }

    pub fn save_modes(upload: UploadMode, chat: ChatMode) -> Result<()> {
        let mut config = Self::load().unwrap_or_else(|_| Self::new());
        config.upload_mode = Some(upload.as_str().to_string());
        config.chat_mode = Some(chat.as_str().to_string());
        config.save()
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("finsight").join("config.json"))
    }
}
