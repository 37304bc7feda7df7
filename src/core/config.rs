use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::api::client::GenerationConfig;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 1.0;
pub const DEFAULT_TOP_P: f32 = 0.95;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 500;
/// Delay between revealed words of an assistant reply.
pub const DEFAULT_WORD_DELAY_MS: u64 = 75;

/// Keys accepted by `parlance set` / `parlance unset`.
pub const SETTING_KEYS: &[&str] = &[
    "base-url",
    "model",
    "temperature",
    "top-p",
    "max-output-tokens",
    "word-delay-ms",
];

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the completion API (e.g. "https://api.openai.com/v1")
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_output_tokens: Option<u32>,
    /// Milliseconds between words when revealing a reply
    pub word_delay_ms: Option<u64>,
}

#[derive(Debug)]
pub enum SettingError {
    UnknownKey(String),
    InvalidValue { key: String, value: String },
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => write!(
                f,
                "Unknown config key: {key} (expected one of: {})",
                SETTING_KEYS.join(", ")
            ),
            SettingError::InvalidValue { key, value } => {
                write!(f, "Invalid value for {key}: {value}")
            }
        }
    }
}

impl Error for SettingError {}

impl Config {
    pub fn load() -> Result<Config, Box<dyn Error>> {
        let config_path = Self::get_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(config_path: &Path) -> Result<Config, Box<dyn Error>> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path)?;
            let config: Config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        let config_path = Self::get_config_path()?;
        self.save_to_path(&config_path)
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<(), Box<dyn Error>> {
        let parent = config_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };

        temp_file.write_all(contents.as_bytes())?;
        temp_file.as_file_mut().sync_all()?;
        temp_file
            .persist(config_path)
            .map_err(|err| -> Box<dyn Error> { Box::new(err) })?;
        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf, Box<dyn Error>> {
        let proj_dirs = ProjectDirs::from("org", "parlance", "parlance")
            .ok_or("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Base URL precedence: `OPENAI_BASE_URL`, then config, then the default.
    pub fn resolve_base_url(&self, env_override: Option<String>) -> String {
        env_override
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn generation_config(&self, model_override: Option<&str>) -> GenerationConfig {
        GenerationConfig {
            model: model_override
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .or_else(|| self.model.clone())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            top_p: self.top_p.unwrap_or(DEFAULT_TOP_P),
            max_output_tokens: self.max_output_tokens.unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS),
        }
    }

    pub fn word_delay_ms(&self) -> u64 {
        self.word_delay_ms.unwrap_or(DEFAULT_WORD_DELAY_MS)
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), SettingError> {
        let invalid = || SettingError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            "base-url" => {
                if value.trim().is_empty() {
                    return Err(invalid());
                }
                self.base_url = Some(value.trim().to_string());
            }
            "model" => {
                if value.trim().is_empty() {
                    return Err(invalid());
                }
                self.model = Some(value.trim().to_string());
            }
            "temperature" => {
                let parsed: f32 = value.parse().map_err(|_| invalid())?;
                if !(0.0..=2.0).contains(&parsed) {
                    return Err(invalid());
                }
                self.temperature = Some(parsed);
            }
            "top-p" => {
                let parsed: f32 = value.parse().map_err(|_| invalid())?;
                if !(0.0..=1.0).contains(&parsed) {
                    return Err(invalid());
                }
                self.top_p = Some(parsed);
            }
            "max-output-tokens" => {
                let parsed: u32 = value.parse().map_err(|_| invalid())?;
                if parsed == 0 {
                    return Err(invalid());
                }
                self.max_output_tokens = Some(parsed);
            }
            "word-delay-ms" => {
                self.word_delay_ms = Some(value.parse().map_err(|_| invalid())?);
            }
            _ => return Err(SettingError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: &str) -> Result<(), SettingError> {
        match key {
            "base-url" => self.base_url = None,
            "model" => self.model = None,
            "temperature" => self.temperature = None,
            "top-p" => self.top_p = None,
            "max-output-tokens" => self.max_output_tokens = None,
            "word-delay-ms" => self.word_delay_ms = None,
            _ => return Err(SettingError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn print_all(&self) {
        println!("Current configuration:");
        let generation = self.generation_config(None);
        println!(
            "  base-url: {}",
            self.base_url.as_deref().unwrap_or("(unset)")
        );
        println!("  model: {}", generation.model);
        println!("  temperature: {}", generation.temperature);
        println!("  top-p: {}", generation.top_p);
        println!("  max-output-tokens: {}", generation.max_output_tokens);
        println!("  word-delay-ms: {}", self.word_delay_ms());
    }
}
