use std::path::PathBuf;
use std::time::Duration;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::completion::GenerationParams;
use crate::languages::{Language, LanguageCatalog};
use crate::proxy::DEFAULT_SOURCES;
use crate::retry::RetryPolicy;
use crate::session::Settings;
use crate::splitter::TextSplitter;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub default_lang: Option<String>,
    pub default_format: Option<String>,
    pub default_model: Option<String>,
    pub max_duration_secs: Option<u64>,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_secs: Option<u64>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub proxy_sources: Option<Vec<String>>,
    pub languages: Option<Vec<Language>>,
}

impl Config {
    /// Load config from ~/.config/ytsum/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    /// Workflow settings from this file, with `lang`/`model` overriding it
    /// when given on the command line
    pub fn settings(&self, lang: Option<&str>, model: Option<&str>) -> crate::Result<Settings> {
        let defaults = Settings::default();
        let default_splitter = defaults.splitter;
        let default_retry = defaults.retry;

        let splitter = TextSplitter::new(
            self.chunk_size.unwrap_or(default_splitter.max_chars()),
            self.chunk_overlap.unwrap_or(default_splitter.overlap_chars()),
        )?;

        let retry = RetryPolicy::new(
            self.retry_attempts.unwrap_or(default_retry.max_attempts()),
            self.retry_delay_secs
                .map(Duration::from_secs)
                .unwrap_or(default_retry.delay()),
        );

        let generation = GenerationParams {
            model: model
                .or(self.default_model.as_deref())
                .map(str::to_string)
                .unwrap_or(defaults.generation.model),
            temperature: self.temperature.unwrap_or(defaults.generation.temperature),
            max_tokens: self.max_tokens.unwrap_or(defaults.generation.max_tokens),
        };

        Ok(Settings {
            preferred_language: lang
                .or(self.default_lang.as_deref())
                .map(str::to_string)
                .unwrap_or(defaults.preferred_language),
            max_duration_secs: self.max_duration_secs.unwrap_or(defaults.max_duration_secs),
            splitter,
            retry,
            generation,
        })
    }

    pub fn proxy_sources(&self) -> Vec<String> {
        self.proxy_sources
            .clone()
            .unwrap_or_else(|| DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect())
    }

    pub fn language_catalog(&self) -> LanguageCatalog {
        match &self.languages {
            Some(languages) => LanguageCatalog::new(languages.iter().cloned()),
            None => LanguageCatalog::default(),
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytsum")
        .join("config.toml")
}
