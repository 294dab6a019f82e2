use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::subtitle::grouper::DEFAULT_MIN_CHARS;

/// Language hint handed to whisper. `Auto` lets the model detect it.
#[derive(Clone, PartialEq, Eq, Debug, Hash, Default)]
pub enum Language {
    #[default]
    Auto,
    Code(String),
}

impl Language {
    pub fn as_str(&self) -> &str {
        match self {
            Language::Auto => "auto",
            Language::Code(code) => code,
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_lowercase();
        if code == "auto" {
            return Ok(Language::Auto);
        }
        match whisper_rs::get_lang_id(&code) {
            Some(_) => Ok(Language::Code(code)),
            None => Err(format!("unsupported language: {}", s)),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Language {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub subtitle: SubtitleConfig,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct TranscriptionConfig {
    #[serde(default)]
    pub models: HashMap<Language, PathBuf>,
}

impl TranscriptionConfig {
    /// Model for `lang`, falling back to the `auto` entry.
    pub fn model_for(&self, lang: &Language) -> Option<&Path> {
        self.models
            .get(lang)
            .or_else(|| self.models.get(&Language::Auto))
            .map(PathBuf::as_path)
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct SubtitleConfig {
    pub min_chars: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct RunConfig {
    pub whisper: Option<WhisperConfig>,
    pub subtitle: Option<SubtitleConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WhisperConfig {
    pub beam_size: Option<u32>,
    pub patience: Option<f32>,
    pub temperature: Option<f32>,
    pub initial_prompt: Option<String>,
    pub word_timestamps: Option<bool>,
    pub vad_model: Option<PathBuf>, // silero ggml model, enables VAD when set
}

pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().context("Could not find home directory")?;
    Ok(home.join(".subline"))
}

/// Loads `~/.subline/config.yaml`. A missing file means defaults.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let config_path = config_dir()?.join("config.yaml");

    if !config_path.exists() {
        log::debug!("No config file at {:?}, using defaults", config_path);
        return Ok(AppConfig::default());
    }

    load_app_config_from(&config_path)
}

pub fn load_app_config_from(path: &Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {:?}", path))?;
    let config: AppConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config {:?}", path))?;
    Ok(config)
}

pub fn load_run_config(path: &Path) -> anyhow::Result<RunConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile {:?}", path))?;
    let config: RunConfig = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse profile {:?}", path))?;
    Ok(config)
}

pub fn resolve_profile_path(profile: &str) -> anyhow::Result<PathBuf> {
    if let Some(rest) = profile.strip_prefix("~/") {
        let home = dirs::home_dir().context("Could not find home directory")?;
        return Ok(home.join(rest));
    }

    let path = PathBuf::from(profile);
    if path.is_absolute() || profile.starts_with("./") || profile.starts_with("../") {
        return Ok(path);
    }

    Ok(config_dir()?
        .join("profiles")
        .join(format!("{}.yaml", profile)))
}

/// flag > profile > app config > default
pub fn resolve_min_chars(
    flag: Option<usize>,
    run_config: Option<&RunConfig>,
    app_config: &AppConfig,
) -> anyhow::Result<usize> {
    let min_chars = flag
        .or_else(|| {
            run_config
                .and_then(|rc| rc.subtitle.as_ref())
                .and_then(|sc| sc.min_chars)
        })
        .or(app_config.subtitle.min_chars)
        .unwrap_or(DEFAULT_MIN_CHARS);

    if min_chars == 0 {
        bail!("min_chars must be a positive integer");
    }
    Ok(min_chars)
}
