use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::engine::trigger::TriggerConfig;

pub const APP_DIR: &str = "academic_survival";
pub const MAX_TEMPERATURE: f32 = 1.5;

/// Per-user directory holding every settings file.
pub fn config_dir() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

fn game_config_path() -> PathBuf {
    config_dir().join("game.json")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:1234/v1".into(),
            model: "local-model".into(),
            api_key: None,
            temperature: 0.7,
            timeout_secs: 120,
        }
    }
}

/// Where quiz questions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizSource {
    /// The main reply carries `[EVENT: QUIZ]` and the question.
    #[default]
    Inline,
    /// A second request, sent without history, writes the question.
    Separate,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSettings {
    pub trigger: TriggerConfig,
    pub quiz_source: QuizSource,
    /// Replaces the built-in persona when set.
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub llm: LlmSettings,
    pub rules: RuleSettings,
}

impl GameConfig {
    /// Clamps values the rest of the game relies on being in range.
    pub fn sanitized(mut self) -> Self {
        let t = self.llm.temperature;
        self.llm.temperature = if t.is_nan() { 0.7 } else { t.clamp(0.0, MAX_TEMPERATURE) };
        if self.llm.timeout_secs == 0 {
            self.llm.timeout_secs = LlmSettings::default().timeout_secs;
        }
        self
    }
}

pub fn load_game_config() -> GameConfig {
    load_game_config_from(&game_config_path())
}

/// Missing or unreadable files fall back to defaults.
pub fn load_game_config_from(path: &Path) -> GameConfig {
    let config = match fs::read_to_string(path) {
        Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            warn!("ignoring malformed {}: {}", path.display(), e);
            GameConfig::default()
        }),
        Err(_) => GameConfig::default(),
    };
    config.sanitized()
}

pub fn save_game_config(config: &GameConfig) -> anyhow::Result<()> {
    save_game_config_to(config, &game_config_path())
}

pub fn save_game_config_to(config: &GameConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
