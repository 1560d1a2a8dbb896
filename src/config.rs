use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_EVENT_START: &str = "2026-08-14T09:00:00";
pub const DEFAULT_HEADLESS_TICKS: u32 = 8;

const DEFAULT_SYSTEM_INSTRUCTION: &str = "Você é o Assistente Zen do EPPA 2025 (Encontro de Publicidade e Propaganda Acadêmico).

Tema: \"Respire\". Foco em saúde mental, evitar burnout e Slow Content no mercado publicitário.

Diretriz Principal: Aja como um mentor calmo, empático e acolhedor. Se o usuário parecer ansioso ou com pressa, sugira gentilmente uma pausa ou uma respiração profunda. Use frases curtas e gentis.

Detalhes do Evento:
- Data: 14 e 15 de Outubro de 2025.
- Local: Hotel Bourbon, Joinville, SC (Um refúgio no centro).
- Lineup: Focado em \"Slow Marketing\" e criatividade sustentável.

Responda dúvidas sobre a programação e local. Evite termos de urgência como \"corra\", \"últimas vagas\" ou \"imperdível\". Prefira \"garanta seu momento\", \"junte-se a nós\".
Responda sempre em Português.";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid event start `{value}`: {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Settings for the chat backend.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChatSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub system_instruction: String,
    pub timeout_ms: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            timeout_ms: 20_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    #[serde(flatten)]
    pub chat: ChatSettings,
    /// Local date-time the countdown runs towards, `YYYY-MM-DDTHH:MM:SS`.
    pub event_start: String,
    pub submit_latency_ms: u64,
    pub tick_interval_ms: u64,
    pub log_path: Option<PathBuf>,
    pub log_max_bytes: u64,
    /// When set, run this many ticks without a terminal and exit.
    pub headless_ticks: Option<u32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chat: ChatSettings::default(),
            event_start: DEFAULT_EVENT_START.to_string(),
            submit_latency_ms: 2_000,
            tick_interval_ms: 250,
            log_path: None,
            log_max_bytes: 1024 * 1024,
            headless_ticks: None,
        }
    }
}

impl AppConfig {
    /// Read a JSON config file, or start from defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_json_str(&contents)?
            }
            None => Self::default(),
        };
        Ok(config)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(contents)?;
        config.event_start()?;
        Ok(config)
    }

    /// Layer environment variables over the loaded values.
    pub fn from_env(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from `lookup`, normally the process environment.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = lookup("API_KEY") {
            self.chat.api_key = Some(key);
        }
        if let Some(model) = lookup("EPPA_MODEL") {
            self.chat.model = model;
        }
        if let Some(path) = lookup("EPPA_LOG") {
            self.log_path = Some(PathBuf::from(path));
        }
        if let Some(ticks) = lookup("EPPA_HEADLESS_TICKS").and_then(|v| v.parse().ok()) {
            self.headless_ticks = Some(ticks);
        } else if self.headless_ticks.is_none()
            && (lookup("HEADLESS").is_some() || lookup("CI").is_some())
        {
            self.headless_ticks = Some(DEFAULT_HEADLESS_TICKS);
        }
    }

    pub fn event_start(&self) -> Result<NaiveDateTime, ConfigError> {
        self.event_start
            .parse::<NaiveDateTime>()
            .map_err(|source| ConfigError::InvalidDate {
                value: self.event_start.clone(),
                source,
            })
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn submit_latency(&self) -> Duration {
        Duration::from_millis(self.submit_latency_ms)
    }
}
