use serde_json::json;

use crate::config::ChatSettings;
use crate::logging::{LogLevel, Logger, emit, json_kv};

use super::ChatError;
use super::gemini::GeminiBackend;

const CHAT_TARGET: &str = "eppa::chat";

pub const FALLBACK_UNAVAILABLE: &str = "Respire fundo... A conexão parece instável no momento.";
pub const FALLBACK_EMPTY_REPLY: &str = "Poderia repetir com calma?";
pub const FALLBACK_ERROR: &str =
    "Houve um pequeno desvio no fluxo. Tente novamente em alguns instantes.";

/// One running conversation with the backend.
pub trait ChatSession: Send {
    fn send(&mut self, message: &str) -> Result<String, ChatError>;
}

pub trait ChatBackend: Send {
    /// Whether credentials are present; an unconfigured backend is never called.
    fn is_configured(&self) -> bool;

    fn start_session(&self, system_instruction: &str) -> Result<Box<dyn ChatSession>, ChatError>;
}

/// Turns user messages into reply text. Never fails: problems surface as one
/// of the fixed fallback replies.
pub struct ChatRelay {
    backend: Box<dyn ChatBackend>,
    system_instruction: String,
    session: Option<Box<dyn ChatSession>>,
    logger: Option<Logger>,
}

impl ChatRelay {
    pub fn new(
        backend: Box<dyn ChatBackend>,
        system_instruction: impl Into<String>,
        logger: Option<Logger>,
    ) -> Self {
        Self {
            backend,
            system_instruction: system_instruction.into(),
            session: None,
            logger,
        }
    }

    /// Relay backed by the Gemini HTTP API.
    pub fn from_settings(settings: &ChatSettings, logger: Option<Logger>) -> Result<Self, ChatError> {
        let backend = GeminiBackend::new(settings)?;
        Ok(Self::new(
            Box::new(backend),
            settings.system_instruction.clone(),
            logger,
        ))
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn send(&mut self, message: &str) -> String {
        if !self.backend.is_configured() {
            self.log(LogLevel::Info, "chat_unavailable", Vec::new());
            return FALLBACK_UNAVAILABLE.to_string();
        }

        match self.exchange(message) {
            Ok(reply) if reply.trim().is_empty() => FALLBACK_EMPTY_REPLY.to_string(),
            Ok(reply) => reply,
            Err(err) => {
                self.log(
                    LogLevel::Warn,
                    "chat_failed",
                    vec![json_kv("error", json!(err.to_string()))],
                );
                FALLBACK_ERROR.to_string()
            }
        }
    }

    fn exchange(&mut self, message: &str) -> Result<String, ChatError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => {
                let session = self.backend.start_session(&self.system_instruction)?;
                self.log(LogLevel::Debug, "chat_session_started", Vec::new());
                session
            }
        };
        self.session.insert(session).send(message)
    }

    fn log(&self, level: LogLevel, message: &str, fields: Vec<(String, serde_json::Value)>) {
        emit(self.logger.as_ref(), level, CHAT_TARGET, message, fields);
    }
}
