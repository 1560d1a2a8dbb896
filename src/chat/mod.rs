//! Zen assistant chat: a relay in front of a generative-language backend,
//! run on its own worker thread so the UI loop never blocks on the network.

mod gemini;
mod plugin;
mod relay;
mod worker;

use thiserror::Error;

pub use gemini::{GeminiBackend, GeminiSession};
pub use plugin::{ChatPlugin, ChatZones};
pub use relay::{
    ChatBackend, ChatRelay, ChatSession, FALLBACK_EMPTY_REPLY, FALLBACK_ERROR, FALLBACK_UNAVAILABLE,
};
pub use worker::{ChatReply, ChatWorker};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat backend has no API key configured")]
    MissingApiKey,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend answered with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode backend response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("chat worker is no longer running")]
    WorkerGone,
}
