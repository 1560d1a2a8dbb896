use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::ChatSettings;

use super::ChatError;
use super::relay::{ChatBackend, ChatSession};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: &'a [Content],
    system_instruction: &'a Content,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

/// Concatenated text parts of the first candidate; empty when there is none.
fn extract_reply(response: &GenerateResponse) -> String {
    response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Gemini `generateContent` over blocking HTTP.
pub struct GeminiBackend {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiBackend {
    pub fn new(settings: &ChatSettings) -> Result<Self, ChatError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string),
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl ChatBackend for GeminiBackend {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn start_session(&self, system_instruction: &str) -> Result<Box<dyn ChatSession>, ChatError> {
        let api_key = self.api_key.clone().ok_or(ChatError::MissingApiKey)?;
        Ok(Box::new(GeminiSession {
            client: self.client.clone(),
            url: self.url(),
            api_key,
            system: Content::text(None, system_instruction),
            history: Vec::new(),
        }))
    }
}

/// Conversation state: the full `user`/`model` turn history is resent on
/// every request.
pub struct GeminiSession {
    client: Client,
    url: String,
    api_key: String,
    system: Content,
    history: Vec<Content>,
}

impl GeminiSession {
    pub fn turns(&self) -> usize {
        self.history.len()
    }

    fn request_body(&self) -> GenerateRequest<'_> {
        GenerateRequest {
            contents: &self.history,
            system_instruction: &self.system,
        }
    }

    fn request(&self) -> Result<String, ChatError> {
        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&self.request_body())
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: GenerateResponse = serde_json::from_str(&body)?;
        Ok(extract_reply(&parsed))
    }
}

impl ChatSession for GeminiSession {
    fn send(&mut self, message: &str) -> Result<String, ChatError> {
        self.history.push(Content::text(Some("user"), message));
        match self.request() {
            Ok(reply) if !reply.trim().is_empty() => {
                self.history.push(Content::text(Some("model"), &reply));
                Ok(reply)
            }
            outcome => {
                // Keep user/model turns alternating.
                self.history.pop();
                outcome
            }
        }
    }
}
