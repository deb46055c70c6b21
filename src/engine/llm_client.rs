use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmSettings;
use crate::engine::error::ProviderError;
use crate::logutil::preview;
use crate::model::message::{Message, Speaker};

/// The single call the game makes to a chat model.
pub trait LlmClient {
    fn ask(
        &self,
        system_instruction: &str,
        prior_turns: &[Message],
        prompt: &str,
        temperature: f32,
    ) -> Result<String, ProviderError>;
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessageResponse {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

/// OpenAI-compatible chat completions client, LM Studio by default.
pub struct LmStudioClient {
    http: Client,
    settings: LlmSettings,
}

impl LmStudioClient {
    pub fn new(settings: LlmSettings) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self { http, settings })
    }

    pub fn build_request(
        &self,
        system_instruction: &str,
        prior_turns: &[Message],
        prompt: &str,
        temperature: f32,
    ) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(prior_turns.len() + 2);
        messages.push(ChatMessage::new("system", system_instruction));
        for turn in prior_turns {
            let role = match turn.speaker {
                Speaker::Player => "user",
                Speaker::Narrator => "assistant",
            };
            messages.push(ChatMessage::new(role, &turn.text));
        }
        messages.push(ChatMessage::new("user", prompt));

        ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages,
            temperature,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.endpoint.trim_end_matches('/'), path)
    }

    fn authorize(&self, req: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        match self.settings.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    pub fn test_connection(&self) -> Result<String, ProviderError> {
        let resp = self.authorize(self.http.get(self.url("models"))).send()?;
        let resp = check_status(resp)?;
        let models: ModelList = resp.json()?;
        Ok(format!("Connected ({} models available)", models.data.len()))
    }
}

impl LlmClient for LmStudioClient {
    fn ask(
        &self,
        system_instruction: &str,
        prior_turns: &[Message],
        prompt: &str,
        temperature: f32,
    ) -> Result<String, ProviderError> {
        let req = self.build_request(system_instruction, prior_turns, prompt, temperature);
        debug!(
            "ask {} with {} prior turns: {}",
            req.model,
            prior_turns.len(),
            preview(prompt)
        );

        let resp = self
            .authorize(self.http.post(self.url("chat/completions")))
            .json(&req)
            .send()?;
        let resp = check_status(resp)?;
        let body: ChatCompletionResponse = resp.json()?;
        extract_content(body)
    }
}

fn check_status(
    resp: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let code = status.as_u16();
    warn!("model server answered HTTP {}", code);
    match code {
        401 | 403 => Err(ProviderError::Auth(code)),
        429 => Err(ProviderError::Quota),
        _ => Err(ProviderError::Status {
            status: code,
            body: preview(&resp.text().unwrap_or_default()),
        }),
    }
}

fn extract_content(body: ChatCompletionResponse) -> Result<String, ProviderError> {
    let content = body
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| ProviderError::Malformed("no choices in completion".into()))?;

    if content.trim().is_empty() {
        return Err(ProviderError::Malformed("empty completion".into()));
    }
    Ok(content)
}
