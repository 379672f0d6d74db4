use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::message::{Conversation, Message};
use crate::settings::AgentSettings;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent did not answer within {0:?}")]
    Timeout(Duration),

    #[error("agent request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("agent returned no completion")]
    EmptyCompletion,

    #[error("{0}")]
    Failed(String),
}

/// The participant's voice. One blocking call per prompt; the agent reads
/// the participant's conversation so far but never changes it.
pub trait Agent {
    fn converse(&self, conversation: &Conversation, prompt: &str) -> Result<String, AgentError>;
}

impl<F> Agent for F
where
    F: Fn(&Conversation, &str) -> Result<String, AgentError>,
{
    fn converse(&self, conversation: &Conversation, prompt: &str) -> Result<String, AgentError> {
        self(conversation, prompt)
    }
}

#[derive(Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub struct Choice {
    pub message: ChatMessageResponse,
}

#[derive(Deserialize)]
pub struct ChatMessageResponse {
    #[serde(default)]
    pub content: Option<String>,
}

/// Agent backed by an OpenAI-compatible chat completions endpoint.
pub struct ChatAgent {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    timeout: Duration,
    api_key: Option<String>,
}

impl ChatAgent {
    pub fn new(settings: &AgentSettings) -> Result<Self, AgentError> {
        let timeout = Duration::from_secs(settings.timeout_secs.max(1));
        let client = Client::builder().timeout(timeout).build()?;
        let api_key = std::env::var(&settings.api_key_env).ok();

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            timeout,
            api_key,
        })
    }

    /// Local servers (LM Studio, Ollama) run without a key.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn build_messages(conversation: &Conversation, prompt: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(conversation.history.len() + 2);

        if !conversation.system.is_empty() {
            messages.push(ChatMessage {
                role: "system".into(),
                content: conversation.system.clone(),
            });
        }

        for message in &conversation.history {
            let (role, content) = match message {
                Message::User(text) => ("user", text),
                Message::Agent(text) => ("assistant", text),
            };
            messages.push(ChatMessage {
                role: role.into(),
                content: content.clone(),
            });
        }

        messages.push(ChatMessage {
            role: "user".into(),
            content: prompt.to_string(),
        });

        messages
    }

    fn map_err(&self, e: reqwest::Error) -> AgentError {
        if e.is_timeout() {
            AgentError::Timeout(self.timeout)
        } else {
            AgentError::Http(e)
        }
    }

    /// Lists the models the endpoint serves.
    pub fn check_connection(&self) -> Result<String, AgentError> {
        let mut req = self.client.get(format!("{}/models", self.base_url));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp: serde_json::Value = req
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| self.map_err(e))?;

        Ok(format!(
            "Connected ({} models available)",
            resp["data"].as_array().map(|a| a.len()).unwrap_or(0)
        ))
    }
}

impl Agent for ChatAgent {
    fn converse(&self, conversation: &Conversation, prompt: &str) -> Result<String, AgentError> {
        let req = ChatCompletionRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages: Self::build_messages(conversation, prompt),
        };

        debug!(
            participant = %conversation.participant,
            turns = conversation.turns(),
            "sending prompt to agent"
        );

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&req);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let resp = builder
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json::<ChatCompletionResponse>())
            .map_err(|e| self.map_err(e))?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(AgentError::EmptyCompletion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_history_in_order() {
        let mut conversation = Conversation::new("Alex Chen", "You are Alex.");
        conversation.record("first prompt", "first reply");

        let messages = ChatAgent::build_messages(&conversation, "second prompt");
        let roles: Vec<&str> = messages.iter().map(|m| m.role.as_str()).collect();

        assert_eq!(roles, ["system", "user", "assistant", "user"]);
        assert_eq!(messages[3].content, "second prompt");
    }

    #[test]
    fn closures_are_agents() {
        let agent = |_: &Conversation, prompt: &str| Ok::<_, AgentError>(prompt.to_uppercase());
        let reply = agent.converse(&Conversation::default(), "choice: b").unwrap();
        assert_eq!(reply, "CHOICE: B");
    }
}
