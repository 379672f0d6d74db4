use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "snake_case")]
pub enum Message {
    /// Prompt sent on behalf of the training module
    User(String),
    /// Reply produced by the participant's agent
    Agent(String),
}

/// One participant's running conversation with the agent.
/// Each participant gets its own; nothing is shared across journeys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    pub participant: String,
    /// Persona instructions placed ahead of the history
    pub system: String,
    pub history: Vec<Message>,
}

impl Conversation {
    pub fn new(participant: impl Into<String>, system: impl Into<String>) -> Self {
        Self {
            participant: participant.into(),
            system: system.into(),
            history: Vec::new(),
        }
    }

    pub fn record(&mut self, prompt: &str, reply: &str) {
        self.history.push(Message::User(prompt.to_string()));
        self.history.push(Message::Agent(reply.to_string()));
    }

    /// Number of completed prompt/reply exchanges
    pub fn turns(&self) -> usize {
        self.history
            .iter()
            .filter(|m| matches!(m, Message::Agent(_)))
            .count()
    }
}
