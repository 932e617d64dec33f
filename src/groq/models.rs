// src/groq/models.rs
use serde::{Deserialize, Serialize};

use crate::locators::PageClassification;
use crate::utils::error::ModelError;

/// Body of an OpenAI-compatible chat completion request.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
}

impl ChatCompletionResponse {
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.message.content.as_deref())
    }
}

/// Reads a `YES [page]` / `NO` reply. Anything else is malformed.
pub fn parse_classification(reply: &str) -> Result<PageClassification, ModelError> {
    let normalized = reply.trim().trim_matches(|c: char| c == '.' || c == '"').to_uppercase();
    let mut words = normalized.split(|c: char| c.is_whitespace() || c == ',' || c == ':');

    match words.next() {
        Some("YES") => {
            let hint = words.find_map(|w| w.trim_matches('.').parse::<usize>().ok()).filter(|n| *n > 0);
            Ok(PageClassification::positive(hint))
        }
        Some("NO") => Ok(PageClassification::negative()),
        _ => Err(ModelError::Malformed(format!("unexpected reply '{}'", reply.trim()))),
    }
}
