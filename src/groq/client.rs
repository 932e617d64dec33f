// src/groq/client.rs
use std::time::Duration;

use reqwest::header;

use crate::corpus::Page;
use crate::groq::models::{parse_classification, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::locators::{PageClassification, PageClassifier};
use crate::utils::error::ModelError;

pub const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";
const USER_AGENT: &str = concat!("gri_extractor/", env!("CARGO_PKG_VERSION"));

/// Page classifier backed by the Groq chat completions API.
pub struct GroqClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    text_cap: usize,
}

impl GroqClient {
    pub fn new(
        api_key: String,
        model: String,
        endpoint: String,
        timeout: Duration,
        text_cap: usize,
    ) -> Result<Self, ModelError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { http, endpoint, api_key, model, text_cap })
    }

    fn build_prompt(&self, page: &Page) -> String {
        let text: String = page.text().chars().take(self.text_cap).collect();
        format!(
            "Analyze this text from page {number} of a sustainability report.\n\
             Does this page contain a GRI (Global Reporting Initiative) content index, \
             GRI standards disclosure section, or GRI reference table?\n\n\
             Look for:\n\
             - GRI Content Index\n\
             - GRI Standards references\n\
             - Systematic listing of GRI disclosures\n\
             - Table of GRI codes (like 2-1, 3-2, 401-1, etc.)\n\n\
             Text:\n{text}\n\n\
             Answer only: YES or NO. If YES and the index clearly begins on an earlier page, \
             you may append that page number, e.g. \"YES {number}\".",
            number = page.number(),
            text = text,
        )
    }
}

impl PageClassifier for GroqClient {
    async fn classify_page(&self, page: &Page) -> Result<PageClassification, ModelError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(self.build_prompt(page)),
            }],
            temperature: 0.1,
            max_tokens: 10,
        };

        tracing::debug!("Asking {} about page {}", self.model, page.number());
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header(header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await?; // Propagates reqwest::Error as ModelError::Network

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} from {}", status, self.endpoint);
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(ModelError::RateLimited);
            }
            return Err(ModelError::Http(status));
        }

        let body: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Malformed(e.to_string()))?;
        let reply = body
            .first_content()
            .ok_or_else(|| ModelError::Malformed("response has no message content".to_string()))?;

        tracing::debug!("Model replied '{}' for page {}", reply.trim(), page.number());
        parse_classification(reply)
    }
}
