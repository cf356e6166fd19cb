use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::TextGenerator;
use crate::{Result, ScribeError};

/// Hosted models reachable through an OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Gemini,
    Openai,
    Grok,
}

pub struct ProviderConfig {
    pub api_url: &'static str,
    pub model: &'static str,
    pub env_var: &'static str,
}

impl Provider {
    pub fn config(&self) -> ProviderConfig {
        match self {
            Provider::Gemini => ProviderConfig {
                api_url: "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions",
                model: "gemini-2.5-flash",
                env_var: "GEMINI_API_KEY",
            },
            Provider::Openai => ProviderConfig {
                api_url: "https://api.openai.com/v1/chat/completions",
                model: "gpt-4o-mini",
                env_var: "OPENAI_API_KEY",
            },
            Provider::Grok => ProviderConfig {
                api_url: "https://api.x.ai/v1/chat/completions",
                model: "grok-4-fast",
                env_var: "XAI_API_KEY",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::Openai => "OpenAI",
            Provider::Grok => "Grok",
        }
    }
}

/// Text generator speaking the chat completions protocol
pub struct ChatCompletionGenerator {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TopicList {
    topics: Vec<String>,
}

impl ChatCompletionGenerator {
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        let config = provider.config();
        Self {
            client: Client::new(),
            api_url: config.api_url.into(),
            api_key: api_key.into(),
            model: config.model.into(),
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Send one user prompt and return the text of the first choice
    pub async fn complete(&self, prompt: String, json_output: bool) -> Result<String> {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "user",
                    "content": prompt
                }
            ]
        });
        if json_output {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(ScribeError::SourceApi { status, message });
        }

        let response = resp.json::<CompletionResponse>().await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ScribeError::generation("No content in response"))
    }
}

fn transcript_prompt(title: &str, language: &str) -> String {
    format!(
        "Generate a plausible, paragraph-based {language} transcript for a YouTube video titled \"{title}\". \
         Make it about 250 words long and realistic for a tutorial or informational video. \
         Format it into several paragraphs separated by double newlines for readability. \
         Reply with the transcript only."
    )
}

fn summary_prompt(transcript: &str) -> String {
    format!(
        "Summarize the following video transcript in one short paragraph of at most 80 words. \
         Reply with the summary only.\n\n{transcript}"
    )
}

fn key_topics_prompt(transcript: &str) -> String {
    format!(
        "Extract the 3 to 7 key topics discussed in the following video transcript, most important first. \
         Reply with a JSON object of the form {{\"topics\": [\"...\"]}}.\n\n{transcript}"
    )
}

/// Parse the topic list out of a model reply, tolerating markdown code fences
pub(crate) fn parse_topics(reply: &str) -> Result<Vec<String>> {
    let trimmed = reply.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let topics = match serde_json::from_str::<TopicList>(json) {
        Ok(list) => list.topics,
        Err(_) => serde_json::from_str::<Vec<String>>(json)?,
    };

    Ok(topics
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}

#[async_trait]
impl TextGenerator for ChatCompletionGenerator {
    async fn transcript(&self, title: &str, language: &str) -> Result<String> {
        let text = self.complete(transcript_prompt(title, language), false).await?;
        Ok(text.trim().to_string())
    }

    async fn summary(&self, transcript: &str) -> Result<String> {
        let text = self.complete(summary_prompt(transcript), false).await?;
        Ok(text.trim().to_string())
    }

    async fn key_topics(&self, transcript: &str) -> Result<Vec<String>> {
        let reply = self.complete(key_topics_prompt(transcript), true).await?;
        parse_topics(&reply)
    }
}
