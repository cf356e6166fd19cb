use async_trait::async_trait;
use playlist_scribe::{Result, ScribeError, TextGenerator};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub struct MockGenerator {
    /// Titles whose transcript generation fails
    pub fail_titles: Vec<String>,
    pub calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockGenerator {
    pub fn failing_for(titles: &[&str]) -> Self {
        Self {
            fail_titles: titles.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn transcript(&self, title: &str, language: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((title.to_string(), language.to_string()));
        if self.fail_titles.iter().any(|t| t == title) {
            return Err(ScribeError::generation("model overloaded"));
        }
        Ok(format!(
            "Welcome to {}.\n\nThis part is spoken in {}.",
            title, language
        ))
    }

    async fn summary(&self, transcript: &str) -> Result<String> {
        Ok(transcript.lines().next().unwrap_or_default().to_string())
    }

    async fn key_topics(&self, _transcript: &str) -> Result<Vec<String>> {
        Ok(vec!["Welcome".to_string(), "Language".to_string()])
    }
}
