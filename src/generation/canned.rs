use async_trait::async_trait;
use std::time::Duration;

use super::TextGenerator;
use crate::Result;

const CANNED_TRANSCRIPT: &str = "Hello everyone and welcome back to the channel! In today's video, we're going to take a deep dive into one of the most powerful and flexible layout modules in CSS: Grid Layout. We'll cover everything from the basic concepts to more advanced techniques that will allow you to create complex, responsive layouts with ease.

First, let's talk about the core idea behind CSS Grid. It's a two-dimensional layout system, meaning it can handle both columns and rows, unlike Flexbox which is largely a one-dimensional system. This makes Grid the perfect tool for creating the main page layouts, such as headers, footers, sidebars, and the main content area.

One of the most useful features of Grid is the 'fr' unit, which stands for fractional unit. This allows you to divide the available space in a flexible way. For example, 'grid-template-columns: 1fr 2fr' would create two columns, where the second column is twice as wide as the first.

We'll also explore how to place items onto the grid, either explicitly using line numbers or by naming grid lines and areas for a more semantic layout. Thanks for watching, and don't forget to like and subscribe for more content.";

/// Offline generator returning fixed text, for demos and runs without an API key
#[derive(Debug, Clone, Default)]
pub struct CannedGenerator {
    delay: Duration,
}

impl CannedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate network latency on every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn wait(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn transcript(&self, title: &str, language: &str) -> Result<String> {
        tracing::debug!("[offline] transcript for \"{}\" ({})", title, language);
        self.wait().await;
        Ok(CANNED_TRANSCRIPT.to_string())
    }

    async fn summary(&self, transcript: &str) -> Result<String> {
        self.wait().await;
        let first = transcript
            .split("\n\n")
            .map(str::trim)
            .find(|p| !p.is_empty())
            .unwrap_or_default();
        Ok(first.split_inclusive(". ").next().unwrap_or(first).trim().to_string())
    }

    async fn key_topics(&self, _transcript: &str) -> Result<Vec<String>> {
        self.wait().await;
        Ok(vec![
            "CSS Grid".to_string(),
            "Two-dimensional layout".to_string(),
            "Fractional units".to_string(),
            "Grid placement".to_string(),
        ])
    }
}
