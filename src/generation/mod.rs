use async_trait::async_trait;

pub mod canned;
pub mod openai;

use crate::{Result, ScribeError};

pub use canned::CannedGenerator;
pub use openai::{ChatCompletionGenerator, Provider};

/// Language used when none is chosen
pub const DEFAULT_LANGUAGE: &str = "English";

const TRANSCRIPT_FAILED: &str = "The AI model could not generate a transcript for this video. This might be due to a network issue or API limitations. Please try again or pick another video.";
const SUMMARY_FAILED: &str =
    "The AI model could not summarize this transcript. Please try again in a moment.";
const KEY_TOPICS_FAILED: &str =
    "The AI model could not extract key topics from this transcript. Please try again in a moment.";

/// Trait for the text generation backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a paragraph-based transcript for an item title
    async fn transcript(&self, title: &str, language: &str) -> Result<String>;

    /// Summarize a transcript
    async fn summary(&self, transcript: &str) -> Result<String>;

    /// Extract the main topics of a transcript, most important first
    async fn key_topics(&self, transcript: &str) -> Result<Vec<String>>;
}

/// Generate a transcript, replacing upstream failures with a user-safe message
pub async fn generate_transcript(
    generator: &dyn TextGenerator,
    title: &str,
    language: &str,
) -> Result<String> {
    tracing::info!("Generating {} transcript for \"{}\"", language, title);
    generator
        .transcript(title, language)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, title, "Transcript generation failed");
            ScribeError::generation(TRANSCRIPT_FAILED)
        })
}

/// Summarize a transcript, replacing upstream failures with a user-safe message
pub async fn generate_summary(generator: &dyn TextGenerator, transcript: &str) -> Result<String> {
    generator.summary(transcript).await.map_err(|e| {
        tracing::error!(error = %e, "Summary generation failed");
        ScribeError::generation(SUMMARY_FAILED)
    })
}

/// Extract key topics, replacing upstream failures with a user-safe message
pub async fn extract_key_topics(
    generator: &dyn TextGenerator,
    transcript: &str,
) -> Result<Vec<String>> {
    generator.key_topics(transcript).await.map_err(|e| {
        tracing::error!(error = %e, "Key topic extraction failed");
        ScribeError::generation(KEY_TOPICS_FAILED)
    })
}
