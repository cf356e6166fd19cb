//! Caption timing for plain-text transcripts.
//!
//! Transcripts coming back from the generator carry no timing information, so each
//! paragraph is given a synthetic spoken duration at a fixed reading rate and the
//! resulting blocks are laid out back to back.

use serde::{Deserialize, Serialize};

/// Reading rate used to estimate how long a paragraph takes to speak
pub const WORDS_PER_MINUTE: f64 = 150.0;

/// Silence inserted between two consecutive caption blocks, in seconds
pub const BLOCK_PAUSE_SECONDS: f64 = 0.5;

/// One timed caption entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionBlock {
    /// 1-based position in the sequence
    pub index: usize,

    /// Start offset in seconds
    pub start: f64,

    /// End offset in seconds
    pub end: f64,

    /// Paragraph text
    pub text: String,
}

/// Timestamp dialect used when rendering captions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampStyle {
    /// `HH:MM:SS,mmm`
    Srt,
    /// `HH:MM:SS.mmm`
    Vtt,
}

impl TimestampStyle {
    fn separator(self) -> char {
        match self {
            TimestampStyle::Srt => ',',
            TimestampStyle::Vtt => '.',
        }
    }
}

/// Split a transcript into its non-empty paragraphs.
pub fn paragraphs(transcript: &str) -> Vec<String> {
    transcript
        .replace("\r\n", "\n")
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Estimated spoken duration of a paragraph in seconds.
pub fn spoken_duration(paragraph: &str) -> f64 {
    let words = paragraph.split_whitespace().count() as f64;
    words / WORDS_PER_MINUTE * 60.0
}

/// Lay the paragraphs of a transcript out as consecutive caption blocks.
pub fn caption_blocks(transcript: &str) -> Vec<CaptionBlock> {
    let mut blocks = Vec::new();
    let mut cursor = 0.0_f64;

    for (i, text) in paragraphs(transcript).into_iter().enumerate() {
        let start = cursor;
        let end = start + spoken_duration(&text);
        blocks.push(CaptionBlock {
            index: i + 1,
            start,
            end,
            text,
        });
        cursor = end + BLOCK_PAUSE_SECONDS;
    }

    blocks
}

/// Render an offset as `HH:MM:SS<sep>mmm`.
pub fn format_timestamp(seconds: f64, style: TimestampStyle) -> String {
    // Round on the total so the millisecond field never reaches 1000
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;

    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        hours,
        minutes,
        secs,
        style.separator(),
        millis
    )
}

/// Format a transcript as SubRip subtitles
pub fn to_srt(transcript: &str) -> String {
    let mut output = String::new();

    for block in caption_blocks(transcript) {
        output.push_str(&format!("{}\n", block.index));
        output.push_str(&format!(
            "{} --> {}\n",
            format_timestamp(block.start, TimestampStyle::Srt),
            format_timestamp(block.end, TimestampStyle::Srt)
        ));
        output.push_str(&block.text);
        output.push_str("\n\n");
    }

    output
}

/// Format a transcript as WebVTT subtitles
pub fn to_vtt(transcript: &str) -> String {
    let mut output = String::from("WEBVTT\n\n");

    for block in caption_blocks(transcript) {
        output.push_str(&format!(
            "{} --> {}\n",
            format_timestamp(block.start, TimestampStyle::Vtt),
            format_timestamp(block.end, TimestampStyle::Vtt)
        ));
        output.push_str(&block.text);
        output.push_str("\n\n");
    }

    output
}
